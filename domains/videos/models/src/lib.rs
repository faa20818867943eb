use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_CATEGORY: &str = "General";

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ModerationStatus {
    #[default]
    Pending,
    Approved,
    Flagged,
}

impl ModerationStatus {
    pub fn is_approved(self) -> bool { self == Self::Approved }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub thumbnail: String,
    /// Seconds.
    pub duration: u32,
    pub views: u64,
    /// Ids of the users who liked the video.
    pub likes: Vec<String>,
    pub tags: Vec<String>,
    pub category: String,
    pub uploader: String,
    pub moderation_status: ModerationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    pub fn from_new(video: NewVideo) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            title: video.title,
            description: video.description,
            url: video.url,
            thumbnail: video.thumbnail,
            duration: video.duration,
            views: 0,
            likes: Vec::new(),
            tags: video.tags,
            category: video.category.unwrap_or_else(|| DEFAULT_CATEGORY.into()),
            uploader: video.uploader,
            moderation_status: video.moderation_status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.iter().any(|id| id == user_id)
    }

    /// Likes or unlikes on behalf of `user_id`. Returns whether the video is
    /// liked afterwards.
    pub fn toggle_like(&mut self, user_id: &str) -> bool {
        let liked = if self.is_liked_by(user_id) {
            self.likes.retain(|id| id != user_id);
            false
        }
        else {
            self.likes.push(user_id.to_owned());
            true
        };
        self.updated_at = Utc::now();
        liked
    }

    pub fn apply(&mut self, update: UpdateVideo) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(thumbnail) = update.thumbnail {
            self.thumbnail = thumbnail;
        }
        if let Some(tags) = update.tags {
            self.tags = tags;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(status) = update.moderation_status {
            self.moderation_status = status;
        }
        self.updated_at = Utc::now();
    }

    /// Case-insensitive match on title, description or any tag.
    pub fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
            || self.tags.iter().any(|tag| tag.to_lowercase().contains(&needle))
    }

    /// Crude relevance: title hits weigh most, then tags, then description.
    pub fn relevance(&self, needle: &str) -> u32 {
        let needle = needle.to_lowercase();
        let mut score = 0;
        if self.title.to_lowercase().contains(&needle) {
            score += 4;
        }
        if self.tags.iter().any(|tag| tag.to_lowercase().contains(&needle)) {
            score += 2;
        }
        if self.description.to_lowercase().contains(&needle) {
            score += 1;
        }
        score
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewVideo {
    pub title: String,
    pub description: String,
    pub url: String,
    pub thumbnail: String,
    pub duration: u32,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub uploader: String,
    pub moderation_status: Option<ModerationStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateVideo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub tags: Option<Vec<String>>,
    pub category: Option<String>,
    pub moderation_status: Option<ModerationStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackAction {
    Watch,
    Like,
    Skip,
}

/// What the recommender knows about a viewer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewerProfile {
    /// Watched video ids, oldest first, without duplicates.
    pub watch_history: Vec<String>,
    pub liked_categories: Vec<(String, u32)>,
    pub skipped: Vec<String>,
}

impl ViewerProfile {
    pub fn record_watch(&mut self, video_id: &str) {
        if !self.watch_history.iter().any(|id| id == video_id) {
            self.watch_history.push(video_id.to_owned());
        }
    }

    pub fn record_like(&mut self, category: &str) {
        match self.liked_categories.iter_mut().find(|(name, _)| name == category) {
            Some((_, count)) => *count += 1,
            None => self.liked_categories.push((category.to_owned(), 1)),
        }
    }

    pub fn record_skip(&mut self, video_id: &str) {
        if !self.skipped.iter().any(|id| id == video_id) {
            self.skipped.push(video_id.to_owned());
        }
    }

    pub fn has_seen(&self, video_id: &str) -> bool {
        self.watch_history.iter().any(|id| id == video_id)
            || self.skipped.iter().any(|id| id == video_id)
    }
}
