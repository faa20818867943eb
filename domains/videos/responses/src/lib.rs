use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use video_models::{ModerationStatus, Video};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub thumbnail: String,
    pub duration: u32,
    pub views: u64,
    pub likes_count: usize,
    pub tags: Vec<String>,
    pub category: String,
    pub uploader: String,
    pub moderation_status: ModerationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Video> for VideoResponse {
    fn from(video: Video) -> Self {
        Self {
            likes_count: video.likes.len(),
            id: video.id,
            title: video.title,
            description: video.description,
            url: video.url,
            thumbnail: video.thumbnail,
            duration: video.duration,
            views: video.views,
            tags: video.tags,
            category: video.category,
            uploader: video.uploader,
            moderation_status: video.moderation_status,
            created_at: video.created_at,
            updated_at: video.updated_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    pub pages: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VideoPage {
    pub videos: Vec<VideoResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub liked: bool,
    pub likes_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<VideoResponse>,
    pub count: usize,
    pub personalized: bool,
}

impl RecommendationsResponse {
    pub fn new(recommendations: Vec<VideoResponse>, personalized: bool) -> Self {
        Self {
            count: recommendations.len(),
            recommendations,
            personalized,
        }
    }

    /// Keeps the first `limit` picks.
    pub fn truncated(mut self, limit: usize) -> Self {
        self.recommendations.truncate(limit);
        self.count = self.recommendations.len();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use video_models::NewVideo;

    use super::*;

    #[test]
    fn response_counts_likes_and_uses_camel_case() {
        let mut video = Video::from_new(NewVideo {
            title: "Clip".into(),
            url: "https://cdn/clip.mp4".into(),
            uploader: "u1".into(),
            ..NewVideo::default()
        });
        video.toggle_like("u2");

        let json = serde_json::to_value(VideoResponse::from(video)).unwrap();

        assert_eq!(json["likesCount"], 1);
        assert_eq!(json["moderationStatus"], "pending");
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn truncation_updates_count() {
        let response = RecommendationsResponse::new(Vec::new(), true).truncated(3);

        assert_eq!(response.count, 0);
        assert!(response.personalized);
    }
}
