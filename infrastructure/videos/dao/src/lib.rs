use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use database_traits::{GenericDao, PageOf};
use tokio::sync::RwLock;
use tracing::instrument;
use video_errors::VideoError;
use video_models::{FeedbackAction, NewVideo, UpdateVideo, Video, ViewerProfile};
use video_queries::SearchSort;

pub mod seed;

/// Which videos a listing selects and how it orders them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoFilter {
    /// Everything, newest first. `category == "all"` means no category filter.
    Listing {
        category: Option<String>,
        search: Option<String>,
    },
    /// Approved videos by views, then recency.
    Trending,
    /// Approved videos matching `text`.
    Search {
        text: String,
        category: Option<String>,
        sort: SearchSort,
    },
}

impl VideoFilter {
    fn select(&self, videos: impl Iterator<Item = Video>) -> Vec<Video> {
        match self {
            VideoFilter::Listing { category, search } => {
                let category = category.as_deref().filter(|c| *c != "all");
                let mut selected: Vec<Video> = videos
                    .filter(|v| category.is_none_or(|c| v.category == c))
                    .filter(|v| search.as_deref().is_none_or(|s| v.matches_text(s)))
                    .collect();
                selected.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                selected
            }
            VideoFilter::Trending => {
                let mut selected: Vec<Video> =
                    videos.filter(|v| v.moderation_status.is_approved()).collect();
                sort_by_popularity(&mut selected);
                selected
            }
            VideoFilter::Search {
                text,
                category,
                sort,
            } => {
                let mut selected: Vec<Video> = videos
                    .filter(|v| v.moderation_status.is_approved())
                    .filter(|v| category.as_deref().is_none_or(|c| v.category == c))
                    .filter(|v| v.matches_text(text))
                    .collect();
                match sort {
                    SearchSort::Relevance => {
                        selected.sort_by(|a, b| {
                            b.relevance(text)
                                .cmp(&a.relevance(text))
                                .then(b.views.cmp(&a.views))
                        })
                    }
                    SearchSort::Date => {
                        selected.sort_by(|a, b| b.created_at.cmp(&a.created_at))
                    }
                    SearchSort::Views => selected.sort_by(|a, b| b.views.cmp(&a.views)),
                }
                selected
            }
        }
    }
}

/// Views descending, newest first among equals.
pub fn sort_by_popularity(videos: &mut [Video]) {
    videos.sort_by(|a, b| {
        b.views
            .cmp(&a.views)
            .then(b.created_at.cmp(&a.created_at))
    });
}

#[derive(Default)]
struct Catalog {
    videos: HashMap<String, Video>,
    viewers: HashMap<String, ViewerProfile>,
}

/// In-process system of record for videos and viewer activity.
#[derive(Clone, Default)]
pub struct VideoDao {
    catalog: Arc<RwLock<Catalog>>,
}

impl VideoDao {
    pub fn new() -> Self { Self::default() }

    pub fn with_videos(videos: impl IntoIterator<Item = Video>) -> Self {
        let catalog = Catalog {
            videos: videos
                .into_iter()
                .map(|video| (video.id.clone(), video))
                .collect(),
            viewers: HashMap::new(),
        };
        Self {
            catalog: Arc::new(RwLock::new(catalog)),
        }
    }

    pub async fn len(&self) -> usize { self.catalog.read().await.videos.len() }

    pub async fn is_empty(&self) -> bool { self.len().await == 0 }

    /// Every video, in no particular order.
    pub async fn snapshot(&self) -> Vec<Video> {
        self.catalog.read().await.videos.values().cloned().collect()
    }

    #[instrument(skip(self))]
    pub async fn record_view(&self, video_id: &str) -> Result<u64, VideoError> {
        let mut catalog = self.catalog.write().await;
        let video = catalog
            .videos
            .get_mut(video_id)
            .ok_or_else(|| not_found(video_id))?;
        video.views += 1;
        Ok(video.views)
    }

    /// Returns `(liked, likes_count)` after the toggle.
    #[instrument(skip(self))]
    pub async fn toggle_like(
        &self, video_id: &str, user_id: &str,
    ) -> Result<(bool, usize), VideoError> {
        let mut catalog = self.catalog.write().await;
        let video = catalog
            .videos
            .get_mut(video_id)
            .ok_or_else(|| not_found(video_id))?;
        let liked = video.toggle_like(user_id);
        Ok((liked, video.likes.len()))
    }

    #[instrument(skip(self))]
    pub async fn record_feedback(
        &self, user_id: &str, video_id: &str, action: FeedbackAction,
    ) -> Result<(), VideoError> {
        let mut catalog = self.catalog.write().await;
        let category = catalog
            .videos
            .get(video_id)
            .map(|video| video.category.clone())
            .ok_or_else(|| not_found(video_id))?;

        let profile = catalog.viewers.entry(user_id.to_owned()).or_default();
        match action {
            FeedbackAction::Watch => profile.record_watch(video_id),
            FeedbackAction::Like => profile.record_like(&category),
            FeedbackAction::Skip => profile.record_skip(video_id),
        }
        Ok(())
    }

    pub async fn viewer_profile(&self, user_id: &str) -> ViewerProfile {
        self.catalog
            .read()
            .await
            .viewers
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }
}

fn not_found(video_id: &str) -> VideoError {
    VideoError::NotFound {
        video_id: video_id.to_owned(),
    }
}

#[async_trait]
impl GenericDao for VideoDao {
    type CreateRequest = NewVideo;
    type Error = VideoError;
    type Filter = VideoFilter;
    type ID = String;
    type Model = Video;
    type Response = Video;
    type UpdateRequest = UpdateVideo;

    async fn find_by_id(
        &self, id: Self::ID,
    ) -> Result<Self::Response, Self::Error> {
        self.catalog
            .read()
            .await
            .videos
            .get(&id)
            .cloned()
            .ok_or(VideoError::NotFound { video_id: id })
    }

    async fn find_many(
        &self, filter: Self::Filter, offset: usize, limit: usize,
    ) -> Result<PageOf<Self::Response>, Self::Error> {
        let catalog = self.catalog.read().await;
        let selected = filter.select(catalog.videos.values().cloned());
        let total = selected.len();
        let items = selected.into_iter().skip(offset).take(limit).collect();

        Ok(PageOf { items, total })
    }

    async fn create(
        &self, req: Self::CreateRequest,
    ) -> Result<Self::Response, Self::Error> {
        if req.title.trim().is_empty() {
            return Err(VideoError::InvalidInput("title is required".into()));
        }
        if req.url.trim().is_empty() {
            return Err(VideoError::InvalidInput("url is required".into()));
        }
        if req.uploader.trim().is_empty() {
            return Err(VideoError::InvalidInput("uploader is required".into()));
        }

        let video = Video::from_new(req);
        self.catalog
            .write()
            .await
            .videos
            .insert(video.id.clone(), video.clone());
        Ok(video)
    }

    async fn update(
        &self, id: Self::ID, req: Self::UpdateRequest,
    ) -> Result<Self::Response, Self::Error> {
        if req.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(VideoError::InvalidInput("title cannot be empty".into()));
        }

        let mut catalog = self.catalog.write().await;
        let video = catalog
            .videos
            .get_mut(&id)
            .ok_or_else(|| not_found(&id))?;
        video.apply(req);
        Ok(video.clone())
    }

    async fn delete(&self, id: Self::ID) -> Result<(), Self::Error> {
        let mut catalog = self.catalog.write().await;
        catalog.videos.remove(&id).ok_or_else(|| not_found(&id))?;
        for profile in catalog.viewers.values_mut() {
            profile.watch_history.retain(|watched| *watched != id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use video_models::ModerationStatus;

    use super::*;

    fn new_video(title: &str, category: &str, status: ModerationStatus) -> NewVideo {
        NewVideo {
            title: title.into(),
            url: format!("https://cdn.example.com/{title}.mp4"),
            uploader: "u1".into(),
            category: Some(category.into()),
            moderation_status: Some(status),
            ..NewVideo::default()
        }
    }

    #[tokio::test]
    async fn create_then_find() {
        let dao = VideoDao::new();
        let created = dao
            .create(new_video("intro", "Music", ModerationStatus::Approved))
            .await
            .unwrap();

        let found = dao.find_by_id(created.id.clone()).await.unwrap();

        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn create_rejects_blank_title() {
        let dao = VideoDao::new();

        let result = dao
            .create(new_video(" ", "Music", ModerationStatus::Approved))
            .await;

        assert!(matches!(result, Err(VideoError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn trending_skips_unapproved_and_orders_by_views() {
        let dao = VideoDao::new();
        let low = dao
            .create(new_video("low", "Music", ModerationStatus::Approved))
            .await
            .unwrap();
        let high = dao
            .create(new_video("high", "Music", ModerationStatus::Approved))
            .await
            .unwrap();
        dao.create(new_video("pending", "Music", ModerationStatus::Pending))
            .await
            .unwrap();
        dao.record_view(&high.id).await.unwrap();
        dao.record_view(&high.id).await.unwrap();

        let page = dao.find_many(VideoFilter::Trending, 0, 10).await.unwrap();

        let ids: Vec<_> = page.items.iter().map(|v| v.id.clone()).collect();
        assert_eq!(ids, vec![high.id, low.id]);
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn listing_pages_and_filters_category() {
        let dao = VideoDao::new();
        for n in 0..5 {
            dao.create(new_video(&format!("m{n}"), "Music", ModerationStatus::Pending))
                .await
                .unwrap();
        }
        dao.create(new_video("g", "Gaming", ModerationStatus::Pending))
            .await
            .unwrap();

        let music = VideoFilter::Listing {
            category: Some("Music".into()),
            search: None,
        };
        let page = dao.find_many(music, 2, 2).await.unwrap();
        let all = VideoFilter::Listing {
            category: Some("all".into()),
            search: None,
        };

        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert_eq!(dao.find_many(all, 0, 100).await.unwrap().total, 6);
    }

    #[tokio::test]
    async fn search_matches_text_on_approved_videos() {
        let dao = VideoDao::new();
        dao.create(new_video("rust-talk", "Tech", ModerationStatus::Approved))
            .await
            .unwrap();
        dao.create(new_video("rust-draft", "Tech", ModerationStatus::Flagged))
            .await
            .unwrap();

        let filter = VideoFilter::Search {
            text: "RUST".into(),
            category: None,
            sort: SearchSort::Relevance,
        };
        let page = dao.find_many(filter, 0, 10).await.unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "rust-talk");
    }

    #[tokio::test]
    async fn toggle_like_round_trip() {
        let dao = VideoDao::new();
        let video = dao
            .create(new_video("clip", "Music", ModerationStatus::Approved))
            .await
            .unwrap();

        assert_eq!(dao.toggle_like(&video.id, "u2").await.unwrap(), (true, 1));
        assert_eq!(dao.toggle_like(&video.id, "u2").await.unwrap(), (false, 0));
        assert!(matches!(
            dao.toggle_like("missing", "u2").await,
            Err(VideoError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn feedback_builds_a_profile() {
        let dao = VideoDao::new();
        let video = dao
            .create(new_video("clip", "Music", ModerationStatus::Approved))
            .await
            .unwrap();

        dao.record_feedback("u9", &video.id, FeedbackAction::Watch).await.unwrap();
        dao.record_feedback("u9", &video.id, FeedbackAction::Like).await.unwrap();

        let profile = dao.viewer_profile("u9").await;
        assert_eq!(profile.watch_history, vec![video.id.clone()]);
        assert_eq!(profile.liked_categories, vec![("Music".to_string(), 1)]);

        dao.delete(video.id.clone()).await.unwrap();
        assert!(dao.viewer_profile("u9").await.watch_history.is_empty());
    }
}
