#![recursion_limit = "256"]

use database_traits::GenericDao;
use tracing::instrument;
use video_cache_keys::{ResourceKind, VideoCache};
use video_commands::{
    DeleteVideoCommand, PublishVideoCommand, RecordFeedbackCommand,
    ToggleLikeCommand, UpdateVideoCommand,
};
use video_dao::VideoDao;
use video_errors::VideoError;
use video_responses::{LikeResponse, MessageResponse, VideoResponse};

// Mutations write first and invalidate after, so a failed write leaves the
// cache alone.

#[derive(Clone)]
pub struct PublishVideoHandler {
    video_dao: VideoDao,
    cache: VideoCache,
}

impl PublishVideoHandler {
    pub fn new(video_dao: VideoDao, cache: VideoCache) -> Self {
        Self { video_dao, cache }
    }

    #[instrument(skip(self))]
    pub async fn execute(
        &self, command: PublishVideoCommand,
    ) -> Result<VideoResponse, VideoError> {
        let saved = self.video_dao.create(command.into()).await?;
        self.cache.invalidate(ResourceKind::Video, &saved.id).await;

        Ok(saved.into())
    }
}

#[derive(Clone)]
pub struct UpdateVideoHandler {
    video_dao: VideoDao,
    cache: VideoCache,
}

impl UpdateVideoHandler {
    pub fn new(video_dao: VideoDao, cache: VideoCache) -> Self {
        Self { video_dao, cache }
    }

    #[instrument(skip(self))]
    pub async fn execute(
        &self, command: UpdateVideoCommand,
    ) -> Result<VideoResponse, VideoError> {
        let video_id = command.video_id.clone();
        let updated = self.video_dao.update(video_id, command.into()).await?;
        self.cache.invalidate(ResourceKind::Video, &updated.id).await;

        Ok(updated.into())
    }
}

#[derive(Clone)]
pub struct DeleteVideoHandler {
    video_dao: VideoDao,
    cache: VideoCache,
}

impl DeleteVideoHandler {
    pub fn new(video_dao: VideoDao, cache: VideoCache) -> Self {
        Self { video_dao, cache }
    }

    #[instrument(skip(self))]
    pub async fn execute(
        &self, command: DeleteVideoCommand,
    ) -> Result<MessageResponse, VideoError> {
        self.video_dao.delete(command.video_id.clone()).await?;
        self.cache
            .invalidate(ResourceKind::Video, &command.video_id)
            .await;

        Ok(MessageResponse::new("Video deleted successfully"))
    }
}

#[derive(Clone)]
pub struct ToggleLikeHandler {
    video_dao: VideoDao,
    cache: VideoCache,
}

impl ToggleLikeHandler {
    pub fn new(video_dao: VideoDao, cache: VideoCache) -> Self {
        Self { video_dao, cache }
    }

    #[instrument(skip(self))]
    pub async fn execute(
        &self, command: ToggleLikeCommand,
    ) -> Result<LikeResponse, VideoError> {
        if command.user_id.trim().is_empty() {
            return Err(VideoError::InvalidInput("userId is required".into()));
        }

        let (liked, likes_count) = self
            .video_dao
            .toggle_like(&command.video_id, &command.user_id)
            .await?;
        self.cache
            .invalidate(ResourceKind::Video, &command.video_id)
            .await;

        Ok(LikeResponse { liked, likes_count })
    }
}

#[derive(Clone)]
pub struct RecordFeedbackHandler {
    video_dao: VideoDao,
    cache: VideoCache,
}

impl RecordFeedbackHandler {
    pub fn new(video_dao: VideoDao, cache: VideoCache) -> Self {
        Self { video_dao, cache }
    }

    /// Updates the viewer's profile and drops their cached recommendations.
    #[instrument(skip(self))]
    pub async fn execute(
        &self, command: RecordFeedbackCommand,
    ) -> Result<MessageResponse, VideoError> {
        self.video_dao
            .record_feedback(&command.user_id, &command.video_id, command.action)
            .await?;
        self.cache
            .invalidate(ResourceKind::Recommendations, &command.user_id)
            .await;

        Ok(MessageResponse::new("Preferences updated"))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use redis_connection::{CacheKey, CacheParams};
    use test_utils::{memory_video_cache, passthrough_video_cache, seeded_dao};
    use video_models::FeedbackAction;

    use super::*;

    async fn warm(cache: &VideoCache, key: &CacheKey) {
        assert!(
            cache
                .layer()
                .populate(key, &"cached", Duration::from_secs(60))
                .await
        );
    }

    fn list_key() -> CacheKey {
        CacheKey::params("videos-list", &CacheParams::new().with("page", "1"))
    }

    #[tokio::test]
    async fn like_toggles_and_clears_cached_views() {
        let cache = memory_video_cache();
        let handler = ToggleLikeHandler::new(seeded_dao(), cache.clone());
        let video_key = CacheKey::resource("video", "v1");
        let trending_key = CacheKey::params("trending", &CacheParams::new());
        warm(&cache, &video_key).await;
        warm(&cache, &list_key()).await;
        warm(&cache, &trending_key).await;

        let like = || ToggleLikeCommand {
            video_id: "v1".into(),
            user_id: "u9".into(),
        };
        let liked = handler.execute(like()).await.unwrap();
        let unliked = handler.execute(like()).await.unwrap();

        assert!(liked.liked);
        assert!(!unliked.liked);
        assert_eq!(liked.likes_count, unliked.likes_count + 1);
        let store = cache.layer().store();
        assert_eq!(store.get(video_key.as_str()).await, None);
        assert_eq!(store.get(list_key().as_str()).await, None);
        assert_eq!(store.get(trending_key.as_str()).await, None);
    }

    #[tokio::test]
    async fn like_on_missing_video_keeps_cache() {
        let cache = memory_video_cache();
        let handler = ToggleLikeHandler::new(seeded_dao(), cache.clone());
        warm(&cache, &list_key()).await;

        let result = handler
            .execute(ToggleLikeCommand {
                video_id: "missing".into(),
                user_id: "u9".into(),
            })
            .await;

        assert!(matches!(result, Err(VideoError::NotFound { .. })));
        assert!(cache.layer().store().get(list_key().as_str()).await.is_some());
    }

    #[tokio::test]
    async fn publish_sweeps_listings() {
        let cache = memory_video_cache();
        let handler = PublishVideoHandler::new(seeded_dao(), cache.clone());
        warm(&cache, &list_key()).await;

        let published = handler
            .execute(PublishVideoCommand {
                title: "new upload".into(),
                url: "https://cdn.example.com/new.mp4".into(),
                uploader: "u1".into(),
                ..PublishVideoCommand::default()
            })
            .await
            .unwrap();

        assert_eq!(published.title, "new upload");
        assert_eq!(cache.layer().store().get(list_key().as_str()).await, None);
        assert_eq!(cache.layer().metrics().snapshot().keys_swept, 1);
    }

    #[tokio::test]
    async fn update_and_delete_drop_the_video_key() {
        let cache = memory_video_cache();
        let dao = seeded_dao();
        let update = UpdateVideoHandler::new(dao.clone(), cache.clone());
        let delete = DeleteVideoHandler::new(dao.clone(), cache.clone());
        let video_key = CacheKey::resource("video", "v3");

        warm(&cache, &video_key).await;
        let updated = update
            .execute(UpdateVideoCommand {
                video_id: "v3".into(),
                title: Some("renamed".into()),
                ..UpdateVideoCommand::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.title, "renamed");
        assert_eq!(cache.layer().store().get(video_key.as_str()).await, None);

        warm(&cache, &video_key).await;
        delete
            .execute(DeleteVideoCommand {
                video_id: "v3".into(),
            })
            .await
            .unwrap();
        assert_eq!(cache.layer().store().get(video_key.as_str()).await, None);
        assert!(dao.find_by_id("v3".into()).await.is_err());
    }

    #[tokio::test]
    async fn feedback_drops_only_that_viewers_recommendations() {
        let cache = memory_video_cache();
        let handler = RecordFeedbackHandler::new(seeded_dao(), cache.clone());
        let mine = CacheKey::resource("recommendations", "u1");
        let theirs = CacheKey::resource("recommendations", "u2");
        warm(&cache, &mine).await;
        warm(&cache, &theirs).await;
        warm(&cache, &list_key()).await;

        handler
            .execute(RecordFeedbackCommand {
                user_id: "u1".into(),
                video_id: "v2".into(),
                action: FeedbackAction::Like,
            })
            .await
            .unwrap();

        let store = cache.layer().store();
        assert_eq!(store.get(mine.as_str()).await, None);
        assert!(store.get(theirs.as_str()).await.is_some());
        assert!(store.get(list_key().as_str()).await.is_some());
    }

    #[tokio::test]
    async fn mutations_succeed_without_a_store() {
        let dao = seeded_dao();
        let handler =
            ToggleLikeHandler::new(dao.clone(), passthrough_video_cache().await);

        let result = handler
            .execute(ToggleLikeCommand {
                video_id: "v4".into(),
                user_id: "u1".into(),
            })
            .await
            .unwrap();

        assert!(result.liked);
        assert!(dao.find_by_id("v4".into()).await.unwrap().is_liked_by("u1"));
    }
}
