#![recursion_limit = "256"]

pub mod recommend;

use chrono::Utc;
use database_traits::GenericDao;
use redis_connection::Cached;
use tracing::instrument;
use video_cache_keys::{RecommendationsCacheKey, VideoCache, VideoCacheKey};
use video_dao::{VideoDao, VideoFilter};
use video_errors::VideoError;
use video_queries::{
    GetRecommendationsQuery, GetVideoQuery, ListVideosQuery, MAX_RECOMMENDATIONS,
    PageWindow, SearchVideosQuery, TrendingQuery,
};
use video_responses::{
    Pagination, RecommendationsResponse, VideoPage, VideoResponse,
};

async fn load_page(
    dao: &VideoDao, filter: VideoFilter, window: PageWindow,
) -> Result<VideoPage, VideoError> {
    let page = dao
        .find_many(filter, window.offset(), window.limit as usize)
        .await?;

    Ok(VideoPage {
        pagination: Pagination {
            page: window.page,
            limit: window.limit,
            total: page.total,
            pages: window.pages(page.total),
        },
        videos: page.items.into_iter().map(Into::into).collect(),
    })
}

#[derive(Clone)]
pub struct GetVideoQueryHandler {
    video_dao: VideoDao,
    cache: VideoCache,
}

impl GetVideoQueryHandler {
    pub fn new(video_dao: VideoDao, cache: VideoCache) -> Self {
        Self { video_dao, cache }
    }

    /// Served through the cache; counts a view either way.
    #[instrument(skip(self))]
    pub async fn execute(
        &self, query: GetVideoQuery,
    ) -> Result<Cached<VideoResponse>, VideoError> {
        let dao = &self.video_dao;
        let video_id = query.video_id.clone();
        let video = self
            .cache
            .cache_read(
                &VideoCacheKey,
                (&query.video_id,),
                move || async move {
                    dao.find_by_id(video_id).await.map(VideoResponse::from)
                },
                None,
            )
            .await?;

        if video.is_hit() {
            tracing::debug!("Cache hit for video {}", query.video_id);
        }

        // the cached copy keeps its view count until it expires or is invalidated
        if let Err(err) = self.video_dao.record_view(&query.video_id).await {
            tracing::debug!("View not recorded for {}: {err}", query.video_id);
        }

        Ok(video)
    }
}

#[derive(Clone)]
pub struct ListVideosQueryHandler {
    video_dao: VideoDao,
}

impl ListVideosQueryHandler {
    pub fn new(video_dao: VideoDao) -> Self { Self { video_dao } }

    #[instrument(skip(self))]
    pub async fn execute(
        &self, query: ListVideosQuery,
    ) -> Result<VideoPage, VideoError> {
        let window = query.window();
        let filter = VideoFilter::Listing {
            category: query.category,
            search: query.search,
        };
        load_page(&self.video_dao, filter, window).await
    }
}

#[derive(Clone)]
pub struct TrendingQueryHandler {
    video_dao: VideoDao,
}

impl TrendingQueryHandler {
    pub fn new(video_dao: VideoDao) -> Self { Self { video_dao } }

    #[instrument(skip(self))]
    pub async fn execute(
        &self, query: TrendingQuery,
    ) -> Result<VideoPage, VideoError> {
        load_page(&self.video_dao, VideoFilter::Trending, query.window()).await
    }
}

#[derive(Clone)]
pub struct SearchVideosQueryHandler {
    video_dao: VideoDao,
}

impl SearchVideosQueryHandler {
    pub fn new(video_dao: VideoDao) -> Self { Self { video_dao } }

    #[instrument(skip(self))]
    pub async fn execute(
        &self, query: SearchVideosQuery,
    ) -> Result<VideoPage, VideoError> {
        let text = query.text.trim();
        if text.is_empty() {
            return Err(VideoError::InvalidInput(
                "search text cannot be empty".into(),
            ));
        }

        let window = query.window();
        let filter = VideoFilter::Search {
            text: text.to_owned(),
            category: query.category,
            sort: query.sort_by.unwrap_or_default(),
        };
        load_page(&self.video_dao, filter, window).await
    }
}

#[derive(Clone)]
pub struct RecommendationsQueryHandler {
    video_dao: VideoDao,
    cache: VideoCache,
}

impl RecommendationsQueryHandler {
    pub fn new(video_dao: VideoDao, cache: VideoCache) -> Self {
        Self { video_dao, cache }
    }

    /// The full list is cached per viewer; `limit` only trims the answer.
    #[instrument(skip(self))]
    pub async fn execute(
        &self, query: GetRecommendationsQuery,
    ) -> Result<Cached<RecommendationsResponse>, VideoError> {
        let limit = query.limit();
        let dao = &self.video_dao;
        let user_id = query.user_id.as_str();

        let recommendations = self
            .cache
            .cache_read(
                &RecommendationsCacheKey,
                (&query.user_id,),
                move || async move {
                    let profile = dao.viewer_profile(user_id).await;
                    let personalized = !profile.watch_history.is_empty()
                        || !profile.liked_categories.is_empty();
                    let picks = recommend::recommend(
                        &profile,
                        dao.snapshot().await,
                        Utc::now(),
                        MAX_RECOMMENDATIONS,
                    );
                    Ok::<_, VideoError>(RecommendationsResponse::new(
                        picks.into_iter().map(Into::into).collect(),
                        personalized,
                    ))
                },
                None,
            )
            .await?;

        Ok(recommendations.map(|response| response.truncated(limit)))
    }
}
