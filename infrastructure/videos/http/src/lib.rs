pub mod admin;
pub mod routes;

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use cache_middleware::CachedJson;
use common_errors::AppError;
use tracing::instrument;
use video_cache_keys::VideoCache;
use video_command_handlers::{
    DeleteVideoHandler, PublishVideoHandler, RecordFeedbackHandler,
    ToggleLikeHandler, UpdateVideoHandler,
};
use video_commands::{
    DeleteVideoCommand, PublishVideoCommand, RecordFeedbackCommand,
    ToggleLikeCommand, UpdateVideoCommand,
};
use video_dao::VideoDao;
use video_queries::{
    GetRecommendationsQuery, GetVideoQuery, ListVideosQuery, SearchVideosQuery,
    TrendingQuery,
};
use video_query_handlers::{
    GetVideoQueryHandler, ListVideosQueryHandler, RecommendationsQueryHandler,
    SearchVideosQueryHandler, TrendingQueryHandler,
};
use video_responses::{
    LikeResponse, MessageResponse, RecommendationsResponse, VideoPage,
    VideoResponse,
};

pub use routes::router;

#[derive(Clone)]
pub struct VideoServices {
    pub publish_video: PublishVideoHandler,
    pub update_video: UpdateVideoHandler,
    pub delete_video: DeleteVideoHandler,
    pub toggle_like: ToggleLikeHandler,
    pub record_feedback: RecordFeedbackHandler,

    pub get_video: GetVideoQueryHandler,
    pub list_videos: ListVideosQueryHandler,
    pub trending: TrendingQueryHandler,
    pub search_videos: SearchVideosQueryHandler,
    pub recommendations: RecommendationsQueryHandler,

    pub cache: VideoCache,
    admin_token: Option<Arc<str>>,
}

impl VideoServices {
    pub fn new(video_dao: VideoDao, cache: VideoCache) -> Self {
        Self {
            publish_video: PublishVideoHandler::new(video_dao.clone(), cache.clone()),
            update_video: UpdateVideoHandler::new(video_dao.clone(), cache.clone()),
            delete_video: DeleteVideoHandler::new(video_dao.clone(), cache.clone()),
            toggle_like: ToggleLikeHandler::new(video_dao.clone(), cache.clone()),
            record_feedback: RecordFeedbackHandler::new(
                video_dao.clone(),
                cache.clone(),
            ),
            get_video: GetVideoQueryHandler::new(video_dao.clone(), cache.clone()),
            list_videos: ListVideosQueryHandler::new(video_dao.clone()),
            trending: TrendingQueryHandler::new(video_dao.clone()),
            search_videos: SearchVideosQueryHandler::new(video_dao.clone()),
            recommendations: RecommendationsQueryHandler::new(video_dao, cache.clone()),
            cache,
            admin_token: None,
        }
    }

    /// Token expected in `x-admin-token`. Without one the admin routes are
    /// closed.
    pub fn with_admin_token(mut self, token: Option<String>) -> Self {
        self.admin_token = token.filter(|t| !t.is_empty()).map(Arc::from);
        self
    }

    pub fn admin_token(&self) -> Option<&str> { self.admin_token.as_deref() }
}

#[utoipa::path(
    get,
    path = "/api/videos",
    params(ListVideosQuery),
    responses(
        (status = 200, description = "Page of videos, newest first", body = VideoPage),
        (status = 500, description = "Internal server error", body = common_errors::ApiErrorResponse)
    ),
    tag = "videos"
)]
#[instrument(skip_all)]
pub async fn list_videos(
    State(services): State<VideoServices>, Query(query): Query<ListVideosQuery>,
) -> Result<Json<VideoPage>, AppError> {
    Ok(Json(services.list_videos.execute(query).await?))
}

#[utoipa::path(
    get,
    path = "/api/videos/trending",
    params(TrendingQuery),
    responses(
        (status = 200, description = "Approved videos by views", body = VideoPage),
        (status = 500, description = "Internal server error", body = common_errors::ApiErrorResponse)
    ),
    tag = "videos"
)]
#[instrument(skip_all)]
pub async fn trending_videos(
    State(services): State<VideoServices>, Query(query): Query<TrendingQuery>,
) -> Result<Json<VideoPage>, AppError> {
    Ok(Json(services.trending.execute(query).await?))
}

#[utoipa::path(
    get,
    path = "/api/videos/search/{query}",
    params(
        ("query" = String, Path, description = "Search text"),
        SearchVideosQuery
    ),
    responses(
        (status = 200, description = "Matching approved videos", body = VideoPage),
        (status = 422, description = "Empty search text", body = common_errors::ApiErrorResponse),
        (status = 500, description = "Internal server error", body = common_errors::ApiErrorResponse)
    ),
    tag = "videos"
)]
#[instrument(skip_all)]
pub async fn search_videos(
    State(services): State<VideoServices>, Path(text): Path<String>,
    Query(mut query): Query<SearchVideosQuery>,
) -> Result<Json<VideoPage>, AppError> {
    query.text = text;
    Ok(Json(services.search_videos.execute(query).await?))
}

#[utoipa::path(
    get,
    path = "/api/videos/{id}",
    params(
        ("id" = String, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Video found; `cached` tells whether it came from the cache", body = VideoResponse),
        (status = 404, description = "Video not found", body = common_errors::ApiErrorResponse),
        (status = 500, description = "Internal server error", body = common_errors::ApiErrorResponse)
    ),
    tag = "videos"
)]
#[instrument(skip_all)]
pub async fn get_video(
    State(services): State<VideoServices>, Path(id): Path<String>,
) -> Result<CachedJson<VideoResponse>, AppError> {
    let query = GetVideoQuery { video_id: id };
    let video = services.get_video.execute(query).await?;

    Ok(CachedJson(video))
}

#[utoipa::path(
    post,
    path = "/api/videos",
    request_body = PublishVideoCommand,
    responses(
        (status = 201, description = "Video published", body = VideoResponse),
        (status = 422, description = "Validation error", body = common_errors::ApiErrorResponse),
        (status = 500, description = "Internal server error", body = common_errors::ApiErrorResponse)
    ),
    tag = "videos"
)]
#[instrument(skip_all)]
pub async fn publish_video(
    State(services): State<VideoServices>,
    Json(command): Json<PublishVideoCommand>,
) -> Result<(StatusCode, Json<VideoResponse>), AppError> {
    let result = services.publish_video.execute(command).await?;

    tracing::info!("Video published: {}", result.id);

    Ok((StatusCode::CREATED, Json(result)))
}

#[utoipa::path(
    put,
    path = "/api/videos/{id}",
    request_body = UpdateVideoCommand,
    params(
        ("id" = String, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Video updated", body = VideoResponse),
        (status = 404, description = "Video not found", body = common_errors::ApiErrorResponse),
        (status = 422, description = "Validation error", body = common_errors::ApiErrorResponse),
        (status = 500, description = "Internal server error", body = common_errors::ApiErrorResponse)
    ),
    tag = "videos"
)]
#[instrument(skip_all)]
pub async fn update_video(
    State(services): State<VideoServices>, Path(id): Path<String>,
    Json(mut command): Json<UpdateVideoCommand>,
) -> Result<Json<VideoResponse>, AppError> {
    command.video_id = id;
    let result = services.update_video.execute(command).await?;

    tracing::info!("Video updated: {}", result.id);

    Ok(Json(result))
}

#[utoipa::path(
    delete,
    path = "/api/videos/{id}",
    params(
        ("id" = String, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Video deleted", body = MessageResponse),
        (status = 404, description = "Video not found", body = common_errors::ApiErrorResponse),
        (status = 500, description = "Internal server error", body = common_errors::ApiErrorResponse)
    ),
    tag = "videos"
)]
#[instrument(skip_all)]
pub async fn delete_video(
    State(services): State<VideoServices>, Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let command = DeleteVideoCommand { video_id: id };
    let result = services.delete_video.execute(command).await?;

    Ok(Json(result))
}

#[utoipa::path(
    post,
    path = "/api/videos/{id}/like",
    request_body = ToggleLikeCommand,
    params(
        ("id" = String, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Like toggled", body = LikeResponse),
        (status = 404, description = "Video not found", body = common_errors::ApiErrorResponse),
        (status = 422, description = "Missing user id", body = common_errors::ApiErrorResponse),
        (status = 500, description = "Internal server error", body = common_errors::ApiErrorResponse)
    ),
    tag = "videos"
)]
#[instrument(skip_all)]
pub async fn toggle_like(
    State(services): State<VideoServices>, Path(id): Path<String>,
    Json(mut command): Json<ToggleLikeCommand>,
) -> Result<Json<LikeResponse>, AppError> {
    command.video_id = id;
    Ok(Json(services.toggle_like.execute(command).await?))
}

#[utoipa::path(
    get,
    path = "/api/recommendations/{userId}",
    params(
        ("userId" = String, Path, description = "Viewer ID"),
        GetRecommendationsQuery
    ),
    responses(
        (status = 200, description = "Recommended videos", body = RecommendationsResponse),
        (status = 500, description = "Internal server error", body = common_errors::ApiErrorResponse)
    ),
    tag = "recommendations"
)]
#[instrument(skip_all)]
pub async fn get_recommendations(
    State(services): State<VideoServices>, Path(user_id): Path<String>,
    Query(mut query): Query<GetRecommendationsQuery>,
) -> Result<CachedJson<RecommendationsResponse>, AppError> {
    query.user_id = user_id;
    let recommendations = services.recommendations.execute(query).await?;

    Ok(CachedJson(recommendations))
}

#[utoipa::path(
    post,
    path = "/api/recommendations/{userId}/feedback",
    request_body = RecordFeedbackCommand,
    params(
        ("userId" = String, Path, description = "Viewer ID")
    ),
    responses(
        (status = 200, description = "Preferences updated", body = MessageResponse),
        (status = 404, description = "Video not found", body = common_errors::ApiErrorResponse),
        (status = 500, description = "Internal server error", body = common_errors::ApiErrorResponse)
    ),
    tag = "recommendations"
)]
#[instrument(skip_all)]
pub async fn record_feedback(
    State(services): State<VideoServices>, Path(user_id): Path<String>,
    Json(mut command): Json<RecordFeedbackCommand>,
) -> Result<Json<MessageResponse>, AppError> {
    command.user_id = user_id;
    Ok(Json(services.record_feedback.execute(command).await?))
}
