use common_errors::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("Video not found: {video_id}")]
    NotFound { video_id: String },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<VideoError> for AppError {
    fn from(err: VideoError) -> Self {
        match err {
            VideoError::NotFound { video_id } => {
                AppError::not_found(
                    "VIDEO_NOT_FOUND",
                    format!("Video with ID {video_id} not found"),
                )
            }
            VideoError::InvalidInput(msg) => {
                AppError::unprocessable_entity("INVALID_VIDEO", msg)
            }
            VideoError::InternalError(msg) => {
                AppError::internal_server_error(format!("Internal error: {msg}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use common_errors::ErrorKind;

    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let err: AppError = VideoError::NotFound {
            video_id: "v1".into(),
        }
        .into();

        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.code, "VIDEO_NOT_FOUND");
        assert_eq!(err.message, "Video with ID v1 not found");
    }
}
