use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use video_models::{FeedbackAction, ModerationStatus, NewVideo, UpdateVideo};

/// Registers a video whose upload has completed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublishVideoCommand {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub url: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub uploader: String,
    pub moderation_status: Option<ModerationStatus>,
}

impl From<PublishVideoCommand> for NewVideo {
    fn from(command: PublishVideoCommand) -> Self {
        Self {
            title: command.title,
            description: command.description,
            url: command.url,
            thumbnail: command.thumbnail,
            duration: command.duration,
            tags: command.tags,
            category: command.category,
            uploader: command.uploader,
            moderation_status: command.moderation_status,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVideoCommand {
    #[serde(skip)]
    pub video_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub tags: Option<Vec<String>>,
    pub category: Option<String>,
    pub moderation_status: Option<ModerationStatus>,
}

impl From<UpdateVideoCommand> for UpdateVideo {
    fn from(command: UpdateVideoCommand) -> Self {
        Self {
            title: command.title,
            description: command.description,
            thumbnail: command.thumbnail,
            tags: command.tags,
            category: command.category,
            moderation_status: command.moderation_status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteVideoCommand {
    pub video_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToggleLikeCommand {
    #[serde(skip)]
    pub video_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordFeedbackCommand {
    #[serde(skip)]
    pub user_id: String,
    pub video_id: String,
    pub action: FeedbackAction,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_command_fills_optional_fields() {
        let command: PublishVideoCommand = serde_json::from_str(
            r#"{"title":"Intro","url":"https://cdn/v.mp4","uploader":"u1"}"#,
        )
        .unwrap();

        let video: NewVideo = command.into();

        assert_eq!(video.duration, 0);
        assert!(video.tags.is_empty());
        assert_eq!(video.category, None);
    }

    #[test]
    fn feedback_action_is_lowercase() {
        let command: RecordFeedbackCommand =
            serde_json::from_str(r#"{"videoId":"v1","action":"skip"}"#).unwrap();

        assert_eq!(command.action, FeedbackAction::Skip);
        assert!(command.user_id.is_empty());
    }
}
