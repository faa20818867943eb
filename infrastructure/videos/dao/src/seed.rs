//! Demo catalog for local runs.

use chrono::{Duration, Utc};
use video_models::{ModerationStatus, Video};

const SAMPLES: &[(&str, &str, &str, u64, &[&str])] = &[
    ("v1", "Lo-fi beats to code to", "Music", 5_400, &["music", "focus"]),
    ("v2", "Speedrunning classic platformers", "Gaming", 3_100, &["gaming", "speedrun"]),
    ("v3", "Async Rust from scratch", "Education", 2_750, &["rust", "async"]),
    ("v4", "Street food tour", "Travel", 1_900, &["food", "travel"]),
    ("v5", "Live jazz session", "Music", 1_200, &["music", "jazz"]),
    ("v6", "Building a cache layer", "Education", 980, &["redis", "caching"]),
    ("v7", "Indie game devlog #12", "Gaming", 640, &["gamedev"]),
    ("v8", "Mountain timelapse", "Travel", 410, &["nature", "timelapse"]),
];

/// Approved sample videos with ids `v1`..`v8`, one day apart, most popular
/// oldest.
pub fn sample_videos() -> Vec<Video> {
    let now = Utc::now();
    SAMPLES
        .iter()
        .enumerate()
        .map(|(age, (id, title, category, views, tags))| {
            let created_at = now - Duration::days(age as i64 + 1);
            Video {
                id: (*id).to_owned(),
                title: (*title).to_owned(),
                description: format!("{title} ({category})"),
                url: format!("https://cdn.example.com/videos/{id}.mp4"),
                thumbnail: format!("https://cdn.example.com/thumbs/{id}.jpg"),
                duration: 60 * (age as u32 + 3),
                views: *views,
                likes: Vec::new(),
                tags: tags.iter().map(|tag| (*tag).to_owned()).collect(),
                category: (*category).to_owned(),
                uploader: format!("creator-{}", age % 3 + 1),
                moderation_status: ModerationStatus::Approved,
                created_at,
                updated_at: created_at,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_are_unique_and_approved() {
        let videos = sample_videos();
        let mut ids: Vec<_> = videos.iter().map(|v| v.id.as_str()).collect();
        ids.dedup();

        assert_eq!(ids.len(), SAMPLES.len());
        assert!(videos.iter().all(|v| v.moderation_status.is_approved()));
    }
}
