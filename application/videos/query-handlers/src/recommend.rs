//! Content-based picks from a viewer's favourite categories, topped up with
//! what is trending.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use video_dao::sort_by_popularity;
use video_models::{Video, ViewerProfile};

pub const TOP_CATEGORIES: usize = 3;
pub const CONTENT_PICKS: usize = 5;
pub const TRENDING_WINDOW_DAYS: i64 = 7;

/// Most watched (and liked) categories, best first. Ties break by name so
/// the same history always yields the same order.
pub fn top_categories(profile: &ViewerProfile, catalog: &[Video]) -> Vec<String> {
    let by_id: HashMap<&str, &Video> =
        catalog.iter().map(|video| (video.id.as_str(), video)).collect();

    let mut counts: HashMap<&str, u32> = HashMap::new();
    for id in &profile.watch_history {
        if let Some(video) = by_id.get(id.as_str()) {
            *counts.entry(video.category.as_str()).or_default() += 1;
        }
    }
    for (category, likes) in &profile.liked_categories {
        *counts.entry(category.as_str()).or_default() += likes;
    }

    let mut ranked: Vec<(&str, u32)> = counts.into_iter().collect();
    ranked.sort_by(|(a_name, a), (b_name, b)| b.cmp(a).then(a_name.cmp(b_name)));
    ranked
        .into_iter()
        .take(TOP_CATEGORIES)
        .map(|(name, _)| name.to_owned())
        .collect()
}

/// Up to `limit` videos the viewer has not seen: content picks first, then
/// recent trending videos, then anything popular.
pub fn recommend(
    profile: &ViewerProfile, mut catalog: Vec<Video>, now: DateTime<Utc>,
    limit: usize,
) -> Vec<Video> {
    let categories = top_categories(profile, &catalog);
    sort_by_popularity(&mut catalog);

    let unseen = |video: &&Video| !profile.has_seen(&video.id);
    let content = catalog
        .iter()
        .filter(unseen)
        .filter(|video| categories.contains(&video.category))
        .take(CONTENT_PICKS);
    let window_start = now - Duration::days(TRENDING_WINDOW_DAYS);
    let trending = catalog
        .iter()
        .filter(unseen)
        .filter(|video| video.moderation_status.is_approved())
        .filter(|video| video.created_at >= window_start);
    let popular = catalog.iter().filter(unseen);

    let mut picked = HashSet::new();
    content
        .chain(trending)
        .chain(popular)
        .filter(|video| picked.insert(video.id.clone()))
        .take(limit)
        .cloned()
        .collect()
}
