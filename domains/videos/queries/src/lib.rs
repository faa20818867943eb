use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_RECOMMENDATIONS: usize = 10;
pub const MAX_RECOMMENDATIONS: usize = 50;

/// 1-based page window with clamped size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub limit: u32,
}

impl PageWindow {
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }

    pub fn pages(&self, total: usize) -> u32 {
        total.div_ceil(self.limit as usize) as u32
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListVideosQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<String>,
    pub search: Option<String>,
}

impl ListVideosQuery {
    pub fn window(&self) -> PageWindow { PageWindow::new(self.page, self.limit) }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TrendingQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl TrendingQuery {
    pub fn window(&self) -> PageWindow { PageWindow::new(self.page, self.limit) }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchSort {
    #[default]
    Relevance,
    Date,
    Views,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct SearchVideosQuery {
    #[serde(skip)]
    #[param(ignore)]
    pub text: String,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<String>,
    pub sort_by: Option<SearchSort>,
}

impl SearchVideosQuery {
    pub fn window(&self) -> PageWindow { PageWindow::new(self.page, self.limit) }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetVideoQuery {
    pub video_id: String,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GetRecommendationsQuery {
    #[serde(skip)]
    #[param(ignore)]
    pub user_id: String,
    pub limit: Option<usize>,
}

impl GetRecommendationsQuery {
    pub fn limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_RECOMMENDATIONS)
            .clamp(1, MAX_RECOMMENDATIONS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_defaults_and_clamps() {
        assert_eq!(PageWindow::new(None, None), PageWindow { page: 1, limit: 20 });
        assert_eq!(PageWindow::new(Some(0), Some(1000)), PageWindow {
            page: 1,
            limit: 100
        });
    }

    #[test]
    fn window_offsets() {
        let window = PageWindow::new(Some(3), Some(10));

        assert_eq!(window.offset(), 20);
        assert_eq!(window.pages(21), 3);
        assert_eq!(window.pages(0), 0);
    }

    #[test]
    fn search_sort_parses_lowercase() {
        let query: SearchVideosQuery =
            serde_json::from_str(r#"{"sortBy":"views","page":2}"#).unwrap();

        assert_eq!(query.sort_by, Some(SearchSort::Views));
        assert_eq!(query.window().page, 2);
    }
}
