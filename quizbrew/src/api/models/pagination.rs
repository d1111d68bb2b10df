//! Page-number pagination for the trivia listings.
//!
//! Pages are 1-indexed and hold `trivia.questions_per_page` items of the id-ordered sequence.

use serde::Deserialize;
use serde_with::{DefaultOnError, DisplayFromStr, serde_as};

pub const DEFAULT_PAGE: i64 = 1;

/// `?page=N` query parameter. A value that isn't an integer falls back to the first page.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct Page {
    #[serde(default)]
    #[serde_as(as = "DefaultOnError<Option<DisplayFromStr>>")]
    pub page: Option<i64>,
}

impl Page {
    #[inline]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(DEFAULT_PAGE)
    }

    /// `(skip, limit)` of the requested page, or `None` when the page can't hold any items
    /// (page < 1).
    pub fn window(&self, per_page: i64) -> Option<(i64, i64)> {
        let page = self.page();
        if page < 1 {
            return None;
        }
        Some((page.saturating_sub(1).saturating_mul(per_page), per_page))
    }
}
