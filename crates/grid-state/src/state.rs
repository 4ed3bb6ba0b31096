//! The immutable grid state snapshot and its pure transitions.

use grid_filter_rs::filter::FilterConfig;
use serde::{Deserialize, Serialize};

use crate::sort::SortConfig;

/// Pages are 1-indexed.
pub const FIRST_PAGE: usize = 1;

/// Page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Pagination, sort and filter state of one grid view.
///
/// Every transition returns a new snapshot; the state is fully described by
/// its fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridState {
    pub page: usize,
    pub page_size: usize,
    pub sort_config: SortConfig,
    pub filter_config: FilterConfig,
}

impl Default for GridState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl GridState {
    /// Creates an unsorted, unfiltered state on the first page.
    pub fn new(page_size: usize) -> Self {
        Self {
            page: FIRST_PAGE,
            page_size: page_size.max(1),
            sort_config: SortConfig::default(),
            filter_config: FilterConfig::default(),
        }
    }

    /// Moves to `page`, leaving everything else unchanged.
    pub fn with_page(&self, page: usize) -> Self {
        Self {
            page: page.max(FIRST_PAGE),
            ..self.clone()
        }
    }

    /// Changes the page size and returns to the first page.
    pub fn with_page_size(&self, page_size: usize) -> Self {
        Self {
            page: FIRST_PAGE,
            page_size: page_size.max(1),
            ..self.clone()
        }
    }

    /// Changes the sort. Returns to the first page only if the sort key changed.
    pub fn with_sort(&self, sort_config: SortConfig) -> Self {
        let page = if sort_config.key == self.sort_config.key {
            self.page
        } else {
            FIRST_PAGE
        };
        Self {
            page,
            sort_config,
            ..self.clone()
        }
    }

    /// Replaces the filter and returns to the first page.
    pub fn with_filter(&self, filter_config: FilterConfig) -> Self {
        Self {
            page: FIRST_PAGE,
            filter_config,
            ..self.clone()
        }
    }

    /// Replaces the filter, keeping page and sort. Used when replaying history.
    pub fn with_restored_filter(&self, filter_config: FilterConfig) -> Self {
        Self {
            filter_config,
            ..self.clone()
        }
    }
}
