//! Pagination, sort and filter history state for data grids.
//!
//! A [`Grid`] owns one [`GridState`] snapshot and replaces it on every
//! transition. Filter changes go through the `grid-filter-rs` composer, so a
//! configuration that does not parse or validate never reaches the state or
//! the undo/redo history.

mod buffer;
mod error;
mod grid;
mod history;
mod sort;
mod state;

pub use buffer::BoundedBuffer;
pub use error::{GridError, GridResult};
pub use grid::{
    DataSourceInfo, Diagnostic, DiagnosticsLog, Grid, GridOptions, GridPage, GridView,
    DIAGNOSTICS_CAPACITY,
};
pub use history::{FilterHistory, HistoryEntry, DEFAULT_MAX_FILTER_HISTORY};
pub use sort::{page_count, paginate, sort_records, SortConfig, SortDirection};
pub use state::{GridState, DEFAULT_PAGE_SIZE, FIRST_PAGE};
