//! The grid controller: state transitions, filter history and query execution.
//!
//! # Example
//!
//! ```
//! use grid_filter_rs::field::{FieldRegistry, FieldType, FilterField};
//! use grid_filter_rs::filter::FilterConfig;
//! use grid_state_rs::{Grid, FIRST_PAGE};
//!
//! let fields = FieldRegistry::new([FilterField::new("age", FieldType::Number)]);
//! let mut grid = Grid::new(fields);
//!
//! grid.set_page(3);
//! grid.set_filter(FilterConfig::new().with_expression("age > 10")).unwrap();
//! assert_eq!(grid.state().page, FIRST_PAGE);
//!
//! assert!(grid.undo());
//! assert!(grid.state().filter_config.is_empty());
//! assert!(grid.can_redo());
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use grid_filter_rs::field::FieldRegistry;
use grid_filter_rs::filter::{
    CompiledFilter, ComposeOptions, ErrorCallback, FilterComposer, FilterConfig, FilterError,
};
use grid_filter_rs::value::Record;
use serde::Serialize;

use crate::buffer::BoundedBuffer;
use crate::error::{GridError, GridResult};
use crate::history::{FilterHistory, DEFAULT_MAX_FILTER_HISTORY};
use crate::sort::{page_count, paginate, sort_records, SortConfig};
use crate::state::{GridState, DEFAULT_PAGE_SIZE, FIRST_PAGE};

/// Number of filter errors kept for inspection.
pub const DIAGNOSTICS_CAPACITY: usize = 50;

/// Options for constructing a [`Grid`].
#[derive(Debug, Clone)]
pub struct GridOptions {
    /// Rows per page for a fresh grid.
    pub page_size: usize,
    /// Filter configurations kept for undo and redo.
    pub max_filter_history: usize,
    /// Quick filter fields, error policy and functions for compiled filters.
    pub compose: ComposeOptions,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_filter_history: DEFAULT_MAX_FILTER_HISTORY,
            compose: ComposeOptions::default(),
        }
    }
}

/// A filter error as recorded in the diagnostics log.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// When the error was reported.
    pub timestamp: DateTime<Utc>,
    /// Error category, as returned by [`FilterError::kind`].
    pub kind: String,
    /// Rendered error message.
    pub message: String,
    /// Byte offset into the expression, when the error has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}

/// The most recent filter errors, oldest evicted first.
#[derive(Debug, Clone)]
pub struct DiagnosticsLog {
    entries: BoundedBuffer<Diagnostic>,
}

impl Default for DiagnosticsLog {
    fn default() -> Self {
        Self {
            entries: BoundedBuffer::new(DIAGNOSTICS_CAPACITY),
        }
    }
}

impl DiagnosticsLog {
    /// Appends `error`, evicting the oldest entry once the log is full.
    ///
    /// ```
    /// use grid_filter_rs::filter::FilterError;
    /// use grid_state_rs::DiagnosticsLog;
    ///
    /// let mut log = DiagnosticsLog::default();
    /// log.record(&FilterError::parse("unexpected token ')'", 8));
    ///
    /// let entry = log.entries().next().unwrap();
    /// assert_eq!(entry.kind, "parse");
    /// assert_eq!(entry.position, Some(8));
    /// ```
    pub fn record(&mut self, error: &FilterError) {
        self.entries.push(Diagnostic {
            timestamp: Utc::now(),
            kind: error.kind().to_string(),
            message: error.to_string(),
            position: error.position(),
        });
    }

    /// The recorded entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Receives every reported filter error: rejected updates and the first
/// evaluation error of each compiled filter.
#[derive(Clone, Default)]
struct ErrorSink {
    diagnostics: Arc<Mutex<DiagnosticsLog>>,
    callback: Arc<Mutex<Option<ErrorCallback>>>,
}

impl ErrorSink {
    fn report(&self, error: &FilterError) {
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(error);
        // Release the lock before calling out
        let callback = self
            .callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(callback) = callback {
            callback(error);
        }
    }
}

/// Totals reported by the external data source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceInfo {
    /// Total matching rows, if the source knows it.
    pub total_count: Option<usize>,
    /// Whether the source has rows past the current page.
    pub has_more: bool,
}

/// Everything a UI needs to render a grid's controls.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridView {
    pub page: usize,
    pub page_size: usize,
    pub sort_config: SortConfig,
    pub filter_config: FilterConfig,
    pub can_undo: bool,
    pub can_redo: bool,
    pub history_length: usize,
    pub history_index: usize,
    pub total_count: Option<usize>,
    pub has_more: bool,
}

/// One page of in-memory query results.
#[derive(Debug)]
pub struct GridPage<'r, R> {
    /// The rows on this page, in sort order.
    pub rows: Vec<&'r R>,
    /// The requested page; past the last page it has no rows.
    pub page: usize,
    pub page_count: usize,
    /// Rows that passed the filter, across all pages.
    pub total_count: usize,
    pub has_more: bool,
}

/// A grid's state plus its filter history.
///
/// Every accepted filter change is recorded in a bounded history that undo
/// and redo move through. Rejected changes leave the grid untouched.
pub struct Grid {
    state: GridState,
    history: FilterHistory,
    registry: FieldRegistry,
    compose: ComposeOptions,
    compiled: Option<CompiledFilter>,
    sink: ErrorSink,
}

impl Grid {
    /// Creates a grid with default options.
    pub fn new(registry: FieldRegistry) -> Self {
        Self::with_options(registry, GridOptions::default())
    }

    /// Creates an unfiltered, unsorted grid on the first page.
    pub fn with_options(registry: FieldRegistry, options: GridOptions) -> Self {
        let state = GridState::new(options.page_size);
        let mut history = FilterHistory::new(options.max_filter_history);
        history.push(state.filter_config.clone());
        Self {
            state,
            history,
            registry,
            compose: options.compose,
            compiled: None,
            sink: ErrorSink::default(),
        }
    }

    /// Recreates a grid from a saved state. The history starts at that state.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidState`] for a zero page or page size, and
    /// [`GridError::FilterRejected`] if the saved filter does not compile
    /// against `registry`.
    pub fn from_state(
        registry: FieldRegistry,
        options: GridOptions,
        state: GridState,
    ) -> GridResult<Self> {
        if state.page < FIRST_PAGE {
            return Err(GridError::InvalidState(format!(
                "page must be at least {FIRST_PAGE}"
            )));
        }
        if state.page_size == 0 {
            return Err(GridError::InvalidState(
                "page size must be at least 1".to_string(),
            ));
        }

        let mut grid = Self::with_options(registry, options);
        grid.compiled = grid.compile(&state.filter_config)?;
        grid.history = FilterHistory::new(grid.history.max_entries());
        grid.history.push(state.filter_config.clone());
        grid.state = state;
        Ok(grid)
    }

    /// Sets the callback told about filter errors.
    ///
    /// It receives rejected filter updates and the first evaluation error of
    /// each applied filter.
    pub fn on_filter_error(self, callback: ErrorCallback) -> Self {
        self.set_filter_error_callback(Some(callback));
        self
    }

    /// Replaces or removes the filter error callback.
    pub fn set_filter_error_callback(&self, callback: Option<ErrorCallback>) {
        *self
            .sink
            .callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = callback;
    }

    // ==================== Transitions ====================

    /// Moves to `page`. Page `0` is treated as the first page.
    pub fn set_page(&mut self, page: usize) {
        self.state = self.state.with_page(page);
        tracing::debug!(page = self.state.page, "page changed");
    }

    /// Changes the page size and returns to the first page.
    pub fn set_page_size(&mut self, page_size: usize) {
        self.state = self.state.with_page_size(page_size);
        tracing::debug!(page_size = self.state.page_size, "page size changed");
    }

    /// Changes the sort; returns to the first page if the sort key changed.
    pub fn set_sort(&mut self, sort_config: SortConfig) {
        self.state = self.state.with_sort(sort_config);
        tracing::debug!(
            key = ?self.state.sort_config.key,
            direction = %self.state.sort_config.direction,
            page = self.state.page,
            "sort changed"
        );
    }

    /// Sorts by `key`, flipping the direction if it is already the sort key.
    pub fn toggle_sort(&mut self, key: &str) {
        let sort_config = self.state.sort_config.toggled(key);
        self.set_sort(sort_config);
    }

    /// Applies a new filter configuration.
    ///
    /// On success the page returns to the first page and the configuration is
    /// recorded in history. Applying the current configuration again changes
    /// nothing and returns `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::FilterRejected`] if the expression does not parse
    /// or a column filter is invalid. The error is also reported to the
    /// diagnostics log and the error callback, and the grid is left unchanged.
    pub fn set_filter(&mut self, filter_config: FilterConfig) -> GridResult<bool> {
        if filter_config == self.state.filter_config {
            tracing::debug!("filter unchanged");
            return Ok(false);
        }

        let compiled = match self.compile(&filter_config) {
            Ok(compiled) => compiled,
            Err(e) => {
                tracing::debug!("filter rejected: {e}");
                if let Some(filter_error) = e.filter_error() {
                    self.sink.report(filter_error);
                }
                return Err(e);
            }
        };

        self.state = self.state.with_filter(filter_config.clone());
        self.history.push(filter_config);
        self.compiled = compiled;
        tracing::debug!(
            history_index = self.history.index(),
            history_length = self.history.len(),
            "filter applied"
        );
        Ok(true)
    }

    /// Steps back to the previous filter configuration.
    ///
    /// Page and sort are left as they are. Returns `false` if there is
    /// nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(filter_config) = self.history.undo().cloned() else {
            return false;
        };
        self.restore_filter(filter_config);
        tracing::debug!(history_index = self.history.index(), "undo");
        true
    }

    /// Steps forward to the next filter configuration.
    ///
    /// Returns `false` if there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(filter_config) = self.history.redo().cloned() else {
            return false;
        };
        self.restore_filter(filter_config);
        tracing::debug!(history_index = self.history.index(), "redo");
        true
    }

    fn restore_filter(&mut self, filter_config: FilterConfig) {
        // History only holds configurations that compiled when applied.
        self.compiled = match self.compile(&filter_config) {
            Ok(compiled) => compiled,
            Err(e) => {
                tracing::warn!("history entry no longer compiles: {e}");
                if let Some(filter_error) = e.filter_error() {
                    self.sink.report(filter_error);
                }
                None
            }
        };
        self.state = self.state.with_restored_filter(filter_config);
    }

    fn compile(&self, filter_config: &FilterConfig) -> GridResult<Option<CompiledFilter>> {
        if filter_config.is_empty() {
            return Ok(None);
        }
        let sink = self.sink.clone();
        let compiled = FilterComposer::new(&self.registry)
            .with_options(self.compose.clone())
            .on_error(Arc::new(move |e: &FilterError| sink.report(e)))
            .build(filter_config)?;
        Ok(Some(compiled))
    }

    // ==================== Queries ====================

    /// The current state snapshot.
    pub fn state(&self) -> &GridState {
        &self.state
    }

    /// The filter history undo and redo move through.
    pub fn history(&self) -> &FilterHistory {
        &self.history
    }

    /// The field catalog filters are checked against.
    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    /// Returns true if there is an older filter configuration to go back to.
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Returns true if an undone filter configuration can be reapplied.
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// The compiled form of the current filter; `None` when no filter is set.
    pub fn compiled_filter(&self) -> Option<&CompiledFilter> {
        self.compiled.as_ref()
    }

    /// Returns true if `record` passes the current filter.
    pub fn matches<R: Record>(&self, record: &R) -> bool {
        self.compiled.as_ref().map_or(true, |f| f.matches(record))
    }

    /// Filters, sorts and pages `records` according to the current state.
    pub fn query<'r, R: Record>(&self, records: &'r [R]) -> GridPage<'r, R> {
        let mut rows: Vec<&R> = records.iter().filter(|r| self.matches(*r)).collect();
        sort_records(&mut rows, &self.state.sort_config, Some(&self.registry));

        let total_count = rows.len();
        let page_size = self.state.page_size;
        let shown = paginate(&rows, self.state.page, page_size).to_vec();
        GridPage {
            rows: shown,
            page: self.state.page,
            page_count: page_count(total_count, page_size),
            total_count,
            has_more: self.state.page.saturating_mul(page_size) < total_count,
        }
    }

    /// Snapshot of the grid's controls, with totals from the data source.
    pub fn view(&self, source: DataSourceInfo) -> GridView {
        GridView {
            page: self.state.page,
            page_size: self.state.page_size,
            sort_config: self.state.sort_config.clone(),
            filter_config: self.state.filter_config.clone(),
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            history_length: self.history.len(),
            history_index: self.history.index(),
            total_count: source.total_count,
            has_more: source.has_more,
        }
    }

    /// The recorded filter errors, oldest first.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.sink
            .diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries()
            .cloned()
            .collect()
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("state", &self.state)
            .field("history_index", &self.history.index())
            .field("history_length", &self.history.len())
            .field("compiled", &self.compiled)
            .finish()
    }
}
