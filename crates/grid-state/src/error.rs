//! Error types for grid state operations.

use grid_filter_rs::filter::FilterError;
use thiserror::Error;

/// A specialized Result type for grid operations.
pub type GridResult<T> = Result<T, GridError>;

/// Errors returned by grid transitions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GridError {
    /// A filter update was rejected; the grid is unchanged.
    #[error("filter rejected: {0}")]
    FilterRejected(#[from] FilterError),

    /// A restored state is not usable.
    #[error("invalid grid state: {0}")]
    InvalidState(String),
}

impl GridError {
    /// The underlying filter error, if this is a rejected filter.
    pub fn filter_error(&self) -> Option<&FilterError> {
        match self {
            GridError::FilterRejected(e) => Some(e),
            GridError::InvalidState(_) => None,
        }
    }
}
