//! Error types for parsing, validating and evaluating filters.

use thiserror::Error;

use crate::field::FieldType;

/// A specialized Result type for filter operations.
pub type FilterResult<T> = Result<T, FilterError>;

/// Errors that can occur while parsing, validating or evaluating a filter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterError {
    /// The expression is syntactically malformed.
    #[error("{message} at position {position}")]
    Parse {
        /// Human-readable description of the problem.
        message: String,
        /// Byte offset into the expression where the problem was found.
        position: usize,
    },

    /// An identifier does not resolve in the catalog or evaluation context.
    #[error("unknown field '{name}'{}", suggestion_suffix(.suggestion))]
    UnknownField {
        /// The identifier that could not be resolved.
        name: String,
        /// Byte offset of the identifier, when it came from an expression.
        position: Option<usize>,
        /// A close catalog match, if one exists.
        suggestion: Option<String>,
    },

    /// An operator was applied to operands it does not support.
    #[error("type mismatch: {message}{}", position_suffix(.position))]
    TypeMismatch {
        /// Description of the incompatibility.
        message: String,
        /// Byte offset into the expression, for static (parse-time) checks.
        position: Option<usize>,
    },

    /// A structured column filter failed validation.
    #[error("invalid filter on '{field}': {message}")]
    Validation {
        /// The field the condition targets.
        field: String,
        /// Why the condition was rejected.
        message: String,
    },

    /// A literal could not be converted to the field's declared type.
    #[error("cannot convert '{raw}' to {expected}{}", position_suffix(.position))]
    Coercion {
        /// The raw literal text.
        raw: String,
        /// The type the literal had to become.
        expected: FieldType,
        /// Byte offset of the literal, when it came from an expression.
        position: Option<usize>,
    },

    /// A call expression named a function not present in the evaluation scope.
    #[error("unsupported call to '{callee}'")]
    UnsupportedCall {
        /// The callee name.
        callee: String,
    },
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean '{s}'?)"),
        None => String::new(),
    }
}

fn position_suffix(position: &Option<usize>) -> String {
    match position {
        Some(p) => format!(" at position {p}"),
        None => String::new(),
    }
}

impl FilterError {
    /// Creates a parse error at the given position.
    pub fn parse(message: impl Into<String>, position: usize) -> Self {
        FilterError::Parse {
            message: message.into(),
            position,
        }
    }

    /// Creates an unknown field error without position information.
    pub fn unknown_field(name: impl Into<String>) -> Self {
        FilterError::UnknownField {
            name: name.into(),
            position: None,
            suggestion: None,
        }
    }

    /// Creates a type mismatch error raised during evaluation.
    pub fn type_mismatch(message: impl Into<String>) -> Self {
        FilterError::TypeMismatch {
            message: message.into(),
            position: None,
        }
    }

    /// Creates a type mismatch error raised by a static check at `position`.
    pub fn type_mismatch_at(message: impl Into<String>, position: usize) -> Self {
        FilterError::TypeMismatch {
            message: message.into(),
            position: Some(position),
        }
    }

    /// Creates a validation error for a column filter.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        FilterError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a coercion error.
    pub fn coercion(raw: impl Into<String>, expected: FieldType) -> Self {
        FilterError::Coercion {
            raw: raw.into(),
            expected,
            position: None,
        }
    }

    /// Creates an unsupported call error.
    pub fn unsupported_call(callee: impl Into<String>) -> Self {
        FilterError::UnsupportedCall {
            callee: callee.into(),
        }
    }

    /// Returns the byte offset into the expression this error points at, if any.
    ///
    /// UI layers use this to place a tooltip or caret under the offending token.
    pub fn position(&self) -> Option<usize> {
        match self {
            FilterError::Parse { position, .. } => Some(*position),
            FilterError::UnknownField { position, .. } => *position,
            FilterError::TypeMismatch { position, .. } => *position,
            FilterError::Coercion { position, .. } => *position,
            _ => None,
        }
    }

    /// Points a positionless error at `at` in the expression.
    ///
    /// Errors that already carry a position, or whose kind never has one,
    /// are returned unchanged.
    pub fn with_position(mut self, at: usize) -> Self {
        match &mut self {
            FilterError::UnknownField { position, .. }
            | FilterError::TypeMismatch { position, .. }
            | FilterError::Coercion { position, .. } => {
                position.get_or_insert(at);
            }
            _ => {}
        }
        self
    }

    /// Returns a short, stable name for the error category.
    pub fn kind(&self) -> &'static str {
        match self {
            FilterError::Parse { .. } => "parse",
            FilterError::UnknownField { .. } => "unknown_field",
            FilterError::TypeMismatch { .. } => "type_mismatch",
            FilterError::Validation { .. } => "validation",
            FilterError::Coercion { .. } => "coercion",
            FilterError::UnsupportedCall { .. } => "unsupported_call",
        }
    }
}
