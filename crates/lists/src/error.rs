//! Error types for list storage and import.

use crate::list_type::ListType;

/// Errors that can occur while importing or resolving value lists.
#[derive(Debug, thiserror::Error)]
pub enum ListError {
    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A value in an import does not parse as the list's declared type.
    #[error("list '{list_id}' line {line}: '{value}' is not a valid {list_type} value")]
    InvalidValue {
        list_id: String,
        line: usize,
        value: String,
        list_type: ListType,
    },

    /// Unknown list type name.
    #[error("unknown list type: '{0}'")]
    UnknownType(String),

    /// No list with this id and type exists.
    #[error("list '{list_id}' of type {list_type} not found")]
    NotFound { list_id: String, list_type: ListType },

    /// A list id could not be derived or is empty.
    #[error("invalid list id: '{0}'")]
    InvalidId(String),
}

/// Result alias for list operations.
pub type Result<T> = std::result::Result<T, ListError>;
