//! Leveler error types

use thiserror::Error;

/// Result type for [`LevelError`]
pub type Result<T, E = LevelError> = std::result::Result<T, E>;

/// Error Type
///
/// Running out of levels while reading a bounded prefix is not an error. A
/// short read is reported through [`crate::reader::BatchRead::is_short`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LevelError {
    /// A logical record does not match the nesting or cardinality declared
    /// by the column path.
    #[error("Record does not match schema at path: {path}: {reason}")]
    SchemaViolation { path: String, reason: String },

    /// A caller supplied buffer is too small for the slots it must hold.
    #[error("Buffer capacity: {stride} is smaller than required slot count: {slots}")]
    CapacityMismatch { stride: usize, slots: usize },

    /// Definition or repetition levels are malformed.
    #[error("Corrupt levels: {reason}")]
    CorruptLevels { reason: String },

    /// A column path lookup named a field which is not in the schema.
    #[error("Column path: {path} not found in schema")]
    UnknownColumn { path: String },

    /// A column path lookup stopped at a group instead of a primitive leaf.
    #[error("Column path: {path} ends at a group, expected a primitive leaf")]
    LeafIsGroup { path: String },
}

impl LevelError {
    pub(crate) fn schema_violation(path: impl ToString, reason: impl Into<String>) -> Self {
        LevelError::SchemaViolation {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        LevelError::CorruptLevels {
            reason: reason.into(),
        }
    }
}
