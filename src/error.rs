//! Error taxonomy.
//!
//! Only [`AtlasError::LoadFailure`] is fatal. Malformed rows are skipped and reported,
//! out-of-range requests are clamped and reported as values, and missing data is
//! not an error at all (it is `None` / a neutral fill).

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AtlasError {
    /// A single bad input row; the row is skipped.
    #[error("malformed record at row {row}: {reason}")]
    MalformedRecord { row: usize, reason: String },

    /// A requested year or zoom outside supported bounds; `applied` is what was used instead.
    #[error("{what} {requested} is out of range, using {applied}")]
    OutOfRange {
        what: &'static str,
        requested: f64,
        applied: f64,
    },

    /// A feed could not be fetched or parsed. Nothing is rendered.
    #[error("failed to load {source_name}: {reason}")]
    LoadFailure { source_name: String, reason: String },
}

impl AtlasError {
    pub fn malformed(row: usize, reason: impl Into<String>) -> Self {
        AtlasError::MalformedRecord {
            row,
            reason: reason.into(),
        }
    }

    pub fn load_failure(source_name: impl Into<String>, reason: impl ToString) -> Self {
        AtlasError::LoadFailure {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }
}
