use thiserror::Error;

/// A failure to map a single unified record into a QuickBooks payload.
///
/// Mapping errors only ever affect the record being mapped. The batch
/// coordinator converts them into a failed state for that record and keeps
/// going with its siblings.
#[derive(Debug, Error)]
pub enum MappingError {
    /// A cross-reference present on the record could not be resolved against
    /// the reference data fetched for the batch.
    #[error("{0}")]
    RecordNotFound(String),

    /// The record's own data violates a structural rule.
    #[error("{0}")]
    InvalidInput(String),

    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

impl MappingError {
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::RecordNotFound(message.into())
    }

    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput(message.into())
    }
}

pub type MappingResult<T> = Result<T, MappingError>;
