use serde::Serialize;
use serde_json::Value;

use crate::{
    client::ClientError,
    mapping::{MappingError, UnifiedRecord},
};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    RecordNotFound,
    InvalidInputError,
    EncodeError,
    RemoteFault,
    TransportError,
    /// The record was applied but deleted again because a sibling failed.
    RolledBack,
    /// The record was applied, a sibling failed, and deleting it failed too.
    /// The record most likely still exists in QuickBooks.
    RollbackFailed,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StateError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl StateError {
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl From<&MappingError> for StateError {
    fn from(error: &MappingError) -> Self {
        let kind = match error {
            MappingError::RecordNotFound(_) => ErrorKind::RecordNotFound,
            MappingError::InvalidInput(_) => ErrorKind::InvalidInputError,
            MappingError::Encode(_) => ErrorKind::EncodeError,
        };

        Self::new(kind, error.to_string())
    }
}

impl From<&ClientError> for StateError {
    fn from(error: &ClientError) -> Self {
        match error {
            ClientError::Fault(message) => Self::new(ErrorKind::RemoteFault, message.clone()),
            error => Self::new(ErrorKind::TransportError, error.to_string()),
        }
    }
}

/// The state reported for one input record.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecordState {
    pub success: bool,
    /// The QuickBooks id on success, the record's own id otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "externalId", skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<StateError>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_updated: bool,
}

impl RecordState {
    pub fn success(record: &UnifiedRecord, id: String, is_updated: bool) -> Self {
        Self {
            success: true,
            id: Some(id),
            external_id: record.external_id(),
            error: None,
            is_updated,
        }
    }

    pub fn failure(record: &UnifiedRecord, error: StateError) -> Self {
        Self {
            success: false,
            id: record.id(),
            external_id: record.external_id(),
            error: Some(error),
            is_updated: false,
        }
    }
}
