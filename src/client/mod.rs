//! Access to the QuickBooks Online accounting API.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::auth::AuthError;

mod batch;
mod http;

pub use batch::{fault_message, BatchItemRequest, BatchItemResponse, ItemOutcome, Operation};
pub use http::HttpClient;

/// The largest number of items QuickBooks accepts in one batch request.
pub const MAX_BATCH_SIZE: usize = 30;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("QuickBooks responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("QuickBooks rejected the request: {0}")]
    Fault(String),
}

pub type DynQuickbooksApi = Arc<dyn QuickbooksApi + Send + Sync>;

#[async_trait]
pub trait QuickbooksApi {
    /// Fetch every entity of a type matching an optional `where` clause,
    /// following pagination until the last page.
    async fn query(
        &self,
        entity_type: &str,
        where_filter: Option<&str>,
    ) -> Result<Vec<Value>, ClientError>;

    /// Submit a batch of at most [`MAX_BATCH_SIZE`] items.
    ///
    /// Item level faults are part of the successful result. An `Err` means
    /// the batch as a whole was not processed.
    async fn batch(&self, items: &[BatchItemRequest])
        -> Result<Vec<BatchItemResponse>, ClientError>;
}
