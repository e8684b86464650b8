//! Batch coordination: submitting mapped records and reporting their state.

mod rollback;
mod services;
mod state;

pub use services::{BatchPhase, SyncService};
pub use state::{ErrorKind, RecordState, StateError};
