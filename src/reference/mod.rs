//! Reference data: the existing QuickBooks entities a batch of records points
//! at, fetched fresh for every batch.

mod index;
mod kind;
mod request;

pub use index::{ReferenceEntity, ReferenceIndex};
pub use kind::ReferenceKind;
pub use request::{fetch, ReferenceRequest};
