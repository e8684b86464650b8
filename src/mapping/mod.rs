//! Conversion of unified records into QuickBooks payloads.
//!
//! Every entity type has a mapper that takes one record and the batch's
//! [`crate::reference::ReferenceIndex`] and produces a [`Payload`]. Mappers
//! never touch the network; everything they need has to be in the index.

mod amount;
mod common;
mod contact;
mod customer;
mod deposit;
mod entity;
mod error;
mod invoice;
mod item;
mod journal_entry;
mod line_items;
mod lines;
mod payload;
mod payment;
mod purchase;
mod record;
mod resolve;
mod vendor;

pub use amount::Amount;
pub use entity::{EntityType, UnknownStream};
pub use error::{MappingError, MappingResult};
pub use lines::{Line, LineDetail, PostingType};
pub use payload::Payload;
pub use record::UnifiedRecord;
pub use resolve::{
    find_existing, ExistingMatcher, Lookup, Reference, ACCOUNT, CLASS, CURRENCY, CUSTOMER, ITEM,
    VENDOR,
};
