use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::reference::{ReferenceIndex, ReferenceRequest};

use super::{
    customer, deposit, invoice, item, journal_entry, payment,
    purchase::{BILL, PURCHASE_ORDER, VENDOR_CREDIT},
    vendor, MappingResult, Payload, UnifiedRecord,
};

/// A unified stream that can be written to QuickBooks.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EntityType {
    Customers,
    Vendors,
    Items,
    Invoices,
    Bills,
    PurchaseOrders,
    VendorCredits,
    JournalEntries,
    BillPayments,
    InvoicePayments,
    Deposits,
}

#[derive(Debug, Error)]
#[error("unknown stream '{0}'")]
pub struct UnknownStream(String);

impl EntityType {
    pub const ALL: [EntityType; 11] = [
        Self::Customers,
        Self::Vendors,
        Self::Items,
        Self::Invoices,
        Self::Bills,
        Self::PurchaseOrders,
        Self::VendorCredits,
        Self::JournalEntries,
        Self::BillPayments,
        Self::InvoicePayments,
        Self::Deposits,
    ];

    /// The name of the unified stream.
    pub fn stream_name(&self) -> &'static str {
        match self {
            Self::Customers => "Customers",
            Self::Vendors => "Vendors",
            Self::Items => "Items",
            Self::Invoices => "Invoices",
            Self::Bills => "Bills",
            Self::PurchaseOrders => "PurchaseOrders",
            Self::VendorCredits => "VendorCredits",
            Self::JournalEntries => "JournalEntries",
            Self::BillPayments => "BillPayments",
            Self::InvoicePayments => "InvoicePayments",
            Self::Deposits => "Deposits",
        }
    }

    /// The QuickBooks entity the stream is written as. This is the key the
    /// payload is nested under in batch requests and responses.
    pub fn record_type(&self) -> &'static str {
        match self {
            Self::Customers => "Customer",
            Self::Vendors => "Vendor",
            Self::Items => "Item",
            Self::Invoices => "Invoice",
            Self::Bills => "Bill",
            Self::PurchaseOrders => "PurchaseOrder",
            Self::VendorCredits => "VendorCredit",
            Self::JournalEntries => "JournalEntry",
            Self::BillPayments => "BillPayment",
            Self::InvoicePayments => "Payment",
            Self::Deposits => "Deposit",
        }
    }

    /// Add everything a record of this type refers to.
    pub fn collect_references(&self, record: &UnifiedRecord, request: &mut ReferenceRequest) {
        match self {
            Self::Customers => customer::collect_references(record, request),
            Self::Vendors => vendor::collect_references(record, request),
            Self::Items => item::collect_references(record, request),
            Self::Invoices => invoice::collect_references(record, request),
            Self::Bills => BILL.collect_references(record, request),
            Self::PurchaseOrders => PURCHASE_ORDER.collect_references(record, request),
            Self::VendorCredits => VENDOR_CREDIT.collect_references(record, request),
            Self::JournalEntries => journal_entry::collect_references(record, request),
            Self::BillPayments => payment::collect_bill_payment_references(record, request),
            Self::InvoicePayments => payment::collect_invoice_payment_references(record, request),
            Self::Deposits => deposit::collect_references(record, request),
        }
    }

    /// Map a record of this type into its QuickBooks payload.
    pub fn map(&self, record: &UnifiedRecord, index: &ReferenceIndex) -> MappingResult<Payload> {
        match self {
            Self::Customers => customer::map(record, index),
            Self::Vendors => vendor::map(record, index),
            Self::Items => item::map(record, index),
            Self::Invoices => invoice::map(record, index),
            Self::Bills => BILL.map(record, index),
            Self::PurchaseOrders => PURCHASE_ORDER.map(record, index),
            Self::VendorCredits => VENDOR_CREDIT.map(record, index),
            Self::JournalEntries => journal_entry::map(record, index),
            Self::BillPayments => payment::map_bill_payment(record, index),
            Self::InvoicePayments => payment::map_invoice_payment(record, index),
            Self::Deposits => deposit::map(record, index),
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stream_name())
    }
}

impl FromStr for EntityType {
    type Err = UnknownStream;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|entity| entity.stream_name() == s)
            .copied()
            .ok_or_else(|| UnknownStream(s.to_owned()))
    }
}
