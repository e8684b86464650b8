use std::fmt;

/// A collection of entities that can be fetched from QuickBooks and searched
/// while mapping a batch.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ReferenceKind {
    Accounts,
    Bills,
    BillPayments,
    Classes,
    Currencies,
    Customers,
    CustomerTypes,
    Departments,
    Deposits,
    Invoices,
    Items,
    JournalEntries,
    PaymentMethods,
    Payments,
    PurchaseOrders,
    TaxCodes,
    Terms,
    VendorCredits,
    Vendors,
}

impl ReferenceKind {
    /// The QuickBooks entity name used in queries.
    pub fn entity_type(&self) -> &'static str {
        match self {
            Self::Accounts => "Account",
            Self::Bills => "Bill",
            Self::BillPayments => "BillPayment",
            Self::Classes => "Class",
            Self::Currencies => "Currency",
            Self::Customers => "Customer",
            Self::CustomerTypes => "CustomerType",
            Self::Departments => "Department",
            Self::Deposits => "Deposit",
            Self::Invoices => "Invoice",
            Self::Items => "Item",
            Self::JournalEntries => "JournalEntry",
            Self::PaymentMethods => "PaymentMethod",
            Self::Payments => "Payment",
            Self::PurchaseOrders => "PurchaseOrder",
            Self::TaxCodes => "TaxCode",
            Self::Terms => "Term",
            Self::VendorCredits => "VendorCredit",
            Self::Vendors => "Vendor",
        }
    }

    /// The human readable field an entity of this kind is matched on when no
    /// id is known. It is also used as the `name` of references to it.
    pub fn natural_key(&self) -> &'static str {
        match self {
            Self::Customers | Self::Vendors => "DisplayName",
            Self::Currencies => "Code",
            Self::Bills
            | Self::BillPayments
            | Self::Deposits
            | Self::Invoices
            | Self::JournalEntries
            | Self::PurchaseOrders
            | Self::VendorCredits => "DocNumber",
            Self::Payments => "PaymentRefNum",
            Self::Accounts
            | Self::Classes
            | Self::CustomerTypes
            | Self::Departments
            | Self::Items
            | Self::PaymentMethods
            | Self::TaxCodes
            | Self::Terms => "Name",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
