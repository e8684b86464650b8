use serde::{ser::SerializeMap, Serialize, Serializer};

use super::{amount::Amount, resolve::Reference};

/// A transaction line.
///
/// Serializes to `{Description, Amount, DetailType, <DetailType>: {...}}`
/// where the detail object is chosen by the variant of [`LineDetail`].
#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    pub description: Option<String>,
    pub amount: Option<Amount>,
    pub detail: LineDetail,
}

impl Line {
    /// The amount the line contributes to a journal entry's balance. Debits
    /// are positive and credits negative. Other line kinds contribute nothing.
    pub fn signed_amount(&self) -> Amount {
        match &self.detail {
            LineDetail::JournalEntry(detail) => {
                let amount = self.amount.unwrap_or_default();

                match detail.posting_type {
                    PostingType::Debit => amount,
                    PostingType::Credit => -amount,
                }
            }
            _ => Amount::ZERO,
        }
    }
}

impl Serialize for Line {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let tag = self.detail.tag();
        let mut map = serializer.serialize_map(None)?;

        if let Some(description) = &self.description {
            map.serialize_entry("Description", description)?;
        }
        if let Some(amount) = &self.amount {
            map.serialize_entry("Amount", amount)?;
        }

        map.serialize_entry("DetailType", tag)?;

        match &self.detail {
            LineDetail::SalesItem(detail) => map.serialize_entry(tag, detail)?,
            LineDetail::ItemBasedExpense(detail) => map.serialize_entry(tag, detail)?,
            LineDetail::AccountBasedExpense(detail) => map.serialize_entry(tag, detail)?,
            LineDetail::JournalEntry(detail) => map.serialize_entry(tag, detail)?,
            LineDetail::Deposit(detail) => map.serialize_entry(tag, detail)?,
            LineDetail::Discount(detail) => map.serialize_entry(tag, detail)?,
        }

        map.end()
    }
}

/// The closed set of line detail kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum LineDetail {
    SalesItem(SalesItemLineDetail),
    ItemBasedExpense(ItemBasedExpenseLineDetail),
    AccountBasedExpense(AccountBasedExpenseLineDetail),
    JournalEntry(JournalEntryLineDetail),
    Deposit(DepositLineDetail),
    Discount(DiscountLineDetail),
}

impl LineDetail {
    /// The `DetailType` discriminator.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::SalesItem(_) => "SalesItemLineDetail",
            Self::ItemBasedExpense(_) => "ItemBasedExpenseLineDetail",
            Self::AccountBasedExpense(_) => "AccountBasedExpenseLineDetail",
            Self::JournalEntry(_) => "JournalEntryLineDetail",
            Self::Deposit(_) => "DepositLineDetail",
            Self::Discount(_) => "DiscountLineDetail",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SalesItemLineDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_ref: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_code_ref: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_ref: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_amt: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qty: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_date: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemBasedExpenseLineDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_ref: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_ref: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_code_ref: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_ref: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qty: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Amount>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccountBasedExpenseLineDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_ref: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_ref: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_code_ref: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_ref: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qty: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Amount>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum PostingType {
    Debit,
    Credit,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum PostingEntityType {
    Customer,
    Vendor,
}

/// The customer or vendor a journal entry line posts against.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PostingEntity {
    #[serde(rename = "Type")]
    pub entity_type: PostingEntityType,
    pub entity_ref: Reference,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct JournalEntryLineDetail {
    pub posting_type: PostingType,
    pub entity: PostingEntity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_ref: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_ref: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_ref: Option<Reference>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DepositLineDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_ref: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_ref: Option<Reference>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiscountLineDetail {
    pub percent_based: bool,
}

/// A payment line applying an amount to an existing transaction.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LinkedLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    pub linked_txn: Vec<LinkedTxn>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LinkedTxn {
    pub txn_id: String,
    pub txn_type: &'static str,
}
