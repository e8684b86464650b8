//! Bill payments and invoice payments.

use serde_json::json;

use crate::reference::{ReferenceEntity, ReferenceIndex, ReferenceKind, ReferenceRequest};

use super::{
    common::map_currency,
    error::{MappingError, MappingResult},
    lines::{LinkedLine, LinkedTxn},
    payload::{FieldTable, Payload},
    record::UnifiedRecord,
    resolve::{
        find_existing, ExistingMatcher, Lookup, ACCOUNT, BILL, CURRENCY, CUSTOMER, INVOICE, VENDOR,
    },
};

const BILL_PAYMENT_EXISTING: &[ExistingMatcher] = &[
    ExistingMatcher::required("id", "Id"),
    ExistingMatcher::optional("paymentNumber", "DocNumber"),
];

const BILL_PAYMENT_FIELDS: FieldTable = &[
    ("paymentNumber", &["DocNumber"]),
    ("paymentDate", &["TxnDate"]),
    ("amount", &["TotalAmt"]),
];

const INVOICE_PAYMENT_EXISTING: &[ExistingMatcher] = &[
    ExistingMatcher::required("id", "Id"),
    ExistingMatcher::optional("externalId", "PaymentRefNum"),
];

const INVOICE_PAYMENT_FIELDS: FieldTable = &[
    ("externalId", &["PaymentRefNum"]),
    ("paymentDate", &["TxnDate"]),
    ("amount", &["TotalAmt"]),
];

pub fn collect_bill_payment_references(record: &UnifiedRecord, request: &mut ReferenceRequest) {
    request.collect_existing(record, ReferenceKind::BillPayments, BILL_PAYMENT_EXISTING);
    request.collect(record, &BILL);
    request.collect(record, &VENDOR);
    request.collect(record, &CURRENCY);
    request.collect(record, &ACCOUNT);
}

pub fn collect_invoice_payment_references(record: &UnifiedRecord, request: &mut ReferenceRequest) {
    request.collect_existing(record, ReferenceKind::Payments, INVOICE_PAYMENT_EXISTING);
    request.collect(record, &INVOICE);
    request.collect(record, &CUSTOMER);
    request.collect(record, &CURRENCY);
    request.collect(record, &ACCOUNT);
}

/// A single line applying the payment to the linked transaction, which must
/// exist.
fn linked_line(
    record: &UnifiedRecord,
    index: &ReferenceIndex,
    lookup: &Lookup,
    txn_type: &'static str,
) -> MappingResult<Vec<LinkedLine>> {
    let linked = lookup.require(index, record)?;

    Ok(vec![LinkedLine {
        amount: record.amount("amount")?,
        linked_txn: vec![LinkedTxn {
            txn_id: linked.id().unwrap_or_default(),
            txn_type,
        }],
    }])
}

fn account_type(account: &ReferenceEntity) -> (Option<String>, Option<String>) {
    (account.text("AccountType"), account.text("AccountSubType"))
}

pub fn map_bill_payment(record: &UnifiedRecord, index: &ReferenceIndex) -> MappingResult<Payload> {
    let mut payload = Payload::default();

    if let Some(existing) =
        find_existing(index, ReferenceKind::BillPayments, record, BILL_PAYMENT_EXISTING)?
    {
        payload.set_internal_id(existing)?;
    }

    payload.set("Line", linked_line(record, index, &BILL, "Bill")?)?;

    if let Some(vendor) = VENDOR.resolve_reference(index, record)? {
        payload.set("VendorRef", vendor)?;
    }

    map_currency(record, index, &mut payload)?;

    if let Some(account) = ACCOUNT.resolve(index, record)? {
        let reference = ACCOUNT.reference(account);

        match account_type(account) {
            (Some(kind), _) if kind == "Credit Card" => {
                payload.set("PayType", "CreditCard")?;
                payload.set("CreditCardPayment", json!({ "CCAccountRef": reference }))?;
            }
            (Some(kind), Some(sub_kind)) if kind == "Bank" && sub_kind == "Checking" => {
                payload.set("PayType", "Check")?;
                payload.set("CheckPayment", json!({ "BankAccountRef": reference }))?;
            }
            _ => {
                return Err(MappingError::invalid(
                    "The account supplied should be of AccountType='Credit Card' or AccountType='Bank' and AccountSubType='Checking'",
                ))
            }
        }
    }

    payload.copy_fields(record, BILL_PAYMENT_FIELDS);

    Ok(payload)
}

pub fn map_invoice_payment(
    record: &UnifiedRecord,
    index: &ReferenceIndex,
) -> MappingResult<Payload> {
    let mut payload = Payload::default();

    if let Some(existing) =
        find_existing(index, ReferenceKind::Payments, record, INVOICE_PAYMENT_EXISTING)?
    {
        payload.set_internal_id(existing)?;
    }

    payload.set("Line", linked_line(record, index, &INVOICE, "Invoice")?)?;

    if let Some(customer) = CUSTOMER.resolve_reference(index, record)? {
        payload.set("CustomerRef", customer)?;
    }

    map_currency(record, index, &mut payload)?;

    if let Some(account) = ACCOUNT.resolve(index, record)? {
        match account_type(account) {
            (Some(kind), _) if kind == "Other Current Asset" || kind == "Bank" => {
                payload.set("DepositToAccountRef", ACCOUNT.reference(account))?;
            }
            (kind, _) => {
                return Err(MappingError::invalid(format!(
                    "The account supplied is of type={}. It should be of type 'Other Current Asset' or 'Bank'",
                    kind.as_deref().unwrap_or("None")
                )))
            }
        }
    }

    payload.copy_fields(record, INVOICE_PAYMENT_FIELDS);

    Ok(payload)
}
