//! Bills, purchase orders and vendor credits.
//!
//! All three combine product lines and expense lines into one `Line` array
//! and differ only in which header fields they carry.

use crate::reference::{ReferenceIndex, ReferenceKind, ReferenceRequest};

use super::{
    common::{map_currency, map_transaction_tax_code},
    error::MappingResult,
    line_items::{collect_purchase_references, expense_line, product_line},
    payload::{FieldTable, Payload},
    record::UnifiedRecord,
    resolve::{find_existing, ExistingMatcher, CURRENCY, DEPARTMENT, TAX_CODE, VENDOR},
};

/// The header shape of one purchase document type.
pub struct PurchaseDocument {
    kind: ReferenceKind,
    existing: &'static [ExistingMatcher],
    fields: FieldTable,
    department: bool,
    transaction_tax_code: bool,
}

pub const BILL: PurchaseDocument = PurchaseDocument {
    kind: ReferenceKind::Bills,
    existing: &[
        ExistingMatcher::required("id", "Id"),
        ExistingMatcher::optional("billNumber", "DocNumber"),
    ],
    fields: &[
        ("billNumber", &["DocNumber"]),
        ("issueDate", &["TxnDate"]),
        ("dueDate", &["DueDate"]),
    ],
    department: true,
    transaction_tax_code: true,
};

pub const PURCHASE_ORDER: PurchaseDocument = PurchaseDocument {
    kind: ReferenceKind::PurchaseOrders,
    existing: &[
        ExistingMatcher::required("id", "Id"),
        ExistingMatcher::optional("purchaseOrderNumber", "DocNumber"),
    ],
    fields: &[
        ("purchaseOrderNumber", &["DocNumber"]),
        ("description", &["Memo"]),
        ("issueDate", &["TxnDate"]),
        ("dueDate", &["DueDate"]),
    ],
    department: false,
    transaction_tax_code: false,
};

pub const VENDOR_CREDIT: PurchaseDocument = PurchaseDocument {
    kind: ReferenceKind::VendorCredits,
    existing: &[
        ExistingMatcher::required("id", "Id"),
        ExistingMatcher::optional("vendorCreditNumber", "DocNumber"),
    ],
    fields: &[
        ("vendorCreditNumber", &["DocNumber"]),
        ("issueDate", &["TxnDate"]),
        ("description", &["PrivateNote"]),
    ],
    department: true,
    transaction_tax_code: false,
};

impl PurchaseDocument {
    pub fn collect_references(&self, record: &UnifiedRecord, request: &mut ReferenceRequest) {
        request.collect_existing(record, self.kind, self.existing);
        request.collect(record, &VENDOR);
        request.collect(record, &CURRENCY);

        if self.department {
            request.collect(record, &DEPARTMENT);
        }
        if self.transaction_tax_code {
            request.collect(record, &TAX_CODE);
        }

        collect_purchase_references(record, request);
    }

    pub fn map(&self, record: &UnifiedRecord, index: &ReferenceIndex) -> MappingResult<Payload> {
        let mut payload = Payload::default();

        if let Some(existing) = find_existing(index, self.kind, record, self.existing)? {
            payload.set_internal_id(existing)?;
        }

        if let Some(vendor) = VENDOR.resolve_reference(index, record)? {
            payload.set("VendorRef", vendor)?;
        }

        map_currency(record, index, &mut payload)?;

        if self.department {
            if let Some(department) = DEPARTMENT.resolve_reference(index, record)? {
                payload.set("DepartmentRef", department)?;
            }
        }
        if self.transaction_tax_code {
            map_transaction_tax_code(record, index, &mut payload)?;
        }

        let mut lines = record
            .list("lineItems")
            .iter()
            .map(|line| product_line(line, index))
            .collect::<MappingResult<Vec<_>>>()?;

        for expense in record.list("expenses") {
            lines.push(expense_line(&expense, index)?);
        }

        payload.set("Line", lines)?;
        payload.copy_fields(record, self.fields);

        Ok(payload)
    }
}

#[cfg(test)]
mod test {
    use serde_json::{json, Value};

    use super::*;
    use crate::mapping::MappingError;

    fn record(value: Value) -> UnifiedRecord {
        UnifiedRecord::try_from(value).expect("record fixture should be an object")
    }

    fn index() -> ReferenceIndex {
        ReferenceIndex::default()
            .with(
                ReferenceKind::Vendors,
                vec![json!({"Id": "30", "DisplayName": "Paper Co"})],
            )
            .with(ReferenceKind::Items, vec![json!({"Id": "9", "Name": "Widget"})])
            .with(
                ReferenceKind::Accounts,
                vec![json!({"Id": "61", "Name": "Travel"})],
            )
            .with(
                ReferenceKind::Departments,
                vec![json!({"Id": "2", "Name": "Operations"})],
            )
            .with(
                ReferenceKind::Currencies,
                vec![json!({"Id": "2", "Code": "EUR", "Name": "Euro"})],
            )
            .with(
                ReferenceKind::Bills,
                vec![json!({"Id": "700", "DocNumber": "B-7", "SyncToken": "1"})],
            )
    }

    #[test]
    fn bill_combines_items_and_expenses() {
        let payload = BILL
            .map(
                &record(json!({
                    "vendorName": "Paper Co",
                    "billNumber": "B-8",
                    "departmentName": "Operations",
                    "currency": "EUR",
                    "exchangeRate": 1.08,
                    "lineItems": [{"itemName": "Widget", "quantity": 4, "unitPrice": 2.5}],
                    "expenses": [{"accountName": "Travel", "amount": 300}]
                })),
                &index(),
            )
            .expect("map bill");

        let value = payload.into_value();

        assert_eq!(json!({"value": "30", "name": "Paper Co"}), value["VendorRef"]);
        assert_eq!(json!({"value": "2", "name": "Operations"}), value["DepartmentRef"]);
        assert_eq!(json!(1.08), value["ExchangeRate"]);
        assert_eq!(json!("B-8"), value["DocNumber"]);

        let lines = value["Line"].as_array().expect("lines");
        assert_eq!(2, lines.len());
        assert_eq!(json!("ItemBasedExpenseLineDetail"), lines[0]["DetailType"]);
        assert_eq!(json!(10), lines[0]["Amount"]);
        assert_eq!(json!("AccountBasedExpenseLineDetail"), lines[1]["DetailType"]);
        assert_eq!(json!(300), lines[1]["Amount"]);
    }

    #[test]
    fn existing_bill_is_update() {
        let payload = BILL
            .map(&record(json!({"billNumber": "B-7", "vendorId": "30"})), &index())
            .expect("map bill");

        assert!(payload.is_update());
        assert_eq!(Some(&json!("700")), payload.get("Id"));
    }

    #[test]
    fn missing_account_name_is_not_found() {
        let err = BILL
            .map(
                &record(json!({"vendorName": "Paper Co", "expenses": [{"accountName": "Meals", "amount": 10}]})),
                &index(),
            )
            .expect_err("unknown account");

        assert!(matches!(err, MappingError::RecordNotFound(_)));
    }

    #[test]
    fn absent_account_name_has_no_account() {
        let payload = BILL
            .map(
                &record(json!({"vendorName": "Paper Co", "expenses": [{"amount": 10}]})),
                &index(),
            )
            .expect("map bill");

        let value = payload.into_value();

        assert!(value["Line"][0]["AccountBasedExpenseLineDetail"]
            .get("AccountRef")
            .is_none());
    }

    #[test]
    fn purchase_order_memo() {
        let payload = PURCHASE_ORDER
            .map(
                &record(json!({"vendorName": "Paper Co", "description": "Q3 restock", "departmentName": "Nowhere"})),
                &index(),
            )
            .expect("map purchase order");

        assert_eq!(Some(&json!("Q3 restock")), payload.get("Memo"));
        assert!(!payload.contains("DepartmentRef"));
    }

    #[test]
    fn vendor_credit_private_note() {
        let payload = VENDOR_CREDIT
            .map(
                &record(json!({"vendorName": "Paper Co", "description": "Damaged goods"})),
                &index(),
            )
            .expect("map vendor credit");

        assert_eq!(Some(&json!("Damaged goods")), payload.get("PrivateNote"));
    }

    #[test]
    fn unknown_vendor_is_not_found() {
        let err = VENDOR_CREDIT
            .map(&record(json!({"vendorName": "Nobody"})), &index())
            .expect_err("unknown vendor");

        assert!(matches!(err, MappingError::RecordNotFound(_)));
    }
}
