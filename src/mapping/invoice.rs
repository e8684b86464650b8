use serde_json::json;

use crate::reference::{ReferenceIndex, ReferenceKind, ReferenceRequest};

use super::{
    common::{map_currency, map_transaction_tax_code},
    contact::{map_addresses, CUSTOMER_ADDRESSES},
    error::MappingResult,
    line_items::sales_item_line,
    lines::{DiscountLineDetail, Line, LineDetail},
    payload::{FieldTable, Payload},
    record::UnifiedRecord,
    resolve::{find_existing, ExistingMatcher, CLASS, CURRENCY, CUSTOMER, ITEM, TAX_CODE},
};

const EXISTING: &[ExistingMatcher] = &[
    ExistingMatcher::required("id", "Id"),
    ExistingMatcher::optional("invoiceNumber", "DocNumber"),
];

const FIELDS: FieldTable = &[
    ("invoiceNumber", &["DocNumber"]),
    ("issueDate", &["TxnDate"]),
    ("dueDate", &["DueDate"]),
    ("shipDate", &["ShipDate"]),
    ("notes", &["PrivateNote"]),
];

pub fn collect_references(record: &UnifiedRecord, request: &mut ReferenceRequest) {
    request.collect_existing(record, ReferenceKind::Invoices, EXISTING);
    request.collect(record, &CUSTOMER);
    request.collect(record, &CURRENCY);
    request.collect(record, &TAX_CODE);
    request.collect_list(record, "lineItems", &[ITEM, CLASS]);
}

pub fn map(record: &UnifiedRecord, index: &ReferenceIndex) -> MappingResult<Payload> {
    let mut payload = Payload::default();

    if let Some(existing) = find_existing(index, ReferenceKind::Invoices, record, EXISTING)? {
        payload.set_internal_id(existing)?;
    }

    if let Some(customer) = CUSTOMER.resolve_reference(index, record)? {
        payload.set("CustomerRef", customer)?;
    }

    if let Some(description) = record.text("description") {
        payload.set("CustomerMemo", json!({ "value": description }))?;
    }

    map_currency(record, index, &mut payload)?;
    map_addresses(record, &mut payload, CUSTOMER_ADDRESSES)?;
    map_transaction_tax_code(record, index, &mut payload)?;

    let mut lines = record
        .list("lineItems")
        .iter()
        .map(|line| sales_item_line(line, index))
        .collect::<MappingResult<Vec<_>>>()?;

    if let Some(discount) = record.amount("discountAmount")? {
        if !discount.is_zero() {
            lines.push(Line {
                description: None,
                amount: Some(discount),
                detail: LineDetail::Discount(DiscountLineDetail {
                    percent_based: false,
                }),
            });
        }
    }

    payload.set("Line", lines)?;
    payload.copy_fields(record, FIELDS);

    Ok(payload)
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
                ReferenceKind::Customers,
                vec![json!({"Id": "5", "DisplayName": "Acme"})],
            )
            .with(ReferenceKind::Items, vec![json!({"Id": "9", "Name": "Widget"})])
            .with(
                ReferenceKind::Invoices,
                vec![json!({"Id": "1001", "DocNumber": "INV-1", "SyncToken": "6"})],
            )
    }

    #[test]
    fn invoice_with_item_line() {
        let payload = map(
            &record(json!({
                "customerName": "Acme",
                "lineItems": [{"itemName": "Widget", "quantity": 2, "unitPrice": 10}]
            })),
            &index(),
        )
        .expect("map invoice");

        let value = payload.into_value();

        assert_eq!(json!({"value": "5", "name": "Acme"}), value["CustomerRef"]);

        let lines = value["Line"].as_array().expect("lines");
        assert_eq!(1, lines.len());
        assert_eq!(json!("9"), lines[0]["SalesItemLineDetail"]["ItemRef"]["value"]);
        assert_eq!(json!(2), lines[0]["SalesItemLineDetail"]["Qty"]);
        assert_eq!(json!(10), lines[0]["SalesItemLineDetail"]["UnitPrice"]);
        assert_eq!(json!(20), lines[0]["Amount"]);
        assert!(value.get("Id").is_none());
        assert!(value.get("SyncToken").is_none());
    }

    #[test]
    fn unknown_customer_is_not_found() {
        let err = map(
            &record(json!({
                "customerName": "Ghost",
                "lineItems": [{"itemName": "Widget", "quantity": 2, "unitPrice": 10}]
            })),
            &index(),
        )
        .expect_err("unknown customer");

        assert!(matches!(err, MappingError::RecordNotFound(_)));
        assert!(err.to_string().contains("Ghost"));
    }

    #[test]
    fn existing_invoice_by_number_is_update() {
        let payload = map(
            &record(json!({"invoiceNumber": "INV-1", "customerId": "5", "notes": "Resent"})),
            &index(),
        )
        .expect("map invoice");

        assert!(payload.is_update());
        assert_eq!(Some(&json!("1001")), payload.get("Id"));
        assert_eq!(Some(&json!("6")), payload.get("SyncToken"));
        assert_eq!(Some(&json!("Resent")), payload.get("PrivateNote"));
    }

    #[test]
    fn discount_line_is_appended() {
        let payload = map(
            &record(json!({
                "customerName": "Acme",
                "discountAmount": 5,
                "lineItems": [{"itemName": "Widget", "quantity": 1, "unitPrice": 50}]
            })),
            &index(),
        )
        .expect("map invoice");

        let value = payload.into_value();
        let lines = value["Line"].as_array().expect("lines");

        assert_eq!(2, lines.len());
        assert_eq!(
            json!({"Amount": 5, "DetailType": "DiscountLineDetail", "DiscountLineDetail": {"PercentBased": false}}),
            lines[1]
        );
    }

    #[test]
    fn invalid_line_tax_code() {
        let err = map(
            &record(json!({
                "customerName": "Acme",
                "lineItems": [{"itemName": "Widget", "taxCode": "EXEMPT"}]
            })),
            &index(),
        )
        .expect_err("bad line tax code");

        assert!(matches!(err, MappingError::InvalidInput(_)));
    }

    #[test]
    fn valid_line_tax_codes() {
        for code in ["TAX", "NON"] {
            let payload = map(
                &record(json!({
                    "customerName": "Acme",
                    "lineItems": [{"itemName": "Widget", "taxCode": code}]
                })),
                &index(),
            )
            .expect("map invoice");

            let value = payload.into_value();
            assert_eq!(
                json!(code),
                value["Line"][0]["SalesItemLineDetail"]["TaxCodeRef"]["value"]
            );
        }
    }
}
