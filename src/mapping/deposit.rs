use crate::reference::{ReferenceIndex, ReferenceKind, ReferenceRequest};

use super::{
    common::map_currency,
    error::MappingResult,
    line_items::deposit_line,
    payload::{FieldTable, Payload},
    record::UnifiedRecord,
    resolve::{find_existing, ExistingMatcher, ACCOUNT, CLASS, CURRENCY, CUSTOMER},
};

const EXISTING: &[ExistingMatcher] = &[ExistingMatcher::required("id", "Id")];

const FIELDS: FieldTable = &[
    ("issueDate", &["TxnDate"]),
    ("description", &["PrivateNote"]),
];

pub fn collect_references(record: &UnifiedRecord, request: &mut ReferenceRequest) {
    request.collect_existing(record, ReferenceKind::Deposits, EXISTING);
    request.collect(record, &ACCOUNT);
    request.collect(record, &CURRENCY);
    request.collect_list(record, "lineItems", &[ACCOUNT, CUSTOMER, CLASS]);
}

pub fn map(record: &UnifiedRecord, index: &ReferenceIndex) -> MappingResult<Payload> {
    let mut payload = Payload::default();

    if let Some(existing) = find_existing(index, ReferenceKind::Deposits, record, EXISTING)? {
        payload.set_internal_id(existing)?;
    }

    if let Some(account) = ACCOUNT.resolve_reference(index, record)? {
        payload.set("DepositToAccountRef", account)?;
    }

    map_currency(record, index, &mut payload)?;

    let lines = record
        .list("lineItems")
        .iter()
        .map(|line| deposit_line(line, index))
        .collect::<MappingResult<Vec<_>>>()?;

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
                ReferenceKind::Accounts,
                vec![
                    json!({"Id": "35", "Name": "Checking"}),
                    json!({"Id": "79", "Name": "Sales"}),
                ],
            )
            .with(
                ReferenceKind::Customers,
                vec![json!({"Id": "5", "DisplayName": "Acme"})],
            )
            .with(ReferenceKind::Classes, vec![json!({"Id": "3", "Name": "East"})])
    }

    #[test]
    fn deposit_with_lines() {
        let payload = map(
            &record(json!({
                "accountName": "Checking",
                "issueDate": "2023-06-30",
                "lineItems": [
                    {"accountName": "Sales", "customerName": "Acme", "className": "East", "amount": 125},
                    {"accountId": "79", "amount": 5}
                ]
            })),
            &index(),
        )
        .expect("map deposit");

        let want = json!({
            "DepositToAccountRef": {"value": "35", "name": "Checking"},
            "TxnDate": "2023-06-30",
            "Line": [
                {
                    "Amount": 125,
                    "DetailType": "DepositLineDetail",
                    "DepositLineDetail": {
                        "AccountRef": {"value": "79", "name": "Sales"},
                        "Entity": {"value": "5", "name": "Acme"},
                        "ClassRef": {"value": "3", "name": "East"}
                    }
                },
                {
                    "Amount": 5,
                    "DetailType": "DepositLineDetail",
                    "DepositLineDetail": {"AccountRef": {"value": "79", "name": "Sales"}}
                }
            ]
        });

        assert_eq!(want, payload.into_value());
    }

    #[test]
    fn unknown_deposit_account() {
        let err = map(&record(json!({"accountName": "Petty Cash"})), &index())
            .expect_err("unknown account");

        assert!(matches!(err, MappingError::RecordNotFound(_)));
    }

    #[test]
    fn unknown_line_customer() {
        let err = map(
            &record(json!({"accountName": "Checking", "lineItems": [{"customerName": "Ghost", "amount": 1}]})),
            &index(),
        )
        .expect_err("unknown customer");

        assert!(matches!(err, MappingError::RecordNotFound(_)));
    }
}
