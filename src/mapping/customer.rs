use crate::reference::{ReferenceIndex, ReferenceKind, ReferenceRequest};

use super::{
    common::map_currency,
    contact::{
        map_addresses, map_email, map_phone_numbers, map_website, CUSTOMER_ADDRESSES,
        CUSTOMER_PHONES,
    },
    error::{MappingError, MappingResult},
    payload::{FieldTable, Payload},
    record::UnifiedRecord,
    resolve::{
        find_existing, ExistingMatcher, Reference, CURRENCY, CUSTOMER_TYPE, PARENT_CUSTOMER,
        PAYMENT_METHOD,
    },
};

const EXISTING: &[ExistingMatcher] = &[
    ExistingMatcher::required("id", "Id"),
    ExistingMatcher::optional("fullName", "DisplayName"),
];

const FIELDS: FieldTable = &[
    ("companyName", &["CompanyName"]),
    ("fullName", &["DisplayName"]),
    ("firstName", &["GivenName"]),
    ("middleName", &["MiddleName"]),
    ("lastName", &["FamilyName"]),
    ("suffix", &["Suffix"]),
    ("title", &["Title"]),
    ("taxCode", &["PrimaryTaxIdentifier"]),
    ("notes", &["Notes"]),
    ("isActive", &["Active"]),
];

pub fn collect_references(record: &UnifiedRecord, request: &mut ReferenceRequest) {
    request.collect_existing(record, ReferenceKind::Customers, EXISTING);
    request.collect(record, &PARENT_CUSTOMER);
    request.collect(record, &PAYMENT_METHOD);
    request.collect(record, &CUSTOMER_TYPE);
    request.collect(record, &CURRENCY);
}

pub fn map(record: &UnifiedRecord, index: &ReferenceIndex) -> MappingResult<Payload> {
    let mut payload = Payload::default();

    if let Some(existing) = find_existing(index, ReferenceKind::Customers, record, EXISTING)? {
        payload.set_internal_id(existing)?;
    }

    map_email(record, &mut payload)?;
    map_website(record, &mut payload)?;
    map_currency(record, index, &mut payload)?;
    map_phone_numbers(record, &mut payload, CUSTOMER_PHONES)?;
    map_addresses(record, &mut payload, CUSTOMER_ADDRESSES)?;

    if let Some(parent) = PARENT_CUSTOMER.resolve_reference(index, record)? {
        payload.set("ParentRef", parent)?;
        payload.set("Job", true)?;
    }

    if let Some(payment_method) = PAYMENT_METHOD.resolve_reference(index, record)? {
        payload.set("PaymentMethodRef", payment_method)?;
    }

    if let Some(customer_type) = CUSTOMER_TYPE.resolve(index, record)? {
        payload.set(
            "CustomerTypeRef",
            Reference::value(customer_type.id().unwrap_or_default()),
        )?;
    }

    map_taxable(record, &mut payload)?;
    payload.copy_fields(record, FIELDS);

    Ok(payload)
}

/// A customer that is not taxable must say why.
fn map_taxable(record: &UnifiedRecord, payload: &mut Payload) -> MappingResult<()> {
    match record.flag("taxable") {
        None => Ok(()),
        Some(true) => payload.set("Taxable", true),
        Some(false) => {
            let reason = record.text("taxExemptionReasonId").ok_or_else(|| {
                MappingError::invalid("A taxExemptionReasonId is required when taxable is false")
            })?;

            payload.set("Taxable", false)?;
            payload.set("TaxExemptionReasonId", reason)
        }
    }
}

#[cfg(test)]
mod test {
    use serde_json::{json, Value};

    use super::*;

    fn record(value: Value) -> UnifiedRecord {
        UnifiedRecord::try_from(value).expect("record fixture should be an object")
    }

    fn index() -> ReferenceIndex {
        ReferenceIndex::default()
            .with(
                ReferenceKind::Customers,
                vec![
                    json!({"Id": "5", "DisplayName": "Acme", "SyncToken": "1"}),
                    json!({"Id": "8", "DisplayName": "Acme Holdings", "SyncToken": "0"}),
                ],
            )
            .with(
                ReferenceKind::PaymentMethods,
                vec![json!({"Id": "2", "Name": "Check"})],
            )
            .with(
                ReferenceKind::CustomerTypes,
                vec![json!({"Id": "11", "Name": "Wholesale"})],
            )
    }

    #[test]
    fn create_new_customer() {
        let record = record(json!({
            "fullName": "Initech",
            "firstName": "Bill",
            "lastName": "Lumbergh",
            "email": "bill@initech.test",
            "notes": null,
            "paymentMethod": "Check",
            "categoryName": "Wholesale"
        }));

        let payload = map(&record, &index()).expect("map customer");

        let want = json!({
            "DisplayName": "Initech",
            "GivenName": "Bill",
            "FamilyName": "Lumbergh",
            "PrimaryEmailAddr": {"Address": "bill@initech.test"},
            "PaymentMethodRef": {"value": "2", "name": "Check"},
            "CustomerTypeRef": {"value": "11"}
        });

        assert!(!payload.is_update());
        assert_eq!(want, payload.into_value());
    }

    #[test]
    fn update_by_display_name() {
        let payload = map(&record(json!({"fullName": "Acme", "title": "Mr"})), &index())
            .expect("map customer");

        assert!(payload.is_update());
        assert_eq!(Some(&json!("5")), payload.get("Id"));
        assert_eq!(Some(&json!("1")), payload.get("SyncToken"));
        assert_eq!(Some(&json!(true)), payload.get("sparse"));
    }

    #[test]
    fn unknown_id_is_not_found() {
        let err = map(&record(json!({"id": "77", "fullName": "Acme"})), &index())
            .expect_err("unknown id");

        assert!(matches!(err, MappingError::RecordNotFound(_)));
    }

    #[test]
    fn parent_makes_job() {
        let payload = map(
            &record(json!({"fullName": "Acme Project", "parentName": "Acme Holdings"})),
            &index(),
        )
        .expect("map customer");

        assert_eq!(
            Some(&json!({"value": "8", "name": "Acme Holdings"})),
            payload.get("ParentRef")
        );
        assert_eq!(Some(&json!(true)), payload.get("Job"));
    }

    #[test]
    fn missing_parent_is_not_found() {
        let err = map(&record(json!({"fullName": "Orphan", "parentId": "404"})), &index())
            .expect_err("missing parent");

        assert!(matches!(err, MappingError::RecordNotFound(_)));
    }

    #[test]
    fn not_taxable_needs_reason() {
        let err = map(&record(json!({"fullName": "Church", "taxable": false})), &index())
            .expect_err("no exemption reason");

        assert!(matches!(err, MappingError::InvalidInput(_)));

        let payload = map(
            &record(json!({"fullName": "Church", "taxable": false, "taxExemptionReasonId": "4"})),
            &index(),
        )
        .expect("map exempt customer");

        assert_eq!(Some(&json!(false)), payload.get("Taxable"));
        assert_eq!(Some(&json!("4")), payload.get("TaxExemptionReasonId"));
    }
}
