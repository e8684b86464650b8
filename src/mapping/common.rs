use serde_json::json;

use crate::reference::ReferenceIndex;

use super::{
    error::{MappingError, MappingResult},
    payload::Payload,
    record::UnifiedRecord,
    resolve::{Reference, CURRENCY, TAX_CODE},
};

/// Line tax codes are a fixed enumeration rather than a reference lookup.
const LINE_TAX_CODES: &[&str] = &["TAX", "NON"];

/// Map the record's currency, trying `currencyId`, then `currency` (the code)
/// and finally `currencyName`. An unknown currency is not an error.
///
/// The exchange rate is only attached when a currency was resolved.
///
/// # Returns
///
/// Whether a currency was resolved.
pub fn map_currency(
    record: &UnifiedRecord,
    index: &ReferenceIndex,
    payload: &mut Payload,
) -> MappingResult<bool> {
    let currency = match CURRENCY.find(index, record) {
        Some(currency) => currency,
        None => return Ok(false),
    };

    payload.set(
        "CurrencyRef",
        Reference {
            value: currency.text("Code").unwrap_or_default(),
            name: currency.text("Name"),
        },
    )?;

    if let Some(rate) = record.get("exchangeRate") {
        payload.set("ExchangeRate", rate)?;
    }

    Ok(true)
}

/// Map a record-level tax code to `TxnTaxDetail`. The code must exist.
pub fn map_transaction_tax_code(
    record: &UnifiedRecord,
    index: &ReferenceIndex,
    payload: &mut Payload,
) -> MappingResult<()> {
    if let Some(tax_code) = TAX_CODE.resolve_reference(index, record)? {
        payload.set("TxnTaxDetail", json!({ "TxnTaxCodeRef": tax_code }))?;
    }

    Ok(())
}

/// Map a sales line's `taxCode`, which must be `TAX` or `NON`.
pub fn map_line_tax_code(line: &UnifiedRecord) -> MappingResult<Option<Reference>> {
    match line.text("taxCode") {
        None => Ok(None),
        Some(code) if LINE_TAX_CODES.contains(&code.as_str()) => Ok(Some(Reference {
            value: code.clone(),
            name: Some(code),
        })),
        Some(code) => Err(MappingError::invalid(format!(
            "Invalid value {} for line taxCode, it should be either 'TAX' or 'NON'",
            code
        ))),
    }
}

/// Map `isActive` to `Active`.
///
/// Deactivation only makes sense for an entity that already exists, so
/// `isActive=false` on a create is rejected.
pub fn map_is_active(
    record: &UnifiedRecord,
    payload: &mut Payload,
    label: &str,
) -> MappingResult<()> {
    match record.flag("isActive") {
        None => Ok(()),
        Some(false) if !payload.is_update() => Err(MappingError::invalid(format!(
            "Invalid value isActive=false when creating a new record. It can only be used to deactivate an existing {}",
            label
        ))),
        Some(active) => payload.set("Active", active),
    }
}

#[cfg(test)]
mod test {
    use serde_json::{json, Value};

    use crate::reference::ReferenceKind;

    use super::*;

    fn record(value: Value) -> UnifiedRecord {
        UnifiedRecord::try_from(value).expect("record fixture should be an object")
    }

    fn currencies() -> ReferenceIndex {
        ReferenceIndex::default().with(
            ReferenceKind::Currencies,
            vec![
                json!({"Id": "1", "Code": "USD", "Name": "United States Dollar"}),
                json!({"Id": "2", "Code": "EUR", "Name": "Euro"}),
            ],
        )
    }

    #[test]
    fn currency_by_code_with_rate() {
        let mut payload = Payload::default();

        let resolved = map_currency(
            &record(json!({"currency": "EUR", "exchangeRate": 1.1})),
            &currencies(),
            &mut payload,
        )
        .expect("map currency");

        assert!(resolved);
        assert_eq!(
            json!({"CurrencyRef": {"value": "EUR", "name": "Euro"}, "ExchangeRate": 1.1}),
            payload.into_value()
        );
    }

    #[test]
    fn currency_id_beats_code() {
        let mut payload = Payload::default();

        map_currency(
            &record(json!({"currencyId": "1", "currency": "EUR"})),
            &currencies(),
            &mut payload,
        )
        .expect("map currency");

        assert_eq!(
            Some(&json!({"value": "USD", "name": "United States Dollar"})),
            payload.get("CurrencyRef")
        );
    }

    #[test]
    fn unknown_currency_drops_rate() {
        let mut payload = Payload::default();

        let resolved = map_currency(
            &record(json!({"currency": "XYZ", "exchangeRate": 3})),
            &currencies(),
            &mut payload,
        )
        .expect("unknown currency is not an error");

        assert!(!resolved);
        assert!(!payload.contains("ExchangeRate"));
    }

    #[test]
    fn line_tax_code_enumeration() {
        for code in ["TAX", "NON"] {
            let mapped = map_line_tax_code(&record(json!({ "taxCode": code })))
                .expect("valid line tax code");

            assert_eq!(Some(code.to_owned()), mapped.map(|reference| reference.value));
        }

        let err = map_line_tax_code(&record(json!({"taxCode": "GST"}))).expect_err("invalid code");

        assert!(matches!(err, MappingError::InvalidInput(_)));
    }

    #[test]
    fn transaction_tax_code_must_exist() {
        let index = ReferenceIndex::default()
            .with(ReferenceKind::TaxCodes, vec![json!({"Id": "4", "Name": "CA"})]);
        let mut payload = Payload::default();

        map_transaction_tax_code(&record(json!({"taxCode": "CA"})), &index, &mut payload)
            .expect("map tax code");

        assert_eq!(
            Some(&json!({"TxnTaxCodeRef": {"value": "4", "name": "CA"}})),
            payload.get("TxnTaxDetail")
        );

        let err = map_transaction_tax_code(
            &record(json!({"taxCode": "NY"})),
            &index,
            &mut Payload::default(),
        )
        .expect_err("unknown tax code");

        assert!(matches!(err, MappingError::RecordNotFound(_)));
    }

    #[test]
    fn deactivate_requires_existing() {
        let err = map_is_active(
            &record(json!({"isActive": false})),
            &mut Payload::default(),
            "Item",
        )
        .expect_err("deactivate on create");

        assert!(matches!(err, MappingError::InvalidInput(_)));

        let mut payload = Payload::default();
        payload.set("Id", "3").expect("set id");

        map_is_active(&record(json!({"isActive": false})), &mut payload, "Item")
            .expect("deactivate existing");

        assert_eq!(Some(&json!(false)), payload.get("Active"));
    }
}
