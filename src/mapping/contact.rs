use serde::Serialize;
use serde_json::json;

use super::{error::MappingResult, payload::Payload, record::UnifiedRecord};

pub const CUSTOMER_PHONES: &[(&str, &str)] = &[
    ("primary", "PrimaryPhone"),
    ("secondary", "AlternatePhone"),
    ("fax", "Fax"),
    ("mobile", "Mobile"),
];

pub const CUSTOMER_ADDRESSES: &[(&str, &str)] =
    &[("billing", "BillAddr"), ("shipping", "ShipAddr")];

pub const VENDOR_ADDRESSES: &[(&str, &str)] = &[("billing", "BillAddr")];

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PhysicalAddress {
    #[serde(skip_serializing_if = "Option::is_none")]
    line1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line3: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    country_sub_division_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    country: Option<String>,
}

impl From<&UnifiedRecord> for PhysicalAddress {
    fn from(address: &UnifiedRecord) -> Self {
        Self {
            line1: address.text("line1"),
            line2: address.text("line2"),
            line3: address.text("line3"),
            city: address.text("city"),
            country_sub_division_code: address.text("state"),
            postal_code: address.text("postalCode"),
            country: address.text("country"),
        }
    }
}

pub fn map_email(record: &UnifiedRecord, payload: &mut Payload) -> MappingResult<()> {
    if let Some(email) = record.text("email") {
        payload.set("PrimaryEmailAddr", json!({ "Address": email }))?;
    }

    Ok(())
}

pub fn map_website(record: &UnifiedRecord, payload: &mut Payload) -> MappingResult<()> {
    if let Some(website) = record.text("website") {
        payload.set("WebAddr", json!({ "URI": website }))?;
    }

    Ok(())
}

/// Map `phoneNumbers` entries by their `type`. The first number of each type
/// wins and unknown types are ignored.
pub fn map_phone_numbers(
    record: &UnifiedRecord,
    payload: &mut Payload,
    phone_types: &[(&str, &str)],
) -> MappingResult<()> {
    let phones = record.list("phoneNumbers");

    for (from, to) in phone_types {
        let number = phones
            .iter()
            .find(|phone| phone.text("type").as_deref() == Some(*from))
            .and_then(|phone| phone.text("phoneNumber"));

        if let Some(number) = number {
            payload.set(to, json!({ "FreeFormNumber": number }))?;
        }
    }

    Ok(())
}

/// Map `addresses` entries by their `addressType`.
pub fn map_addresses(
    record: &UnifiedRecord,
    payload: &mut Payload,
    address_types: &[(&str, &str)],
) -> MappingResult<()> {
    let addresses = record.list("addresses");

    for (from, to) in address_types {
        let address = addresses
            .iter()
            .find(|address| address.text("addressType").as_deref() == Some(*from));

        if let Some(address) = address {
            payload.set(to, PhysicalAddress::from(address))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use serde_json::{json, Value};

    use super::*;

    fn record(value: Value) -> UnifiedRecord {
        UnifiedRecord::try_from(value).expect("record fixture should be an object")
    }

    #[test]
    fn phones_by_type() {
        let record = record(json!({
            "phoneNumbers": [
                {"type": "mobile", "phoneNumber": "555-0100"},
                {"type": "pager", "phoneNumber": "555-0199"},
                {"type": "primary", "phoneNumber": "555-0101"}
            ]
        }));
        let mut payload = Payload::default();

        map_phone_numbers(&record, &mut payload, CUSTOMER_PHONES).expect("map phones");

        let want = json!({
            "Mobile": {"FreeFormNumber": "555-0100"},
            "PrimaryPhone": {"FreeFormNumber": "555-0101"}
        });

        assert_eq!(want, payload.into_value());
    }

    #[test]
    fn vendor_ignores_shipping_address() {
        let record = record(json!({
            "addresses": [
                {"addressType": "shipping", "line1": "1 Dock Rd"},
                {"addressType": "billing", "line1": "2 Main St", "state": "CA", "postalCode": "94105"}
            ]
        }));
        let mut payload = Payload::default();

        map_addresses(&record, &mut payload, VENDOR_ADDRESSES).expect("map addresses");

        let want = json!({
            "BillAddr": {"Line1": "2 Main St", "CountrySubDivisionCode": "CA", "PostalCode": "94105"}
        });

        assert_eq!(want, payload.into_value());
    }

    #[test]
    fn email_and_website() {
        let record = record(json!({"email": "ap@acme.test", "website": "https://acme.test"}));
        let mut payload = Payload::default();

        map_email(&record, &mut payload).expect("map email");
        map_website(&record, &mut payload).expect("map website");

        let want = json!({
            "PrimaryEmailAddr": {"Address": "ap@acme.test"},
            "WebAddr": {"URI": "https://acme.test"}
        });

        assert_eq!(want, payload.into_value());
    }
}
