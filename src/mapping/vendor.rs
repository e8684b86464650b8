use crate::reference::{ReferenceIndex, ReferenceKind, ReferenceRequest};

use super::{
    common::{map_currency, map_is_active},
    contact::{
        map_addresses, map_email, map_phone_numbers, map_website, CUSTOMER_PHONES,
        VENDOR_ADDRESSES,
    },
    error::MappingResult,
    payload::{FieldTable, Payload},
    record::UnifiedRecord,
    resolve::{find_existing, ExistingMatcher, CURRENCY},
};

const EXISTING: &[ExistingMatcher] = &[
    ExistingMatcher::required("id", "Id"),
    ExistingMatcher::optional("vendorName", "DisplayName"),
];

const FIELDS: FieldTable = &[
    ("vendorName", &["DisplayName"]),
    ("companyName", &["CompanyName"]),
    ("firstName", &["GivenName"]),
    ("middleName", &["MiddleName"]),
    ("lastName", &["FamilyName"]),
    ("suffix", &["Suffix"]),
    ("title", &["Title"]),
    ("checkName", &["PrintOnCheckName"]),
];

pub fn collect_references(record: &UnifiedRecord, request: &mut ReferenceRequest) {
    request.collect_existing(record, ReferenceKind::Vendors, EXISTING);
    request.collect(record, &CURRENCY);
}

pub fn map(record: &UnifiedRecord, index: &ReferenceIndex) -> MappingResult<Payload> {
    let mut payload = Payload::default();

    if let Some(existing) = find_existing(index, ReferenceKind::Vendors, record, EXISTING)? {
        payload.set_internal_id(existing)?;
    }

    map_email(record, &mut payload)?;
    map_website(record, &mut payload)?;
    map_currency(record, index, &mut payload)?;
    map_phone_numbers(record, &mut payload, CUSTOMER_PHONES)?;
    map_addresses(record, &mut payload, VENDOR_ADDRESSES)?;
    map_is_active(record, &mut payload, "Vendor")?;

    payload.copy_fields(record, FIELDS);

    Ok(payload)
}
