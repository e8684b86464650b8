use chrono::Utc;

use crate::reference::{ReferenceIndex, ReferenceKind, ReferenceRequest};

use super::{
    common::map_is_active,
    error::{MappingError, MappingResult},
    payload::{FieldTable, Payload},
    record::UnifiedRecord,
    resolve::{find_existing, ExistingMatcher, Lookup, CLASS},
};

const EXISTING: &[ExistingMatcher] = &[
    ExistingMatcher::required("id", "Id"),
    ExistingMatcher::optional("name", "Name"),
];

const FIELDS: FieldTable = &[
    ("name", &["Name"]),
    ("type", &["Type"]),
    ("quantityOnHand", &["QtyOnHand"]),
];

/// An entry of the item's `accounts` list.
const ITEM_ACCOUNT: Lookup = Lookup::new(
    ReferenceKind::Accounts,
    "Account",
    &[("id", "Id"), ("accountNumber", "AcctNum"), ("name", "Name")],
);

/// An entry of the item's `itemVendors` list.
const ITEM_VENDOR: Lookup = Lookup::new(
    ReferenceKind::Vendors,
    "Vendor",
    &[("vendorId", "Id"), ("vendorName", "DisplayName")],
);

const ACCOUNT_TYPES: &[(&str, &str)] = &[
    ("asset", "AssetAccountRef"),
    ("expense", "ExpenseAccountRef"),
    ("income", "IncomeAccountRef"),
];

pub fn collect_references(record: &UnifiedRecord, request: &mut ReferenceRequest) {
    request.collect_existing(record, ReferenceKind::Items, EXISTING);
    request.collect(record, &CLASS);
    request.collect_list(record, "accounts", &[ITEM_ACCOUNT]);
    request.collect_list(record, "itemVendors", &[ITEM_VENDOR]);
}

pub fn map(record: &UnifiedRecord, index: &ReferenceIndex) -> MappingResult<Payload> {
    let mut payload = Payload::default();

    if let Some(existing) = find_existing(index, ReferenceKind::Items, record, EXISTING)? {
        payload.set_internal_id(existing)?;
    }

    if let Some(class) = CLASS.resolve_reference(index, record)? {
        payload.set("ClassRef", class)?;
    }

    map_preferred_vendor(record, index, &mut payload)?;
    map_accounts(record, index, &mut payload)?;

    if record.text("type").as_deref() == Some("Inventory") {
        payload.set("TrackQtyOnHand", true)?;
        payload.set("InvStartDate", Utc::now().to_rfc3339())?;
    }

    map_is_active(record, &mut payload, "Item")?;
    payload.copy_fields(record, FIELDS);

    Ok(payload)
}

/// The first item vendor that resolves becomes the preferred vendor.
fn map_preferred_vendor(
    record: &UnifiedRecord,
    index: &ReferenceIndex,
    payload: &mut Payload,
) -> MappingResult<()> {
    let preferred = record
        .list("itemVendors")
        .iter()
        .find_map(|vendor| ITEM_VENDOR.find(index, vendor))
        .map(|vendor| ITEM_VENDOR.reference(vendor));

    if let Some(vendor) = preferred {
        payload.set("PrefVendorRef", vendor)?;
    }

    Ok(())
}

/// Accounts are matched by id, then account number, then name. Accounts that
/// cannot be found are left off the item.
fn map_accounts(
    record: &UnifiedRecord,
    index: &ReferenceIndex,
    payload: &mut Payload,
) -> MappingResult<()> {
    for account in record.list("accounts") {
        let account_type = account.text("accountType");
        let key = ACCOUNT_TYPES
            .iter()
            .find(|(name, _)| account_type.as_deref() == Some(*name))
            .map(|(_, key)| *key)
            .ok_or_else(|| {
                MappingError::invalid(format!(
                    "Invalid accountType={}",
                    account_type.as_deref().unwrap_or("None")
                ))
            })?;

        if let Some(found) = ITEM_ACCOUNT.find(index, &account) {
            payload.set(key, ITEM_ACCOUNT.reference(found))?;
        }
    }

    Ok(())
}
