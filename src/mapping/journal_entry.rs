use crate::reference::{ReferenceIndex, ReferenceKind, ReferenceRequest};

use super::{
    amount::Amount,
    common::map_currency,
    error::{MappingError, MappingResult},
    line_items::journal_entry_line,
    payload::{FieldTable, Payload},
    record::UnifiedRecord,
    resolve::{
        find_existing, ExistingMatcher, ACCOUNT, CLASS, CURRENCY, CUSTOMER, DEPARTMENT, VENDOR,
    },
};

const EXISTING: &[ExistingMatcher] = &[
    ExistingMatcher::required("id", "Id"),
    ExistingMatcher::optional("journalEntryNumber", "DocNumber"),
];

const FIELDS: FieldTable = &[
    ("journalEntryNumber", &["DocNumber"]),
    ("transactionDate", &["TxnDate"]),
    ("description", &["PrivateNote"]),
];

pub fn collect_references(record: &UnifiedRecord, request: &mut ReferenceRequest) {
    request.collect_existing(record, ReferenceKind::JournalEntries, EXISTING);
    request.collect(record, &CURRENCY);
    request.collect_list(
        record,
        "lineItems",
        &[CUSTOMER, VENDOR, ACCOUNT, CLASS, DEPARTMENT],
    );
}

/// Map a journal entry.
///
/// Journal entries can only be created. The lines must balance: debits and
/// credits have to sum to the same amount.
pub fn map(record: &UnifiedRecord, index: &ReferenceIndex) -> MappingResult<Payload> {
    let mut payload = Payload::default();

    if find_existing(index, ReferenceKind::JournalEntries, record, EXISTING)?.is_some() {
        return Err(MappingError::invalid(
            "Update is not supported for JournalEntries. Skipping it.",
        ));
    }

    map_currency(record, index, &mut payload)?;

    let lines = record
        .list("lineItems")
        .iter()
        .map(|line| journal_entry_line(line, index))
        .collect::<MappingResult<Vec<_>>>()?;

    let balance = Amount::checked_sum(lines.iter().map(|line| line.signed_amount()))
        .ok_or_else(|| MappingError::invalid("amount out of range"))?;
    if !balance.is_zero() {
        return Err(MappingError::invalid(format!(
            "The Journal is out of balance by {}. Please check that the Amount is correct for each line",
            balance
        )));
    }

    payload.set("Line", lines)?;
    payload.copy_fields(record, FIELDS);

    Ok(payload)
}
