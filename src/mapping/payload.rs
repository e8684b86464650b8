use chrono::DateTime;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::reference::ReferenceEntity;

use super::{error::MappingResult, record::UnifiedRecord};

/// Maps a unified field name to one or more payload field names.
pub type FieldTable = &'static [(&'static str, &'static [&'static str])];

/// The QuickBooks-shaped body produced for a single record.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Payload(Map<String, Value>);

impl Payload {
    /// Set a field on the payload, replacing any existing value.
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> MappingResult<()> {
        self.0.insert(key.to_owned(), serde_json::to_value(value)?);

        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Whether the payload targets an existing entity. The presence of `Id` is
    /// the only thing that decides between an update and a create.
    pub fn is_update(&self) -> bool {
        self.contains("Id")
    }

    /// Add the `{Id, SyncToken, sparse}` block for an existing entity.
    pub fn set_internal_id(&mut self, existing: &ReferenceEntity) -> MappingResult<()> {
        if let Some(id) = existing.get("Id") {
            self.0.insert("Id".to_owned(), id.clone());
        }
        if let Some(sync_token) = existing.get("SyncToken") {
            self.0.insert("SyncToken".to_owned(), sync_token.clone());
        }

        self.set("sparse", true)
    }

    /// Copy fields from the record according to a field table. Absent and null
    /// values are skipped, and timestamps are normalized to RFC 3339.
    pub fn copy_fields(&mut self, record: &UnifiedRecord, table: FieldTable) {
        for (record_key, payload_keys) in table {
            if let Some(value) = record.get(record_key) {
                let value = normalize_datetime(value);

                for payload_key in payload_keys.iter() {
                    self.0.insert((*payload_key).to_owned(), value.clone());
                }
            }
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

fn normalize_datetime(value: &Value) -> Value {
    match value {
        Value::String(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(parsed) => Value::String(parsed.to_rfc3339()),
            Err(_) => value.clone(),
        },
        _ => value.clone(),
    }
}
