use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{
    amount::Amount,
    error::{MappingError, MappingResult},
};

/// A record in the unified accounting schema.
///
/// Records are read-only once they have been handed to a mapper. Mappers that
/// need to rename fields (for example treating a line's project as its
/// customer) work on a copy produced by [`UnifiedRecord::with_aliases`].
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct UnifiedRecord(Map<String, Value>);

impl UnifiedRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Get the raw value of a field. Explicit nulls are treated the same as a
    /// missing field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|value| !value.is_null())
    }

    /// Get a field as text.
    ///
    /// Numbers are converted to their string form since identifiers are
    /// frequently sent as integers. Empty strings count as absent.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(value) if value.is_empty() => None,
            Value::String(value) => Some(value.clone()),
            Value::Number(value) => Some(value.to_string()),
            _ => None,
        }
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Get a numeric field.
    ///
    /// # Returns
    ///
    /// `Ok(None)` if the field is absent, or an [`MappingError::InvalidInput`]
    /// if it is present but not numeric.
    pub fn amount(&self, key: &str) -> MappingResult<Option<Amount>> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => Amount::from_json(value).map(Some).ok_or_else(|| {
                MappingError::invalid(format!("Invalid numeric value {} for {}", value, key))
            }),
        }
    }

    /// Get a nested list of records, such as `lineItems`. Entries that are not
    /// objects are ignored.
    pub fn list(&self, key: &str) -> Vec<UnifiedRecord> {
        match self.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_object().cloned().map(UnifiedRecord))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Produce a copy of the record where each `(from, to)` pair has the value
    /// of `from` written to `to`. A missing `from` clears `to`.
    pub fn with_aliases(&self, aliases: &[(&str, &str)]) -> Self {
        let mut copy = self.clone();

        for (from, to) in aliases {
            match self.get(from) {
                Some(value) => {
                    copy.0.insert((*to).to_owned(), value.clone());
                }
                None => {
                    copy.0.remove(*to);
                }
            }
        }

        copy
    }

    /// The identifier the upstream pipeline uses to correlate results. This is
    /// the record's `externalId`, falling back to its `id`.
    pub fn external_id(&self) -> Option<String> {
        self.text("externalId").or_else(|| self.text("id"))
    }

    pub fn id(&self) -> Option<String> {
        self.text("id")
    }
}

impl From<Map<String, Value>> for UnifiedRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl TryFrom<Value> for UnifiedRecord {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(other),
        }
    }
}
