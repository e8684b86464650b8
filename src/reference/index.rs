use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::trace;

use super::kind::ReferenceKind;

/// An entity that already exists in QuickBooks.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReferenceEntity(Map<String, Value>);

impl ReferenceEntity {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|value| !value.is_null())
    }

    /// Get a field as text. Numbers are stringified so they compare equal to
    /// identifiers supplied as strings.
    pub fn text(&self, field: &str) -> Option<String> {
        match self.get(field)? {
            Value::String(value) => Some(value.clone()),
            Value::Number(value) => Some(value.to_string()),
            Value::Bool(value) => Some(value.to_string()),
            _ => None,
        }
    }

    pub fn id(&self) -> Option<String> {
        self.text("Id")
    }
}

impl From<Map<String, Value>> for ReferenceEntity {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl TryFrom<Value> for ReferenceEntity {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(other),
        }
    }
}

/// A batch-scoped snapshot of the entities referenced by a set of records.
///
/// The index is built fresh for every batch and is never shared between
/// batches, so any `SyncToken` read from it is as recent as the batch.
#[derive(Clone, Debug, Default)]
pub struct ReferenceIndex {
    collections: HashMap<ReferenceKind, Vec<ReferenceEntity>>,
}

impl ReferenceIndex {
    /// Add entities to a collection. Entities whose `Id` is already present in
    /// the collection are skipped, since the same entity is often returned by
    /// both the id and the name query.
    pub fn insert<I>(&mut self, kind: ReferenceKind, entities: I)
    where
        I: IntoIterator<Item = ReferenceEntity>,
    {
        let collection = self.collections.entry(kind).or_default();

        for entity in entities {
            let duplicate = entity.id().map_or(false, |id| {
                collection
                    .iter()
                    .any(|existing| existing.id().as_deref() == Some(id.as_str()))
            });

            if duplicate {
                trace!(%kind, id = ?entity.id(), "Skipping duplicate reference entity.");
            } else {
                collection.push(entity);
            }
        }
    }

    /// Builder form of [`ReferenceIndex::insert`] taking raw JSON entities.
    /// Values that are not objects are ignored.
    pub fn with(mut self, kind: ReferenceKind, entities: Vec<Value>) -> Self {
        self.insert(
            kind,
            entities
                .into_iter()
                .filter_map(|entity| ReferenceEntity::try_from(entity).ok()),
        );

        self
    }

    pub fn entities(&self, kind: ReferenceKind) -> &[ReferenceEntity] {
        self.collections
            .get(&kind)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Find the first entity of a kind whose field exactly equals the value.
    /// The comparison is case-sensitive.
    pub fn find(&self, kind: ReferenceKind, field: &str, value: &str) -> Option<&ReferenceEntity> {
        self.entities(kind)
            .iter()
            .find(|entity| entity.text(field).as_deref() == Some(value))
    }

    /// The total number of entities across all collections.
    pub fn len(&self) -> usize {
        self.collections.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
