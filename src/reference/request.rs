use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, instrument};

use crate::{
    client::{ClientError, DynQuickbooksApi},
    mapping::{ExistingMatcher, Lookup, UnifiedRecord},
};

use super::{
    index::{ReferenceEntity, ReferenceIndex},
    kind::ReferenceKind,
};

/// The ids and names a batch refers to, grouped by kind and by the entity
/// field they are matched against.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReferenceRequest {
    wanted: BTreeMap<ReferenceKind, BTreeMap<&'static str, BTreeSet<String>>>,
}

impl ReferenceRequest {
    pub fn add(&mut self, kind: ReferenceKind, field: &'static str, value: String) {
        self.wanted
            .entry(kind)
            .or_default()
            .entry(field)
            .or_default()
            .insert(value);
    }

    /// Request every entity the lookup could match for this record.
    pub fn collect(&mut self, record: &UnifiedRecord, lookup: &Lookup) {
        for (record_field, entity_field) in lookup.matchers {
            if let Some(value) = record.text(record_field) {
                self.add(lookup.kind, entity_field, value);
            }
        }
    }

    /// Request the existing entities a record could update.
    pub fn collect_existing(
        &mut self,
        record: &UnifiedRecord,
        kind: ReferenceKind,
        matchers: &[ExistingMatcher],
    ) {
        for matcher in matchers {
            if let Some(value) = record.text(matcher.record_field) {
                self.add(kind, matcher.entity_field, value);
            }
        }
    }

    /// Apply [`ReferenceRequest::collect`] to every entry of a nested list.
    pub fn collect_list(&mut self, record: &UnifiedRecord, key: &str, lookups: &[Lookup]) {
        for line in record.list(key) {
            for lookup in lookups {
                self.collect(&line, lookup);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.wanted.is_empty()
    }

    /// The `where` clauses needed to fetch everything requested.
    ///
    /// There is one clause per kind and field since the query language has no
    /// `OR` across fields.
    pub fn filters(&self) -> Vec<(ReferenceKind, String)> {
        self.wanted
            .iter()
            .flat_map(|(kind, fields)| {
                fields.iter().map(move |(field, values)| {
                    let values = values
                        .iter()
                        .map(|value| format!("'{}'", escape(value)))
                        .collect::<Vec<_>>()
                        .join(",");

                    (*kind, format!("{} in ({})", field, values))
                })
            })
            .collect()
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Fetch the reference data for a request.
///
/// Any failed query fails the whole fetch. A partial index would make lookups
/// report entities as missing when they were simply not loaded.
#[instrument(skip_all, fields(queries = tracing::field::Empty))]
pub async fn fetch(
    api: &DynQuickbooksApi,
    request: &ReferenceRequest,
) -> Result<ReferenceIndex, ClientError> {
    let filters = request.filters();
    tracing::Span::current().record("queries", filters.len());

    let mut index = ReferenceIndex::default();

    for (kind, filter) in filters {
        let entities = api.query(kind.entity_type(), Some(filter.as_str())).await?;

        debug!(%kind, %filter, count = entities.len(), "Fetched reference entities.");

        index.insert(
            kind,
            entities
                .into_iter()
                .filter_map(|entity| ReferenceEntity::try_from(entity).ok()),
        );
    }

    Ok(index)
}

#[cfg(test)]
mod test {
    use serde_json::{json, Value};

    use crate::mapping::{CUSTOMER, ITEM};

    use super::*;

    fn record(value: Value) -> UnifiedRecord {
        UnifiedRecord::try_from(value).expect("record fixture should be an object")
    }

    #[test]
    fn filters_split_by_field() {
        let mut request = ReferenceRequest::default();
        request.collect(&record(json!({"customerId": "5", "customerName": "Acme"})), &CUSTOMER);
        request.collect(&record(json!({"customerName": "Globex"})), &CUSTOMER);

        let want = vec![
            (
                ReferenceKind::Customers,
                "DisplayName in ('Acme','Globex')".to_owned(),
            ),
            (ReferenceKind::Customers, "Id in ('5')".to_owned()),
        ];

        assert_eq!(want, request.filters());
    }

    #[test]
    fn filters_escape_quotes() {
        let mut request = ReferenceRequest::default();
        request.collect(&record(json!({"customerName": "Bob's Burgers"})), &CUSTOMER);

        assert_eq!(
            vec![(
                ReferenceKind::Customers,
                r"DisplayName in ('Bob\'s Burgers')".to_owned()
            )],
            request.filters()
        );
    }

    #[test]
    fn collect_list_reads_lines() {
        let mut request = ReferenceRequest::default();
        request.collect_list(
            &record(json!({"lineItems": [{"itemName": "Widget"}, {"itemId": "9"}]})),
            "lineItems",
            &[ITEM],
        );

        assert_eq!(2, request.filters().len());
    }

    #[test]
    fn empty_request_has_no_filters() {
        let mut request = ReferenceRequest::default();
        request.collect(&record(json!({"notes": "nothing referenced"})), &CUSTOMER);

        assert!(request.is_empty());
        assert!(request.filters().is_empty());
    }
}
