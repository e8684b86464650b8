use serde::Serialize;
use tracing::trace;

use crate::reference::{ReferenceEntity, ReferenceIndex, ReferenceKind};

use super::{
    error::{MappingError, MappingResult},
    record::UnifiedRecord,
};

/// A QuickBooks reference, e.g. the value of `CustomerRef`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Reference {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Reference {
    /// A reference carrying only a value.
    pub fn value<S: Into<String>>(value: S) -> Self {
        Self {
            value: value.into(),
            name: None,
        }
    }
}

/// Resolves a record's `xId` / `xName` style fields to a reference entity.
///
/// Matchers are `(record field, entity field)` pairs tried in order. The first
/// matcher whose record field is present and finds an entity wins, so an id
/// match always takes precedence over a name match listed after it.
#[derive(Clone, Copy, Debug)]
pub struct Lookup {
    pub kind: ReferenceKind,
    pub label: &'static str,
    pub matchers: &'static [(&'static str, &'static str)],
}

impl Lookup {
    pub const fn new(
        kind: ReferenceKind,
        label: &'static str,
        matchers: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self {
            kind,
            label,
            matchers,
        }
    }

    /// Whether the record carries any of the fields this lookup matches on.
    pub fn is_present(&self, record: &UnifiedRecord) -> bool {
        self.matchers
            .iter()
            .any(|(record_field, _)| record.text(record_field).is_some())
    }

    /// Find the referenced entity without treating a miss as an error.
    pub fn find<'a>(
        &self,
        index: &'a ReferenceIndex,
        record: &UnifiedRecord,
    ) -> Option<&'a ReferenceEntity> {
        self.matchers
            .iter()
            .find_map(|(record_field, entity_field)| {
                let value = record.text(record_field)?;

                index.find(self.kind, entity_field, &value)
            })
    }

    /// Find the referenced entity, treating it as required when present.
    ///
    /// # Returns
    ///
    /// `Ok(None)` if the record does not reference this kind at all, or a
    /// [`MappingError::RecordNotFound`] if it does but nothing matched.
    pub fn resolve<'a>(
        &self,
        index: &'a ReferenceIndex,
        record: &UnifiedRecord,
    ) -> MappingResult<Option<&'a ReferenceEntity>> {
        match self.find(index, record) {
            Some(entity) => {
                trace!(kind = %self.kind, id = ?entity.id(), "Resolved reference.");

                Ok(Some(entity))
            }
            None if self.is_present(record) => Err(self.not_found(record)),
            None => Ok(None),
        }
    }

    /// Like [`Lookup::resolve`] but also fails when the record has no fields
    /// for this lookup.
    pub fn require<'a>(
        &self,
        index: &'a ReferenceIndex,
        record: &UnifiedRecord,
    ) -> MappingResult<&'a ReferenceEntity> {
        self.find(index, record)
            .ok_or_else(|| self.not_found(record))
    }

    pub fn not_found(&self, record: &UnifiedRecord) -> MappingError {
        let searched = self
            .matchers
            .iter()
            .map(|(record_field, _)| {
                format!(
                    "{}={}",
                    record_field,
                    record.text(record_field).unwrap_or_else(|| "None".to_owned())
                )
            })
            .collect::<Vec<_>>()
            .join(" / ");

        MappingError::not_found(format!(
            "{} could not be found in QuickBooks with {}",
            self.label, searched
        ))
    }

    /// The reference to a resolved entity, named by its natural key.
    pub fn reference(&self, entity: &ReferenceEntity) -> Reference {
        Reference {
            value: entity.id().unwrap_or_default(),
            name: entity.text(self.kind.natural_key()),
        }
    }

    /// Resolve and convert to a reference in one step.
    pub fn resolve_reference(
        &self,
        index: &ReferenceIndex,
        record: &UnifiedRecord,
    ) -> MappingResult<Option<Reference>> {
        Ok(self
            .resolve(index, record)?
            .map(|entity| self.reference(entity)))
    }
}

pub const ACCOUNT: Lookup = Lookup::new(
    ReferenceKind::Accounts,
    "Account",
    &[("accountId", "Id"), ("accountName", "Name")],
);

pub const BILL: Lookup = Lookup::new(
    ReferenceKind::Bills,
    "Bill",
    &[("billId", "Id"), ("billNumber", "DocNumber")],
);

pub const CLASS: Lookup = Lookup::new(
    ReferenceKind::Classes,
    "Class",
    &[("classId", "Id"), ("className", "Name")],
);

pub const CURRENCY: Lookup = Lookup::new(
    ReferenceKind::Currencies,
    "Currency",
    &[("currencyId", "Id"), ("currency", "Code"), ("currencyName", "Name")],
);

pub const CUSTOMER: Lookup = Lookup::new(
    ReferenceKind::Customers,
    "Customer",
    &[("customerId", "Id"), ("customerName", "DisplayName")],
);

pub const CUSTOMER_TYPE: Lookup = Lookup::new(
    ReferenceKind::CustomerTypes,
    "Customer Type",
    &[("categoryId", "Id"), ("categoryName", "Name")],
);

pub const DEPARTMENT: Lookup = Lookup::new(
    ReferenceKind::Departments,
    "Department",
    &[("departmentId", "Id"), ("departmentName", "Name")],
);

pub const INVOICE: Lookup = Lookup::new(
    ReferenceKind::Invoices,
    "Invoice",
    &[("invoiceId", "Id"), ("invoiceNumber", "DocNumber")],
);

pub const ITEM: Lookup = Lookup::new(
    ReferenceKind::Items,
    "Item",
    &[("itemId", "Id"), ("itemName", "Name")],
);

pub const PARENT_CUSTOMER: Lookup = Lookup::new(
    ReferenceKind::Customers,
    "Parent Customer",
    &[("parentId", "Id"), ("parentName", "DisplayName")],
);

pub const PAYMENT_METHOD: Lookup = Lookup::new(
    ReferenceKind::PaymentMethods,
    "Payment Method",
    &[("paymentMethod", "Name")],
);

/// A project on a line is the customer the line is billed to.
pub const PROJECT: Lookup = Lookup::new(
    ReferenceKind::Customers,
    "Project",
    &[("projectId", "Id"), ("projectName", "DisplayName")],
);

/// Record aliases that turn a line's project into its customer.
pub const PROJECT_ALIASES: &[(&str, &str)] =
    &[("projectId", "customerId"), ("projectName", "customerName")];

pub const TAX_CODE: Lookup = Lookup::new(
    ReferenceKind::TaxCodes,
    "Tax Code",
    &[("taxCodeId", "Id"), ("taxCode", "Name")],
);

pub const VENDOR: Lookup = Lookup::new(
    ReferenceKind::Vendors,
    "Vendor",
    &[("vendorId", "Id"), ("vendorName", "DisplayName")],
);

/// Matches a record against the entity it would update.
#[derive(Clone, Copy, Debug)]
pub struct ExistingMatcher {
    pub record_field: &'static str,
    pub entity_field: &'static str,
    /// Fail instead of falling through to the next matcher when the record
    /// field is present but matches nothing.
    pub required_if_present: bool,
}

impl ExistingMatcher {
    pub const fn required(record_field: &'static str, entity_field: &'static str) -> Self {
        Self {
            record_field,
            entity_field,
            required_if_present: true,
        }
    }

    pub const fn optional(record_field: &'static str, entity_field: &'static str) -> Self {
        Self {
            record_field,
            entity_field,
            required_if_present: false,
        }
    }
}

/// Look for an existing entity the record should update.
///
/// Matchers are evaluated in order with early exit. A matcher marked
/// `required_if_present` whose field is set but finds nothing aborts with
/// [`MappingError::RecordNotFound`].
pub fn find_existing<'a>(
    index: &'a ReferenceIndex,
    kind: ReferenceKind,
    record: &UnifiedRecord,
    matchers: &[ExistingMatcher],
) -> MappingResult<Option<&'a ReferenceEntity>> {
    for matcher in matchers {
        let value = match record.text(matcher.record_field) {
            Some(value) => value,
            None => continue,
        };

        match index.find(kind, matcher.entity_field, &value) {
            Some(existing) => {
                trace!(
                    %kind,
                    id = ?existing.id(),
                    field = matcher.record_field,
                    "Found existing entity."
                );

                return Ok(Some(existing));
            }
            None if matcher.required_if_present => {
                return Err(MappingError::not_found(format!(
                    "Record {}={} not found in QuickBooks",
                    matcher.record_field, value
                )));
            }
            None => (),
        }
    }

    Ok(None)
}

#[cfg(test)]
mod test {
    use serde_json::{json, Value};

    use super::*;

    fn record(value: Value) -> UnifiedRecord {
        UnifiedRecord::try_from(value).expect("record fixture should be an object")
    }

    fn customers() -> ReferenceIndex {
        ReferenceIndex::default().with(
            ReferenceKind::Customers,
            vec![
                json!({"Id": "5", "DisplayName": "Acme", "SyncToken": "0"}),
                json!({"Id": "6", "DisplayName": "Globex", "SyncToken": "2"}),
            ],
        )
    }

    #[test]
    fn id_wins_over_name() {
        let index = customers();
        let record = record(json!({"customerId": "6", "customerName": "Acme"}));

        let want = Reference {
            value: "6".to_owned(),
            name: Some("Globex".to_owned()),
        };

        assert_eq!(
            Some(want),
            CUSTOMER.resolve_reference(&index, &record).expect("resolve customer")
        );
    }

    #[test]
    fn currency_by_name() {
        let index = ReferenceIndex::default().with(
            ReferenceKind::Currencies,
            vec![
                json!({"Id": "1", "Code": "USD", "Name": "United States Dollar"}),
                json!({"Id": "2", "Code": "EUR", "Name": "Euro"}),
            ],
        );
        let record = record(json!({"currencyName": "Euro"}));

        let want = Reference {
            value: "2".to_owned(),
            name: Some("EUR".to_owned()),
        };

        assert_eq!(
            Some(want),
            CURRENCY.resolve_reference(&index, &record).expect("resolve currency")
        );
    }

    #[test]
    fn falls_back_to_name_when_id_misses() {
        let index = customers();
        let record = record(json!({"customerId": "404", "customerName": "Acme"}));

        let found = CUSTOMER.resolve(&index, &record).expect("resolve customer");

        assert_eq!(Some("5".to_owned()), found.and_then(ReferenceEntity::id));
    }

    #[test]
    fn absent_reference_is_not_an_error() {
        let index = customers();

        let found = CUSTOMER
            .resolve(&index, &record(json!({"notes": "none"})))
            .expect("resolve absent customer");

        assert!(found.is_none());
    }

    #[test]
    fn present_unmatched_reference_is_not_found() {
        let index = customers();

        let err = CUSTOMER
            .resolve(&index, &record(json!({"customerName": "Ghost"})))
            .expect_err("unknown customer");

        assert!(matches!(err, MappingError::RecordNotFound(_)));
        assert!(err.to_string().contains("Ghost"));
    }

    #[test]
    fn require_fails_when_absent() {
        let index = ReferenceIndex::default();

        let err = BILL.require(&index, &record(json!({}))).expect_err("missing bill");

        assert!(matches!(err, MappingError::RecordNotFound(_)));
    }

    #[test]
    fn existing_required_id_miss_aborts() {
        let index = customers();
        let matchers = [
            ExistingMatcher::required("id", "Id"),
            ExistingMatcher::optional("fullName", "DisplayName"),
        ];

        let err = find_existing(
            &index,
            ReferenceKind::Customers,
            &record(json!({"id": "99", "fullName": "Acme"})),
            &matchers,
        )
        .expect_err("required id miss");

        assert!(matches!(err, MappingError::RecordNotFound(_)));
    }

    #[test]
    fn existing_optional_miss_falls_through() {
        let index = customers();
        let matchers = [
            ExistingMatcher::optional("fullName", "DisplayName"),
            ExistingMatcher::optional("id", "Id"),
        ];

        let found = find_existing(
            &index,
            ReferenceKind::Customers,
            &record(json!({"id": 6, "fullName": "Nobody"})),
            &matchers,
        )
        .expect("find existing");

        assert_eq!(Some("6".to_owned()), found.and_then(ReferenceEntity::id));
    }
}
