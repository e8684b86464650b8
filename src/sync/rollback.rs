use std::collections::HashMap;

use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::client::{fault_message, BatchItemRequest, DynQuickbooksApi, ItemOutcome, Operation};

/// A record QuickBooks applied in a batch that has to be undone.
#[derive(Clone, Debug, PartialEq)]
pub struct Applied {
    pub entity_type: String,
    pub id: String,
    pub data: Value,
}

/// How undoing one applied record went.
#[derive(Clone, Debug, PartialEq)]
pub enum RollbackResult {
    Deleted,
    Failed(String),
}

/// Delete every applied record in one batch.
///
/// The results line up with `applied`. Nothing is retried: a record that
/// cannot be deleted is reported as [`RollbackResult::Failed`] and left for a
/// person to clean up.
#[instrument(skip_all, fields(records = applied.len()))]
pub async fn compensate(api: &DynQuickbooksApi, applied: &[Applied]) -> Vec<RollbackResult> {
    if applied.is_empty() {
        return Vec::new();
    }

    let items = applied
        .iter()
        .enumerate()
        .filter_map(|(position, record)| {
            let entity_type = rollback_entity_type(&record.entity_type)?;

            Some(BatchItemRequest::new(
                format!("bid{}", position),
                Operation::Delete,
                entity_type,
                record.data.clone(),
            ))
        })
        .collect::<Vec<_>>();

    info!(deletes = items.len(), "Deleting records applied in failed batch.");

    let submitted = if items.is_empty() {
        Ok(Vec::new())
    } else {
        api.batch(&items).await
    };

    let mut responses = match submitted {
        Ok(responses) => responses
            .into_iter()
            .filter_map(|response| response.b_id.clone().map(|b_id| (b_id, response)))
            .collect::<HashMap<_, _>>(),
        Err(error) => {
            error!(?error, "Rollback batch failed. Applied records were not deleted.");

            return applied
                .iter()
                .map(|_| RollbackResult::Failed(format!("Rollback request failed: {}", error)))
                .collect();
        }
    };

    applied
        .iter()
        .enumerate()
        .map(|(position, record)| {
            let result = match responses.remove(&format!("bid{}", position)) {
                Some(response) => match response.outcome {
                    ItemOutcome::Fault(fault) => RollbackResult::Failed(fault_message(&fault)),
                    _ => RollbackResult::Deleted,
                },
                None if rollback_entity_type(&record.entity_type).is_none() => {
                    RollbackResult::Failed(format!(
                        "{} records cannot be deleted",
                        record.entity_type
                    ))
                }
                None => RollbackResult::Failed("No response to rollback delete".to_owned()),
            };

            match &result {
                RollbackResult::Deleted => {
                    warn!(entity_type = %record.entity_type, id = %record.id, "Rolled back record.")
                }
                RollbackResult::Failed(reason) => error!(
                    entity_type = %record.entity_type,
                    id = %record.id,
                    %reason,
                    "Failed to roll back record."
                ),
            }

            result
        })
        .collect()
}

/// The batch entity key to delete a record under. Only entity types the
/// coordinator can create are deletable.
fn rollback_entity_type(entity_type: &str) -> Option<&'static str> {
    crate::mapping::EntityType::ALL
        .iter()
        .map(|entity| entity.record_type())
        .find(|record_type| *record_type == entity_type)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn known_entity_types_are_deletable() {
        assert_eq!(Some("Invoice"), rollback_entity_type("Invoice"));
        assert_eq!(Some("Payment"), rollback_entity_type("Payment"));
        assert_eq!(None, rollback_entity_type("Widget"));
    }
}
