use std::{collections::HashMap, fmt};

use tracing::{debug, error, info, info_span, instrument, warn, Instrument};
use uuid::Uuid;

use crate::{
    client::{
        BatchItemRequest, BatchItemResponse, ClientError, DynQuickbooksApi, ItemOutcome,
        Operation, MAX_BATCH_SIZE,
    },
    mapping::{EntityType, UnifiedRecord},
    reference::{self, ReferenceIndex, ReferenceRequest},
};

use super::{
    rollback::{self, Applied, RollbackResult},
    state::{ErrorKind, RecordState, StateError},
};

/// The phases a batch moves through.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BatchPhase {
    ReferenceFetch,
    Mapping,
    Submitting,
    Reconciling,
    RollingBack,
    Done,
}

impl fmt::Display for BatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ReferenceFetch => "reference_fetch",
            Self::Mapping => "mapping",
            Self::Submitting => "submitting",
            Self::Reconciling => "reconciling",
            Self::RollingBack => "rolling_back",
            Self::Done => "done",
        };

        f.write_str(name)
    }
}

/// Where a record stands while its batch is processed.
#[derive(Clone, Debug, PartialEq)]
enum Outcome {
    Failed(StateError),
    Applied { applied: Applied, is_updated: bool },
}

/// A mapped record that was put into the batch request.
struct Submitted {
    position: usize,
    is_updated: bool,
}

/// A service object writing unified records to QuickBooks.
#[derive(Clone)]
pub struct SyncService {
    api: DynQuickbooksApi,
}

impl SyncService {
    pub fn new(api: DynQuickbooksApi) -> Self {
        Self { api }
    }

    /// Fetch the reference data a set of records needs.
    ///
    /// Only the entities the records actually mention are fetched. The result
    /// is a fresh snapshot and must not outlive the batch it was fetched for.
    pub async fn get_batch_reference_data(
        &self,
        entity: EntityType,
        records: &[UnifiedRecord],
    ) -> Result<ReferenceIndex, ClientError> {
        let mut request = ReferenceRequest::default();
        for record in records {
            entity.collect_references(record, &mut request);
        }

        if request.is_empty() {
            return Ok(ReferenceIndex::default());
        }

        reference::fetch(&self.api, &request).await
    }

    /// Map, submit and reconcile records of one stream.
    ///
    /// Records are processed in batches of at most [`MAX_BATCH_SIZE`], one
    /// batch at a time. The returned states line up with `records`.
    #[instrument(skip(self, records), fields(records = records.len()))]
    pub async fn map_and_reconcile(
        &self,
        entity: EntityType,
        records: &[UnifiedRecord],
    ) -> Vec<RecordState> {
        let mut states = Vec::with_capacity(records.len());

        for batch in records.chunks(MAX_BATCH_SIZE) {
            let batch_id = Uuid::new_v4();
            let span = info_span!("batch", %batch_id, size = batch.len());

            states.extend(self.process_batch(entity, batch).instrument(span).await);
        }

        states
    }

    async fn process_batch(&self, entity: EntityType, batch: &[UnifiedRecord]) -> Vec<RecordState> {
        debug!(phase = %BatchPhase::ReferenceFetch, "Fetching reference data.");

        let index = match self.get_batch_reference_data(entity, batch).await {
            Ok(index) => index,
            Err(error) => {
                error!(?error, "Failed to fetch reference data. Failing batch.");

                let failure = StateError::new(
                    ErrorKind::TransportError,
                    format!("Failed to fetch reference data: {}", error),
                );

                return batch
                    .iter()
                    .map(|record| RecordState::failure(record, failure.clone()))
                    .collect();
            }
        };

        debug!(phase = %BatchPhase::Mapping, references = index.len(), "Mapping records.");

        let mut outcomes: Vec<Option<Outcome>> = vec![None; batch.len()];
        let mut items = Vec::new();
        let mut submitted = Vec::new();

        for (position, record) in batch.iter().enumerate() {
            match entity.map(record, &index) {
                Ok(payload) => {
                    let is_updated = payload.is_update();
                    let operation = if is_updated {
                        Operation::Update
                    } else {
                        Operation::Create
                    };

                    items.push(BatchItemRequest::new(
                        format!("bid{}", items.len()),
                        operation,
                        entity.record_type(),
                        payload.into_value(),
                    ));
                    submitted.push(Submitted {
                        position,
                        is_updated,
                    });
                }
                Err(error) => {
                    warn!(
                        %entity,
                        position,
                        external_id = ?record.external_id(),
                        %error,
                        "Failed to map record."
                    );

                    outcomes[position] = Some(Outcome::Failed(StateError::from(&error)));
                }
            }
        }

        if !items.is_empty() {
            self.submit(&items, &submitted, &mut outcomes).await;
        }

        debug!(phase = %BatchPhase::Done, "Batch processed.");

        batch
            .iter()
            .zip(outcomes)
            .map(|(record, outcome)| project(record, outcome))
            .collect()
    }

    async fn submit(
        &self,
        items: &[BatchItemRequest],
        submitted: &[Submitted],
        outcomes: &mut [Option<Outcome>],
    ) {
        info!(phase = %BatchPhase::Submitting, items = items.len(), "Submitting batch.");

        let responses = match self.api.batch(items).await {
            Ok(responses) => responses,
            Err(error) => {
                error!(?error, "Batch request failed.");

                let failure = StateError::from(&error);
                for record in submitted {
                    outcomes[record.position] = Some(Outcome::Failed(failure.clone()));
                }

                return;
            }
        };

        debug!(phase = %BatchPhase::Reconciling, responses = responses.len(), "Reconciling batch.");

        let mut responses = responses
            .into_iter()
            .filter_map(|response| response.b_id.clone().map(|b_id| (b_id, response)))
            .collect::<HashMap<_, _>>();

        let mut failed = false;
        for (item, record) in items.iter().zip(submitted) {
            let outcome = reconcile(responses.remove(&item.b_id), record.is_updated);

            if let Outcome::Failed(failure) = &outcome {
                error!(b_id = %item.b_id, message = %failure.message, "Batch item failed.");
                failed = true;
            }

            outcomes[record.position] = Some(outcome);
        }

        if failed {
            self.roll_back(submitted, outcomes).await;
        }
    }

    /// Delete every record of a failed batch that QuickBooks did apply, and
    /// report them as failed.
    async fn roll_back(&self, submitted: &[Submitted], outcomes: &mut [Option<Outcome>]) {
        let applied = submitted
            .iter()
            .filter_map(|record| match &outcomes[record.position] {
                Some(Outcome::Applied { applied, .. }) => Some((record.position, applied.clone())),
                _ => None,
            })
            .collect::<Vec<_>>();

        if applied.is_empty() {
            return;
        }

        warn!(
            phase = %BatchPhase::RollingBack,
            records = applied.len(),
            "Batch partially failed. Rolling back."
        );

        let records = applied
            .iter()
            .map(|(_, applied)| applied.clone())
            .collect::<Vec<_>>();
        let results = rollback::compensate(&self.api, &records).await;

        for ((position, applied), result) in applied.into_iter().zip(results) {
            let failure = match result {
                RollbackResult::Deleted => StateError::new(
                    ErrorKind::RolledBack,
                    format!(
                        "{} {} was deleted because another record in its batch failed.",
                        applied.entity_type, applied.id
                    ),
                ),
                RollbackResult::Failed(reason) => StateError::new(
                    ErrorKind::RollbackFailed,
                    format!(
                        "Another record in the batch failed and {} {} could not be deleted: {}",
                        applied.entity_type, applied.id, reason
                    ),
                ),
            }
            .with_details(applied.data);

            outcomes[position] = Some(Outcome::Failed(failure));
        }
    }
}

fn reconcile(response: Option<BatchItemResponse>, is_updated: bool) -> Outcome {
    let response = match response {
        Some(response) => response,
        None => {
            return Outcome::Failed(StateError::new(
                ErrorKind::RemoteFault,
                "QuickBooks did not respond to this record.",
            ))
        }
    };

    let message = response.fault_message();
    match response.outcome {
        ItemOutcome::Fault(fault) => Outcome::Failed(
            StateError::new(ErrorKind::RemoteFault, message.unwrap_or_default())
                .with_details(fault),
        ),
        ItemOutcome::Entity { entity_type, data } => {
            let id = data.get("Id").and_then(|id| id.as_str()).map(str::to_owned);

            match id {
                Some(id) => Outcome::Applied {
                    applied: Applied {
                        entity_type,
                        id,
                        data,
                    },
                    is_updated,
                },
                None => Outcome::Failed(
                    StateError::new(ErrorKind::RemoteFault, "QuickBooks response carried no Id.")
                        .with_details(data),
                ),
            }
        }
        ItemOutcome::Unrecognized(raw) => Outcome::Failed(
            StateError::new(ErrorKind::RemoteFault, "Unrecognized batch response item.")
                .with_details(raw),
        ),
    }
}

fn project(record: &UnifiedRecord, outcome: Option<Outcome>) -> RecordState {
    match outcome {
        Some(Outcome::Applied {
            applied,
            is_updated,
        }) => RecordState::success(record, applied.id, is_updated),
        Some(Outcome::Failed(error)) => RecordState::failure(record, error),
        None => RecordState::failure(
            record,
            StateError::new(ErrorKind::TransportError, "Record was never submitted."),
        ),
    }
}
