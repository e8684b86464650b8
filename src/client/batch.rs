use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

/// One item of a `/batch` request.
///
/// Serializes as `{"bId": ..., "operation": ..., "<EntityType>": payload}`.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchItemRequest {
    pub b_id: String,
    pub operation: Operation,
    pub entity_type: &'static str,
    pub payload: Value,
}

impl BatchItemRequest {
    pub fn new(
        b_id: String,
        operation: Operation,
        entity_type: &'static str,
        payload: Value,
    ) -> Self {
        Self {
            b_id,
            operation,
            entity_type,
            payload,
        }
    }
}

impl Serialize for BatchItemRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("bId", &self.b_id)?;
        map.serialize_entry("operation", &self.operation)?;
        map.serialize_entry(self.entity_type, &self.payload)?;
        map.end()
    }
}

/// What a single batch item came back as.
#[derive(Clone, Debug, PartialEq)]
pub enum ItemOutcome {
    /// The item was rejected. Holds the `Fault` object.
    Fault(Value),
    /// The item was applied. Holds the entity QuickBooks returned.
    Entity { entity_type: String, data: Value },
    /// Neither a fault nor an entity.
    Unrecognized(Value),
}

/// One item of a `/batch` response.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(from = "Map<String, Value>")]
pub struct BatchItemResponse {
    pub b_id: Option<String>,
    pub outcome: ItemOutcome,
}

impl From<Map<String, Value>> for BatchItemResponse {
    fn from(mut raw: Map<String, Value>) -> Self {
        let b_id = match raw.remove("bId") {
            Some(Value::String(b_id)) => Some(b_id),
            _ => None,
        };

        let outcome = if let Some(fault) = raw.remove("Fault") {
            ItemOutcome::Fault(fault)
        } else {
            let entity = raw
                .iter()
                .find(|(_, value)| value.is_object())
                .map(|(key, _)| key.clone());

            match entity.and_then(|key| raw.remove(&key).map(|data| (key, data))) {
                Some((entity_type, data)) => ItemOutcome::Entity { entity_type, data },
                None => ItemOutcome::Unrecognized(Value::Object(raw)),
            }
        };

        Self { b_id, outcome }
    }
}

impl BatchItemResponse {
    /// The concatenated messages of a faulted item, or `None` for other
    /// outcomes.
    pub fn fault_message(&self) -> Option<String> {
        match &self.outcome {
            ItemOutcome::Fault(fault) => Some(fault_message(fault)),
            _ => None,
        }
    }
}

/// Render a QuickBooks `Fault` object as a readable message.
pub fn fault_message(fault: &Value) -> String {
    let messages = fault
        .get("Error")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .map(|error| {
                    let message = error.get("Message").and_then(Value::as_str);
                    let detail = error.get("Detail").and_then(Value::as_str);

                    match (message, detail) {
                        (Some(message), Some(detail)) => format!("{}: {}", message, detail),
                        (Some(text), None) | (None, Some(text)) => text.to_owned(),
                        (None, None) => error.to_string(),
                    }
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    if messages.is_empty() {
        fault.to_string()
    } else {
        messages.join("; ")
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct BatchRequest<'a> {
    #[serde(rename = "BatchItemRequest")]
    pub items: &'a [BatchItemRequest],
}

#[derive(Debug, Deserialize)]
pub(crate) struct BatchResponse {
    #[serde(rename = "BatchItemResponse", default)]
    pub items: Vec<BatchItemResponse>,
}
