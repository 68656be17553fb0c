use serde_json::Value;
use tracing::warn;

use super::intent::{Intent, SlotValue};
use crate::error::ObservationError;

/// One unit from the understanding step: an intent plus the slot writes it
/// carries, in arrival order. `None` means an explicit clear.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub intent: Intent,
    pub writes: Vec<(String, Option<SlotValue>)>,
}

impl Observation {
    pub fn new(intent: Intent) -> Self {
        Self { intent, writes: Vec::new() }
    }

    pub fn with(mut self, slot: &str, value: Option<SlotValue>) -> Self {
        self.writes.push((slot.to_string(), value));
        self
    }

    pub fn with_text(self, slot: &str, value: &str) -> Self {
        self.with(slot, Some(SlotValue::Text(value.to_string())))
    }

    pub fn is_terminate(&self) -> bool {
        self.intent == Intent::TerminateSystem
    }

    /// Parses `{"intent": <label>, <key>: {<slot>: <value>}}`. Every nested
    /// object is read as slot values.
    pub fn from_value(value: &Value) -> Result<Self, ObservationError> {
        let map = value
            .as_object()
            .ok_or_else(|| ObservationError::NotAnObject(value.to_string()))?;

        let label = map
            .get("intent")
            .and_then(Value::as_str)
            .ok_or(ObservationError::MissingIntent)?;
        let mut observation = Observation::new(label.parse()?);

        for (key, nested) in map {
            if key == "intent" {
                continue;
            }
            if let Value::Object(slots) = nested {
                for (slot, raw) in slots {
                    if raw.is_object() {
                        warn!("Ignoring structured value for slot '{}': {}", slot, raw);
                        continue;
                    }
                    observation.writes.push((slot.clone(), normalize(raw)));
                }
            }
        }
        Ok(observation)
    }
}

/// Parses a whole batch: a JSON array of observations, or a single object.
pub fn parse_batch(text: &str) -> Result<Vec<Observation>, ObservationError> {
    let value: Value = serde_json::from_str(text)?;
    match value {
        Value::Array(items) => items.iter().map(Observation::from_value).collect(),
        single => Ok(vec![Observation::from_value(&single)?]),
    }
}

fn is_sentinel(text: &str) -> bool {
    let t = text.trim();
    t.eq_ignore_ascii_case("null") || t.eq_ignore_ascii_case("none")
}

/// The only place sentinel strings are interpreted.
pub fn normalize(raw: &Value) -> Option<SlotValue> {
    match raw {
        Value::Null => None,
        Value::String(s) if is_sentinel(s) => None,
        Value::String(s) => Some(SlotValue::Text(s.clone())),
        Value::Number(n) => n.as_f64().map(SlotValue::Number),
        Value::Bool(b) => Some(SlotValue::Flag(*b)),
        Value::Array(items) => {
            let values: Vec<SlotValue> = items.iter().filter_map(normalize).collect();
            if values.is_empty() {
                None
            } else {
                Some(SlotValue::List(values))
            }
        }
        Value::Object(_) => None,
    }
}
