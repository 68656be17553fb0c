use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::intent::{Intent, SlotValue};
use super::observation::Observation;

pub type Slots = IndexMap<&'static str, Option<SlotValue>>;

/// Slot-filling progress for one intent. The key set is fixed at creation.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentState {
    intent: Intent,
    slots: Slots,
}

/// Canonical view handed to the understanding collaborator.
#[derive(Serialize)]
struct StateView<'a> {
    intent: Intent,
    slots: &'a Slots,
}

impl IntentState {
    /// New tracker with every slot from the static table unset.
    pub fn initialize(intent: Intent) -> Self {
        let slots = intent.slots().iter().map(|name| (*name, None)).collect();
        Self { intent, slots }
    }

    pub fn intent(&self) -> Intent {
        self.intent
    }

    pub fn slots(&self) -> &Slots {
        &self.slots
    }

    pub fn get(&self, slot: &str) -> Option<&SlotValue> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn is_set(&self, slot: &str) -> bool {
        self.get(slot).is_some()
    }

    pub fn has_slot(&self, slot: &str) -> bool {
        self.slots.contains_key(slot)
    }

    pub fn is_complete(&self) -> bool {
        self.slots.values().all(Option::is_some)
    }

    /// Applies the observation's writes in order. Slots outside the static
    /// table are dropped so the key set never changes.
    pub fn merge(&mut self, observation: &Observation) {
        for (slot, value) in &observation.writes {
            match self.slots.get_mut(slot.as_str()) {
                Some(current) => *current = value.clone(),
                None => debug!("{} has no slot '{}', ignoring write", self.intent, slot),
            }
        }
    }

    /// Every statically defined slot, unset ones as `null`.
    pub fn serialize(&self) -> Value {
        serde_json::to_value(StateView { intent: self.intent, slots: &self.slots })
            .unwrap_or(Value::Null)
    }

    pub fn to_payload(&self) -> String {
        serde_json::to_string_pretty(&StateView { intent: self.intent, slots: &self.slots })
            .unwrap_or_default()
    }
}

/// Active intents in first-seen order, at most one per intent.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    states: IndexMap<Intent, IntentState>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges into the existing tracker for the intent, creating it first if
    /// needed.
    pub fn merge(&mut self, observation: &Observation) {
        self.states
            .entry(observation.intent)
            .or_insert_with(|| {
                debug!("Tracking new intent {}", observation.intent);
                IntentState::initialize(observation.intent)
            })
            .merge(observation);
    }

    pub fn get(&self, intent: Intent) -> Option<&IntentState> {
        self.states.get(&intent)
    }

    /// Drops a resolved intent while keeping the order of the rest.
    pub fn remove(&mut self, intent: Intent) -> Option<IntentState> {
        self.states.shift_remove(&intent)
    }

    pub fn iter(&self) -> impl Iterator<Item = &IntentState> {
        self.states.values()
    }

    pub fn intents(&self) -> Vec<Intent> {
        self.states.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }
}
