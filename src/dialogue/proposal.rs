use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::intent::Intent;
use super::registry::IntentState;
use crate::error::ProposalError;

/// Next-step proposal from the understanding collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionProposal {
    RequestInfo { slot: String },
    Confirmation { intent: String },
    CheckInfo { intent: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProposalViolation {
    #[error("parameter is empty or a null sentinel")]
    EmptyParameter,
    #[error("check_info cannot be proposed")]
    NotProposable,
    #[error("'{0}' is not a slot of this intent")]
    UnknownSlot(String),
    #[error("slot '{0}' is already set")]
    SlotAlreadySet(String),
    #[error("slots still unset: {0:?}")]
    StateIncomplete(Vec<String>),
    #[error("get_beer_info only asks for 'name', not '{0}'")]
    NameOnly(String),
    #[error("confirmation targets '{found}' while deciding {expected}")]
    WrongTarget { expected: Intent, found: String },
}

#[derive(Deserialize)]
struct RawProposal {
    action: String,
    #[serde(default)]
    parameter: Value,
}

impl ActionProposal {
    pub fn parameter(&self) -> &str {
        match self {
            ActionProposal::RequestInfo { slot } => slot,
            ActionProposal::Confirmation { intent } | ActionProposal::CheckInfo { intent } => intent,
        }
    }

    /// Parses an extracted JSON fragment. An array yields its first element.
    pub fn parse(fragment: &str) -> Result<Self, ProposalError> {
        let value: Value = serde_json::from_str(fragment)
            .map_err(|e| ProposalError::Malformed(format!("{}: {}", e, fragment)))?;
        let value = match value {
            Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
            other => other,
        };
        let raw: RawProposal = serde_json::from_value(value)
            .map_err(|e| ProposalError::Malformed(e.to_string()))?;

        let parameter = match raw.parameter {
            Value::Null => String::new(),
            Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        };

        match raw.action.trim() {
            "request_info" => Ok(ActionProposal::RequestInfo { slot: parameter }),
            "confirmation" => Ok(ActionProposal::Confirmation { intent: parameter }),
            "check_info" => Ok(ActionProposal::CheckInfo { intent: parameter }),
            other => Err(ProposalError::Malformed(format!("unknown action '{}'", other))),
        }
    }

    /// Checks the proposal against the slot-completeness rules for `state`.
    pub fn validate(&self, state: &IntentState) -> Result<(), ProposalViolation> {
        let parameter = self.parameter();
        if parameter.is_empty()
            || parameter.eq_ignore_ascii_case("null")
            || parameter.eq_ignore_ascii_case("none")
        {
            return Err(ProposalViolation::EmptyParameter);
        }

        match self {
            ActionProposal::CheckInfo { .. } => Err(ProposalViolation::NotProposable),
            ActionProposal::RequestInfo { slot } => {
                if state.intent() == Intent::GetBeerInfo && slot != "name" {
                    return Err(ProposalViolation::NameOnly(slot.clone()));
                }
                if !state.has_slot(slot) {
                    return Err(ProposalViolation::UnknownSlot(slot.clone()));
                }
                if state.is_set(slot) {
                    return Err(ProposalViolation::SlotAlreadySet(slot.clone()));
                }
                Ok(())
            }
            ActionProposal::Confirmation { intent } => {
                if intent != state.intent().label() {
                    return Err(ProposalViolation::WrongTarget {
                        expected: state.intent(),
                        found: intent.clone(),
                    });
                }
                let ready = match state.intent() {
                    Intent::GetBeerInfo => state.is_set("name"),
                    _ => state.is_complete(),
                };
                if ready {
                    Ok(())
                } else {
                    Err(ProposalViolation::StateIncomplete(missing_slots(state)))
                }
            }
        }
    }
}

fn missing_slots(state: &IntentState) -> Vec<String> {
    state
        .slots()
        .iter()
        .filter(|(_, v)| v.is_none())
        .map(|(k, _)| k.to_string())
        .collect()
}
