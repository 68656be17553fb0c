use serde::Serialize;
use serde_json::Value;

use super::intent::Intent;
use crate::catalog::query::{BeerList, RatingReceipt};

/// Payload of an accepted confirmation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Resolution {
    Beers(BeerList),
    Rated(RatingReceipt),
    Note(String),
}

/// What the decision engine hands to the response generator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DialogueAction {
    /// Ask for `parameter`; `data` names the intent it belongs to.
    RequestInfo { parameter: String, data: Intent },
    /// The intent executed; `data` is the catalog result.
    Confirmation { parameter: Intent, data: Resolution },
    /// The intent could not be resolved; `data` is its serialized state.
    CheckInfo { parameter: String, data: Value },
    TerminateSystem,
}

impl DialogueAction {
    pub fn kind(&self) -> &'static str {
        match self {
            DialogueAction::RequestInfo { .. } => "request_info",
            DialogueAction::Confirmation { .. } => "confirmation",
            DialogueAction::CheckInfo { .. } => "check_info",
            DialogueAction::TerminateSystem => "terminate_system",
        }
    }
}
