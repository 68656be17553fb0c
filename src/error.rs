use thiserror::Error;

use crate::dialogue::intent::Intent;
use crate::dialogue::proposal::ProposalViolation;

/// Rejections at the observation boundary.
#[derive(Debug, Error)]
pub enum ObservationError {
    #[error("observation is not a JSON object: {0}")]
    NotAnObject(String),
    #[error("observation has no intent label")]
    MissingIntent,
    #[error("unknown intent label '{0}'")]
    UnknownIntent(String),
    #[error("observation batch is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a collaborator reply was not accepted as a proposal.
#[derive(Debug, Error)]
pub enum ProposalError {
    /// The reply had no parseable proposal object.
    #[error("malformed collaborator output: {0}")]
    Malformed(String),
    /// The proposal parsed but breaks the slot-state rules.
    #[error("invalid action proposal: {0}")]
    Invalid(#[from] ProposalViolation),
}

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("collaborator transport failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("collaborator returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("collaborator is unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("catalog CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("catalog is missing column '{0}'")]
    MissingColumn(&'static str),
    #[error("failed to persist catalog to {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("catalog writer task failed: {0}")]
    Writer(#[from] tokio::task::JoinError),
}

/// Failure of a whole decision turn.
#[derive(Debug, Error)]
pub enum DialogueError {
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
    #[error("no valid proposal for {intent} after {attempts} attempts")]
    AttemptsExhausted { intent: Intent, attempts: u32 },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid prompt book: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
