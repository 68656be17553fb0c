use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::catalog::query::DEFAULT_TOP_K;
use crate::dialogue::history::DEFAULT_HISTORY_LIMIT;
use crate::error::ConfigError;

/// Runtime settings. Every field has a default; a TOML file only needs the
/// keys it changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub model: String,
    /// Base URL of the chat endpoint.
    pub endpoint: String,
    pub catalog_path: PathBuf,
    pub prompts_path: Option<PathBuf>,
    /// Retry invalid proposals without limit.
    pub interactive: bool,
    /// Accept the first parseable proposal without validation.
    pub evaluation: bool,
    pub max_attempts: u32,
    pub top_k: usize,
    pub history_limit: usize,
    pub include_history: bool,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "llama3".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            catalog_path: PathBuf::from("dataset/beer_data.csv"),
            prompts_path: None,
            interactive: false,
            evaluation: false,
            max_attempts: 8,
            top_k: DEFAULT_TOP_K,
            history_limit: DEFAULT_HISTORY_LIMIT,
            include_history: false,
            max_tokens: 200,
            request_timeout_secs: 30,
        }
    }
}

impl AgentConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Attempt cap for the decision loop; `None` in interactive mode.
    pub fn attempt_limit(&self) -> Option<u32> {
        if self.interactive {
            None
        } else {
            Some(self.max_attempts.max(1))
        }
    }
}
