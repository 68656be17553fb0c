use serde::Deserialize;
use std::path::Path;

use crate::error::ConfigError;

const DEFAULT_DM_PROMPT: &str = "You are the dialogue manager of a beer catalog assistant. \
You receive the state of one user intent as JSON: its name and every slot, with null for \
slots that are still missing. Reply with exactly one JSON object and nothing else: \
{\"action\": \"request_info\", \"parameter\": <one missing slot>} when a slot is missing, or \
{\"action\": \"confirmation\", \"parameter\": <intent name>} when every slot is filled. \
For get_beer_info only the name slot is required.";

/// Instruction text for the collaborator, optionally loaded from YAML:
///
/// ```yaml
/// dm:
///   prompt: "..."
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct PromptBook {
    pub dm: DmPrompts,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DmPrompts {
    pub prompt: String,
}

impl Default for PromptBook {
    fn default() -> Self {
        Self { dm: DmPrompts { prompt: DEFAULT_DM_PROMPT.to_string() } }
    }
}

impl PromptBook {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_yaml::from_str(&text)?)
    }

    pub fn decision_prompt(&self) -> &str {
        &self.dm.prompt
    }
}
