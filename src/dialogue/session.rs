use tracing::{info_span, warn, Instrument};
use uuid::Uuid;

use super::action::DialogueAction;
use super::engine::{DecisionEngine, DecisionPolicy};
use super::history::History;
use super::observation::Observation;
use super::registry::Registry;
use crate::catalog::query::QueryEngine;
use crate::catalog::store::SharedCatalog;
use crate::config::AgentConfig;
use crate::error::{ConfigError, DialogueError};
use crate::services::llm::client::{Collaborator, Role};
use crate::services::llm::prompts::PromptBook;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

/// One conversation: its own registry and history over the shared catalog.
/// Turns run one at a time.
pub struct Session {
    id: SessionId,
    registry: Registry,
    history: History,
    engine: DecisionEngine,
    terminated: bool,
}

impl Session {
    pub fn new(engine: DecisionEngine, history: History) -> Self {
        Self {
            id: SessionId::new(),
            registry: Registry::new(),
            history,
            engine,
            terminated: false,
        }
    }

    pub fn from_config(
        config: &AgentConfig,
        catalog: SharedCatalog,
        collaborator: Box<dyn Collaborator>,
    ) -> Result<Self, ConfigError> {
        let prompts = match &config.prompts_path {
            Some(path) => PromptBook::load(path)?,
            None => PromptBook::default(),
        };
        let engine = DecisionEngine::new(
            collaborator,
            QueryEngine::new(catalog, config.top_k),
            prompts,
            DecisionPolicy::from(config),
        );
        Ok(Self::new(engine, History::new(config.history_limit)))
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn note_user_turn(&mut self, text: &str) {
        self.history.push(Role::User, text);
    }

    pub fn note_system_turn(&mut self, text: &str) {
        self.history.push(Role::System, text);
    }

    /// Runs one decision turn over an observation batch.
    pub async fn turn(&mut self, observations: &[Observation]) -> Result<Vec<DialogueAction>, DialogueError> {
        let span = info_span!("turn", session = %self.id.0, observations = observations.len());
        let actions = self
            .engine
            .run_turn(&mut self.registry, observations, &self.history)
            .instrument(span)
            .await?;

        if matches!(actions.as_slice(), [DialogueAction::TerminateSystem]) {
            self.terminated = true;
        }
        Ok(actions)
    }

    /// Records `user_text` in the history, runs the turn, then records the
    /// actions as the system's side of the exchange.
    pub async fn exchange(
        &mut self,
        user_text: &str,
        observations: &[Observation],
    ) -> Result<Vec<DialogueAction>, DialogueError> {
        self.note_user_turn(user_text);
        let actions = self.turn(observations).await?;
        match serde_json::to_string(&actions) {
            Ok(reply) => self.note_system_turn(&reply),
            Err(e) => warn!("Could not record actions in history: {}", e),
        }
        Ok(actions)
    }
}
