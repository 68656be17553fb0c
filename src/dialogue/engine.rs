use tracing::{debug, info, warn};

use super::action::{DialogueAction, Resolution};
use super::history::History;
use super::intent::Intent;
use super::observation::Observation;
use super::proposal::ActionProposal;
use super::registry::{IntentState, Registry};
use crate::catalog::query::QueryEngine;
use crate::config::AgentConfig;
use crate::error::{DialogueError, ProposalError};
use crate::services::llm::client::{ChatMessage, Collaborator};
use crate::services::llm::extract::first_json_fragment;
use crate::services::llm::prompts::PromptBook;

/// How proposals are obtained and checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionPolicy {
    /// `None` retries until a valid proposal arrives.
    pub attempt_limit: Option<u32>,
    /// Skip validation and take the first parseable proposal.
    pub evaluation: bool,
    pub include_history: bool,
    pub max_tokens: u32,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self::from(&AgentConfig::default())
    }
}

impl From<&AgentConfig> for DecisionPolicy {
    fn from(config: &AgentConfig) -> Self {
        Self {
            attempt_limit: config.attempt_limit(),
            evaluation: config.evaluation,
            include_history: config.include_history,
            max_tokens: config.max_tokens,
        }
    }
}

/// Outcome of one decision cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub action: DialogueAction,
    /// The intent executed and should leave the registry.
    pub resolved: bool,
}

pub struct DecisionEngine {
    collaborator: Box<dyn Collaborator>,
    queries: QueryEngine,
    prompts: PromptBook,
    policy: DecisionPolicy,
}

impl DecisionEngine {
    pub fn new(
        collaborator: Box<dyn Collaborator>,
        queries: QueryEngine,
        prompts: PromptBook,
        policy: DecisionPolicy,
    ) -> Self {
        Self { collaborator, queries, prompts, policy }
    }

    pub fn policy(&self) -> DecisionPolicy {
        self.policy
    }

    pub fn queries(&self) -> &QueryEngine {
        &self.queries
    }

    /// Merges the batch into `registry`, runs one cycle per active intent in
    /// registry order, then drops the intents that resolved. Nothing is
    /// removed if any cycle fails.
    pub async fn run_turn(
        &self,
        registry: &mut Registry,
        observations: &[Observation],
        history: &History,
    ) -> Result<Vec<DialogueAction>, DialogueError> {
        if let [only] = observations {
            if only.is_terminate() {
                info!("Terminate signal received, skipping {} active intents", registry.len());
                return Ok(vec![DialogueAction::TerminateSystem]);
            }
        }

        for observation in observations {
            if observation.is_terminate() {
                warn!("Ignoring terminate signal inside a multi-intent batch");
                continue;
            }
            registry.merge(observation);
        }

        let mut actions = Vec::with_capacity(registry.len());
        let mut resolved = Vec::new();
        for state in registry.iter() {
            let decision = self.decide(state, history).await?;
            if decision.resolved {
                resolved.push(state.intent());
            }
            actions.push(decision.action);
        }

        for intent in resolved {
            registry.remove(intent);
            debug!("Resolved {}", intent);
        }
        Ok(actions)
    }

    pub async fn decide(&self, state: &IntentState, history: &History) -> Result<Decision, DialogueError> {
        let proposal = self.propose(state, history).await?;
        self.dispatch(&proposal, state).await
    }

    /// Queries the collaborator until it returns an acceptable proposal or
    /// the attempt limit is reached.
    pub async fn propose(&self, state: &IntentState, history: &History) -> Result<ActionProposal, DialogueError> {
        let messages = self.messages(state, history);
        let mut attempts = 0u32;

        loop {
            if let Some(limit) = self.policy.attempt_limit {
                if attempts >= limit {
                    return Err(DialogueError::AttemptsExhausted { intent: state.intent(), attempts });
                }
            }
            attempts += 1;

            let reply = self.collaborator.complete(&messages, self.policy.max_tokens).await?;
            match self.accept(&reply, state) {
                Ok(proposal) => {
                    debug!("{} accepted {:?} on attempt {}", state.intent(), proposal, attempts);
                    return Ok(proposal);
                }
                Err(e) => warn!("{} attempt {} rejected: {}", state.intent(), attempts, e),
            }
        }
    }

    /// Extracts, parses and (outside evaluation) validates one reply.
    pub fn accept(&self, reply: &str, state: &IntentState) -> Result<ActionProposal, ProposalError> {
        let fragment = first_json_fragment(reply)
            .ok_or_else(|| ProposalError::Malformed(format!("no JSON object in: {}", reply)))?;
        let proposal = ActionProposal::parse(fragment)?;
        if !self.policy.evaluation {
            proposal.validate(state)?;
        }
        Ok(proposal)
    }

    /// Turns an accepted proposal into the action for this turn.
    pub async fn dispatch(&self, proposal: &ActionProposal, state: &IntentState) -> Result<Decision, DialogueError> {
        let intent = state.intent();
        match proposal {
            ActionProposal::RequestInfo { slot } => Ok(Decision {
                action: DialogueAction::RequestInfo { parameter: slot.clone(), data: intent },
                resolved: false,
            }),
            ActionProposal::Confirmation { .. } => match self.execute(state).await? {
                Some(resolution) => {
                    info!("{} confirmed", intent);
                    Ok(Decision {
                        action: DialogueAction::Confirmation { parameter: intent, data: resolution },
                        resolved: true,
                    })
                }
                None => {
                    info!("{} found nothing, asking the user to check", intent);
                    Ok(check_info(state))
                }
            },
            ActionProposal::CheckInfo { .. } => Ok(check_info(state)),
        }
    }

    async fn execute(&self, state: &IntentState) -> Result<Option<Resolution>, DialogueError> {
        let intent = state.intent();
        match intent {
            Intent::GetBeerRecommendation
            | Intent::GetBeerInfo
            | Intent::ListBeersByBrewery
            | Intent::GetTopRated => Ok(self
                .queries
                .filter_by_intent(state.slots(), intent)
                .await
                .map(Resolution::Beers)),
            Intent::RateBeer => Ok(self
                .queries
                .record_user_rating(state.slots())
                .await?
                .map(Resolution::Rated)),
            Intent::OutOfContext => Ok(Some(Resolution::Note(format!("Intent {}", intent)))),
            Intent::TerminateSystem => Ok(None),
        }
    }

    fn messages(&self, state: &IntentState, history: &History) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::system(self.prompts.decision_prompt())];
        if self.policy.include_history {
            messages.extend(history.as_context());
        }
        messages.push(ChatMessage::user(state.to_payload()));
        messages
    }
}

fn check_info(state: &IntentState) -> Decision {
    Decision {
        action: DialogueAction::CheckInfo {
            parameter: state.intent().label().to_string(),
            data: state.serialize(),
        },
        resolved: false,
    }
}
