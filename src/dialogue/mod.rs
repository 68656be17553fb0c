pub mod action;
pub mod engine;
pub mod history;
pub mod intent;
pub mod observation;
pub mod proposal;
pub mod registry;
pub mod session;

pub use action::{DialogueAction, Resolution};
pub use engine::{Decision, DecisionEngine, DecisionPolicy};
pub use history::History;
pub use intent::{Intent, SlotValue};
pub use observation::{parse_batch, Observation};
pub use proposal::{ActionProposal, ProposalViolation};
pub use registry::{IntentState, Registry};
pub use session::{Session, SessionId};
