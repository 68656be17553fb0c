pub mod client;
pub mod extract;
pub mod prompts;

pub use client::{ChatMessage, Collaborator, LLMService, Role};
pub use extract::first_json_fragment;
pub use prompts::PromptBook;
