pub mod catalog;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod services;

// Re-export specific items if needed for convenient access
pub use config::AgentConfig;
pub use dialogue::session::Session;
