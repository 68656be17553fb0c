use std::collections::VecDeque;

use crate::services::llm::client::{ChatMessage, Role};

pub const DEFAULT_HISTORY_LIMIT: usize = 6;

/// Rolling window of recent turns.
#[derive(Debug, Clone)]
pub struct History {
    buffer: VecDeque<ChatMessage>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(limit),
            limit,
        }
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        if self.limit == 0 {
            return;
        }
        if self.buffer.len() >= self.limit {
            self.buffer.pop_front();
        }
        self.buffer.push_back(ChatMessage { role, content: content.into() });
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Drops everything but one fresh user turn.
    pub fn clean(&mut self, user_text: &str) {
        self.reset();
        self.push(Role::User, user_text);
    }

    pub fn turns(&self) -> impl Iterator<Item = &ChatMessage> {
        self.buffer.iter()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// `role: content` lines, oldest first.
    pub fn render(&self) -> String {
        self.buffer
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                };
                format!("{}: {}", role, m.content)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The window as collaborator messages, each tagged as history.
    pub fn as_context(&self) -> Vec<ChatMessage> {
        self.buffer
            .iter()
            .map(|m| ChatMessage {
                role: m.role,
                content: format!("History: {}", m.content),
            })
            .collect()
    }
}
