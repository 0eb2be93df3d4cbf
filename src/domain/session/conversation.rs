//! Conversation bookkeeping kept alongside the tab.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

/// Lightweight per-session conversation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    turn_count: u64,
    last_intent: Option<String>,
    started_at: Timestamp,
    last_turn_at: Option<Timestamp>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self {
            turn_count: 0,
            last_intent: None,
            started_at: Timestamp::now(),
            last_turn_at: None,
        }
    }

    /// Records one user turn. A `None` intent keeps the previous one.
    pub fn record_turn(&mut self, intent: Option<String>) -> u64 {
        self.turn_count += 1;
        if intent.is_some() {
            self.last_intent = intent;
        }
        self.last_turn_at = Some(Timestamp::now());
        self.turn_count
    }

    pub fn turn_count(&self) -> u64 {
        self.turn_count
    }

    pub fn last_intent(&self) -> Option<&str> {
        self.last_intent.as_deref()
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    pub fn last_turn_at(&self) -> Option<Timestamp> {
        self.last_turn_at
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}
