//! Per-user conversation memory.
//!
//! Each user has a rolling window of recent topics (most recent first, no
//! duplicates) and a bounded history of exchanges. State is created on the
//! first message and lives until cleared; nothing is persisted.
//!
//! Updates for one user are serialized by that user's own mutex; the map
//! lock is only held to find or insert a user's slot. Clearing retires the
//! slot under its mutex, so a writer that fetched it earlier starts over on
//! a fresh slot instead of writing into a detached one.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use assist_types::{MemorySettings, HISTORY_LIMIT_RANGE, MAX_RECENT_TOPICS};

use crate::result::ResponseSource;

/// One question and the answer it got.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exchange {
    pub user_text: String,
    pub response_text: String,
    pub source: ResponseSource,
    pub confidence: f32,
    pub timestamp: DateTime<Utc>,
}

impl Exchange {
    pub fn new(
        user_text: impl Into<String>,
        response_text: impl Into<String>,
        source: ResponseSource,
        confidence: f32,
    ) -> Self {
        Self {
            user_text: user_text.into(),
            response_text: response_text.into(),
            source,
            confidence,
            timestamp: Utc::now(),
        }
    }
}

/// Summary of one user's conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationStats {
    pub message_count: u64,
    /// Most recent first
    pub topics: Vec<String>,
}

#[derive(Debug, Default)]
struct ConversationState {
    recent_topics: VecDeque<String>,
    message_count: u64,
    history: VecDeque<Exchange>,
    /// Set when the slot has been removed from the map
    retired: bool,
}

/// Bounded conversational memory for all users.
pub struct ConversationMemory {
    users: RwLock<HashMap<String, Arc<Mutex<ConversationState>>>>,
    max_topics: usize,
    history_limit: usize,
}

impl ConversationMemory {
    pub fn new(settings: &MemorySettings) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            max_topics: settings.max_topics.clamp(1, MAX_RECENT_TOPICS),
            history_limit: settings
                .history_limit
                .clamp(*HISTORY_LIMIT_RANGE.start(), *HISTORY_LIMIT_RANGE.end()),
        }
    }

    fn slot(&self, user_id: &str) -> Option<Arc<Mutex<ConversationState>>> {
        self.users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user_id)
            .cloned()
    }

    fn slot_or_insert(&self, user_id: &str) -> Arc<Mutex<ConversationState>> {
        if let Some(slot) = self.slot(user_id) {
            return slot;
        }
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(users.entry(user_id.to_string()).or_default())
    }

    /// Record an exchange under `topic`.
    ///
    /// The topic moves to the front of the window; the oldest topic and
    /// exchange fall off when the bounds are exceeded.
    pub async fn record(&self, user_id: &str, topic: &str, exchange: Exchange) {
        // A retired slot is already gone from the map, so the next lookup
        // inserts a fresh one
        let mut state = loop {
            let state = self.slot_or_insert(user_id).lock_owned().await;
            if !state.retired {
                break state;
            }
        };

        state.message_count += 1;

        if let Some(pos) = state.recent_topics.iter().position(|t| t == topic) {
            state.recent_topics.remove(pos);
        }
        state.recent_topics.push_front(topic.to_string());
        state.recent_topics.truncate(self.max_topics);

        state.history.push_back(exchange);
        while state.history.len() > self.history_limit {
            state.history.pop_front();
        }

        debug!(
            user_id,
            topic,
            message_count = state.message_count,
            "Conversation updated"
        );
    }

    /// Recent topics, most recent first. Empty for unknown users.
    pub async fn recent_topics(&self, user_id: &str) -> Vec<String> {
        match self.slot(user_id) {
            Some(slot) => slot.lock().await.recent_topics.iter().cloned().collect(),
            None => Vec::new(),
        }
    }

    pub async fn stats(&self, user_id: &str) -> ConversationStats {
        match self.slot(user_id) {
            Some(slot) => {
                let state = slot.lock().await;
                ConversationStats {
                    message_count: state.message_count,
                    topics: state.recent_topics.iter().cloned().collect(),
                }
            }
            None => ConversationStats::default(),
        }
    }

    /// Stored exchanges, oldest first.
    pub async fn history(&self, user_id: &str) -> Vec<Exchange> {
        match self.slot(user_id) {
            Some(slot) => slot.lock().await.history.iter().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Forget a user. Returns true if there was anything to forget.
    ///
    /// Waits for an in-flight update of that user to finish.
    pub async fn clear(&self, user_id: &str) -> bool {
        let removed = self
            .users
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(user_id);

        match removed {
            Some(slot) => {
                let mut state = slot.lock().await;
                *state = ConversationState {
                    retired: true,
                    ..ConversationState::default()
                };
                debug!(user_id, "Conversation cleared");
                true
            }
            None => false,
        }
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(&MemorySettings::default())
    }
}
