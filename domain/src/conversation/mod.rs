//! Conversation context
//!
//! A [`ConversationContext`] is the history a turn reads from. It is owned
//! by exactly one in-flight turn at a time and only ever grows: there is no
//! API to edit or remove a recorded turn.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier of a persisted conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new time-based id (UUID v4 layout).
    pub fn generate() -> Self {
        Self(uuid_v4())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConversationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ConversationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who said something in the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    pub fn as_str(&self) -> &str {
        match self {
            Speaker::User => "user",
            Speaker::Assistant => "assistant",
        }
    }
}

/// One entry of the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub speaker: Speaker,
    pub text: String,
}

impl HistoryTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
        }
    }
}

/// Append-only history plus accumulated user attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    conversation_id: Option<ConversationId>,
    turns: Vec<HistoryTurn>,
    attributes: BTreeMap<String, String>,
}

impl ConversationContext {
    pub fn new(conversation_id: Option<ConversationId>) -> Self {
        Self {
            conversation_id,
            ..Self::default()
        }
    }

    /// Rebuild a context from persisted history.
    pub fn from_history(conversation_id: ConversationId, turns: Vec<HistoryTurn>) -> Self {
        Self {
            conversation_id: Some(conversation_id),
            turns,
            attributes: BTreeMap::new(),
        }
    }

    pub fn conversation_id(&self) -> Option<&ConversationId> {
        self.conversation_id.as_ref()
    }

    pub fn append(&mut self, turn: HistoryTurn) {
        self.turns.push(turn);
    }

    /// Record the user message and the final answer of a completed turn.
    pub fn append_exchange(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.turns.push(HistoryTurn::user(question));
        self.turns.push(HistoryTurn::assistant(answer));
    }

    /// Accumulate a user attribute (budget, income, ...). Later values for
    /// the same key win.
    pub fn note_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn turns(&self) -> &[HistoryTurn] {
        &self.turns
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// The last `max_exchanges` user/assistant exchanges.
    pub fn recent(&self, max_exchanges: usize) -> &[HistoryTurn] {
        let keep = max_exchanges.saturating_mul(2);
        let start = self.turns.len().saturating_sub(keep);
        &self.turns[start..]
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn uuid_v4() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    // Mix in a process-wide counter so ids made in the same tick differ
    let salt = ID_COUNTER.fetch_add(1, Ordering::Relaxed) as u128;
    let mixed = nanos ^ (salt.wrapping_mul(0x9e37_79b9_7f4a_7c15) << 17);
    format!(
        "{:08x}-{:04x}-4{:03x}-{:04x}-{:012x}",
        (mixed >> 96) as u32,
        (mixed >> 80) as u16,
        (mixed >> 64) as u16 & 0x0fff,
        ((mixed >> 48) as u16 & 0x3fff) | 0x8000,
        (mixed & 0xffff_ffff_ffff) as u64
    )
}
