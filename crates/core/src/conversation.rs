//! Conversation log and rolling per-user context.
//!
//! The log is append-only: every processed chat call adds a user turn and
//! a bot turn. The rolling context is a single mutable summary row per user,
//! overwritten after every turn.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StoreError;

/// Coarse affect of a user message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }

    /// Parse a stored label; anything unknown reads as neutral.
    pub fn parse(label: &str) -> Self {
        match label {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logged message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user_id: String,
    pub text: String,
    pub is_bot: bool,
    /// Set on user turns; bot turns carry `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment_tag: Option<Sentiment>,
    /// True when the bot turn carries a generation fallback string.
    #[serde(default)]
    pub is_fallback: bool,
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn user(user_id: impl Into<String>, text: impl Into<String>, sentiment: Sentiment) -> Self {
        Self {
            user_id: user_id.into(),
            text: text.into(),
            is_bot: false,
            sentiment_tag: Some(sentiment),
            is_fallback: false,
            created_at: Utc::now(),
        }
    }

    pub fn bot(user_id: impl Into<String>, text: impl Into<String>, is_fallback: bool) -> Self {
        Self {
            user_id: user_id.into(),
            text: text.into(),
            is_bot: true,
            sentiment_tag: None,
            is_fallback,
            created_at: Utc::now(),
        }
    }
}

/// The mutable per-user conversation summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingContext {
    pub user_id: String,
    pub last_topic: String,
    pub last_sentiment: Sentiment,
    pub last_interaction_at: DateTime<Utc>,
}

/// The document store holding turns and rolling contexts.
///
/// Implementations: PostgreSQL, in-memory (for testing).
#[async_trait]
pub trait ConversationStore: Send + Sync {
    fn name(&self) -> &str;

    /// Append one turn to the log.
    async fn append_turn(&self, turn: ConversationTurn) -> Result<(), StoreError>;

    /// Insert or overwrite the user's rolling context.
    async fn upsert_context(&self, context: RollingContext) -> Result<(), StoreError>;

    /// The most recent turns of a user, oldest first.
    async fn recent_turns(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, StoreError>;

    async fn rolling_context(&self, user_id: &str) -> Result<Option<RollingContext>, StoreError>;

    /// Delete every turn of a user. Returns how many were removed.
    async fn delete_turns(&self, user_id: &str) -> Result<u64, StoreError>;

    /// Delete the user's rolling context. Returns whether a row existed.
    async fn delete_context(&self, user_id: &str) -> Result<bool, StoreError>;
}
