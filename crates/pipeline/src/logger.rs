//! Conversation Logger: turn log writes, rolling context, history clear.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, warn};

use academaide_core::conversation::{ConversationStore, ConversationTurn, RollingContext, Sentiment};
use academaide_core::error::{Result, StoreError};

/// Topic label written to every rolling context. No topic extraction
/// exists yet.
pub const DEFAULT_TOPIC: &str = "general";

/// Outcome of one deletion step of a history clear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ClearStep<T> {
    Done(T),
    Failed(String),
}

impl<T> ClearStep<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, ClearStep::Done(_))
    }
}

impl<T> From<std::result::Result<T, StoreError>> for ClearStep<T> {
    fn from(result: std::result::Result<T, StoreError>) -> Self {
        match result {
            Ok(value) => ClearStep::Done(value),
            Err(e) => ClearStep::Failed(e.to_string()),
        }
    }
}

/// Which parts of a history clear succeeded. The two deletions are not
/// transactional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClearHistoryReport {
    /// Number of turns removed.
    pub turns: ClearStep<u64>,
    /// Whether a context row existed.
    pub context: ClearStep<bool>,
}

impl ClearHistoryReport {
    pub fn is_complete(&self) -> bool {
        self.turns.is_done() && self.context.is_done()
    }
}

#[derive(Clone)]
pub struct ConversationLogger {
    store: Arc<dyn ConversationStore>,
}

impl ConversationLogger {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    /// Persist one processed chat call: a user turn, a bot turn and the
    /// rolling context upsert.
    ///
    /// The user turn is appended before the bot turn; the upsert runs
    /// alongside them.
    pub async fn record_exchange(
        &self,
        user_id: &str,
        message: &str,
        sentiment: Sentiment,
        reply: &str,
        is_fallback: bool,
    ) -> Result<()> {
        let user_turn = ConversationTurn::user(user_id, message, sentiment);
        let bot_turn = ConversationTurn::bot(user_id, reply, is_fallback);
        let context = RollingContext {
            user_id: user_id.to_string(),
            last_topic: DEFAULT_TOPIC.to_string(),
            last_sentiment: sentiment,
            last_interaction_at: Utc::now(),
        };

        let appends = async {
            self.store.append_turn(user_turn).await?;
            self.store.append_turn(bot_turn).await
        };
        tokio::try_join!(appends, self.store.upsert_context(context))?;

        debug!(user_id, is_fallback, sentiment = %sentiment, "Recorded exchange");
        Ok(())
    }

    /// The last `limit` turns, oldest first. Empty on store failure.
    pub async fn history(&self, user_id: &str, limit: usize) -> Vec<ConversationTurn> {
        if limit == 0 {
            return Vec::new();
        }
        match self.store.recent_turns(user_id, limit).await {
            Ok(turns) => turns,
            Err(e) => {
                warn!(user_id, store = self.store.name(), error = %e, "History read failed, continuing without history");
                Vec::new()
            }
        }
    }

    /// Delete all turns and the rolling context. Both deletions are
    /// attempted even if the first fails.
    pub async fn clear_history(&self, user_id: &str) -> ClearHistoryReport {
        let turns: ClearStep<u64> = self.store.delete_turns(user_id).await.into();
        let context: ClearStep<bool> = self.store.delete_context(user_id).await.into();
        let report = ClearHistoryReport { turns, context };

        if report.is_complete() {
            debug!(user_id, "Cleared chat history");
        } else {
            warn!(user_id, report = ?report, "Chat history clear was partial");
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::FlakyConversationStore;
    use academaide_core::error::Error;
    use academaide_store::InMemoryConversationStore;

    #[tokio::test]
    async fn exchange_appends_two_turns_and_upserts_context() {
        let store = Arc::new(InMemoryConversationStore::new());
        let logger = ConversationLogger::new(store.clone());

        logger
            .record_exchange("S1", "I hate exams", Sentiment::Negative, "Let's plan.", false)
            .await
            .unwrap();

        let turns = store.turns_for("S1").await;
        assert_eq!(turns.len(), 2);
        assert!(!turns[0].is_bot);
        assert_eq!(turns[0].sentiment_tag, Some(Sentiment::Negative));
        assert!(turns[1].is_bot);
        assert_eq!(turns[1].text, "Let's plan.");

        let context = store.rolling_context("S1").await.unwrap().unwrap();
        assert_eq!(context.last_topic, DEFAULT_TOPIC);
        assert_eq!(context.last_sentiment, Sentiment::Negative);
    }

    #[tokio::test]
    async fn fallback_turns_are_flagged() {
        let store = Arc::new(InMemoryConversationStore::new());
        let logger = ConversationLogger::new(store.clone());
        logger
            .record_exchange("S1", "hi", Sentiment::Neutral, "Simulated AI Response: hi", true)
            .await
            .unwrap();
        let turns = store.turns_for("S1").await;
        assert!(turns[1].is_fallback);
        assert!(!turns[0].is_fallback);
    }

    #[tokio::test]
    async fn second_exchange_overwrites_context() {
        let store = Arc::new(InMemoryConversationStore::new());
        let logger = ConversationLogger::new(store.clone());
        logger
            .record_exchange("S1", "bad day", Sentiment::Negative, "sorry", false)
            .await
            .unwrap();
        logger
            .record_exchange("S1", "thanks", Sentiment::Positive, "welcome", false)
            .await
            .unwrap();

        let context = store.rolling_context("S1").await.unwrap().unwrap();
        assert_eq!(context.last_sentiment, Sentiment::Positive);
        assert_eq!(store.turns_for("S1").await.len(), 4);
    }

    #[tokio::test]
    async fn append_failure_is_storage_error() {
        let store = Arc::new(FlakyConversationStore::new().failing("append_turn"));
        let logger = ConversationLogger::new(store);
        let err = logger
            .record_exchange("S1", "hi", Sentiment::Neutral, "hello", false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }

    #[tokio::test]
    async fn history_is_oldest_first_and_bounded() {
        let store = Arc::new(InMemoryConversationStore::new());
        let logger = ConversationLogger::new(store.clone());
        for i in 0..4 {
            logger
                .record_exchange("S1", &format!("q{i}"), Sentiment::Neutral, &format!("a{i}"), false)
                .await
                .unwrap();
        }
        let history = logger.history("S1", 5).await;
        let texts: Vec<&str> = history.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["a1", "q2", "a2", "q3", "a3"]);
        assert!(logger.history("S1", 0).await.is_empty());
    }

    #[tokio::test]
    async fn history_read_failure_is_empty() {
        let store = Arc::new(FlakyConversationStore::new().failing("recent_turns"));
        let logger = ConversationLogger::new(store);
        assert!(logger.history("S1", 5).await.is_empty());
    }

    #[tokio::test]
    async fn clear_removes_turns_and_context() {
        let store = Arc::new(InMemoryConversationStore::new());
        let logger = ConversationLogger::new(store.clone());
        logger
            .record_exchange("S1", "hi", Sentiment::Neutral, "hello", false)
            .await
            .unwrap();
        logger
            .record_exchange("S2", "hi", Sentiment::Neutral, "hello", false)
            .await
            .unwrap();

        let report = logger.clear_history("S1").await;
        assert!(report.is_complete());
        assert_eq!(report.turns, ClearStep::Done(2));
        assert_eq!(report.context, ClearStep::Done(true));
        assert!(store.turns_for("S1").await.is_empty());
        assert!(store.rolling_context("S1").await.unwrap().is_none());
        assert_eq!(store.turns_for("S2").await.len(), 2);
    }

    #[tokio::test]
    async fn partial_clear_reports_the_failed_step() {
        let store = Arc::new(FlakyConversationStore::new().failing("delete_turns"));
        let logger = ConversationLogger::new(store);
        let report = logger.clear_history("S1").await;
        assert!(!report.is_complete());
        assert!(matches!(report.turns, ClearStep::Failed(_)));
        assert!(report.context.is_done());
    }
}
