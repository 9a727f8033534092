//! The chat pipeline.
//!
//! # Flow
//!
//! 1. Response cache lookup by message hash; a hit returns immediately and
//!    writes nothing
//! 2. Fan-out: context aggregation, query embedding and history fetch run
//!    concurrently
//! 3. Vector search scoped to the caller's courses
//! 4. Prompt assembly
//! 5. Generation (falls back, never fails)
//! 6. Conversation log, then cache write
//!
//! A cancelled request stops at the next await point and writes neither
//! log rows nor a cache entry. Once generation has finished uncancelled,
//! step 6 runs on its own task and completes even if the caller goes away.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use academaide_config::AppConfig;
use academaide_core::academic::{AcademicRecordStore, Role};
use academaide_core::cache::ResponseCache;
use academaide_core::conversation::{ConversationStore, Sentiment};
use academaide_core::error::{Error, Result, StoreError};
use academaide_core::material::{CourseFilter, MaterialQuery, VectorStore};
use academaide_core::provider::{EmbeddingProvider, GenerationService};

use crate::cache_key::response_cache_key;
use crate::cancel::cancellable;
use crate::context::{ContextAggregator, GradeScale};
use crate::generation::GenerationGateway;
use crate::insights::InsightsService;
use crate::logger::{ClearHistoryReport, ConversationLogger};
use crate::prompt::{Agent, PersonaTable, PromptAssembler, PromptInput, classify};
use crate::quiz::QuizService;
use crate::retrieval::RetrievalEngine;

/// Number of prior turns rendered into the prompt.
pub const HISTORY_TURNS: usize = 5;

/// The external systems the pipeline talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub records: Arc<dyn AcademicRecordStore>,
    pub vectors: Arc<dyn VectorStore>,
    pub conversations: Arc<dyn ConversationStore>,
    pub cache: Arc<dyn ResponseCache>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub generator: Arc<dyn GenerationService>,
}

/// Process-wide tunables, fixed at construction.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub generation_model: String,
    pub generation_timeout: Duration,
    pub stop: Vec<String>,
    pub embedding_model: String,
    pub embedding_dimension: usize,
    pub cache_prefix: String,
    pub cache_ttl: Duration,
    pub retrieval_limit: usize,
    pub quiz_limit: usize,
    pub materials_budget: usize,
    pub history_turns: usize,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            generation_model: config.generation.model.clone(),
            generation_timeout: config.generation_timeout(),
            stop: config.generation.stop.clone(),
            embedding_model: config.embedding.model.clone(),
            embedding_dimension: config.embedding.dimension,
            cache_prefix: config.cache.key_prefix.clone(),
            cache_ttl: config.cache_ttl(),
            retrieval_limit: config.retrieval.default_limit,
            quiz_limit: config.retrieval.quiz_limit,
            materials_budget: config.retrieval.materials_token_budget,
            history_turns: HISTORY_TURNS,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// One chat call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,
    #[serde(default)]
    pub role: Role,
    pub message: String,
    /// Persona id; empty or unknown selects the general advisor.
    #[serde(default)]
    pub agent_id: String,
    /// Overrides the wall clock for schedule resolution.
    #[serde(default)]
    pub now: Option<NaiveDateTime>,
}

impl ChatRequest {
    pub fn new(user_id: impl Into<String>, role: Role, message: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            message: message.into(),
            agent_id: String::new(),
            now: None,
        }
    }

    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = agent_id.into();
        self
    }

    pub fn at(mut self, now: NaiveDateTime) -> Self {
        self.now = Some(now);
        self
    }
}

/// Per-call diagnostics. Absent on cache hits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMetadata {
    pub agent: Agent,
    pub sentiment: Sentiment,
    pub chunks_retrieved: usize,
    pub chunks_dropped: usize,
    pub history_turns: usize,
    pub prompt_tokens: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub text: String,
    pub cache_hit: bool,
    pub is_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ChatMetadata>,
}

pub struct ChatPipeline {
    aggregator: ContextAggregator,
    retrieval: Arc<RetrievalEngine>,
    assembler: PromptAssembler,
    gateway: Arc<GenerationGateway>,
    logger: ConversationLogger,
    cache: Arc<dyn ResponseCache>,
    records: Arc<dyn AcademicRecordStore>,
    settings: PipelineSettings,
}

impl ChatPipeline {
    pub fn new(collaborators: Collaborators, settings: PipelineSettings) -> Self {
        let Collaborators {
            records,
            vectors,
            conversations,
            cache,
            embedder,
            generator,
        } = collaborators;

        let retrieval = RetrievalEngine::new(embedder, vectors, settings.embedding_model.clone())
            .with_dimension(settings.embedding_dimension);
        let gateway = GenerationGateway::new(
            generator,
            settings.generation_model.clone(),
            settings.generation_timeout,
        );

        Self {
            aggregator: ContextAggregator::new(records.clone(), Arc::new(GradeScale::standard())),
            retrieval: Arc::new(retrieval),
            assembler: PromptAssembler::new(
                Arc::new(PersonaTable::standard()),
                settings.materials_budget,
                settings.stop.clone(),
            ),
            gateway: Arc::new(gateway),
            logger: ConversationLogger::new(conversations),
            cache,
            records,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Quiz generation and analysis over the same retrieval and
    /// generation collaborators.
    pub fn quiz(&self) -> QuizService {
        QuizService::new(
            self.records.clone(),
            self.retrieval.clone(),
            self.gateway.clone(),
            self.settings.quiz_limit,
        )
    }

    /// Grade risks and study suggestions over the record store.
    pub fn insights(&self) -> InsightsService {
        InsightsService::new(self.records.clone())
    }

    /// Process one chat message end to end.
    pub async fn chat(&self, request: &ChatRequest, cancel: &CancellationToken) -> Result<ChatReply> {
        let started = Instant::now();
        let key = response_cache_key(&self.settings.cache_prefix, &request.message);

        if let Some(cached) = self.cached(&key).await {
            info!(
                user_id = %request.user_id,
                cache_hit = true,
                latency_ms = started.elapsed().as_millis() as u64,
                "Chat served from cache"
            );
            return Ok(ChatReply {
                text: cached,
                cache_hit: true,
                is_fallback: false,
                metadata: None,
            });
        }

        let agent = Agent::parse(&request.agent_id);
        let sentiment = classify(&request.message);
        let now = request.now.unwrap_or_else(|| Local::now().naive_local());

        let fan_out = async {
            tokio::join!(
                self.aggregator.aggregate(&request.user_id, request.role, now),
                self.retrieval.embed_query(&request.message),
                self.logger.history(&request.user_id, self.settings.history_turns),
            )
        };
        let (context, embedding, history) = cancellable(cancel, fan_out).await?;
        let context = context?;

        let chunks = match embedding {
            Some(embedding) if !context.course_ids().is_empty() => {
                let query = MaterialQuery {
                    embedding,
                    courses: CourseFilter::Only(context.course_ids().to_vec()),
                    unit: None,
                    limit: self.settings.retrieval_limit,
                };
                cancellable(cancel, self.retrieval.search(&query)).await?
            }
            Some(_) => {
                debug!(user_id = %request.user_id, "No courses in scope, skipping retrieval");
                Vec::new()
            }
            None => Vec::new(),
        };

        let prompt = self.assembler.assemble(&PromptInput {
            agent,
            context: &context,
            chunks: &chunks,
            sentiment,
            history: &history,
            message: &request.message,
        });

        let outcome = self.gateway.reply(&prompt, &request.message, cancel).await?;
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        // Runs detached so a caller dropping this future cannot split the
        // exchange between its user and bot turns.
        let logger = self.logger.clone();
        let cache = self.cache.clone();
        let ttl = self.settings.cache_ttl;
        let user_id = request.user_id.clone();
        let message = request.message.clone();
        let reply = outcome.text.clone();
        let is_fallback = outcome.is_fallback;
        let write = tokio::spawn(async move {
            logger
                .record_exchange(&user_id, &message, sentiment, &reply, is_fallback)
                .await?;
            if let Err(e) = cache.set(&key, &reply, ttl).await {
                warn!(cache = cache.name(), error = %e, "Cache write failed");
            }
            Ok::<(), Error>(())
        });
        write
            .await
            .map_err(|e| StoreError::WriteFailed(format!("Exchange write task failed: {e}")))??;

        info!(
            user_id = %request.user_id,
            cache_hit = false,
            agent = %agent,
            chunks = chunks.len(),
            is_fallback = outcome.is_fallback,
            latency_ms = started.elapsed().as_millis() as u64,
            "Chat processed"
        );

        Ok(ChatReply {
            text: outcome.text,
            cache_hit: false,
            is_fallback: outcome.is_fallback,
            metadata: Some(ChatMetadata {
                agent,
                sentiment,
                chunks_retrieved: chunks.len(),
                chunks_dropped: prompt.metadata.chunks_dropped,
                history_turns: history.len(),
                prompt_tokens: prompt.metadata.total_tokens,
            }),
        })
    }

    /// Delete a user's turn log and rolling context.
    pub async fn clear_history(&self, user_id: &str) -> ClearHistoryReport {
        self.logger.clear_history(user_id).await
    }

    async fn cached(&self, key: &str) -> Option<String> {
        match self.cache.get(key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(cache = self.cache.name(), error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }
}
