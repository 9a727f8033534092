//! # AcademAide Pipeline
//!
//! Turns a chat message into a grounded prompt and returns a cached,
//! logged reply:
//!
//! ```text
//! cache lookup ─hit──────────────────────────────────────────────► reply
//!      │ miss
//!      ├─ ContextAggregator ─┐
//!      ├─ embed query ───────┼─► vector search ─► PromptAssembler ─► GenerationGateway
//!      └─ history ───────────┘                                              │
//!                                                 reply ◄─ cache ◄─ ConversationLogger
//! ```
//!
//! Quiz generation and analysis ([`QuizService`]) reuse the retrieval and
//! generation stages. [`InsightsService`] reads grades straight from the
//! record store.

pub mod cache_key;
mod cancel;
pub mod context;
pub mod generation;
pub mod insights;
pub mod logger;
pub mod pipeline;
pub mod prompt;
pub mod quiz;
pub mod retrieval;

pub use cache_key::response_cache_key;
pub use context::{AcademicContext, ContextAggregator, GradeScale, ScheduleStatus};
pub use generation::{GenerationGateway, GenerationOutcome, SIMULATED_PREFIX, UNABLE_TO_RESPOND};
pub use insights::{InsightsService, RiskKind, Severity, StudentInsights, StudentRisk, Suggestion};
pub use logger::{ClearHistoryReport, ClearStep, ConversationLogger};
pub use pipeline::{ChatMetadata, ChatPipeline, ChatReply, ChatRequest, Collaborators, PipelineSettings};
pub use prompt::{Agent, PersonaTable, PromptAssembler};
pub use quiz::{Quiz, QuizAnalysis, QuizRequest, QuizService, QuizSubmission};
pub use retrieval::RetrievalEngine;

#[cfg(test)]
pub(crate) mod test_helpers;
