//! # AcademAide Core
//!
//! Domain types, collaborator traits, and error definitions for the
//! AcademAide chat pipeline. This crate has **no framework dependencies**:
//! it defines the model every other crate implements against.
//!
//! ## Collaborators
//!
//! Everything the pipeline talks to is a trait defined here:
//! - [`AcademicRecordStore`]: identity, enrollment, grades, timetable
//! - [`VectorStore`]: nearest-neighbour search over course material chunks
//! - [`EmbeddingProvider`] / [`GenerationService`]: external model endpoints
//! - [`ResponseCache`]: exact-match reply cache with TTL
//! - [`ConversationStore`]: append-only turn log plus rolling context
//!
//! Implementations live in `academaide-store` and `academaide-providers`,
//! which keeps the pipeline testable against in-memory fakes.

pub mod academic;
pub mod cache;
pub mod conversation;
pub mod error;
pub mod material;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use academic::{
    AcademicRecordStore, Course, EnrollmentRecord, Grade, Identity, Role, ScheduleSlot,
};
pub use cache::ResponseCache;
pub use conversation::{ConversationStore, ConversationTurn, RollingContext, Sentiment};
pub use error::{Error, ProviderError, Result, StoreError};
pub use material::{CourseFilter, DocumentChunk, MaterialQuery, ScoredChunk, VectorStore};
pub use provider::{
    EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, GenerationRequest,
    GenerationResponse, GenerationService, OutputFormat,
};
