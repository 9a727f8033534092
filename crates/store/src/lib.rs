//! Store implementations for AcademAide.
//!
//! - PostgreSQL + pgvector for academic records, material chunks and the chat log
//! - Redis for the response cache
//! - In-memory versions of every store for tests and ephemeral sessions

pub mod cache;
pub mod fixture;
pub mod in_memory;
pub mod postgres;
pub mod vector;

pub use cache::{InMemoryResponseCache, RedisResponseCache};
pub use fixture::Fixture;
pub use in_memory::{InMemoryAcademicStore, InMemoryConversationStore, InMemoryVectorStore};
pub use postgres::PostgresStore;
pub use vector::{cosine_similarity, rank_chunks, to_vector_literal};
