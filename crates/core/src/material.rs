//! Course material chunks and the vector store that ranks them.
//!
//! A chunk is the atom of retrieval: a slice of source material with its
//! own embedding. Chunks are written by an offline ingestion job and are
//! immutable afterwards.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A unit of course material with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: String,
    pub course_id: String,
    pub unit_no: u32,
    pub text: String,
    #[serde(skip)]
    pub embedding: Vec<f32>,
    /// Human-readable origin (file name, slide deck, ...).
    pub source_label: String,
}

/// Which courses a search may return material for.
///
/// This is the access-control boundary of retrieval: a caller must only see
/// chunks of courses they are enrolled in or teach.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CourseFilter {
    #[default]
    Unrestricted,
    Only(Vec<String>),
}

impl CourseFilter {
    /// Build a filter from a course-id set. An empty set means unrestricted.
    pub fn from_ids(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            CourseFilter::Unrestricted
        } else {
            CourseFilter::Only(ids)
        }
    }

    /// Whether a chunk of `course_id` is eligible under this filter.
    pub fn permits(&self, course_id: &str) -> bool {
        match self {
            CourseFilter::Unrestricted => true,
            CourseFilter::Only(ids) => ids.iter().any(|id| id == course_id),
        }
    }
}

/// A nearest-neighbour query over material chunks.
#[derive(Debug, Clone)]
pub struct MaterialQuery {
    pub embedding: Vec<f32>,
    pub courses: CourseFilter,
    pub unit: Option<u32>,
    pub limit: usize,
}

/// A chunk returned by a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: DocumentChunk,
    /// `1 - cosine_distance`; in [-1, 1], near [0, 1] for normalised vectors.
    pub similarity: f32,
}

/// Nearest-neighbour search over embedded course material.
///
/// Implementations: PostgreSQL + pgvector, in-memory (for testing).
#[async_trait]
pub trait VectorStore: Send + Sync {
    fn name(&self) -> &str;

    /// Return at most `query.limit` eligible chunks ordered by ascending
    /// cosine distance (descending similarity).
    async fn nearest_chunks(&self, query: &MaterialQuery) -> Result<Vec<ScoredChunk>, StoreError>;
}
