//! Retrieval Engine: embed the query, search the vector store, enforce
//! the course filter.
//!
//! Both the embedding call and the vector search degrade to "no materials"
//! on failure. Results are re-checked against the filter after the store
//! returns them, so a misbehaving backend cannot leak chunks from courses
//! outside the caller's set.

use std::sync::Arc;

use tracing::{debug, warn};

use academaide_core::material::{CourseFilter, MaterialQuery, ScoredChunk, VectorStore};
use academaide_core::provider::{EmbeddingProvider, EmbeddingRequest};

pub struct RetrievalEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    vectors: Arc<dyn VectorStore>,
    model: String,
    /// Expected vector length; mismatches are treated as embedding failures.
    dimension: Option<usize>,
}

impl RetrievalEngine {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, vectors: Arc<dyn VectorStore>, model: impl Into<String>) -> Self {
        Self {
            embedder,
            vectors,
            model: model.into(),
            dimension: None,
        }
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = Some(dimension);
        self
    }

    /// Vectorize `text`. `None` when the embedding service fails.
    pub async fn embed_query(&self, text: &str) -> Option<Vec<f32>> {
        let request = EmbeddingRequest {
            model: self.model.clone(),
            text: text.to_string(),
        };
        match self.embedder.embed(request).await {
            Ok(response) => match self.dimension {
                Some(expected) if response.vector.len() != expected => {
                    warn!(
                        provider = self.embedder.name(),
                        expected,
                        actual = response.vector.len(),
                        "Embedding has unexpected dimension, skipping retrieval"
                    );
                    None
                }
                _ => Some(response.vector),
            },
            Err(e) => {
                warn!(provider = self.embedder.name(), error = %e, "Embedding failed, continuing without materials");
                None
            }
        }
    }

    /// Nearest chunks for an already-embedded query, most similar first.
    pub async fn search(&self, query: &MaterialQuery) -> Vec<ScoredChunk> {
        if query.limit == 0 {
            return Vec::new();
        }
        let found = match self.vectors.nearest_chunks(query).await {
            Ok(found) => found,
            Err(e) => {
                warn!(store = self.vectors.name(), error = %e, "Vector search failed, continuing without materials");
                return Vec::new();
            }
        };

        let returned = found.len();
        let mut chunks: Vec<ScoredChunk> = found
            .into_iter()
            .filter(|c| query.courses.permits(&c.chunk.course_id))
            .filter(|c| query.unit.is_none_or(|u| u == c.chunk.unit_no))
            .collect();
        if chunks.len() < returned {
            warn!(
                store = self.vectors.name(),
                dropped = returned - chunks.len(),
                "Vector store returned chunks outside the filter"
            );
        }
        chunks.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        chunks.truncate(query.limit);

        debug!(chunks = chunks.len(), limit = query.limit, "Retrieved materials");
        chunks
    }

    /// Embed `text` then search. Empty on any upstream failure.
    pub async fn retrieve(&self, text: &str, courses: CourseFilter, unit: Option<u32>, limit: usize) -> Vec<ScoredChunk> {
        let Some(embedding) = self.embed_query(text).await else {
            return Vec::new();
        };
        self.search(&MaterialQuery {
            embedding,
            courses,
            unit,
            limit,
        })
        .await
    }
}
