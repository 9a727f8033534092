//! Vector similarity utilities.
//!
//! Pure-Rust implementations of:
//! - Cosine similarity
//! - The pgvector text literal used in similarity predicates
//! - Filtered nearest-neighbour ranking for the in-memory store

use academaide_core::material::{DocumentChunk, MaterialQuery, ScoredChunk};

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if either vector is zero-length or empty.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Serialize a vector as a pgvector literal: `[0.100000,-0.250000,...]`.
///
/// Six decimal places, matching what the ingestion job writes.
pub fn to_vector_literal(values: &[f32]) -> String {
    let parts: Vec<String> = values.iter().map(|v| format!("{v:.6}")).collect();
    format!("[{}]", parts.join(","))
}

/// Rank chunks by cosine similarity to the query embedding.
///
/// Applies the course and unit filters before ranking, skips chunks
/// without an embedding, and truncates to `query.limit`. Results come
/// back in descending similarity order.
pub fn rank_chunks<'a>(
    chunks: impl IntoIterator<Item = &'a DocumentChunk>,
    query: &MaterialQuery,
) -> Vec<ScoredChunk> {
    let mut scored: Vec<ScoredChunk> = chunks
        .into_iter()
        .filter(|chunk| !chunk.embedding.is_empty())
        .filter(|chunk| query.courses.permits(&chunk.course_id))
        .filter(|chunk| query.unit.is_none_or(|unit| chunk.unit_no == unit))
        .map(|chunk| ScoredChunk {
            similarity: cosine_similarity(&chunk.embedding, &query.embedding),
            chunk: chunk.clone(),
        })
        .collect();

    scored.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(query.limit);
    scored
}
