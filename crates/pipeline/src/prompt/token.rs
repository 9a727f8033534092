//! Token estimation.
//!
//! Character heuristic: ~4 characters per token, rounded up. Close enough
//! for budgeting a prompt sent to a BPE-tokenized model.

/// Estimate the token count for a string.
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}
