//! Prompt assembly.
//!
//! Section order is fixed: persona, context, materials, sentiment,
//! history, user message, then the open `Assistant:` turn. A section with
//! nothing to say renders empty instead of disappearing, so the template
//! shape never changes.
//!
//! # Budget
//!
//! Only the materials section is budgeted. Chunks arrive most-similar
//! first; the tail is dropped until the block fits.

use std::fmt::Write;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use academaide_core::conversation::{ConversationTurn, Sentiment};
use academaide_core::material::ScoredChunk;

use super::persona::{Agent, PersonaTable};
use super::token::estimate_tokens;
use crate::context::AcademicContext;

/// Everything a single chat prompt is built from.
pub struct PromptInput<'a> {
    pub agent: Agent,
    pub context: &'a AcademicContext,
    /// Most similar first.
    pub chunks: &'a [ScoredChunk],
    pub sentiment: Sentiment,
    /// Oldest first.
    pub history: &'a [ConversationTurn],
    pub message: &'a str,
}

#[derive(Debug, Clone)]
pub struct AssembledPrompt {
    pub text: String,
    /// Role labels the model must stop at.
    pub stop: Vec<String>,
    pub metadata: AssemblyMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyMetadata {
    pub chunks_included: usize,
    pub chunks_dropped: usize,
    pub materials_tokens: usize,
    pub materials_budget: usize,
    pub total_tokens: usize,
}

pub struct PromptAssembler {
    personas: Arc<PersonaTable>,
    materials_budget: usize,
    stop: Vec<String>,
}

impl PromptAssembler {
    pub fn new(personas: Arc<PersonaTable>, materials_budget: usize, stop: Vec<String>) -> Self {
        Self {
            personas,
            materials_budget,
            stop,
        }
    }

    pub fn assemble(&self, input: &PromptInput<'_>) -> AssembledPrompt {
        let (materials, included) = fit_materials(input.chunks, self.materials_budget);
        let materials_tokens = estimate_tokens(&materials);

        let mut history = String::new();
        for turn in input.history {
            let speaker = if turn.is_bot { "Bot" } else { "User" };
            let _ = writeln!(history, "{speaker}: {}", turn.text);
        }

        let text = format!(
            "System: {persona}\nContext: {context}\nMaterials:\n{materials}\nSentiment: User seems {sentiment}.\nHistory:\n{history}\nUser: {message}\nAssistant:",
            persona = self.personas.instructions(input.agent),
            context = input.context.render(),
            sentiment = input.sentiment,
            message = input.message,
        );

        let metadata = AssemblyMetadata {
            chunks_included: included,
            chunks_dropped: input.chunks.len() - included,
            materials_tokens,
            materials_budget: self.materials_budget,
            total_tokens: estimate_tokens(&text),
        };

        AssembledPrompt {
            text,
            stop: self.stop.clone(),
            metadata,
        }
    }
}

/// One retrieved chunk as it appears in a prompt.
pub fn material_entry(chunk: &ScoredChunk) -> String {
    format!(
        "---\nSource: {}\nUnit: {}\nContent: {}\n",
        chunk.chunk.source_label, chunk.chunk.unit_no, chunk.chunk.text
    )
}

/// Longest prefix of `chunks` whose rendered entries fit in `budget`
/// tokens. Returns the rendered block and how many chunks it holds.
pub fn fit_materials(chunks: &[ScoredChunk], budget: usize) -> (String, usize) {
    let mut block = String::new();
    let mut used = 0;
    let mut included = 0;
    for chunk in chunks {
        let entry = material_entry(chunk);
        let cost = estimate_tokens(&entry);
        if used + cost > budget {
            break;
        }
        used += cost;
        block.push_str(&entry);
        included += 1;
    }
    (block, included)
}
