//! Persona & Prompt Assembler.

pub mod assembler;
pub mod persona;
pub mod sentiment;
pub mod token;

pub use assembler::{AssembledPrompt, AssemblyMetadata, PromptAssembler, PromptInput, fit_materials, material_entry};
pub use persona::{Agent, PersonaTable};
pub use sentiment::classify;
pub use token::estimate_tokens;
