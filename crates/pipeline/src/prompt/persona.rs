//! Agent personas.
//!
//! [`Agent::parse`] is total: an empty or unrecognised id selects the
//! general advisor.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Agent {
    #[default]
    General,
    Socratic,
    CodeReviewer,
    Research,
    Exam,
    Motivational,
    TeachingAssistant,
}

impl Agent {
    pub const ALL: [Agent; 7] = [
        Agent::General,
        Agent::Socratic,
        Agent::CodeReviewer,
        Agent::Research,
        Agent::Exam,
        Agent::Motivational,
        Agent::TeachingAssistant,
    ];

    pub fn parse(id: &str) -> Self {
        match id.trim().to_lowercase().as_str() {
            "socratic" => Agent::Socratic,
            "code_reviewer" => Agent::CodeReviewer,
            "research" => Agent::Research,
            "exam" => Agent::Exam,
            "motivational" => Agent::Motivational,
            "teaching_assistant" | "ta" => Agent::TeachingAssistant,
            _ => Agent::General,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Agent::General => "general",
            Agent::Socratic => "socratic",
            Agent::CodeReviewer => "code_reviewer",
            Agent::Research => "research",
            Agent::Exam => "exam",
            Agent::Motivational => "motivational",
            Agent::TeachingAssistant => "teaching_assistant",
        }
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persona instruction blocks, built once and shared read-only.
#[derive(Debug, Clone)]
pub struct PersonaTable {
    instructions: HashMap<Agent, String>,
}

impl PersonaTable {
    pub fn standard() -> Self {
        let instructions = HashMap::from([
            (Agent::General, "You are AcademAide, an academic advisor."),
            (
                Agent::Socratic,
                "You are a Socratic Tutor. Your goal is to guide the student to the answer by asking probing questions. Do not give the answer directly. Break down complex problems into smaller steps.",
            ),
            (
                Agent::CodeReviewer,
                "You are an expert Code Reviewer. Analyze the student's code for bugs, efficiency, and style. Provide constructive feedback and explain *why* something is an issue. Do not just fix it.",
            ),
            (
                Agent::Research,
                "You are a Research Assistant. Focus on providing academic context, summarizing key concepts, and suggesting related topics or papers. Be formal and precise.",
            ),
            (
                Agent::Exam,
                "You are an Exam Strategist. Focus on test-taking strategies, time management, and prioritizing questions. Help the student prepare effectively for exams.",
            ),
            (
                Agent::Motivational,
                "You are a Motivational Coach. Be encouraging, positive, and supportive. Help the student set believable goals and overcome anxiety or procrastination.",
            ),
            (
                Agent::TeachingAssistant,
                "You are a Teaching Assistant for a faculty member. Help plan lectures, draft assessments, and summarize how enrolled students are doing. Be concise and practical.",
            ),
        ])
        .into_iter()
        .map(|(agent, text)| (agent, text.to_string()))
        .collect();
        Self { instructions }
    }

    /// Instruction block for `agent`, falling back to the general advisor.
    pub fn instructions(&self, agent: Agent) -> &str {
        self.instructions
            .get(&agent)
            .or_else(|| self.instructions.get(&Agent::General))
            .map(String::as_str)
            .unwrap_or_default()
    }
}

impl Default for PersonaTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_ids_parse() {
        assert_eq!(Agent::parse("socratic"), Agent::Socratic);
        assert_eq!(Agent::parse("code_reviewer"), Agent::CodeReviewer);
        assert_eq!(Agent::parse("Research"), Agent::Research);
        assert_eq!(Agent::parse(" exam "), Agent::Exam);
        assert_eq!(Agent::parse("ta"), Agent::TeachingAssistant);
    }

    #[test]
    fn unknown_or_empty_is_general() {
        assert_eq!(Agent::parse(""), Agent::General);
        assert_eq!(Agent::parse("pirate"), Agent::General);
        assert_eq!(Agent::parse("socratc"), Agent::General);
    }

    #[test]
    fn ids_roundtrip() {
        for agent in Agent::ALL {
            assert_eq!(Agent::parse(agent.as_str()), agent);
        }
    }

    #[test]
    fn every_agent_has_instructions() {
        let table = PersonaTable::standard();
        for agent in Agent::ALL {
            assert!(!table.instructions(agent).is_empty(), "{agent} has no persona");
        }
        assert_eq!(
            table.instructions(Agent::General),
            "You are AcademAide, an academic advisor."
        );
        assert!(table.instructions(Agent::Socratic).starts_with("You are a Socratic Tutor."));
    }
}
