//! Quiz generation and quiz performance analysis.
//!
//! Both reuse the chat pipeline's retrieval and generation collaborators
//! but ask for JSON. A generation failure here is an error: there is no
//! placeholder quiz.

use std::cmp::Reverse;
use std::fmt::Write;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use academaide_core::academic::AcademicRecordStore;
use academaide_core::error::{Error, Result};
use academaide_core::material::{CourseFilter, MaterialQuery};

use crate::cancel::cancellable;
use crate::generation::GenerationGateway;
use crate::prompt::material_entry;
use crate::retrieval::RetrievalEngine;

pub const DEFAULT_QUESTIONS: usize = 5;
pub const QUIZ_TOPIC: &str = "Generated from Course Materials";
pub const NO_MATERIALS: &str = "No course materials available.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizRequest {
    pub course_id: String,
    /// `None` or `Some(0)` covers the whole course.
    #[serde(default)]
    pub unit: Option<u32>,
    #[serde(default)]
    pub num_questions: Option<usize>,
}

impl QuizRequest {
    pub fn new(course_id: impl Into<String>, unit: Option<u32>) -> Self {
        Self {
            course_id: course_id.into(),
            unit,
            num_questions: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    #[serde(default)]
    pub id: u32,
    pub text: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_option: usize,
    /// Source file the question was drawn from.
    #[serde(default)]
    pub reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub course_id: String,
    pub topic: String,
    pub questions: Vec<QuizQuestion>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct QuizPayload {
    #[serde(default)]
    questions: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrongAnswer {
    pub question_text: String,
    pub correct_answer: String,
    pub user_answer: String,
    #[serde(default)]
    pub reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSubmission {
    pub course_id: String,
    #[serde(default)]
    pub wrong_questions: Vec<WrongAnswer>,
    #[serde(default)]
    pub total_questions: usize,
    #[serde(default)]
    pub score: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyPriority {
    pub topic: String,
    /// "High", "Medium" or "Low".
    pub priority: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizAnalysis {
    #[serde(default)]
    pub weak_areas: Vec<String>,
    #[serde(default)]
    pub study_priorities: Vec<StudyPriority>,
}

impl QuizAnalysis {
    fn perfect_score() -> Self {
        Self {
            weak_areas: Vec::new(),
            study_priorities: vec![StudyPriority {
                topic: "General Review".into(),
                priority: "Low".into(),
                reason: "Perfection! Just review the course summary.".into(),
            }],
        }
    }
}

pub struct QuizService {
    records: Arc<dyn AcademicRecordStore>,
    retrieval: Arc<RetrievalEngine>,
    gateway: Arc<GenerationGateway>,
    material_limit: usize,
}

impl QuizService {
    pub fn new(
        records: Arc<dyn AcademicRecordStore>,
        retrieval: Arc<RetrievalEngine>,
        gateway: Arc<GenerationGateway>,
        material_limit: usize,
    ) -> Self {
        Self {
            records,
            retrieval,
            gateway,
            material_limit,
        }
    }

    /// Generate a multiple-choice quiz grounded in the course's materials.
    pub async fn generate(&self, request: &QuizRequest, cancel: &CancellationToken) -> Result<Quiz> {
        let course_id = request.course_id.as_str();
        let unit = request.unit.filter(|u| *u > 0);
        let count = request.num_questions.filter(|n| *n > 0).unwrap_or(DEFAULT_QUESTIONS);

        let topics = self.records.syllabus_topics(course_id, unit).await?;
        if topics.is_empty() {
            return Err(Error::NotFound(format!(
                "syllabus for {course_id} (Unit {})",
                unit.unwrap_or(0)
            )));
        }
        let topic_list = topics.join(", ");

        let query = match unit {
            Some(n) => format!("Important concepts in {course_id} Unit {n}"),
            None => format!("Important concepts in {course_id}: {topic_list}"),
        };

        let materials = match cancellable(cancel, self.retrieval.embed_query(&query)).await? {
            None => NO_MATERIALS.to_string(),
            Some(embedding) => {
                let material_query = MaterialQuery {
                    embedding,
                    courses: CourseFilter::Only(vec![course_id.to_string()]),
                    unit,
                    limit: self.material_limit,
                };
                let search = self.retrieval.search(&material_query);
                let chunks = cancellable(cancel, search).await?;
                debug!(course_id, chunks = chunks.len(), "Quiz materials retrieved");
                if chunks.is_empty() {
                    NO_MATERIALS.to_string()
                } else {
                    chunks.iter().map(material_entry).collect::<String>()
                }
            }
        };

        let prompt = quiz_prompt(course_id, unit, count, &materials, &topic_list);
        let raw = self.gateway.generate_structured(prompt, cancel).await?;

        let mut payload: QuizPayload = parse_structured(&raw)?;
        payload.questions.retain(|q| !q.text.trim().is_empty());
        if payload.questions.is_empty() {
            return Err(Error::MalformedUpstreamResponse("quiz contained no questions".into()));
        }
        payload.questions.truncate(count);

        info!(course_id, unit = unit.unwrap_or(0), questions = payload.questions.len(), "Quiz generated");

        Ok(Quiz {
            course_id: course_id.to_string(),
            topic: QUIZ_TOPIC.to_string(),
            questions: payload.questions,
            created_at: Utc::now(),
        })
    }

    /// Turn a quiz's wrong answers into weak areas and a study list,
    /// highest priority first.
    pub async fn analyze(&self, submission: &QuizSubmission, cancel: &CancellationToken) -> Result<QuizAnalysis> {
        if submission.wrong_questions.is_empty() {
            return Ok(QuizAnalysis::perfect_score());
        }

        let prompt = analysis_prompt(submission);
        let raw = self.gateway.generate_structured(prompt, cancel).await?;
        let mut analysis: QuizAnalysis = parse_structured(&raw)?;
        sort_priorities(&mut analysis.study_priorities);

        info!(
            course_id = %submission.course_id,
            wrong = submission.wrong_questions.len(),
            weak_areas = analysis.weak_areas.len(),
            "Quiz analysed"
        );
        Ok(analysis)
    }
}

fn quiz_prompt(course_id: &str, unit: Option<u32>, count: usize, materials: &str, topics: &str) -> String {
    let scope = match unit {
        Some(n) => format!("focusing STRICTLY on Unit {n}"),
        None => "covering the course topics".to_string(),
    };
    format!(
        r#"You are a professor. Generate a quiz with {count} multiple-choice questions for the course {course_id}, {scope}.

CRITICAL INSTRUCTION:
1. You MUST use ONLY the content provided below in "Context Materials" to generate the questions.
2. Do NOT use outside knowledge. If the provided materials are insufficient, do not make up facts.
3. For each question, the "reference" field MUST be the exact 'Source' filename provided in the Context Materials (e.g. "Unit1_Intro.pdf"). Do not hallucinate filenames.

Context Materials:
{materials}

Topics: {topics}

Return ONLY valid JSON in the following format, with no extra text:
{{
  "questions": [
    {{
      "id": 1,
      "text": "Question text here?",
      "options": ["Option A", "Option B", "Option C", "Option D"],
      "correct_option": 0,
      "reference": "Exact_Source_File_Name.pdf"
    }}
  ]
}}
"#
    )
}

fn analysis_prompt(submission: &QuizSubmission) -> String {
    let mut mistakes = format!("Course: {}\nIncorrectly Answered Questions:\n", submission.course_id);
    for (i, q) in submission.wrong_questions.iter().enumerate() {
        let _ = write!(
            mistakes,
            "{}. Question: {}\n   Correct: {}\n   User Answered: {}\n   Source: {}\n",
            i + 1,
            q.question_text,
            q.correct_answer,
            q.user_answer,
            q.reference
        );
    }
    format!(
        r#"You are an academic tutor. A student just took a quiz for course {course} and got the following questions wrong.
Analyze their mistakes to identify specific weak topics.
Give a prioritized study list.

{mistakes}

Return ONLY valid JSON in this format:
{{
  "weak_areas": ["Topic A", "Topic B"],
  "study_priorities": [
    {{ "topic": "Specific Concept", "priority": "High", "reason": "Explanation based on mistakes" }},
    {{ "topic": "Another Concept", "priority": "Medium", "reason": "..." }}
  ]
}}
"#,
        course = submission.course_id,
    )
}

fn priority_rank(priority: &str) -> u8 {
    match priority.trim().to_ascii_lowercase().as_str() {
        "high" => 3,
        "medium" => 2,
        "low" => 1,
        _ => 0,
    }
}

/// High, then Medium, then Low, then anything else. Stable.
pub fn sort_priorities(priorities: &mut [StudyPriority]) {
    priorities.sort_by_key(|p| Reverse(priority_rank(&p.priority)));
}

/// Parse model output that should be JSON but may be wrapped in markdown
/// fences or surrounded by prose.
pub fn parse_structured<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let first_error = match serde_json::from_str(raw) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    let unfenced = raw.replace("```json", "").replace("```", "");
    if let Ok(value) = serde_json::from_str(unfenced.trim()) {
        return Ok(value);
    }

    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}'))
        && end > start
        && let Ok(value) = serde_json::from_str(&raw[start..=end])
    {
        return Ok(value);
    }

    warn!(error = %first_error, chars = raw.len(), "Unparseable structured response");
    Err(Error::MalformedUpstreamResponse(first_error.to_string()))
}
