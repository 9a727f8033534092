//! Academic health insights: grade risks and study suggestions derived
//! from a student's enrollments.
//!
//! Pure rules over the record store. No model call is involved.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use academaide_core::academic::{AcademicRecordStore, Grade, Role};
use academaide_core::error::{Error, Result};

/// Enrollment statuses whose grades are assessed.
const ASSESSED_STATUSES: [&str; 2] = ["Enrolled", "Completed"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskKind {
    Grades,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRisk {
    #[serde(rename = "type")]
    pub kind: RiskKind,
    pub severity: Severity,
    pub message: String,
    /// Title of the course the risk is about.
    pub subject: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub suggestion: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StudentInsights {
    pub risks: Vec<StudentRisk>,
    pub suggestions: Vec<Suggestion>,
}

/// How worrying a grade is. `None` for grades that need no action.
fn grade_severity(grade: &Grade) -> Option<Severity> {
    match grade {
        Grade::F | Grade::D => Some(Severity::High),
        Grade::Unrecognized(label) if label.eq_ignore_ascii_case("E") => Some(Severity::High),
        Grade::C | Grade::CPlus => Some(Severity::Medium),
        _ => None,
    }
}

fn assess(grade: &Grade, title: &str) -> Option<(StudentRisk, Suggestion)> {
    let severity = grade_severity(grade)?;
    let (message, suggestion, reason) = match severity {
        Severity::High => (
            format!("Critical performance (Grade: {grade}) in {title}"),
            format!("Schedule remedial session for {title}"),
            "Current grade puts you at risk of failing or academic probation.",
        ),
        Severity::Medium => (
            format!("Average performance (Grade: {grade}) in {title}"),
            format!("Review core concepts in {title}"),
            "Grade is average; improving understanding now can boost final score.",
        ),
    };
    let risk = StudentRisk {
        kind: RiskKind::Grades,
        severity,
        message,
        subject: title.to_string(),
    };
    Some((
        risk,
        Suggestion {
            suggestion,
            reason: reason.to_string(),
        },
    ))
}

pub struct InsightsService {
    records: Arc<dyn AcademicRecordStore>,
}

impl InsightsService {
    pub fn new(records: Arc<dyn AcademicRecordStore>) -> Self {
        Self { records }
    }

    /// Grade risks of a student, one per poorly graded course, each with a
    /// matching suggestion. A student with no risks gets a single
    /// keep-it-up suggestion.
    pub async fn student(&self, student_id: &str) -> Result<StudentInsights> {
        if self.records.identity(student_id, Role::Student).await?.is_none() {
            return Err(Error::NotFound(format!("student {student_id}")));
        }

        let enrollments = self.records.enrollments(student_id).await?;
        let course_ids: Vec<String> = enrollments.iter().map(|e| e.course_id.clone()).collect();
        let titles: HashMap<String, String> = self
            .records
            .courses(&course_ids)
            .await?
            .into_iter()
            .map(|c| (c.course_id, c.title))
            .collect();

        let mut insights = StudentInsights::default();
        for enrollment in &enrollments {
            if !ASSESSED_STATUSES.contains(&enrollment.status.as_str()) {
                continue;
            }
            // Enrollments in courses without a record are not assessed.
            let Some(title) = titles.get(&enrollment.course_id) else {
                continue;
            };
            let Some(grade) = &enrollment.grade else {
                continue;
            };
            if let Some((risk, suggestion)) = assess(grade, title) {
                insights.risks.push(risk);
                insights.suggestions.push(suggestion);
            }
        }

        if insights.risks.is_empty() {
            insights.suggestions.push(Suggestion {
                suggestion: "Maintain current study schedule".into(),
                reason: "Your academic health is green! All grades are satisfactory.".into(),
            });
        }

        info!(student_id, risks = insights.risks.len(), "Insights computed");
        Ok(insights)
    }
}
