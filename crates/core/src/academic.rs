//! Academic record domain: who the caller is and what they study or teach.
//!
//! All of this is owned by the relational record store and is read-only to
//! the pipeline. Role and grade strings coming from storage are parsed into
//! closed enums here so that an unexpected value falls through to a
//! documented default instead of silently diverging.

use async_trait::async_trait;
use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StoreError;

/// Whether the caller is a student or a member of faculty.
///
/// Deserializes through [`Role::parse`], so request bodies get the same
/// fallthrough as every other role label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Role {
    #[default]
    Student,
    Faculty,
}

impl Role {
    /// Parse a role label. "teacher" is accepted as an alias for faculty;
    /// anything unrecognised is treated as a student.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "faculty" | "teacher" => Role::Faculty,
            _ => Role::Student,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Faculty => "faculty",
        }
    }
}

impl From<String> for Role {
    fn from(label: String) -> Self {
        Role::parse(&label)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A student or faculty identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub display_name: String,
    pub role: Role,
    /// Department identifier.
    pub organizational_unit: String,
    pub join_year: i32,
}

/// A letter grade on the ten-point scale.
///
/// `Unrecognized` keeps the raw label for display; it scores like a fail.
/// Serialized as its label ("B+"), not as a variant name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Grade {
    O,
    APlus,
    A,
    BPlus,
    B,
    CPlus,
    C,
    D,
    F,
    Unrecognized(String),
}

impl Grade {
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "O" => Grade::O,
            "A+" => Grade::APlus,
            "A" => Grade::A,
            "B+" => Grade::BPlus,
            "B" => Grade::B,
            "C+" => Grade::CPlus,
            "C" => Grade::C,
            "D" => Grade::D,
            "F" => Grade::F,
            _ => Grade::Unrecognized(label.trim().to_string()),
        }
    }
}

impl From<String> for Grade {
    fn from(label: String) -> Self {
        Grade::parse(&label)
    }
}

impl From<Grade> for String {
    fn from(grade: Grade) -> Self {
        grade.to_string()
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Grade::O => "O",
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
            Grade::Unrecognized(raw) => raw.as_str(),
        };
        f.write_str(label)
    }
}

/// A student's enrollment in a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    pub user_id: String,
    pub course_id: String,
    /// e.g. "Enrolled", "Completed".
    pub status: String,
    /// Set once the course is graded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<Grade>,
}

/// A course offering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub course_id: String,
    pub title: String,
    pub credit_weight: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Null until the offline backfill has embedded the description.
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
}

/// One weekly timetable slot of a course section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSlot {
    pub course_id: String,
    pub section: String,
    pub day_of_week: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub room: String,
}

/// Read access to the relational academic record store.
///
/// Implementations: PostgreSQL, in-memory (for testing).
#[async_trait]
pub trait AcademicRecordStore: Send + Sync {
    /// The backend name (e.g., "postgres", "in_memory").
    fn name(&self) -> &str;

    /// Resolve an identity. `Ok(None)` when no such user exists for the role.
    async fn identity(&self, user_id: &str, role: Role) -> Result<Option<Identity>, StoreError>;

    /// Every enrollment of a student, graded or not.
    async fn enrollments(&self, student_id: &str) -> Result<Vec<EnrollmentRecord>, StoreError>;

    /// Look up course records by id. Unknown ids are skipped.
    async fn courses(&self, course_ids: &[String]) -> Result<Vec<Course>, StoreError>;

    /// All timetable slots of the given courses, across every section.
    async fn schedule(&self, course_ids: &[String]) -> Result<Vec<ScheduleSlot>, StoreError>;

    /// Course ids taught by a faculty member.
    async fn taught_courses(&self, faculty_id: &str) -> Result<Vec<String>, StoreError>;

    /// Students enrolled in a course.
    async fn roster(&self, course_id: &str) -> Result<Vec<Identity>, StoreError>;

    /// Syllabus topics of a course, optionally restricted to one unit.
    async fn syllabus_topics(
        &self,
        course_id: &str,
        unit: Option<u32>,
    ) -> Result<Vec<String>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing_falls_back_to_student() {
        assert_eq!(Role::parse("faculty"), Role::Faculty);
        assert_eq!(Role::parse("Teacher"), Role::Faculty);
        assert_eq!(Role::parse("student"), Role::Student);
        assert_eq!(Role::parse(""), Role::Student);
        assert_eq!(Role::parse("admin"), Role::Student);
    }

    #[test]
    fn role_labels_deserialize_through_parse() {
        let role: Role = serde_json::from_str(r#""teacher""#).unwrap();
        assert_eq!(role, Role::Faculty);
        let role: Role = serde_json::from_str(r#""admin""#).unwrap();
        assert_eq!(role, Role::Student);
        assert_eq!(serde_json::to_string(&Role::Faculty).unwrap(), r#""faculty""#);
    }

    #[test]
    fn grade_parsing_is_case_insensitive() {
        assert_eq!(Grade::parse("b+"), Grade::BPlus);
        assert_eq!(Grade::parse(" A+ "), Grade::APlus);
        assert_eq!(Grade::parse("o"), Grade::O);
    }

    #[test]
    fn unknown_grade_keeps_label() {
        let grade = Grade::parse("E");
        assert_eq!(grade, Grade::Unrecognized("E".into()));
        assert_eq!(grade.to_string(), "E");
    }

    #[test]
    fn grade_display_roundtrips() {
        for label in ["O", "A+", "A", "B+", "B", "C+", "C", "D", "F"] {
            assert_eq!(Grade::parse(label).to_string(), label);
        }
    }

    #[test]
    fn grade_serializes_as_label() {
        let json = serde_json::to_string(&Grade::BPlus).unwrap();
        assert_eq!(json, "\"B+\"");
        let grade: Grade = serde_json::from_str("\"a+\"").unwrap();
        assert_eq!(grade, Grade::APlus);
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Faculty).unwrap();
        assert_eq!(json, "\"faculty\"");
    }
}
