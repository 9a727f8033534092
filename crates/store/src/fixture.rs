//! JSON seed data for the in-memory stores.
//!
//! Lets `--ephemeral` sessions run against a realistic record set without a
//! database. Every section is optional.
//!
//! ```json
//! {
//!   "identities": [{"id": "S1", "display_name": "Asha Rao", "role": "student",
//!                   "organizational_unit": "CSE", "join_year": 2023}],
//!   "courses": [{"course_id": "CS101", "title": "Data Structures", "credit_weight": 4}],
//!   "enrollments": [{"user_id": "S1", "course_id": "CS101", "status": "Completed", "grade": "B+"}],
//!   "schedule": [{"course_id": "CS101", "section": "A", "day_of_week": "Monday",
//!                 "start_time": "09:00:00", "end_time": "10:00:00", "room": "R101"}]
//! }
//! ```

use serde::Deserialize;
use std::path::Path;

use academaide_core::academic::{Course, EnrollmentRecord, Identity, ScheduleSlot};
use academaide_core::error::StoreError;
use academaide_core::material::DocumentChunk;

use crate::in_memory::{InMemoryAcademicStore, InMemoryVectorStore};

#[derive(Debug, Default, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub identities: Vec<Identity>,
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub enrollments: Vec<EnrollmentRecord>,
    #[serde(default)]
    pub schedule: Vec<ScheduleSlot>,
    #[serde(default)]
    pub teaches: Vec<TeachingRow>,
    #[serde(default)]
    pub syllabus: Vec<SyllabusRow>,
    #[serde(default)]
    pub chunks: Vec<ChunkRow>,
}

#[derive(Debug, Deserialize)]
pub struct TeachingRow {
    pub faculty_id: String,
    pub course_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SyllabusRow {
    pub course_id: String,
    pub unit_no: u32,
    pub topic: String,
}

/// A chunk with its embedding inline.
#[derive(Debug, Deserialize)]
pub struct ChunkRow {
    pub id: String,
    pub course_id: String,
    pub unit_no: u32,
    pub text: String,
    #[serde(default)]
    pub source_label: String,
    #[serde(default)]
    pub embedding: Vec<f32>,
}

impl Fixture {
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        serde_json::from_str(json).map_err(|e| StoreError::Corrupt(format!("Invalid fixture: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StoreError::Connection(format!("Failed to read fixture {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    /// Build the read-only stores from this fixture.
    pub fn into_stores(self) -> (InMemoryAcademicStore, InMemoryVectorStore) {
        let mut records = InMemoryAcademicStore::new();
        for identity in self.identities {
            records = records.with_identity(identity);
        }
        for course in self.courses {
            records = records.with_course(course);
        }
        for enrollment in self.enrollments {
            records = records.with_enrollment(enrollment);
        }
        for slot in self.schedule {
            records = records.with_slot(slot);
        }
        for row in self.teaches {
            records = records.with_teaching(row.faculty_id, row.course_id);
        }
        for row in self.syllabus {
            records = records.with_syllabus_topic(row.course_id, row.unit_no, row.topic);
        }

        let mut vectors = InMemoryVectorStore::new();
        for row in self.chunks {
            vectors = vectors.with_chunk(DocumentChunk {
                id: row.id,
                course_id: row.course_id,
                unit_no: row.unit_no,
                text: row.text,
                embedding: row.embedding,
                source_label: row.source_label,
            });
        }

        (records, vectors)
    }
}
