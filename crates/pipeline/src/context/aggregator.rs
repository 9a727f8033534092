//! Builds an [`AcademicContext`] from the record store.
//!
//! Only identity resolution is fatal. Every other read degrades to an
//! empty default and is logged at `warn`.

use std::sync::Arc;

use chrono::{Datelike, NaiveDateTime};
use futures::future::join_all;
use tracing::{debug, warn};

use academaide_core::academic::{AcademicRecordStore, Identity, Role};
use academaide_core::error::{Error, Result, StoreError};

use super::grades::{GradeScale, academic_year, compute_gpa};
use super::schedule::{ScheduleStatus, weekly_timetable};
use super::{AcademicContext, CourseRoster, FacultyContext, StudentContext};

/// Stateless aside from its collaborators; share one per process.
pub struct ContextAggregator {
    records: Arc<dyn AcademicRecordStore>,
    scale: Arc<GradeScale>,
}

impl ContextAggregator {
    pub fn new(records: Arc<dyn AcademicRecordStore>, scale: Arc<GradeScale>) -> Self {
        Self { records, scale }
    }

    /// Snapshot the caller's academic state as of `now`.
    pub async fn aggregate(&self, user_id: &str, role: Role, now: NaiveDateTime) -> Result<AcademicContext> {
        match role {
            Role::Student => self.student(user_id, now).await.map(AcademicContext::Student),
            Role::Faculty => self.faculty(user_id).await.map(AcademicContext::Faculty),
        }
    }

    async fn student(&self, user_id: &str, now: NaiveDateTime) -> Result<StudentContext> {
        let (identity, enrollments) = tokio::join!(
            self.records.identity(user_id, Role::Student),
            self.records.enrollments(user_id),
        );
        let identity = require_identity(identity, user_id, Role::Student)?;
        let enrollments = or_default(enrollments, user_id, "enrollments");

        let mut course_ids: Vec<String> = Vec::with_capacity(enrollments.len());
        for enrollment in &enrollments {
            if !course_ids.contains(&enrollment.course_id) {
                course_ids.push(enrollment.course_id.clone());
            }
        }

        let (courses, slots) = tokio::join!(
            self.records.courses(&course_ids),
            self.records.schedule(&course_ids),
        );
        let courses = or_default(courses, user_id, "courses");
        let slots = or_default(slots, user_id, "schedule");

        let gpa = compute_gpa(&self.scale, &enrollments, &courses);
        let status = ScheduleStatus::resolve(&slots, now);
        let year = academic_year(now.year(), identity.join_year);

        debug!(
            user_id,
            courses = course_ids.len(),
            slots = slots.len(),
            gpa = gpa.gpa,
            "Aggregated student context"
        );

        Ok(StudentContext {
            identity,
            year,
            gpa,
            status,
            enrolled_course_ids: course_ids,
            courses,
            timetable: weekly_timetable(&slots),
        })
    }

    async fn faculty(&self, user_id: &str) -> Result<FacultyContext> {
        let (identity, taught) = tokio::join!(
            self.records.identity(user_id, Role::Faculty),
            self.records.taught_courses(user_id),
        );
        let identity = require_identity(identity, user_id, Role::Faculty)?;
        let taught = or_default(taught, user_id, "taught_courses");

        let (courses, rosters) = tokio::join!(
            self.records.courses(&taught),
            join_all(taught.iter().map(|id| self.records.roster(id))),
        );
        let courses = or_default(courses, user_id, "courses");
        let rosters = taught
            .iter()
            .zip(rosters)
            .map(|(course_id, students)| CourseRoster {
                course_id: course_id.clone(),
                students: or_default(students, user_id, "roster"),
            })
            .collect();

        debug!(user_id, courses = taught.len(), "Aggregated faculty context");

        Ok(FacultyContext {
            identity,
            taught_course_ids: taught,
            courses,
            rosters,
        })
    }
}

fn require_identity(
    found: std::result::Result<Option<Identity>, StoreError>,
    user_id: &str,
    role: Role,
) -> Result<Identity> {
    match found? {
        Some(identity) => Ok(identity),
        None => Err(Error::NotFound(format!("{role} '{user_id}'"))),
    }
}

fn or_default<T: Default>(read: std::result::Result<T, StoreError>, user_id: &str, what: &str) -> T {
    read.unwrap_or_else(|e| {
        warn!(user_id, read = what, error = %e, "Context read failed, using default");
        T::default()
    })
}
