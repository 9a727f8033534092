//! Context Aggregator: the caller's academic state as one snapshot.
//!
//! A student snapshot carries year, GPA, schedule status and the weekly
//! timetable; a faculty snapshot carries taught courses and rosters. Both
//! expose the course-id set that scopes retrieval.

pub mod aggregator;
pub mod grades;
pub mod schedule;

pub use aggregator::ContextAggregator;
pub use grades::{GpaReport, GradeScale, Standing, compute_gpa};
pub use schedule::{ScheduleStatus, weekly_timetable};

use std::collections::HashMap;
use std::fmt::Write;

use academaide_core::academic::{Course, Identity, ScheduleSlot};

use grades::ordinal;
use schedule::day_name;

/// Academic state of a student.
#[derive(Debug, Clone)]
pub struct StudentContext {
    pub identity: Identity,
    /// Years since joining, floored at 1.
    pub year: i32,
    pub gpa: GpaReport,
    pub status: ScheduleStatus,
    /// Deduplicated, in enrollment order.
    pub enrolled_course_ids: Vec<String>,
    pub courses: Vec<Course>,
    /// Monday-first.
    pub timetable: Vec<ScheduleSlot>,
}

/// Students enrolled in one taught course.
#[derive(Debug, Clone)]
pub struct CourseRoster {
    pub course_id: String,
    pub students: Vec<Identity>,
}

/// Academic state of a faculty member.
#[derive(Debug, Clone)]
pub struct FacultyContext {
    pub identity: Identity,
    pub taught_course_ids: Vec<String>,
    pub courses: Vec<Course>,
    pub rosters: Vec<CourseRoster>,
}

#[derive(Debug, Clone)]
pub enum AcademicContext {
    Student(StudentContext),
    Faculty(FacultyContext),
}

impl AcademicContext {
    pub fn identity(&self) -> &Identity {
        match self {
            AcademicContext::Student(s) => &s.identity,
            AcademicContext::Faculty(f) => &f.identity,
        }
    }

    /// Courses the caller is entitled to retrieve materials for.
    pub fn course_ids(&self) -> &[String] {
        match self {
            AcademicContext::Student(s) => &s.enrolled_course_ids,
            AcademicContext::Faculty(f) => &f.taught_course_ids,
        }
    }

    /// The contextual-awareness block of the prompt.
    pub fn render(&self) -> String {
        match self {
            AcademicContext::Student(s) => render_student(s),
            AcademicContext::Faculty(f) => render_faculty(f),
        }
    }
}

fn titles(courses: &[Course]) -> HashMap<&str, &str> {
    courses
        .iter()
        .map(|c| (c.course_id.as_str(), c.title.as_str()))
        .collect()
}

fn course_list(ids: &[String], titles: &HashMap<&str, &str>) -> String {
    if ids.is_empty() {
        return "none".into();
    }
    ids.iter()
        .map(|id| match titles.get(id.as_str()) {
            Some(title) => format!("{id} ({title})"),
            None => id.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_student(s: &StudentContext) -> String {
    let titles = titles(&s.courses);
    let title_of = |slot: &ScheduleSlot| -> String {
        titles
            .get(slot.course_id.as_str())
            .map(|t| t.to_string())
            .unwrap_or_else(|| slot.course_id.clone())
    };

    let status = match &s.status {
        ScheduleStatus::Ongoing(slot) => format!(
            "Ongoing Class: {} until {} in {}",
            title_of(slot),
            slot.end_time.format("%H:%M"),
            slot.room
        ),
        ScheduleStatus::UpcomingToday(slot) => format!(
            "Next Class: {} at {} in {}",
            title_of(slot),
            slot.start_time.format("%H:%M"),
            slot.room
        ),
        ScheduleStatus::NoneToday => "No Upcoming Classes".to_string(),
    };

    let mut out = format!(
        "User is {} from Dept {}, a {}-year student. GPA: {} ({}). {}. Enrolled Courses: {}. Weekly Schedule: ",
        s.identity.display_name,
        s.identity.organizational_unit,
        ordinal(s.year),
        s.gpa,
        s.gpa.standing().describe(),
        status,
        course_list(&s.enrolled_course_ids, &titles),
    );
    for slot in &s.timetable {
        let _ = write!(
            out,
            "[{}: {} at {} in {}] ",
            day_name(slot.day_of_week),
            title_of(slot),
            slot.start_time.format("%H:%M"),
            slot.room
        );
    }
    out.trim_end().to_string()
}

fn render_faculty(f: &FacultyContext) -> String {
    let titles = titles(&f.courses);
    let mut out = format!(
        "User is {} from Dept {}, a faculty member. Teaching: {}.",
        f.identity.display_name,
        f.identity.organizational_unit,
        course_list(&f.taught_course_ids, &titles),
    );
    for roster in &f.rosters {
        let names: Vec<&str> = roster.students.iter().map(|s| s.display_name.as_str()).collect();
        let _ = write!(
            out,
            " [{}: {} enrolled{}{}]",
            roster.course_id,
            names.len(),
            if names.is_empty() { "" } else { " - " },
            names.join(", ")
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use academaide_core::academic::Role;
    use chrono::{NaiveTime, Weekday};

    fn identity(role: Role) -> Identity {
        Identity {
            id: "U1".into(),
            display_name: "Asha Rao".into(),
            role,
            organizational_unit: "CSE".into(),
            join_year: 2022,
        }
    }

    fn course(id: &str, title: &str) -> Course {
        Course {
            course_id: id.into(),
            title: title.into(),
            credit_weight: 4,
            description: None,
            embedding: None,
        }
    }

    fn slot(course: &str, day: Weekday, hour: u32, room: &str) -> ScheduleSlot {
        ScheduleSlot {
            course_id: course.into(),
            section: "A".into(),
            day_of_week: day,
            start_time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(hour + 1, 0, 0).unwrap(),
            room: room.into(),
        }
    }

    #[test]
    fn student_block_lists_state_and_timetable() {
        let next = slot("CS101", Weekday::Mon, 11, "LH-1");
        let ctx = AcademicContext::Student(StudentContext {
            identity: identity(Role::Student),
            year: 3,
            gpa: GpaReport {
                gpa: 8.0,
                graded_courses: 1,
                graded_credits: 4,
            },
            status: ScheduleStatus::UpcomingToday(next.clone()),
            enrolled_course_ids: vec!["CS101".into()],
            courses: vec![course("CS101", "Data Structures")],
            timetable: vec![next, slot("CS101", Weekday::Wed, 9, "LH-2")],
        });

        let block = ctx.render();
        assert!(block.starts_with("User is Asha Rao from Dept CSE, a 3rd-year student."));
        assert!(block.contains("GPA: 8.00 (good standing)"));
        assert!(block.contains("Next Class: Data Structures at 11:00 in LH-1"));
        assert!(block.contains("Enrolled Courses: CS101 (Data Structures)"));
        assert!(block.contains("[Monday: Data Structures at 11:00 in LH-1] [Wednesday: Data Structures at 09:00 in LH-2]"));
        assert_eq!(ctx.course_ids(), ["CS101".to_string()]);
    }

    #[test]
    fn student_without_classes_today() {
        let ctx = AcademicContext::Student(StudentContext {
            identity: identity(Role::Student),
            year: 1,
            gpa: GpaReport::none(),
            status: ScheduleStatus::NoneToday,
            enrolled_course_ids: vec![],
            courses: vec![],
            timetable: vec![],
        });
        let block = ctx.render();
        assert!(block.contains("No Upcoming Classes"));
        assert!(block.contains("no graded courses yet"));
        assert!(block.contains("Enrolled Courses: none"));
        assert!(block.ends_with("Weekly Schedule:"));
    }

    #[test]
    fn faculty_block_lists_rosters() {
        let mut student = identity(Role::Student);
        student.display_name = "Ravi Kumar".into();
        let ctx = AcademicContext::Faculty(FacultyContext {
            identity: identity(Role::Faculty),
            taught_course_ids: vec!["CS101".into(), "CS102".into()],
            courses: vec![course("CS101", "Data Structures")],
            rosters: vec![
                CourseRoster {
                    course_id: "CS101".into(),
                    students: vec![student],
                },
                CourseRoster {
                    course_id: "CS102".into(),
                    students: vec![],
                },
            ],
        });
        let block = ctx.render();
        assert!(block.contains("a faculty member. Teaching: CS101 (Data Structures), CS102."));
        assert!(block.contains("[CS101: 1 enrolled - Ravi Kumar]"));
        assert!(block.contains("[CS102: 0 enrolled]"));
        assert_eq!(ctx.course_ids().len(), 2);
    }
}
