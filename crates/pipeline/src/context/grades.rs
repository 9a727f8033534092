//! Grade points, GPA and academic standing.
//!
//! GPA is credit-weighted and truncated (not rounded) to two decimals, so
//! 8.129 reports as 8.12.

use std::collections::HashMap;
use std::fmt;

use academaide_core::academic::{Course, EnrollmentRecord, Grade};

/// Letter grade → point value on the ten-point scale.
///
/// Built once at startup and shared read-only. Grades missing from the
/// table (including `Unrecognized`) score zero.
#[derive(Debug, Clone)]
pub struct GradeScale {
    points: HashMap<Grade, f64>,
}

impl GradeScale {
    pub fn standard() -> Self {
        let points = HashMap::from([
            (Grade::O, 10.0),
            (Grade::APlus, 10.0),
            (Grade::A, 9.0),
            (Grade::BPlus, 8.0),
            (Grade::B, 7.0),
            (Grade::CPlus, 6.0),
            (Grade::C, 5.0),
            (Grade::D, 4.0),
            (Grade::F, 0.0),
        ]);
        Self { points }
    }

    pub fn points(&self, grade: &Grade) -> f64 {
        self.points.get(grade).copied().unwrap_or(0.0)
    }
}

impl Default for GradeScale {
    fn default() -> Self {
        Self::standard()
    }
}

/// A computed GPA with the inputs that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpaReport {
    /// Truncated to two decimals.
    pub gpa: f64,
    pub graded_courses: usize,
    pub graded_credits: u32,
}

impl GpaReport {
    pub fn none() -> Self {
        Self {
            gpa: 0.0,
            graded_courses: 0,
            graded_credits: 0,
        }
    }

    pub fn standing(&self) -> Standing {
        if self.graded_courses == 0 {
            Standing::NoGrades
        } else if self.gpa >= 9.0 {
            Standing::Excellent
        } else if self.gpa >= 7.5 {
            Standing::Good
        } else if self.gpa >= 6.0 {
            Standing::Satisfactory
        } else {
            Standing::NeedsImprovement
        }
    }
}

impl fmt::Display for GpaReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.gpa)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standing {
    Excellent,
    Good,
    Satisfactory,
    NeedsImprovement,
    NoGrades,
}

impl Standing {
    pub fn describe(&self) -> &'static str {
        match self {
            Standing::Excellent => "excellent standing",
            Standing::Good => "good standing",
            Standing::Satisfactory => "satisfactory standing",
            Standing::NeedsImprovement => "needs improvement",
            Standing::NoGrades => "no graded courses yet",
        }
    }
}

/// Truncate toward zero at two decimal places.
pub fn truncate_2dp(value: f64) -> f64 {
    (value * 100.0).trunc() / 100.0
}

/// Credit-weighted GPA over graded enrollments.
///
/// Enrollments whose course record is missing are skipped: their credit
/// weight is unknown.
pub fn compute_gpa(scale: &GradeScale, enrollments: &[EnrollmentRecord], courses: &[Course]) -> GpaReport {
    let credits: HashMap<&str, u32> = courses
        .iter()
        .map(|c| (c.course_id.as_str(), c.credit_weight))
        .collect();

    let mut total_points = 0.0;
    let mut total_credits: u32 = 0;
    let mut graded_courses = 0;

    for enrollment in enrollments {
        let Some(grade) = &enrollment.grade else {
            continue;
        };
        let Some(&weight) = credits.get(enrollment.course_id.as_str()) else {
            continue;
        };
        total_points += scale.points(grade) * f64::from(weight);
        total_credits += weight;
        graded_courses += 1;
    }

    let gpa = if total_credits > 0 {
        truncate_2dp(total_points / f64::from(total_credits))
    } else {
        0.0
    };

    GpaReport {
        gpa,
        graded_courses,
        graded_credits: total_credits,
    }
}

/// Years since joining, floored at 1.
pub fn academic_year(current_year: i32, join_year: i32) -> i32 {
    (current_year - join_year).max(1)
}

/// "1st", "2nd", "3rd", "4th", "11th", "21st", ...
pub fn ordinal(n: i32) -> String {
    let suffix = match (n % 100, n % 10) {
        (11..=13, _) => "th",
        (_, 1) => "st",
        (_, 2) => "nd",
        (_, 3) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}
