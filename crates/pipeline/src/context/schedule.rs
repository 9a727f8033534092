//! Schedule status and weekly timetable.
//!
//! Enrollments carry no section, so every slot of every enrolled course is
//! a candidate. A student in a multi-section course sees all sections.

use chrono::{Datelike, NaiveDateTime};

use academaide_core::academic::ScheduleSlot;

/// Where the caller is in today's timetable. Exactly one state holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleStatus {
    /// A slot with `start <= now < end` exists today.
    Ongoing(ScheduleSlot),
    /// No ongoing slot; this is the earliest slot starting later today.
    UpcomingToday(ScheduleSlot),
    NoneToday,
}

impl ScheduleStatus {
    /// Resolve the status at `now`. Ongoing wins over upcoming even when
    /// overlapping slots make both true.
    pub fn resolve(slots: &[ScheduleSlot], now: NaiveDateTime) -> Self {
        let today = now.weekday();
        let time = now.time();
        let todays = || slots.iter().filter(move |s| s.day_of_week == today);

        if let Some(slot) = todays()
            .filter(|s| s.start_time <= time && time < s.end_time)
            .min_by(|a, b| a.start_time.cmp(&b.start_time).then(a.course_id.cmp(&b.course_id)))
        {
            return ScheduleStatus::Ongoing(slot.clone());
        }

        if let Some(slot) = todays()
            .filter(|s| s.start_time > time)
            .min_by(|a, b| a.start_time.cmp(&b.start_time).then(a.course_id.cmp(&b.course_id)))
        {
            return ScheduleStatus::UpcomingToday(slot.clone());
        }

        ScheduleStatus::NoneToday
    }

    pub fn slot(&self) -> Option<&ScheduleSlot> {
        match self {
            ScheduleStatus::Ongoing(slot) | ScheduleStatus::UpcomingToday(slot) => Some(slot),
            ScheduleStatus::NoneToday => None,
        }
    }
}

/// Order slots Monday-first, then by start time.
pub fn weekly_timetable(slots: &[ScheduleSlot]) -> Vec<ScheduleSlot> {
    let mut ordered = slots.to_vec();
    ordered.sort_by(|a, b| {
        a.day_of_week
            .num_days_from_monday()
            .cmp(&b.day_of_week.num_days_from_monday())
            .then(a.start_time.cmp(&b.start_time))
            .then(a.course_id.cmp(&b.course_id))
            .then(a.section.cmp(&b.section))
    });
    ordered
}

/// English day name.
pub fn day_name(day: chrono::Weekday) -> &'static str {
    match day {
        chrono::Weekday::Mon => "Monday",
        chrono::Weekday::Tue => "Tuesday",
        chrono::Weekday::Wed => "Wednesday",
        chrono::Weekday::Thu => "Thursday",
        chrono::Weekday::Fri => "Friday",
        chrono::Weekday::Sat => "Saturday",
        chrono::Weekday::Sun => "Sunday",
    }
}
