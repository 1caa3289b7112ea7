use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::models::availability::parse_weekday;
use crate::models::{AppointmentTiming, BookingRecord, TimeOfDay};

pub const APPOINTMENT_MINUTES: i64 = 60;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SchedulingError {
    #[error("unrecognized appointment timing: {0}")]
    UnknownTiming(String),
    #[error("unrecognized day of week: {0}")]
    UnknownDay(String),
    #[error("unrecognized time of day: {0}")]
    UnknownTimeOfDay(String),
}

/// Earliest date the caller's timing preference allows.
fn earliest_date(timing: AppointmentTiming, today: NaiveDate) -> NaiveDate {
    let days = match timing {
        AppointmentTiming::NextAvailable => 1,
        AppointmentTiming::NextWeek => 7,
        AppointmentTiming::AfterTwoWeeks => 14,
        AppointmentTiming::NextMonth => 30,
    };
    today + Duration::days(days)
}

fn start_hour(time_of_day: TimeOfDay) -> u32 {
    match time_of_day {
        TimeOfDay::Morning => 9,
        TimeOfDay::Afternoon => 13,
    }
}

/// First date on or after the timing offset that falls on the preferred
/// weekday, at 09:00 for mornings and 13:00 for afternoons.
pub fn propose_slot(
    record: &BookingRecord,
    today: NaiveDate,
) -> Result<NaiveDateTime, SchedulingError> {
    let timing = AppointmentTiming::parse(&record.appointment_timing)
        .ok_or_else(|| SchedulingError::UnknownTiming(record.appointment_timing.clone()))?;
    let weekday = parse_weekday(&record.day_of_week)
        .ok_or_else(|| SchedulingError::UnknownDay(record.day_of_week.clone()))?;
    let start_time = TimeOfDay::parse(&record.time_of_day)
        .and_then(|t| NaiveTime::from_hms_opt(start_hour(t), 0, 0))
        .ok_or_else(|| SchedulingError::UnknownTimeOfDay(record.time_of_day.clone()))?;

    let start = earliest_date(timing, today);
    let ahead = (7 + weekday.num_days_from_monday() as i64
        - start.weekday().num_days_from_monday() as i64)
        % 7;
    let date = start + Duration::days(ahead);

    Ok(date.and_time(start_time))
}

pub fn slot_end(start: NaiveDateTime) -> NaiveDateTime {
    start + Duration::minutes(APPOINTMENT_MINUTES)
}
