use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::models::BookingRecord;
use crate::services::scheduling::{self, slot_end};

/// External calendar collaborator. Only a stub ships; a real integration
/// would reserve the slot rather than just propose it.
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    async fn propose_slot(
        &self,
        record: &BookingRecord,
        today: NaiveDate,
    ) -> anyhow::Result<NaiveDateTime>;
}

/// Derives the slot from the caller's preferences without any I/O.
pub struct StubCalendar;

#[async_trait]
impl CalendarProvider for StubCalendar {
    async fn propose_slot(
        &self,
        record: &BookingRecord,
        today: NaiveDate,
    ) -> anyhow::Result<NaiveDateTime> {
        Ok(scheduling::propose_slot(record, today)?)
    }
}

/// Asks the calendar for a slot, giving up after `timeout`. Failures are
/// logged and yield `None`; the booking itself still completes.
pub async fn tentative_slot(
    calendar: &dyn CalendarProvider,
    record: &BookingRecord,
    today: NaiveDate,
    timeout: Duration,
) -> Option<NaiveDateTime> {
    match tokio::time::timeout(timeout, calendar.propose_slot(record, today)).await {
        Ok(Ok(slot)) => Some(slot),
        Ok(Err(e)) => {
            tracing::warn!(booking_id = %record.id, error = %e, "calendar could not propose a slot");
            None
        }
        Err(_) => {
            tracing::warn!(booking_id = %record.id, ?timeout, "calendar timed out");
            None
        }
    }
}

/// Text appended to the completion message.
pub fn slot_note(slot: Option<NaiveDateTime>) -> String {
    match slot {
        Some(slot) => format!(
            "We've tentatively reserved {} at {} for you.",
            slot.format("%A, %B %-d"),
            slot.format("%-I:%M %p")
        ),
        None => "Our team will call you to confirm an exact time.".to_string(),
    }
}

fn escape_text(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}

/// iCalendar event for a record with a tentative slot.
pub fn generate_ics(record: &BookingRecord) -> Option<String> {
    let start = record.tentative_slot?;
    let dtstart = start.format("%Y%m%dT%H%M%S").to_string();
    let dtend = slot_end(start).format("%Y%m%dT%H%M%S").to_string();
    let dtstamp = record.created_at.format("%Y%m%dT%H%M%S").to_string();
    let uid = format!("{}@intake", record.id);

    let summary = escape_text(&format!(
        "{} appointment with {}",
        record.procedure, record.company_name
    ));
    let location = escape_text(&record.location);
    let mut description = format!(
        "Patient: {}\\nReason: {}\\nPain level: {}/10",
        escape_text(&record.full_name()),
        escape_text(&record.symptoms),
        record.pain_level
    );
    if let Some(info) = &record.additional_info {
        description.push_str(&format!("\\nNotes: {}", escape_text(info)));
    }

    Some(format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Intake//Booking Assistant//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:{uid}\r\n\
         DTSTAMP:{dtstamp}\r\n\
         DTSTART:{dtstart}\r\n\
         DTEND:{dtend}\r\n\
         SUMMARY:{summary}\r\n\
         LOCATION:{location}\r\n\
         DESCRIPTION:{description}\r\n\
         STATUS:TENTATIVE\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PatientType;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn record(slot: Option<NaiveDateTime>, notes: Option<&str>) -> BookingRecord {
        BookingRecord {
            id: "test-123".to_string(),
            company_name: "Acme Spine".to_string(),
            patient_type: PatientType::Existing,
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            date_of_birth: "03/15/1985".to_string(),
            phone: "5551234567".to_string(),
            email: "jane@x.com".to_string(),
            appointment_timing: "next week".to_string(),
            day_of_week: "Saturday".to_string(),
            business_hours: None,
            time_of_day: "afternoon".to_string(),
            location: "Downtown, Suite 4".to_string(),
            pain_level: 6,
            symptoms: "stiff neck".to_string(),
            procedure: "Physical Therapy".to_string(),
            insurance: "Aetna".to_string(),
            policy_holder: "Jane Doe".to_string(),
            policy_number: "XYZ123456".to_string(),
            group_number: "GRP-01".to_string(),
            additional_info: notes.map(str::to_string),
            tentative_slot: slot,
            created_at: dt("2025-03-10 10:00:00"),
        }
    }

    struct SlowCalendar;

    #[async_trait]
    impl CalendarProvider for SlowCalendar {
        async fn propose_slot(
            &self,
            _record: &BookingRecord,
            _today: NaiveDate,
        ) -> anyhow::Result<NaiveDateTime> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(dt("2025-03-15 13:00:00"))
        }
    }

    struct BrokenCalendar;

    #[async_trait]
    impl CalendarProvider for BrokenCalendar {
        async fn propose_slot(
            &self,
            _record: &BookingRecord,
            _today: NaiveDate,
        ) -> anyhow::Result<NaiveDateTime> {
            anyhow::bail!("calendar unavailable")
        }
    }

    #[test]
    fn test_generate_ics() {
        let ics = generate_ics(&record(Some(dt("2025-03-15 13:00:00")), Some("bring x-rays"))).unwrap();
        assert!(ics.contains("BEGIN:VCALENDAR"));
        assert!(ics.contains("BEGIN:VEVENT"));
        assert!(ics.contains("DTSTART:20250315T130000"));
        assert!(ics.contains("DTEND:20250315T140000"));
        assert!(ics.contains("SUMMARY:Physical Therapy appointment with Acme Spine"));
        assert!(ics.contains("LOCATION:Downtown\\, Suite 4"));
        assert!(ics.contains("Notes: bring x-rays"));
        assert!(ics.contains("UID:test-123@intake"));
        assert!(ics.contains("END:VCALENDAR"));
    }

    #[test]
    fn test_generate_ics_needs_slot() {
        assert!(generate_ics(&record(None, None)).is_none());
    }

    #[tokio::test]
    async fn test_stub_calendar_proposes_slot() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let slot = tentative_slot(&StubCalendar, &record(None, None), today, Duration::from_secs(1)).await;
        // 2025-03-03 is a Monday; a week later is Monday 03-10, Saturday is 03-15
        assert_eq!(slot, Some(dt("2025-03-15 13:00:00")));
    }

    #[tokio::test]
    async fn test_slow_calendar_times_out() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let slot =
            tentative_slot(&SlowCalendar, &record(None, None), today, Duration::from_millis(100)).await;
        assert_eq!(slot, None);
    }

    #[tokio::test]
    async fn test_broken_calendar_degrades() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let slot =
            tentative_slot(&BrokenCalendar, &record(None, None), today, Duration::from_secs(1)).await;
        assert_eq!(slot, None);
        assert!(slot_note(slot).contains("call you"));
    }

    #[test]
    fn test_slot_note_formats_time() {
        let note = slot_note(Some(dt("2025-03-15 13:00:00")));
        assert_eq!(note, "We've tentatively reserved Saturday, March 15 at 1:00 PM for you.");
    }
}
