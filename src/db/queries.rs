use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{BookingRecord, PatientType};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const RECORD_COLUMNS: &str = "id, company_name, patient_type, first_name, last_name, date_of_birth, \
     phone, email, appointment_timing, day_of_week, business_hours, time_of_day, location, \
     pain_level, symptoms, procedure_name, insurance, policy_holder, policy_number, group_number, \
     additional_info, tentative_slot, created_at";

// ── Booking records ──

pub fn insert_booking_record(conn: &Connection, record: &BookingRecord) -> anyhow::Result<()> {
    let created_at = record.created_at.format(TIMESTAMP_FORMAT).to_string();
    let tentative_slot = record
        .tentative_slot
        .map(|slot| slot.format(TIMESTAMP_FORMAT).to_string());

    conn.execute(
        &format!(
            "INSERT INTO booking_records ({RECORD_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23)"
        ),
        params![
            record.id,
            record.company_name,
            record.patient_type.as_str(),
            record.first_name,
            record.last_name,
            record.date_of_birth,
            record.phone,
            record.email,
            record.appointment_timing,
            record.day_of_week,
            record.business_hours,
            record.time_of_day,
            record.location,
            record.pain_level,
            record.symptoms,
            record.procedure,
            record.insurance,
            record.policy_holder,
            record.policy_number,
            record.group_number,
            record.additional_info,
            tentative_slot,
            created_at,
        ],
    )?;
    Ok(())
}

pub fn get_booking_record(conn: &Connection, id: &str) -> anyhow::Result<Option<BookingRecord>> {
    let result = conn.query_row(
        &format!("SELECT {RECORD_COLUMNS} FROM booking_records WHERE id = ?1"),
        params![id],
        |row| Ok(parse_record_row(row)),
    );

    match result {
        Ok(record) => Ok(Some(record?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Newest first.
pub fn list_booking_records(conn: &Connection, limit: i64) -> anyhow::Result<Vec<BookingRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECORD_COLUMNS} FROM booking_records ORDER BY created_at DESC, rowid DESC LIMIT ?1"
    ))?;

    let rows = stmt.query_map(params![limit], |row| Ok(parse_record_row(row)))?;

    let mut records = vec![];
    for row in rows {
        records.push(row??);
    }
    Ok(records)
}

pub fn count_booking_records(conn: &Connection) -> anyhow::Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM booking_records", [], |row| row.get(0))?;
    Ok(count)
}

fn parse_timestamp(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).unwrap_or_else(|_| Utc::now().naive_utc())
}

fn parse_record_row(row: &rusqlite::Row) -> anyhow::Result<BookingRecord> {
    let patient_type_str: String = row.get(2)?;
    let tentative_slot: Option<String> = row.get(21)?;
    let created_at_str: String = row.get(22)?;

    let patient_type = PatientType::parse(&patient_type_str)
        .ok_or_else(|| anyhow::anyhow!("unknown patient type: {patient_type_str}"))?;

    Ok(BookingRecord {
        id: row.get(0)?,
        company_name: row.get(1)?,
        patient_type,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        date_of_birth: row.get(5)?,
        phone: row.get(6)?,
        email: row.get(7)?,
        appointment_timing: row.get(8)?,
        day_of_week: row.get(9)?,
        business_hours: row.get(10)?,
        time_of_day: row.get(11)?,
        location: row.get(12)?,
        pain_level: row.get(13)?,
        symptoms: row.get(14)?,
        procedure: row.get(15)?,
        insurance: row.get(16)?,
        policy_holder: row.get(17)?,
        policy_number: row.get(18)?,
        group_number: row.get(19)?,
        additional_info: row.get(20)?,
        tentative_slot: tentative_slot
            .as_deref()
            .and_then(|s| NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok()),
        created_at: parse_timestamp(&created_at_str),
    })
}
