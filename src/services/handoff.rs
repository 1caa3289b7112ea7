use chrono::{NaiveDate, Utc};

use crate::db::{self, queries};
use crate::errors::AppError;
use crate::models::{BookingAnswers, BookingRecord, TenantConfig};
use crate::services::calendar;
use crate::services::catalogue::Catalogue;
use crate::services::validation;
use crate::state::AppState;

/// Turns the collected answers into a stored record with a tentative slot
/// when the calendar can offer one in time.
pub async fn complete_booking(
    state: &AppState,
    answers: &BookingAnswers,
    tenant: &TenantConfig,
    today: NaiveDate,
) -> Result<BookingRecord, AppError> {
    let offered_days = Catalogue::resolve(tenant).available_days();
    if let Some(field) = validation::first_unusable(answers, today, &offered_days) {
        return Err(AppError::Internal(format!(
            "completed booking has no usable {}",
            field.key()
        )));
    }

    let mut record =
        BookingRecord::from_answers(answers, tenant.company_name(), Utc::now().naive_utc())
            .map_err(|field| {
                AppError::Internal(format!("completed booking is missing {}", field.key()))
            })?;

    record.tentative_slot = calendar::tentative_slot(
        state.calendar.as_ref(),
        &record,
        today,
        state.config.calendar_timeout,
    )
    .await;

    {
        let conn = db::lock(&state.db)?;
        queries::insert_booking_record(&conn, &record)?;
    }

    tracing::info!(
        booking_id = %record.id,
        company = %record.company_name,
        slot = ?record.tentative_slot,
        "booking handed off"
    );

    Ok(record)
}
