use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::db::{self, queries};
use crate::errors::AppError;
use crate::services::calendar::generate_ics;
use crate::state::AppState;

// GET /calendar/:booking_id
pub async fn download_ics(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    let booking_id = raw_id.strip_suffix(".ics").unwrap_or(&raw_id);

    let record = {
        let conn = db::lock(&state.db)?;
        queries::get_booking_record(&conn, booking_id)?
    }
    .ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))?;

    let ics = generate_ics(&record)
        .ok_or_else(|| AppError::NotFound(format!("no tentative slot for booking {booking_id}")))?;
    let filename = format!("intake-{booking_id}.ics");

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        ics,
    )
        .into_response())
}
