use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::Local;

use crate::errors::AppError;
use crate::models::{TurnRequest, TurnResponse};
use crate::services::{booking_flow, calendar, context, handoff};
use crate::state::AppState;

// POST /api/booking/turn
pub async fn booking_turn(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TurnRequest>, JsonRejection>,
) -> Result<Json<TurnResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let today = Local::now().date_naive();
    let normalized = context::normalize(request, &state.default_tenant);
    let mut outcome = booking_flow::process_turn(normalized, state.phrases.as_ref(), today);

    if outcome.completed {
        let record =
            handoff::complete_booking(&state, &outcome.answers, &outcome.tenant, today).await?;
        let note = calendar::slot_note(record.tentative_slot);
        outcome.response.response_text = format!("{} {note}", outcome.response.response_text);
        outcome.response.booking_record = Some(record);
    }

    Ok(Json(outcome.response))
}
