pub mod booking;
pub mod bookings;
pub mod calendar;
pub mod health;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/booking/turn", post(booking::booking_turn))
        .route("/api/bookings", get(bookings::list_bookings))
        .route("/calendar/:booking_id", get(calendar::download_ics))
        .with_state(state)
}
