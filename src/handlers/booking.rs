use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::errors::AppError;
use crate::models::Session;
use crate::services::availability::{self, BookingForm};
use crate::services::booking::{self, BookingRequest, SUCCESS_MESSAGE};
use crate::state::AppState;

// GET /api/booking/form
pub async fn booking_form(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<BookingForm>, AppError> {
    let form = availability::open_form(state.backend.as_ref(), &session).await?;
    Ok(Json(form))
}

// POST /api/bookings
pub async fn submit_booking(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(body): Json<BookingRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let booking = booking::submit_booking(
        state.backend.as_ref(),
        &session,
        state.config.slot_policy,
        &body,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "ok": true,
            "booking": booking,
            "message": SUCCESS_MESSAGE,
            "redirect": "/",
        })),
    ))
}
