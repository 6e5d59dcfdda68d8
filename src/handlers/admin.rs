use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{Availability, Booking, BookingStatus, Session};
use crate::services::admin::{self, AdminBoard, BookingDetail, StatusCounts};
use crate::state::AppState;

// GET /api/admin/bookings
#[derive(Serialize)]
pub struct BookingsResponse {
    bookings: Vec<BookingDetail>,
    counts: StatusCounts,
    occupied_dates: Availability,
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<BookingsResponse>, AppError> {
    let board = AdminBoard::load(state.backend.as_ref(), &session, state.config.slot_policy).await?;

    Ok(Json(BookingsResponse {
        bookings: board.rows(),
        counts: board.counts(),
        occupied_dates: board.occupied_dates(),
    }))
}

// GET /api/admin/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<BookingDetail>, AppError> {
    let detail = admin::booking_detail(state.backend.as_ref(), &session, &id).await?;
    Ok(Json(detail))
}

// POST /api/admin/bookings/:id/status
#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: BookingStatus,
}

#[derive(Serialize)]
pub struct StatusResponse {
    ok: bool,
    booking: Booking,
    actions: Vec<BookingStatus>,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    let booking = admin::set_status(
        state.backend.as_ref(),
        &session,
        state.config.slot_policy,
        &id,
        body.status,
    )
    .await?;

    Ok(Json(StatusResponse {
        ok: true,
        actions: booking.status.actions().to_vec(),
        booking,
    }))
}
