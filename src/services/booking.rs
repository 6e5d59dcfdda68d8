use chrono::NaiveDate;
use serde::Deserialize;

use crate::backend::Backend;
use crate::config::SlotPolicy;
use crate::errors::AppError;
use crate::models::availability::is_closed;
use crate::models::{Booking, BookingStatus, NewBooking, ServiceType, Session, TimeSlot};

pub const REQUIRED_FIELDS_MESSAGE: &str =
    "Please fill in all required fields (date, time, service).";
pub const SUCCESS_MESSAGE: &str = "Booking requested successfully! Our team will contact you.";
pub const MAX_YEAR_LEN: usize = 4;

/// What the booking form sends. Date, time and service may be missing and
/// are checked by [`BookingRequest::validate`] before anything is written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingRequest {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub vehicle_brand: String,
    #[serde(default)]
    pub vehicle_model: String,
    #[serde(default)]
    pub vehicle_year: String,
    #[serde(default)]
    pub service_type: Option<String>,
    #[serde(default)]
    pub message: String,
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl BookingRequest {
    /// Builds the pending record for `user_id`. Vehicle fields and the
    /// message are carried through untouched.
    pub fn validate(&self, user_id: &str) -> Result<NewBooking, AppError> {
        let (Some(date), Some(time), Some(service)) = (
            present(&self.date),
            present(&self.time),
            present(&self.service_type),
        ) else {
            return Err(AppError::Validation(REQUIRED_FIELDS_MESSAGE.to_string()));
        };

        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| AppError::Validation(format!("Invalid date: {date}")))?;
        if is_closed(&date) {
            return Err(AppError::Validation(
                "We are closed on Sundays. Please pick another date.".to_string(),
            ));
        }

        let time = TimeSlot::parse(time)
            .ok_or_else(|| AppError::Validation(format!("Invalid time slot: {time}")))?;

        if self.vehicle_year.chars().count() > MAX_YEAR_LEN {
            return Err(AppError::Validation(format!(
                "Vehicle year must be at most {MAX_YEAR_LEN} characters."
            )));
        }

        Ok(NewBooking {
            user_id: user_id.to_string(),
            date,
            time,
            vehicle_brand: self.vehicle_brand.clone(),
            vehicle_model: self.vehicle_model.clone(),
            vehicle_year: self.vehicle_year.clone(),
            service_type: ServiceType::from(service.to_string()),
            message: self.message.clone(),
            status: BookingStatus::Pending,
        })
    }
}

/// Persists a booking request for the session user with status `pending`.
pub async fn submit_booking(
    backend: &dyn Backend,
    session: &Session,
    policy: SlotPolicy,
    request: &BookingRequest,
) -> Result<Booking, AppError> {
    let identity = session.require_user()?;
    let new_booking = request.validate(&identity.user.id)?;

    if policy == SlotPolicy::FirstConfirmedWins {
        ensure_slot_free(
            backend,
            &identity.access_token,
            new_booking.date,
            new_booking.time,
            None,
        )
        .await?;
    }

    let booking = backend
        .insert_booking(&identity.access_token, &new_booking)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %identity.user.id, "failed to store booking");
            AppError::from(e)
        })?;

    tracing::info!(
        booking_id = %booking.id,
        user_id = %booking.user_id,
        date = %booking.date,
        time = %booking.time,
        "booking requested"
    );
    Ok(booking)
}

/// Fails with `Conflict` when another confirmed booking holds the same date and slot.
pub(crate) async fn ensure_slot_free(
    backend: &dyn Backend,
    access_token: &str,
    date: NaiveDate,
    time: TimeSlot,
    except_id: Option<&str>,
) -> Result<(), AppError> {
    let confirmed = backend
        .bookings_with_status(access_token, BookingStatus::Confirmed)
        .await?;

    let taken = confirmed
        .iter()
        .any(|b| b.date == date && b.time == time && Some(b.id.as_str()) != except_id);
    if taken {
        return Err(AppError::Conflict(format!(
            "The {time} slot on {} is already booked. Please pick a different time.",
            date.format("%d/%m/%Y")
        )));
    }
    Ok(())
}
