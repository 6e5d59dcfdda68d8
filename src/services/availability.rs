use serde::Serialize;

use crate::backend::Backend;
use crate::errors::AppError;
use crate::models::availability::CLOSED_WEEKDAY;
use crate::models::{Availability, BookingStatus, ServiceType, Session, TimeSlot};

/// Dates already taken by confirmed bookings, as of this call.
pub async fn unavailable_dates(
    backend: &dyn Backend,
    session: &Session,
) -> Result<Availability, AppError> {
    let identity = session.require_user()?;
    let confirmed = backend
        .bookings_with_status(&identity.access_token, BookingStatus::Confirmed)
        .await?;
    Ok(Availability::from_bookings(&confirmed))
}

/// Everything the booking form needs when it opens.
#[derive(Debug, Serialize)]
pub struct BookingForm {
    pub full_name: Option<String>,
    pub time_slots: Vec<TimeSlot>,
    pub services: Vec<ServiceType>,
    pub closed_weekday: String,
    pub unavailable_dates: Availability,
}

pub async fn open_form(backend: &dyn Backend, session: &Session) -> Result<BookingForm, AppError> {
    let unavailable_dates = unavailable_dates(backend, session).await?;

    Ok(BookingForm {
        full_name: session.user().and_then(|u| u.full_name.clone()),
        time_slots: TimeSlot::ALL.to_vec(),
        services: ServiceType::CATEGORIES.to_vec(),
        closed_weekday: CLOSED_WEEKDAY.to_string().to_lowercase(),
        unavailable_dates,
    })
}
