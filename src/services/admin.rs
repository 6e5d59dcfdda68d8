use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::backend::Backend;
use crate::config::SlotPolicy;
use crate::errors::AppError;
use crate::models::{Availability, Booking, BookingStatus, Profile, Session};
use crate::services::booking::ensure_slot_free;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub confirmed: usize,
    pub cancelled: usize,
    pub total: usize,
}

impl StatusCounts {
    pub fn from_bookings(bookings: &[Booking]) -> Self {
        bookings.iter().fold(Self::default(), |mut counts, b| {
            match b.status {
                BookingStatus::Pending => counts.pending += 1,
                BookingStatus::Confirmed => counts.confirmed += 1,
                BookingStatus::Cancelled => counts.cancelled += 1,
            }
            counts.total += 1;
            counts
        })
    }
}

/// A booking with its requester's profile joined in.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BookingDetail {
    #[serde(flatten)]
    pub booking: Booking,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub actions: Vec<BookingStatus>,
}

impl BookingDetail {
    fn new(booking: Booking, profile: Option<&Profile>) -> Self {
        let actions = booking.status.actions().to_vec();
        Self {
            customer_name: profile.and_then(|p| p.full_name.clone()),
            customer_phone: profile.and_then(|p| p.phone.clone()),
            actions,
            booking,
        }
    }
}

/// The administrator's working copy of every booking.
///
/// Loaded once; status changes are applied to the stored row and then
/// patched into this copy without reloading the whole set.
#[derive(Debug, Clone)]
pub struct AdminBoard {
    bookings: Vec<Booking>,
    profiles: HashMap<String, Profile>,
    policy: SlotPolicy,
}

impl AdminBoard {
    pub async fn load(
        backend: &dyn Backend,
        session: &Session,
        policy: SlotPolicy,
    ) -> Result<Self, AppError> {
        let identity = session.require_admin()?;
        let token = &identity.access_token;

        let bookings = backend.list_bookings(token).await?;

        let owners: Vec<String> = bookings
            .iter()
            .map(|b| b.user_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let profiles = backend
            .profiles_by_ids(token, &owners)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        tracing::debug!(bookings = bookings.len(), owners = owners.len(), "loaded admin board");
        Ok(Self {
            bookings,
            profiles,
            policy,
        })
    }

    pub fn bookings(&self) -> &[Booking] {
        &self.bookings
    }

    pub fn profile(&self, user_id: &str) -> Option<&Profile> {
        self.profiles.get(user_id)
    }

    pub fn counts(&self) -> StatusCounts {
        StatusCounts::from_bookings(&self.bookings)
    }

    pub fn occupied_dates(&self) -> Availability {
        Availability::from_bookings(&self.bookings)
    }

    /// Every booking joined with its profile, in list order.
    pub fn rows(&self) -> Vec<BookingDetail> {
        self.bookings
            .iter()
            .map(|b| BookingDetail::new(b.clone(), self.profile(&b.user_id)))
            .collect()
    }

    pub fn detail(&self, id: &str) -> Result<BookingDetail, AppError> {
        let booking = self
            .bookings
            .iter()
            .find(|b| b.id == id)
            .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;
        Ok(BookingDetail::new(booking.clone(), self.profile(&booking.user_id)))
    }

    /// On failure the working copy is left as it was.
    pub async fn transition(
        &mut self,
        backend: &dyn Backend,
        session: &Session,
        id: &str,
        target: BookingStatus,
    ) -> Result<&Booking, AppError> {
        let index = self
            .bookings
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;

        let updated = set_status(backend, session, self.policy, id, target).await?;
        self.bookings[index].status = updated.status;
        Ok(&self.bookings[index])
    }
}

/// Sets a booking to `confirmed` or `cancelled` and returns the stored row.
pub async fn set_status(
    backend: &dyn Backend,
    session: &Session,
    policy: SlotPolicy,
    id: &str,
    target: BookingStatus,
) -> Result<Booking, AppError> {
    let identity = session.require_admin()?;
    let token = &identity.access_token;

    if !target.is_transition_target() {
        return Err(AppError::Validation(
            "Status can only be set to confirmed or cancelled.".to_string(),
        ));
    }

    if policy == SlotPolicy::FirstConfirmedWins && target == BookingStatus::Confirmed {
        let current = backend
            .get_booking(token, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;
        ensure_slot_free(backend, token, current.date, current.time, Some(id)).await?;
    }

    let updated = backend
        .update_booking_status(token, id, target)
        .await
        .map_err(|e| {
            tracing::error!(
                error = %e,
                booking_id = %id,
                status = %target,
                "failed to update booking status"
            );
            AppError::from(e)
        })?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;

    tracing::info!(
        booking_id = %id,
        status = %updated.status,
        admin = %identity.user.id,
        "booking status changed"
    );
    Ok(updated)
}

pub async fn booking_detail(
    backend: &dyn Backend,
    session: &Session,
    id: &str,
) -> Result<BookingDetail, AppError> {
    let identity = session.require_admin()?;
    let token = &identity.access_token;

    let booking = backend
        .get_booking(token, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;
    let profile = backend.get_profile(token, &booking.user_id).await?;

    Ok(BookingDetail::new(booking, profile.as_ref()))
}
