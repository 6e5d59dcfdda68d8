use std::collections::BTreeSet;

use chrono::{NaiveDate, Weekday};
use serde::Serialize;

use crate::models::{Booking, BookingStatus};

/// The shop does not open on this weekday; the picker disables it.
pub const CLOSED_WEEKDAY: Weekday = Weekday::Sun;

/// Dates the picker marks as already taken.
///
/// Advisory only: derived from confirmed bookings, by date and not by slot.
/// Once computed it is a plain value and does not follow later status changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Availability {
    unavailable: BTreeSet<NaiveDate>,
}

impl Availability {
    pub fn from_bookings<'a, I>(bookings: I) -> Self
    where
        I: IntoIterator<Item = &'a Booking>,
    {
        let unavailable = bookings
            .into_iter()
            .filter(|b| b.status == BookingStatus::Confirmed)
            .map(|b| b.date)
            .collect();
        Self { unavailable }
    }

    pub fn is_unavailable(&self, date: &NaiveDate) -> bool {
        self.unavailable.contains(date)
    }

    pub fn len(&self) -> usize {
        self.unavailable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unavailable.is_empty()
    }
}

pub fn is_closed(date: &NaiveDate) -> bool {
    use chrono::Datelike;
    date.weekday() == CLOSED_WEEKDAY
}
