pub mod availability;
pub mod booking;
pub mod profile;
pub mod session;

pub use availability::Availability;
pub use booking::{Booking, BookingStatus, NewBooking, ServiceType, TimeSlot};
pub use profile::Profile;
pub use session::{AuthUser, Identity, Session};
