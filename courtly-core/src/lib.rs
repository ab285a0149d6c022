pub mod booking;
pub mod repository;
pub mod schedule;

pub use booking::{Booking, BookingSlot, BookingStatus, Reservation, ReservationError};
pub use repository::{BookingRepository, RepositoryError};
pub use schedule::{has_conflict, TimeOfDay, TimeParseError};
