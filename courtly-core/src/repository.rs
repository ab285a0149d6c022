use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::booking::{Booking, BookingSlot, BookingStatus, Reservation};

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The requested slot overlaps an active booking.
    #[error("slot already booked")]
    SlotTaken,
    #[error("booking not found")]
    NotFound,
    /// A stored row failed an invariant (e.g. a malformed time string). This
    /// is a data-integrity failure and must surface rather than be skipped.
    #[error("corrupt booking row: {0}")]
    CorruptRow(String),
    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

/// Repository trait for booking persistence. The API layer depends on this
/// seam; `courtly-store` provides the Postgres implementation.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Active (pending/confirmed) slots for one club, court and date. This is
    /// the pre-filtered input the conflict checker expects.
    async fn find_active_slots(
        &self,
        club_id: Uuid,
        court_number: i32,
        date: NaiveDate,
    ) -> Result<Vec<BookingSlot>, RepositoryError>;

    /// Transactional check-and-insert: re-reads active slots, runs the
    /// conflict check and inserts atomically. Returns `SlotTaken` when the
    /// check fails or the database uniqueness backstop fires.
    async fn reserve(
        &self,
        reservation: &Reservation,
        member_email: &str,
        amount_cents: i32,
    ) -> Result<Booking, RepositoryError>;

    async fn get_booking(&self, id: Uuid) -> Result<Booking, RepositoryError>;

    async fn update_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> Result<(), RepositoryError>;
}
