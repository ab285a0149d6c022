use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::schedule::TimeOfDay;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Failed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Failed => "failed",
        }
    }

    /// Only pending and confirmed rows block new reservations.
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "cancelled" => Some(BookingStatus::Cancelled),
            "failed" => Some(BookingStatus::Failed),
            _ => None,
        }
    }
}

/// A persisted court booking.
///
/// Invariant: `start_time < end_time` within the same calendar day; bookings
/// never span midnight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub club_id: Uuid,
    pub court_number: i32,
    pub booking_date: NaiveDate,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub status: BookingStatus,
    pub member_email: String,
    pub amount_cents: i32,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The slice of a booking the conflict checker needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingSlot {
    pub court_number: i32,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReservationError {
    #[error("duration must be a positive number of minutes")]
    NonPositiveDuration,
    #[error("reservation must end within the same calendar day")]
    CrossesMidnight,
}

/// A proposed reservation. `end_time` is derived, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub club_id: Uuid,
    pub court_number: i32,
    pub booking_date: NaiveDate,
    pub start_time: TimeOfDay,
    pub duration_minutes: u32,
}

impl Reservation {
    /// Caller-side contract check. Runs before the conflict checker; the
    /// checker itself assumes a valid reservation.
    pub fn validate(&self) -> Result<(), ReservationError> {
        if self.duration_minutes == 0 {
            return Err(ReservationError::NonPositiveDuration);
        }
        // 24:00 is not representable as a TimeOfDay, so a booking running to
        // midnight is out of model along with anything past it. Saturating
        // arithmetic keeps an absurd wire-supplied duration on this rejection
        // path instead of wrapping back into the valid range.
        if self.end_minutes() >= 24 * 60 {
            return Err(ReservationError::CrossesMidnight);
        }
        Ok(())
    }

    pub fn end_minutes(&self) -> u32 {
        self.start_time
            .minutes_since_midnight()
            .saturating_add(self.duration_minutes)
    }

    /// Derived end time. Valid only after `validate()` has passed.
    pub fn end_time(&self) -> TimeOfDay {
        let end = self.end_minutes();
        TimeOfDay {
            hour: (end / 60) as u8,
            minute: (end % 60) as u8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reservation(start: &str, duration_minutes: u32) -> Reservation {
        Reservation {
            club_id: Uuid::new_v4(),
            court_number: 2,
            booking_date: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
            start_time: TimeOfDay::parse(start).unwrap(),
            duration_minutes,
        }
    }

    #[test]
    fn zero_duration_is_rejected() {
        assert_eq!(
            reservation("09:00", 0).validate(),
            Err(ReservationError::NonPositiveDuration)
        );
    }

    #[test]
    fn cross_midnight_is_rejected() {
        assert_eq!(
            reservation("23:30", 60).validate(),
            Err(ReservationError::CrossesMidnight)
        );
        // Ending exactly at 24:00 is also out of model.
        assert!(reservation("23:00", 60).validate().is_err());
        assert!(reservation("23:00", 59).validate().is_ok());
    }

    #[test]
    fn huge_duration_is_rejected_not_wrapped() {
        // u32::MAX once wrapped past midnight back into the valid range,
        // producing an end_time before start_time.
        let r = reservation("09:00", u32::MAX);
        assert_eq!(r.validate(), Err(ReservationError::CrossesMidnight));
        assert!(r.end_minutes() >= 24 * 60);

        assert_eq!(
            reservation("00:00", u32::MAX - 10).validate(),
            Err(ReservationError::CrossesMidnight)
        );
    }

    #[test]
    fn derived_end_time() {
        let r = reservation("09:15", 45);
        assert!(r.validate().is_ok());
        assert_eq!(r.end_time().to_string(), "10:00");
    }

    #[test]
    fn only_pending_and_confirmed_are_active() {
        assert!(BookingStatus::Pending.is_active());
        assert!(BookingStatus::Confirmed.is_active());
        assert!(!BookingStatus::Cancelled.is_active());
        assert!(!BookingStatus::Failed.is_active());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(BookingStatus::Confirmed).unwrap(),
            serde_json::json!("confirmed")
        );
        let parsed: BookingStatus = serde_json::from_value(serde_json::json!("pending")).unwrap();
        assert_eq!(parsed, BookingStatus::Pending);
    }

    #[test]
    fn status_round_trips_through_strings() {
        for s in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
            BookingStatus::Failed,
        ] {
            assert_eq!(BookingStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(BookingStatus::parse("PAID"), None);
    }
}
