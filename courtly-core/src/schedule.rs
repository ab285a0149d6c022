use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::booking::{BookingSlot, Reservation};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("time must be formatted as HH:MM, got '{0}'")]
    BadFormat(String),
    #[error("hour out of range in '{0}'")]
    HourOutOfRange(String),
    #[error("minute out of range in '{0}'")]
    MinuteOutOfRange(String),
}

/// Naive club-local wall-clock time. No time zone is attached; bookings are
/// compared on the same calendar date only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self { hour, minute })
    }

    /// Parse a `HH:MM` 24-hour string. Malformed input is a hard error:
    /// silently dropping a row from conflict input could hide a real overlap.
    pub fn parse(s: &str) -> Result<Self, TimeParseError> {
        let (h, m) = s
            .split_once(':')
            .ok_or_else(|| TimeParseError::BadFormat(s.to_string()))?;
        let hour: u8 = h
            .parse()
            .map_err(|_| TimeParseError::BadFormat(s.to_string()))?;
        let minute: u8 = m
            .parse()
            .map_err(|_| TimeParseError::BadFormat(s.to_string()))?;
        if hour > 23 {
            return Err(TimeParseError::HourOutOfRange(s.to_string()));
        }
        if minute > 59 {
            return Err(TimeParseError::MinuteOutOfRange(s.to_string()));
        }
        Ok(Self { hour, minute })
    }

    pub fn minutes_since_midnight(&self) -> u32 {
        u32::from(self.hour) * 60 + u32::from(self.minute)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Half-open interval overlap on minutes since midnight. Touching endpoints
/// (one booking ending exactly when the next starts) are NOT a conflict.
pub fn overlaps(a_start: u32, a_end: u32, b_start: u32, b_end: u32) -> bool {
    a_start < b_end && a_end > b_start
}

/// Returns true if the proposed reservation overlaps any of the given slots.
///
/// `existing` must already be filtered by the caller to the same club, court
/// and date, and to active statuses (pending/confirmed) only. This function
/// does not re-filter; it only compares intervals.
pub fn has_conflict(proposed: &Reservation, existing: &[BookingSlot]) -> bool {
    let new_start = proposed.start_time.minutes_since_midnight();
    let new_end = new_start + proposed.duration_minutes;

    for slot in existing {
        let exist_start = slot.start_time.minutes_since_midnight();
        let exist_end = slot.end_time.minutes_since_midnight();
        if overlaps(new_start, new_end, exist_start, exist_end) {
            return true;
        }
    }
    false
}
