//! Weekly schedule primitives
//!
//! Time-of-day parsing and the interval-overlap predicate shared by every
//! conflict check in the platform, plus the [`TimeSlot`] document embedded in
//! course records.
//!
//! All times are minutes since midnight on a single day. Intervals are
//! half-open `[start, end)`: a slot ending at 10:00 does not overlap a slot
//! starting at 10:00.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minutes since midnight, `0..=1439`.
pub type Minutes = u16;

/// Errors from parsing `"HH:MM"` time-of-day strings
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("Invalid time '{0}': expected HH:MM on a 24-hour clock")]
    InvalidFormat(String),
}

/// Parse a 24-hour `"HH:MM"` string into minutes since midnight
///
/// # Errors
///
/// Returns [`TimeParseError::InvalidFormat`] unless the input is two
/// colon-separated integers with hour < 24 and minute < 60.
pub fn to_minutes(time: &str) -> Result<Minutes, TimeParseError> {
    let invalid = || TimeParseError::InvalidFormat(time.to_string());

    let (hours, minutes) = time.split_once(':').ok_or_else(invalid)?;
    let hours: u16 = hours.trim().parse().map_err(|_| invalid())?;
    let minutes: u16 = minutes.trim().parse().map_err(|_| invalid())?;

    if hours >= 24 || minutes >= 60 {
        return Err(invalid());
    }

    Ok(hours * 60 + minutes)
}

/// Render minutes since midnight back to `"HH:MM"`
pub fn format_minutes(minutes: Minutes) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Test two half-open intervals `[a_start, a_end)` and `[b_start, b_end)` for
/// overlap
///
/// This is the only overlap test in the codebase; both the course-level
/// conflict checker and the per-student schedule check go through it.
/// Touching intervals (one ends exactly where the other starts) do not
/// overlap.
pub fn overlaps(a_start: Minutes, a_end: Minutes, b_start: Minutes, b_end: Minutes) -> bool {
    a_start < b_end && b_start < a_end
}

/// Teaching days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
}

impl Weekday {
    pub const ALL: [Weekday; 5] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Weekday::Mon => "Mon",
            Weekday::Tue => "Tue",
            Weekday::Wed => "Wed",
            Weekday::Thu => "Thu",
            Weekday::Fri => "Fri",
        }
    }
}

impl std::fmt::Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Weekday {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mon" | "monday" => Ok(Weekday::Mon),
            "tue" | "tuesday" => Ok(Weekday::Tue),
            "wed" | "wednesday" => Ok(Weekday::Wed),
            "thu" | "thursday" => Ok(Weekday::Thu),
            "fri" | "friday" => Ok(Weekday::Fri),
            other => Err(TimeParseError::InvalidFormat(other.to_string())),
        }
    }
}

/// Errors from validating a time slot
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SlotError {
    #[error(transparent)]
    Time(#[from] TimeParseError),

    #[error("Slot must end after it starts ({start} >= {end})")]
    EmptyInterval { start: String, end: String },

    #[error("Room is required for every slot")]
    RoomRequired,
}

/// One weekly recurring time block belonging to a course
///
/// Serialized with `"HH:MM"` start/end times; this is both the wire shape and
/// the stored (JSONB) shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub day: Weekday,
    #[serde(rename = "start_time", with = "hhmm")]
    pub start: Minutes,
    #[serde(rename = "end_time", with = "hhmm")]
    pub end: Minutes,
    pub room: String,
}

impl TimeSlot {
    /// Build a slot from wire strings, enforcing the slot invariants
    ///
    /// # Errors
    ///
    /// - `Time` - start or end is not a valid `"HH:MM"` time
    /// - `EmptyInterval` - start is not strictly before end
    /// - `RoomRequired` - room is empty or whitespace
    pub fn new(day: Weekday, start: &str, end: &str, room: &str) -> Result<Self, SlotError> {
        let start_min = to_minutes(start)?;
        let end_min = to_minutes(end)?;

        if start_min >= end_min {
            return Err(SlotError::EmptyInterval {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        if room.trim().is_empty() {
            return Err(SlotError::RoomRequired);
        }

        Ok(Self {
            day,
            start: start_min,
            end: end_min,
            room: room.trim().to_string(),
        })
    }

    /// Whether two slots collide in time on the same day, ignoring rooms
    pub fn clashes_with(&self, other: &TimeSlot) -> bool {
        self.day == other.day && overlaps(self.start, self.end, other.start, other.end)
    }

    /// Render the slot's time range as `"HH:MM-HH:MM"`
    pub fn time_range(&self) -> String {
        format!("{}-{}", format_minutes(self.start), format_minutes(self.end))
    }
}

/// Serde adapter between `Minutes` and the `"HH:MM"` wire format
mod hhmm {
    use super::{format_minutes, to_minutes, Minutes};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(minutes: &Minutes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_minutes(*minutes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Minutes, D::Error> {
        let raw = String::deserialize(deserializer)?;
        to_minutes(&raw).map_err(de::Error::custom)
    }
}
