// crates/obscore-core/src/timestamp.rs
// ============================================================================
// Module: Timestamp
// Description: UTC ISO-8601 timestamp wrapper with RFC 3339 wire encoding.
// Purpose: Give every timed field in the data model one canonical type.
// Dependencies: time, serde
// ============================================================================

//! ## Overview
//! All timestamps in the data model are UTC and serialize as RFC 3339
//! strings on the wire. `Timestamp` wraps [`time::OffsetDateTime`] rather than
//! a raw string so that comparisons (`end_time >= start_time`) and arithmetic
//! (bucket widths, ages) stay in one place.

use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::Error as DeError;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// A UTC instant serialized as an RFC 3339 string.
///
/// # Invariants
/// - Always represents an instant in UTC; construction from a non-UTC offset
///   normalizes to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    /// Wraps an existing offset date-time, normalizing to UTC.
    #[must_use]
    pub fn new(value: OffsetDateTime) -> Self {
        Self(value.to_offset(time::UtcOffset::UTC))
    }

    /// Parses an RFC 3339 string into a `Timestamp`.
    ///
    /// # Errors
    /// Returns an error if `value` is not a valid RFC 3339 timestamp.
    pub fn parse(value: &str) -> Result<Self, time::error::Parse> {
        OffsetDateTime::parse(value, &Rfc3339).map(Self::new)
    }

    /// Returns the wrapped offset date-time.
    #[must_use]
    pub const fn inner(self) -> OffsetDateTime {
        self.0
    }

    /// Returns the number of whole milliseconds between `self` and `other`
    /// (`self - other`); negative when `self` precedes `other`. Saturates at
    /// `i64::MIN`/`i64::MAX` rather than overflowing.
    #[must_use]
    pub fn millis_since(self, other: Self) -> i64 {
        let millis = (self.0 - other.0).whole_milliseconds();
        i64::try_from(millis).unwrap_or(if millis.is_positive() { i64::MAX } else { i64::MIN })
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `OffsetDateTime::format` only fails on allocation or unsupported
        // components, neither of which applies to `Rfc3339`.
        match self.0.format(&Rfc3339) {
            Ok(text) => f.write_str(&text),
            Err(_) => f.write_str("<invalid-timestamp>"),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let text = self
            .0
            .format(&Rfc3339)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(DeError::custom)
    }
}

#[cfg(test)]
mod tests {
    //! Test-only lint relaxations for panic-based assertions and debug output.
    #![allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only output and panic-based assertions are permitted."
    )]

    use super::Timestamp;

    #[test]
    fn round_trips_through_rfc3339() {
        let ts = Timestamp::parse("2026-07-27T10:00:00Z").expect("valid timestamp");
        assert_eq!(ts.to_string(), "2026-07-27T10:00:00Z");
    }

    #[test]
    fn millis_since_is_signed() {
        let earlier = Timestamp::parse("2026-07-27T10:00:00Z").expect("valid");
        let later = Timestamp::parse("2026-07-27T10:00:01.500Z").expect("valid");
        assert_eq!(later.millis_since(earlier), 1500);
        assert_eq!(earlier.millis_since(later), -1500);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(Timestamp::parse("not-a-date").is_err());
    }
}
