//! # Temporal Types — UTC Timestamps
//!
//! Defines `Timestamp`, the UTC-only instant used for `createdAt` and
//! `updatedAt`. Values are kept at microsecond precision, the resolution
//! existing sidecars were written with.
//!
//! ## Normalisation
//!
//! Output is always RFC 3339 with a `Z` suffix. Input is lenient:
//!
//! - `2026-01-15T12:00:00Z` and `2026-01-15T12:00:00.123456Z` are taken as-is.
//! - Explicit offsets (`+05:00`) are converted to UTC.
//! - Naive datetimes (`2026-01-15T12:00:00.5`, `2026-01-15 12:00:00`) are
//!   interpreted as UTC.
//!
//! Loading a sidecar written with naive datetimes and saving it again
//! therefore gains an explicit `Z`, and nothing else changes.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SyoError;

/// A UTC timestamp truncated to microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The earliest representable instant. Entries with no creation time
    /// order as if created here.
    pub const MIN: Timestamp = Timestamp(DateTime::<Utc>::MIN_UTC);

    /// Current UTC time.
    pub fn now() -> Self {
        Self::from_utc(Utc::now())
    }

    /// Create a timestamp from a `DateTime<Utc>`, truncating below microseconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt.trunc_subsecs(6))
    }

    /// Parse an RFC 3339 string or a naive ISO 8601 datetime.
    ///
    /// # Errors
    ///
    /// Returns `SyoError::Serialization` if the text matches neither form.
    pub fn parse(s: &str) -> Result<Self, SyoError> {
        let trimmed = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Self::from_utc(dt.with_timezone(&Utc)));
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
                return Ok(Self::from_utc(naive.and_utc()));
            }
        }
        Err(SyoError::Serialization(format!(
            "invalid timestamp {s:?}: expected RFC 3339 or ISO 8601 datetime"
        )))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Render as RFC 3339 with `Z` suffix, omitting a zero fraction.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    /// Render at minute resolution (`YYYY-MM-DD HH:MM`), the form matched by
    /// collection search.
    pub fn to_search_string(&self) -> String {
        self.0.format("%Y-%m-%d %H:%M").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Timestamp::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_now_has_microsecond_precision() {
        let ts = Timestamp::now();
        assert_eq!(ts.as_datetime().nanosecond() % 1_000, 0);
    }

    #[test]
    fn test_parse_z_suffix() {
        let ts = Timestamp::parse("2026-01-15T12:00:00Z").unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-01-15T12:00:00Z");
    }

    #[test]
    fn test_parse_offset_converts_to_utc() {
        let ts = Timestamp::parse("2026-01-15T17:00:00+05:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-01-15T12:00:00Z");
    }

    #[test]
    fn test_parse_naive_assumes_utc() {
        let ts = Timestamp::parse("2026-01-15T12:00:00.250000").unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-01-15T12:00:00.250Z");
        let spaced = Timestamp::parse("2026-01-15 12:00:00").unwrap();
        assert_eq!(spaced.to_rfc3339(), "2026-01-15T12:00:00Z");
    }

    #[test]
    fn test_parse_truncates_below_microseconds() {
        let ts = Timestamp::parse("2026-01-15T12:00:00.123456789Z").unwrap();
        assert_eq!(ts.as_datetime().nanosecond(), 123_456_000);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Timestamp::parse("not-a-date").is_err());
        assert!(Timestamp::parse("").is_err());
    }

    #[test]
    fn test_min_orders_first() {
        let dt = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        assert!(Timestamp::MIN < Timestamp::from_utc(dt));
    }

    #[test]
    fn test_search_string() {
        let dt = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(Timestamp::from_utc(dt).to_search_string(), "2026-03-04 05:06");
    }

    #[test]
    fn test_serde_roundtrip() {
        let ts = Timestamp::parse("2026-01-15T12:00:00.5Z").unwrap();
        let yaml = serde_yaml::to_string(&ts).unwrap();
        let parsed: Timestamp = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(ts, parsed);
    }
}
