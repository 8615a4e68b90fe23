//! The document store's timestamp wrapper.
//!
//! Stores hand out instants as whole seconds plus a nanosecond remainder.
//! Converting to a native `DateTime<Utc>` is fallible: the wrapper can carry
//! values that no calendar date represents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// An instant as delivered by the document store.
///
/// Ordering is chronological: seconds first, then the nanosecond remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StoreTimestamp {
    /// Seconds since the Unix epoch.
    seconds: i64,
    /// Sub-second remainder. Valid values are below one billion.
    #[serde(rename = "nanoseconds")]
    nanos: u32,
}

impl StoreTimestamp {
    /// Creates a timestamp from raw components without validating them.
    #[must_use]
    pub const fn new(seconds: i64, nanos: u32) -> Self {
        Self { seconds, nanos }
    }

    /// Creates a timestamp for the current instant.
    #[must_use]
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Creates a timestamp from a native date/time.
    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self {
            seconds: dt.timestamp(),
            nanos: dt.timestamp_subsec_nanos(),
        }
    }

    /// Creates a timestamp from milliseconds since the Unix epoch.
    #[must_use]
    pub fn from_millis(millis: i64) -> Self {
        Self {
            seconds: millis.div_euclid(1000),
            nanos: (millis.rem_euclid(1000) as u32) * 1_000_000,
        }
    }

    /// Returns the seconds component.
    #[must_use]
    pub const fn seconds(&self) -> i64 {
        self.seconds
    }

    /// Returns the nanosecond component.
    #[must_use]
    pub const fn nanos(&self) -> u32 {
        self.nanos
    }

    /// Converts to a native date/time.
    ///
    /// Fails when the nanosecond component is out of range or the instant
    /// lies outside what `chrono` can represent.
    pub fn to_datetime(&self) -> crate::Result<DateTime<Utc>> {
        if self.nanos >= NANOS_PER_SECOND {
            return Err(self.invalid());
        }
        DateTime::from_timestamp(self.seconds, self.nanos).ok_or_else(|| self.invalid())
    }

    fn invalid(&self) -> crate::Error {
        crate::Error::InvalidTimestamp {
            seconds: self.seconds,
            nanos: self.nanos,
        }
    }
}

impl From<DateTime<Utc>> for StoreTimestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_datetime(dt)
    }
}
