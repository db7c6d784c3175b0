use std::time::SystemTime;

use chrono::{DateTime, TimeZone, Utc};

/// A moment that can be expressed as Unix seconds.
///
/// Only timezone-aware types implement this trait, so a
/// [`chrono::NaiveDateTime`] cannot be passed where a timestamp is expected.
pub trait IntoTimestamp {
    /// Seconds since the Unix epoch, rounded towards negative infinity.
    fn into_timestamp(self) -> i64;
}

impl IntoTimestamp for i64 {
    fn into_timestamp(self) -> i64 {
        self
    }
}

impl<Tz: TimeZone> IntoTimestamp for DateTime<Tz> {
    fn into_timestamp(self) -> i64 {
        self.timestamp()
    }
}

impl IntoTimestamp for SystemTime {
    fn into_timestamp(self) -> i64 {
        DateTime::<Utc>::from(self).timestamp()
    }
}

/// The current time in Unix seconds.
pub fn now() -> i64 {
    Utc::now().timestamp()
}
