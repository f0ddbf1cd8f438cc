//! Clock port for server-side timestamps.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};

/// Source of `createdAt` / `updatedAt` values.
pub trait Clock: Send + Sync {
    /// The current time.
    fn now(&self) -> DateTime<Utc>;

    /// The current time as an RFC 3339 string with microsecond precision.
    fn timestamp(&self) -> String {
        self.now().to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

/// Wall clock that never hands out the same microsecond twice.
///
/// Two updates landing in the same microsecond (or a wall clock stepping
/// backwards) would otherwise give `updatedAt` values that do not increase.
#[derive(Debug, Default)]
pub struct SystemClock {
    last_micros: AtomicI64,
}

impl SystemClock {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_micros: AtomicI64::new(0),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now().timestamp_micros();
        let previous = self
            .last_micros
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(wall.max(last.saturating_add(1)))
            })
            .unwrap_or(wall);
        let issued = wall.max(previous.saturating_add(1));

        DateTime::from_timestamp_micros(issued).unwrap_or_else(Utc::now)
    }
}

#[cfg(test)]
pub struct FixedClock {
    at: DateTime<Utc>,
}

#[cfg(test)]
impl FixedClock {
    pub const fn new(at: DateTime<Utc>) -> Self {
        Self { at }
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.at
    }
}
