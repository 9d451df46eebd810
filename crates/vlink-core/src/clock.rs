//! Wall-clock source for expiry computation.

use std::fmt;

/// Supplies the current Unix time in seconds.
pub trait Clock: fmt::Debug + Send + Sync {
    fn now_unix(&self) -> i64;
}

/// Reads the system clock (UTC).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        time::OffsetDateTime::now_utc().unix_timestamp()
    }
}
