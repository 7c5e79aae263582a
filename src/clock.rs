//! Time source abstraction.
//!
//! Lock expiry and the expiration/purge boundaries are all decided against
//! "now"; injecting the clock lets tests move time forward without sleeping.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use parking_lot::Mutex;

/// Source of the current time for lock expiry and date comparisons.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;

    /// Current date, at date granularity. Expiration comparisons ignore the
    /// time of day.
    fn today(&self) -> NaiveDate {
        self.now_utc().date_naive()
    }

    /// Current time as Unix seconds.
    fn now_unix(&self) -> i64 {
        self.now_utc().timestamp()
    }
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
///
/// Lets lock-expiry and retention-boundary tests simulate the passage of
/// days in microseconds.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}
