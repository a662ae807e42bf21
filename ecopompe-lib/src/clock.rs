//! Time sources used for data staleness and price freshness checks.

use std::sync::atomic::{AtomicI64, Ordering};
use chrono::{DateTime, NaiveDate, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn new(millis: i64) -> Self {
        Self {
            millis: AtomicI64::new(millis),
        }
    }

    pub fn set_millis(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    pub fn advance_millis(&self, delta: i64) {
        self.millis.fetch_add(delta, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }

    fn now_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use crate::clock::{Clock, ManualClock};

    #[test]
    fn manual_clock_only_moves_when_told() {
        let clock = ManualClock::new(1526729962);
        assert_eq!(clock.now_millis(), 1526729962);

        clock.advance_millis(999);
        assert_eq!(clock.now_millis(), 1526730961);

        clock.set_millis(0);
        assert_eq!(clock.now_millis(), 0);
    }

    #[test]
    fn manual_clock_reports_utc_date() {
        // 2018-04-10T00:00:00Z
        let clock = ManualClock::new(1523318400000);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2018, 4, 10).unwrap());
    }
}
