use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Source of "now" for the coordinator.
///
/// Injected explicitly so calculations never read ambient time; meeting
/// dates are calendar dates with no timezone shift at aggregation
/// boundaries.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock implementation used by the live runtime.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fixed clock for tests and replays.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock {
    date: NaiveDate,
    at: DateTime<Utc>,
}

impl FixedClock {
    pub fn on(date: NaiveDate) -> Self {
        Self {
            date,
            at: date.and_time(NaiveTime::MIN).and_utc(),
        }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.date
    }

    fn now(&self) -> DateTime<Utc> {
        self.at
    }
}
