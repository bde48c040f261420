// tests/support/mocks/time.rs
use chrono::{DateTime, Duration, Utc};
use hpt_auth::application::ports::time::Clock;
use once_cell::sync::Lazy;
use std::sync::Mutex;

static FIXED_NOW: Lazy<DateTime<Utc>> = Lazy::new(|| {
    DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
        .expect("invalid RFC3339 in tests/support/mocks/time.rs")
        .with_timezone(&Utc)
});

pub fn fixed_now() -> DateTime<Utc> {
    *FIXED_NOW
}

/// A clock that only moves when told to.
pub struct MockClock {
    now: Mutex<DateTime<Utc>>,
}

impl MockClock {
    pub fn new() -> Self {
        Self::at(fixed_now())
    }

    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
