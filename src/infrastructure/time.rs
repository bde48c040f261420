// src/infrastructure/time.rs
use crate::application::ports::time::Clock;
use chrono::{DateTime, Utc};

/// Wall clock used outside tests. Code, token and session expiry all read from it.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
