use chrono::{DateTime, SubsecRound, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// `now()` truncated to whole seconds, the resolution of signed token timestamps.
    fn now_seconds(&self) -> DateTime<Utc> {
        self.now().trunc_subsecs(0)
    }
}
