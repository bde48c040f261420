// tests/support/mocks/session.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hpt_auth::application::{
    ApplicationResult,
    error::ApplicationError,
    ports::session::{SessionRecord, SessionRepository},
};
use hpt_auth::infrastructure::security::session_store::InMemorySessionRepository;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-memory sessions whose writes can be switched off to simulate a backend outage.
#[derive(Default)]
pub struct SwitchableSessionRepository {
    inner: InMemorySessionRepository,
    reject_stores: AtomicBool,
}

impl SwitchableSessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_stores(&self, reject: bool) {
        self.reject_stores.store(reject, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl SessionRepository for SwitchableSessionRepository {
    async fn load(&self, id: &str) -> ApplicationResult<Option<SessionRecord>> {
        self.inner.load(id).await
    }

    async fn store(&self, record: &SessionRecord) -> ApplicationResult<()> {
        if self.reject_stores.load(Ordering::SeqCst) {
            return Err(ApplicationError::internal("session backend unavailable"));
        }
        self.inner.store(record).await
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> ApplicationResult<u64> {
        self.inner.purge_expired(now).await
    }
}
