// src/application/ports/session.rs
use crate::application::{ApplicationResult, dto::FormFields};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SessionValue {
    Text(String),
    Form(FormFields),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub values: BTreeMap<String, SessionValue>,
    pub expires_at: DateTime<Utc>,
}

/// Persistence for browser sessions. Backend failures surface as
/// `ApplicationError::Internal`.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn load(&self, id: &str) -> ApplicationResult<Option<SessionRecord>>;
    async fn store(&self, record: &SessionRecord) -> ApplicationResult<()>;
    /// Removes sessions past `expires_at`; backends with native expiry may return 0.
    async fn purge_expired(&self, now: DateTime<Utc>) -> ApplicationResult<u64>;
}
