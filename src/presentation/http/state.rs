// src/presentation/http/state.rs
use crate::application::{
    ApplicationResult, error::ApplicationError, services::ApplicationServices,
};
use std::{future::Future, sync::Arc, time::Duration};

#[derive(Clone)]
pub struct HttpState {
    pub services: Arc<ApplicationServices>,
    pub settings: HttpSettings,
}

#[derive(Clone, Debug)]
pub struct HttpSettings {
    pub session_cookie_name: String,
    pub session_cookie_secure: bool,
    pub request_timeout: Duration,
    pub allowed_origins: Vec<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            session_cookie_name: "hpt_session".into(),
            session_cookie_secure: false,
            request_timeout: Duration::from_secs(10),
            allowed_origins: vec!["*".into()],
        }
    }
}

impl HttpState {
    /// Runs an engine call under the per-request deadline. The future is dropped when
    /// the deadline passes.
    pub async fn within_deadline<T>(
        &self,
        call: impl Future<Output = ApplicationResult<T>>,
    ) -> ApplicationResult<T> {
        tokio::time::timeout(self.settings.request_timeout, call)
            .await
            .map_err(|_| ApplicationError::internal("request deadline exceeded"))?
    }
}
