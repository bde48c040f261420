// src/application/services/session.rs
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex, Weak},
    time::Duration,
};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::application::{
    dto::FormFields,
    error::{ApplicationError, ApplicationResult},
    ports::{
        session::{SessionRecord, SessionRepository, SessionValue},
        time::Clock,
        util::SecretGenerator,
    },
};
use crate::domain::secret::fingerprint;

/// Session key holding the authenticated user's id, written by the login page.
pub const LOGGED_IN_USER_ID: &str = "LoggedInUserID";
/// Session key holding an authorize request stashed while the user logs in.
pub const RETURN_URI: &str = "ReturnUri";

type HmacSha256 = Hmac<Sha256>;

/// Binds browsers to sessions through signed cookies.
pub struct SessionStore {
    repo: Arc<dyn SessionRepository>,
    clock: Arc<dyn Clock>,
    secrets: Arc<dyn SecretGenerator>,
    signing_key: Vec<u8>,
    ttl: Duration,
    locks: Mutex<HashMap<String, Weak<AsyncMutex<()>>>>,
}

impl SessionStore {
    pub fn new(
        repo: Arc<dyn SessionRepository>,
        clock: Arc<dyn Clock>,
        secrets: Arc<dyn SecretGenerator>,
        signing_key: impl Into<Vec<u8>>,
        ttl: Duration,
    ) -> Self {
        Self {
            repo,
            clock,
            secrets,
            signing_key: signing_key.into(),
            ttl,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Binds the session named by `cookie`, or starts a fresh one when the cookie is
    /// absent, forged, or refers to an expired session. The returned handle holds the
    /// session's lock until it is dropped.
    pub async fn start(&self, cookie: Option<&str>) -> ApplicationResult<Session> {
        if let Some(id) = cookie.and_then(|value| self.verify_cookie(value)) {
            let guard = self.lock(&id).await?;
            match self.repo.load(&id).await? {
                Some(record) if record.expires_at > self.clock.now() => {
                    return self.bind(record.id, record.values, false, guard);
                }
                _ => tracing::debug!(
                    session = %fingerprint(&id),
                    "session cookie refers to an unknown or expired session"
                ),
            }
        }

        let id = self.secrets.generate();
        let guard = self.lock(&id).await?;
        self.bind(id, BTreeMap::new(), true, guard)
    }

    fn bind(
        &self,
        id: String,
        values: BTreeMap<String, SessionValue>,
        is_new: bool,
        guard: OwnedMutexGuard<()>,
    ) -> ApplicationResult<Session> {
        let cookie = self.sign(&id)?;
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|_| ApplicationError::internal("session ttl out of range"))?;
        Ok(Session {
            id,
            cookie,
            values,
            is_new,
            refreshed: false,
            dirty: false,
            ttl,
            repo: Arc::clone(&self.repo),
            clock: Arc::clone(&self.clock),
            _guard: guard,
        })
    }

    fn mac(&self) -> ApplicationResult<HmacSha256> {
        HmacSha256::new_from_slice(&self.signing_key)
            .map_err(|err| ApplicationError::internal(format!("session signing key: {err}")))
    }

    fn sign(&self, id: &str) -> ApplicationResult<String> {
        let mut mac = self.mac()?;
        mac.update(id.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{id}.{signature}"))
    }

    fn verify_cookie(&self, value: &str) -> Option<String> {
        let (id, signature) = value.rsplit_once('.')?;
        if id.is_empty() {
            return None;
        }
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;
        let mut mac = self.mac().ok()?;
        mac.update(id.as_bytes());
        mac.verify_slice(&signature).ok()?;
        Some(id.to_string())
    }

    async fn lock(&self, id: &str) -> ApplicationResult<OwnedMutexGuard<()>> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .map_err(|_| ApplicationError::internal("session lock table poisoned"))?;
            locks.retain(|_, weak| weak.strong_count() > 0);
            match locks.get(id).and_then(Weak::upgrade) {
                Some(existing) => existing,
                None => {
                    let created = Arc::new(AsyncMutex::new(()));
                    locks.insert(id.to_string(), Arc::downgrade(&created));
                    created
                }
            }
        };
        Ok(lock.lock_owned().await)
    }
}

/// A bound session. Mutations are local until [`Session::save`].
pub struct Session {
    id: String,
    cookie: String,
    values: BTreeMap<String, SessionValue>,
    is_new: bool,
    refreshed: bool,
    dirty: bool,
    ttl: chrono::Duration,
    repo: Arc<dyn SessionRepository>,
    clock: Arc<dyn Clock>,
    _guard: OwnedMutexGuard<()>,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Signed value for the session cookie.
    pub fn cookie_value(&self) -> &str {
        &self.cookie
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// True once this request has stored the session. Each store pushes `expires_at`
    /// forward, so the browser is handed the cookie again with a fresh `Max-Age`.
    pub fn needs_cookie(&self) -> bool {
        self.refreshed
    }

    pub fn get(&self, key: &str) -> Option<&SessionValue> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: SessionValue) {
        self.values.insert(key.into(), value);
        self.dirty = true;
    }

    pub fn delete(&mut self, key: &str) -> Option<SessionValue> {
        let removed = self.values.remove(key);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    pub fn logged_in_user(&self) -> ApplicationResult<Option<&str>> {
        match self.values.get(LOGGED_IN_USER_ID) {
            None => Ok(None),
            Some(SessionValue::Text(user)) if user.is_empty() => Ok(None),
            Some(SessionValue::Text(user)) => Ok(Some(user)),
            Some(SessionValue::Form(_)) => Err(ApplicationError::internal(format!(
                "session key {LOGGED_IN_USER_ID} holds a form"
            ))),
        }
    }

    pub fn stash_return_request(&mut self, request: FormFields) {
        self.set(RETURN_URI, SessionValue::Form(request));
    }

    /// Removes and returns the stashed authorize request.
    pub fn take_return_request(&mut self) -> ApplicationResult<Option<FormFields>> {
        match self.delete(RETURN_URI) {
            None => Ok(None),
            Some(SessionValue::Form(form)) => Ok(Some(form)),
            Some(SessionValue::Text(_)) => Err(ApplicationError::internal(format!(
                "session key {RETURN_URI} holds text"
            ))),
        }
    }

    /// Persists pending mutations and extends the session lifetime.
    pub async fn save(&mut self) -> ApplicationResult<()> {
        if !self.dirty {
            return Ok(());
        }
        let record = SessionRecord {
            id: self.id.clone(),
            values: self.values.clone(),
            expires_at: self.expiry_from_now(),
        };
        self.repo.store(&record).await?;
        self.dirty = false;
        self.refreshed = true;
        Ok(())
    }

    /// Clears all values and persists the empty session under the same id.
    pub async fn flush(&mut self) -> ApplicationResult<()> {
        self.values.clear();
        self.dirty = true;
        self.save().await
    }

    fn expiry_from_now(&self) -> DateTime<Utc> {
        self.clock.now() + self.ttl
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &fingerprint(&self.id))
            .field("keys", &self.values.keys().collect::<Vec<_>>())
            .field("is_new", &self.is_new)
            .finish()
    }
}
