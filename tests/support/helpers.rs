// tests/support/helpers.rs
use super::mocks::{MockClock, SwitchableSessionRepository};
use axum::body::{self, Body};
use axum::http::{Request, Response, header};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hpt_auth::application::{
    commands::oauth::GrantLifetimes,
    ports::{
        security::TokenManager,
        session::{SessionRepository, SessionValue},
        time::Clock,
        util::SecretGenerator,
    },
    services::{ApplicationServices, ServiceSettings, session::LOGGED_IN_USER_ID},
};
use hpt_auth::domain::client::{Client, ClientRegistry};
use hpt_auth::domain::user::UserIdentity;
use hpt_auth::infrastructure::{
    repositories::{InMemoryClientRegistry, InMemoryUserDirectory},
    security::{token::BiscuitTokenManager, token_store::InMemoryTokenStore},
    util::RandomSecretGenerator,
};
use hpt_auth::presentation::http::{
    routes::build_router_with_rate_limiter,
    state::{HttpSettings, HttpState},
};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::{sync::Arc, time::Duration};
use tower::util::ServiceExt as _;

pub const TEST_BISCUIT_KEY: &str =
    "c2a4a5f3e0b1d7c6a9f8e7d6c5b4a3928170f6e5d4c3b2a1908f7e6d5c4b3a29";
pub const TEST_SESSION_SECRET: &str = "0123456789abcdef0123456789abcdef";
pub const COOKIE_NAME: &str = "hpt_session";

pub const CLIENT_ID: &str = "222222";
pub const CLIENT_SECRET: &str = "22222222";
pub const CLIENT_DOMAIN: &str = "http://localhost:3000";
pub const OTHER_CLIENT_ID: &str = "333333";
pub const OTHER_CLIENT_SECRET: &str = "33333333";
pub const OTHER_CLIENT_DOMAIN: &str = "http://localhost:4000";

pub const USER_EMAIL: &str = "test@example.com";
pub const USER_NAME: &str = "Test User";

/// RFC 7636 appendix B.
pub const VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
pub const CHALLENGE: &str = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";

pub struct TestContext {
    pub router: axum::Router,
    pub state: HttpState,
    pub clock: Arc<MockClock>,
    pub tokens: Arc<InMemoryTokenStore>,
    pub sessions: Arc<SwitchableSessionRepository>,
}

impl TestContext {
    pub async fn new() -> Self {
        let clock = Arc::new(MockClock::new());
        let tokens = Arc::new(InMemoryTokenStore::new());
        let sessions = Arc::new(SwitchableSessionRepository::new());

        let clients = Arc::new(InMemoryClientRegistry::new());
        for (id, secret, domain) in [
            (CLIENT_ID, CLIENT_SECRET, CLIENT_DOMAIN),
            (OTHER_CLIENT_ID, OTHER_CLIENT_SECRET, OTHER_CLIENT_DOMAIN),
        ] {
            clients
                .register(Client::new(id, secret, domain).unwrap())
                .await
                .unwrap();
        }
        let users = Arc::new(InMemoryUserDirectory::with_users([
            UserIdentity::new(USER_EMAIL, USER_NAME).unwrap(),
        ]));

        let dyn_clock: Arc<dyn Clock> = clock.clone();
        let secrets: Arc<dyn SecretGenerator> = Arc::new(RandomSecretGenerator);
        let token_manager: Arc<dyn TokenManager> = Arc::new(
            BiscuitTokenManager::new(TEST_BISCUIT_KEY, Arc::clone(&dyn_clock)).unwrap(),
        );

        let services = Arc::new(ApplicationServices::new(
            clients,
            tokens.clone(),
            users,
            sessions.clone() as Arc<dyn SessionRepository>,
            token_manager,
            secrets,
            dyn_clock,
            ServiceSettings {
                lifetimes: GrantLifetimes::default(),
                session_ttl: Duration::from_secs(3600),
                session_signing_key: TEST_SESSION_SECRET.as_bytes().to_vec(),
            },
        ));

        let state = HttpState {
            services,
            settings: HttpSettings::default(),
        };
        let router = build_router_with_rate_limiter(state.clone(), false);

        Self {
            router,
            state,
            clock,
            tokens,
            sessions,
        }
    }

    /// Creates a stored session with `user` logged in and returns its `Cookie` header.
    pub async fn login(&self, user: &str) -> String {
        let mut session = self.state.services.sessions.start(None).await.unwrap();
        session.set(LOGGED_IN_USER_ID, SessionValue::Text(user.to_string()));
        session.save().await.unwrap();
        format!("{COOKIE_NAME}={}", session.cookie_value())
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.router
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub async fn get_with_bearer(&self, uri: &str, token: &str) -> Response<Body> {
        let req = Request::builder()
            .method("GET")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        self.router.clone().oneshot(req).await.unwrap()
    }

    pub async fn post_token(&self, form: &[(&str, &str)]) -> Response<Body> {
        let req = token_request(form, None);
        self.router.clone().oneshot(req).await.unwrap()
    }

    /// Runs a logged-in authorize request and returns the issued code.
    pub async fn issue_code(&self, query: &str) -> String {
        let cookie = self.login(USER_EMAIL).await;
        let resp = self.get(&format!("/oauth/authorize?{query}"), Some(&cookie)).await;
        assert_eq!(resp.status(), axum::http::StatusCode::FOUND);
        query_param(&location(&resp), "code").expect("code in redirect")
    }

    /// Full PKCE flow for the default client; returns the access token.
    pub async fn obtain_token(&self) -> String {
        let code = self.issue_code(&pkce_authorize_query("xyz")).await;
        let resp = self
            .post_token(&[
                ("grant_type", "authorization_code"),
                ("code", code.as_str()),
                ("redirect_uri", "http://localhost:3000/callback"),
                ("client_id", CLIENT_ID),
                ("code_verifier", VERIFIER),
            ])
            .await;
        assert_eq!(resp.status(), axum::http::StatusCode::OK);
        let json = read_json(resp).await;
        json["access_token"].as_str().unwrap().to_string()
    }
}

pub fn token_request(form: &[(&str, &str)], basic: Option<(&str, &str)>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/oauth/token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some((id, secret)) = basic {
        let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{id}:{secret}"));
        builder = builder.header(header::AUTHORIZATION, format!("Basic {encoded}"));
    }
    builder
        .body(Body::from(serde_urlencoded::to_string(form).unwrap()))
        .unwrap()
}

/// Authorize query for the default client using the padded S256 challenge.
pub fn pkce_authorize_query(state: &str) -> String {
    format!(
        "response_type=code&client_id={CLIENT_ID}&redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fcallback&code_challenge={CHALLENGE}%3D&code_challenge_method=S256&state={state}"
    )
}

pub fn s256(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

pub fn location(resp: &Response<Body>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("Location header")
        .to_string()
}

/// `name=value` from the response's `Set-Cookie`, ready for a `Cookie` header.
pub fn session_cookie_from(resp: &Response<Body>) -> Option<String> {
    let raw = resp.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    raw.split(';').next().map(|pair| pair.trim().to_string())
}

pub fn query_param(location: &str, name: &str) -> Option<String> {
    let url = url::Url::parse(location).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

pub async fn read_json(resp: Response<Body>) -> Value {
    let bytes = body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap_or_else(|err| {
        panic!(
            "response is not JSON ({err}): {}",
            String::from_utf8_lossy(&bytes)
        )
    })
}

/// Asserts an OAuth error body with the given status and `error` code.
pub async fn assert_oauth_error(
    resp: Response<Body>,
    status: axum::http::StatusCode,
    error: &str,
) -> Value {
    assert_eq!(resp.status(), status);
    let json = read_json(resp).await;
    assert_eq!(json["error"], error, "unexpected body: {json}");
    json
}
