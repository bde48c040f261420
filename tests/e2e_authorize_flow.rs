use axum::http::StatusCode;
use hpt_auth::application::ports::session::SessionValue;
use hpt_auth::application::services::session::{LOGGED_IN_USER_ID, RETURN_URI};
use hpt_auth::domain::oauth::{CodeChallengeMethod, TokenStore};

mod support;

use support::*;

/// Logged-out browser is sent to /login, then resumes the stashed request after login.
#[tokio::test]
async fn login_round_trip_resumes_stashed_request() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .get(&format!("/oauth/authorize?{}", pkce_authorize_query("abc123")), None)
        .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/login");
    let cookie = session_cookie_from(&resp).expect("new session gets a cookie");
    assert_eq!(ctx.sessions.len(), 1);

    // the login page stores the user in the same session
    let (_, value) = cookie.split_once('=').unwrap();
    {
        let mut session = ctx.state.services.sessions.start(Some(value)).await.unwrap();
        assert!(!session.is_new());
        assert!(matches!(session.get(RETURN_URI), Some(SessionValue::Form(_))));
        session.set(LOGGED_IN_USER_ID, SessionValue::Text(USER_EMAIL.into()));
        session.save().await.unwrap();
    }

    let resp = ctx.get("/auth", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/oauth/authorize");
    assert!(session_cookie_from(&resp).is_none());

    // the browser follows the redirect without any query
    let resp = ctx.get("/oauth/authorize", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let target = location(&resp);
    assert!(target.starts_with("http://localhost:3000/callback?code="), "{target}");
    assert_eq!(query_param(&target, "state").as_deref(), Some("abc123"));

    let code = query_param(&target, "code").unwrap();
    let stored = ctx.tokens.find_code(&code).await.unwrap().expect("code stored");
    assert_eq!(stored.client_id, CLIENT_ID);
    assert_eq!(stored.user_id, USER_EMAIL);
    assert_eq!(stored.redirect_uri, "http://localhost:3000/callback");
    assert!(!stored.used);
    let challenge = stored.challenge.expect("challenge stored");
    assert_eq!(challenge.method(), CodeChallengeMethod::S256);
    assert!(challenge.verify(VERIFIER));
    assert_eq!(stored.expires_at, fixed_now() + chrono::Duration::minutes(10));
}

#[tokio::test]
async fn stashed_request_wins_over_a_fresh_query() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .get(&format!("/oauth/authorize?{}", pkce_authorize_query("stashed")), None)
        .await;
    assert_eq!(location(&resp), "/login");
    let cookie = session_cookie_from(&resp).unwrap();
    let (_, value) = cookie.split_once('=').unwrap();
    {
        let mut session = ctx.state.services.sessions.start(Some(value)).await.unwrap();
        session.set(LOGGED_IN_USER_ID, SessionValue::Text(USER_EMAIL.into()));
        session.save().await.unwrap();
    }

    let fresh = format!(
        "/oauth/authorize?response_type=code&client_id={OTHER_CLIENT_ID}&redirect_uri=http%3A%2F%2Flocalhost%3A4000%2Fcallback&state=fresh"
    );
    let resp = ctx.get(&fresh, Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let target = location(&resp);
    assert!(target.starts_with("http://localhost:3000/callback?code="), "{target}");
    assert_eq!(query_param(&target, "state").as_deref(), Some("stashed"));

    let code = query_param(&target, "code").unwrap();
    let stored = ctx.tokens.find_code(&code).await.unwrap().unwrap();
    assert_eq!(stored.client_id, CLIENT_ID);
    assert!(stored.challenge.is_some());
    assert_eq!(ctx.tokens.code_count(), 1);
}

#[tokio::test]
async fn issuing_a_code_logs_the_session_out() {
    let ctx = TestContext::new().await;
    let cookie = ctx.login(USER_EMAIL).await;

    let query = format!("/oauth/authorize?{}", pkce_authorize_query("s1"));
    let resp = ctx.get(&query, Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(location(&resp).starts_with("http://localhost:3000/callback?"));
    // logging out stored the session, which extends it, so the cookie is refreshed
    let set_cookie = resp.headers()[axum::http::header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.starts_with(&format!("{cookie};")), "{set_cookie}");
    assert!(set_cookie.contains("Max-Age=3600"), "{set_cookie}");

    let resp = ctx.get(&query, Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/login");
}

#[tokio::test]
async fn code_is_withdrawn_when_the_session_cannot_be_saved() {
    let ctx = TestContext::new().await;
    let cookie = ctx.login(USER_EMAIL).await;
    let query = format!("/oauth/authorize?{}", pkce_authorize_query("s1"));

    ctx.sessions.reject_stores(true);
    let resp = ctx.get(&query, Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(resp.headers().get(axum::http::header::LOCATION).is_none());
    assert_eq!(ctx.tokens.code_count(), 0);

    // the logout never landed, so a retry still issues a code
    ctx.sessions.reject_stores(false);
    let resp = ctx.get(&query, Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(location(&resp).starts_with("http://localhost:3000/callback?code="));
    assert_eq!(ctx.tokens.code_count(), 1);
}

#[tokio::test]
async fn state_is_omitted_when_not_supplied() {
    let ctx = TestContext::new().await;
    let cookie = ctx.login(USER_EMAIL).await;

    let resp = ctx
        .get(
            "/oauth/authorize?response_type=code&client_id=222222&redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fcb%3Fnext%3D1",
            Some(&cookie),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let target = location(&resp);
    assert!(target.starts_with("http://localhost:3000/cb?next=1&code="), "{target}");
    assert!(query_param(&target, "state").is_none());

    let code = query_param(&target, "code").unwrap();
    let stored = ctx.tokens.find_code(&code).await.unwrap().unwrap();
    assert!(stored.challenge.is_none());
}

#[tokio::test]
async fn redirect_outside_registered_origin_is_rejected() {
    let ctx = TestContext::new().await;
    let cookie = ctx.login(USER_EMAIL).await;

    for redirect in [
        "http%3A%2F%2Flocalhost%3A4000%2Fcallback",
        "http%3A%2F%2Fevil.example%2Fcallback",
        "https%3A%2F%2Flocalhost%3A3000%2Fcallback",
    ] {
        let resp = ctx
            .get(
                &format!("/oauth/authorize?response_type=code&client_id=222222&redirect_uri={redirect}"),
                Some(&cookie),
            )
            .await;
        assert_oauth_error(resp, StatusCode::BAD_REQUEST, "invalid_client").await;
    }
    assert_eq!(ctx.tokens.code_count(), 0);
}

#[tokio::test]
async fn invalid_authorize_requests() {
    let ctx = TestContext::new().await;

    let cases = [
        (
            "response_type=token&client_id=222222&redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fcb",
            "invalid_request",
        ),
        (
            "response_type=code&client_id=999999&redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fcb",
            "invalid_client",
        ),
        ("response_type=code&client_id=222222", "invalid_request"),
        (
            "response_type=code&client_id=222222&redirect_uri=%2Fcallback",
            "invalid_request",
        ),
        (
            "response_type=code&client_id=222222&redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fcb&code_challenge=abc&code_challenge_method=S512",
            "invalid_request",
        ),
    ];

    for (query, error) in cases {
        let cookie = ctx.login(USER_EMAIL).await;
        let resp = ctx.get(&format!("/oauth/authorize?{query}"), Some(&cookie)).await;
        assert_oauth_error(resp, StatusCode::BAD_REQUEST, error).await;
    }
}

#[tokio::test]
async fn failed_validation_keeps_the_user_logged_in() {
    let ctx = TestContext::new().await;
    let cookie = ctx.login(USER_EMAIL).await;

    let resp = ctx
        .get(
            "/oauth/authorize?response_type=code&client_id=999999&redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fcb",
            Some(&cookie),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = ctx.get("/auth", Some(&cookie)).await;
    assert_eq!(location(&resp), "/oauth/authorize");
}

#[tokio::test]
async fn resume_without_login_goes_to_login() {
    let ctx = TestContext::new().await;
    let resp = ctx.get("/auth", None).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/login");
    // nothing was stored, so no cookie is handed out
    assert!(session_cookie_from(&resp).is_none());
    assert!(ctx.sessions.is_empty());
}

#[tokio::test]
async fn forged_cookie_starts_a_fresh_session() {
    let ctx = TestContext::new().await;
    let cookie = ctx.login(USER_EMAIL).await;
    let (id, _) = cookie.split_once('.').unwrap();
    let forged = format!("{id}.AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA");

    let resp = ctx
        .get(&format!("/oauth/authorize?{}", pkce_authorize_query("x")), Some(&forged))
        .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/login");
    let fresh = session_cookie_from(&resp).expect("fresh session cookie");
    assert_ne!(fresh, cookie);
}

#[tokio::test]
async fn expired_session_is_not_resumed() {
    let ctx = TestContext::new().await;
    let cookie = ctx.login(USER_EMAIL).await;
    ctx.clock.advance(chrono::Duration::hours(2));

    let resp = ctx.get("/auth", Some(&cookie)).await;
    assert_eq!(location(&resp), "/login");
}

#[tokio::test]
async fn reference_scenario_redirects_with_code_and_state() {
    let ctx = TestContext::new().await;
    let cookie = ctx.login(USER_EMAIL).await;

    let resp = ctx
        .get(
            "/oauth/authorize?client_id=222222&redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fcallback&response_type=code&code_challenge=Qn3Kywp0OiU4NK_AFzGPlmrcYJDJ13Abj_jdL08Ahg8%3D&code_challenge_method=S256&state=abc123",
            Some(&cookie),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let target = location(&resp);
    for expected in ["http://localhost:3000/callback", "code=", "state=abc123"] {
        assert!(target.contains(expected), "{target} lacks {expected}");
    }
    assert_eq!(ctx.tokens.code_count(), 1);
}
