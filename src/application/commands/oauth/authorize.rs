// src/application/commands/oauth/authorize.rs
use url::Url;

use super::OAuthCommandService;
use crate::{
    application::{
        dto::FormFields,
        error::{ApplicationError, ApplicationResult},
        services::session::{LOGGED_IN_USER_ID, Session},
    },
    domain::{
        oauth::{AuthorizationCode, PkceChallenge, authorization_code::CodeGrant},
        secret::fingerprint,
    },
};

pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizeOutcome {
    /// The browser has no logged-in user; the request was stashed in the session.
    LoginRequired { location: String },
    /// A code was issued; `location` is the client redirect carrying it.
    Redirect { location: String },
}

impl AuthorizeOutcome {
    pub fn location(&self) -> &str {
        match self {
            AuthorizeOutcome::LoginRequired { location } | AuthorizeOutcome::Redirect { location } => {
                location
            }
        }
    }
}

struct AuthorizeRequest {
    client_id: String,
    redirect_uri: Url,
    raw_redirect_uri: String,
    scope: Option<String>,
    state: Option<String>,
    challenge: Option<PkceChallenge>,
}

impl AuthorizeRequest {
    fn redirect_location(&self, code: &str) -> String {
        let mut location = self.redirect_uri.clone();
        {
            let mut pairs = location.query_pairs_mut();
            pairs.append_pair("code", code);
            if let Some(state) = &self.state {
                pairs.append_pair("state", state);
            }
        }
        location.into()
    }
}

impl OAuthCommandService {
    /// Handles `/oauth/authorize` for a bound browser session.
    ///
    /// A request stashed before login takes precedence over `query` and is consumed
    /// whatever the outcome.
    pub async fn authorize(
        &self,
        session: &mut Session,
        query: FormFields,
    ) -> ApplicationResult<AuthorizeOutcome> {
        let params = match session.take_return_request()? {
            Some(stashed) => {
                session.save().await?;
                tracing::debug!("resuming authorize request stashed before login");
                stashed
            }
            None => query,
        };

        let Some(user_id) = session.logged_in_user()?.map(str::to_string) else {
            session.stash_return_request(params);
            session.save().await?;
            return Ok(AuthorizeOutcome::LoginRequired {
                location: LOGIN_PATH.to_string(),
            });
        };

        let request = self.validate_authorize_request(&params).await?;
        let code = self.issue_code(&user_id, &request).await?;

        session.delete(LOGGED_IN_USER_ID);
        if let Err(err) = session.save().await {
            self.revoke_code(&code).await;
            return Err(err);
        }

        Ok(AuthorizeOutcome::Redirect {
            location: request.redirect_location(&code),
        })
    }

    /// Drops a code that never reached the browser.
    async fn revoke_code(&self, code: &str) {
        if let Err(err) = self.tokens.delete_code(code).await {
            tracing::warn!(
                code = %fingerprint(code),
                error = %err,
                "failed to remove undelivered authorization code"
            );
        }
    }

    async fn validate_authorize_request(
        &self,
        params: &FormFields,
    ) -> ApplicationResult<AuthorizeRequest> {
        let response_type = params
            .non_empty("response_type")
            .ok_or_else(|| ApplicationError::invalid_request("response_type is required"))?;
        if response_type != "code" {
            return Err(ApplicationError::invalid_request(format!(
                "unsupported response_type '{response_type}'"
            )));
        }

        let client_id = params
            .non_empty("client_id")
            .ok_or_else(|| ApplicationError::invalid_request("client_id is required"))?;
        let client = self
            .clients
            .find_by_id(client_id)
            .await?
            .ok_or_else(|| ApplicationError::invalid_client(format!("unknown client '{client_id}'")))?;

        let raw_redirect_uri = params
            .non_empty("redirect_uri")
            .ok_or_else(|| ApplicationError::invalid_request("redirect_uri is required"))?;
        let redirect_uri = Url::parse(raw_redirect_uri).map_err(|_| {
            ApplicationError::invalid_request("redirect_uri must be an absolute URL")
        })?;
        if !client.allows_redirect(&redirect_uri) {
            return Err(ApplicationError::invalid_client(
                "redirect_uri does not match the client's registered domain",
            ));
        }

        let challenge = PkceChallenge::from_request(
            params.non_empty("code_challenge"),
            params.non_empty("code_challenge_method"),
        )
        .map_err(|err| ApplicationError::invalid_request(err.to_string()))?;

        Ok(AuthorizeRequest {
            client_id: client.id().to_string(),
            redirect_uri,
            raw_redirect_uri: raw_redirect_uri.to_string(),
            scope: params.non_empty("scope").map(str::to_string),
            state: params.non_empty("state").map(str::to_string),
            challenge,
        })
    }

    async fn issue_code(&self, user_id: &str, request: &AuthorizeRequest) -> ApplicationResult<String> {
        let value = self.secrets.generate();
        let code = AuthorizationCode::issue(
            value.clone(),
            CodeGrant {
                client_id: request.client_id.clone(),
                user_id: user_id.to_string(),
                redirect_uri: request.raw_redirect_uri.clone(),
                challenge: request.challenge.clone(),
                scope: request.scope.clone(),
            },
            self.clock.now(),
            self.lifetimes.code_ttl,
        );
        self.tokens.insert_code(code).await?;

        tracing::info!(
            client_id = %request.client_id,
            code = %fingerprint(&value),
            pkce = request.challenge.as_ref().map(|c| c.method().as_str()).unwrap_or("none"),
            "authorization code issued"
        );
        Ok(value)
    }
}
