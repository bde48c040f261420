// src/application/commands/oauth/exchange.rs
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::OAuthCommandService;
use crate::{
    application::{
        dto::{AccessClaims, TokenResponseDto},
        error::{ApplicationError, ApplicationResult},
    },
    domain::{
        client::Client,
        oauth::{AccessToken, AuthorizationCode},
        secret::fingerprint,
    },
};

pub const AUTHORIZATION_CODE_GRANT: &str = "authorization_code";

/// Raw token endpoint parameters. Empty strings count as absent.
#[derive(Debug, Clone, Default)]
pub struct TokenExchangeCommand {
    pub grant_type: Option<String>,
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub code_verifier: Option<String>,
}

struct ExchangeRequest {
    code: String,
    redirect_uri: Option<String>,
    client_id: String,
    client_secret: Option<String>,
    code_verifier: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl TryFrom<TokenExchangeCommand> for ExchangeRequest {
    type Error = ApplicationError;

    fn try_from(command: TokenExchangeCommand) -> Result<Self, Self::Error> {
        match present(command.grant_type).as_deref() {
            Some(AUTHORIZATION_CODE_GRANT) => {}
            Some(other) => {
                return Err(ApplicationError::invalid_request(format!(
                    "unsupported grant_type '{other}'"
                )));
            }
            None => return Err(ApplicationError::invalid_request("grant_type is required")),
        }
        let code = present(command.code)
            .ok_or_else(|| ApplicationError::invalid_request("code is required"))?;
        let client_id = present(command.client_id)
            .ok_or_else(|| ApplicationError::invalid_request("client_id is required"))?;
        Ok(Self {
            code,
            redirect_uri: present(command.redirect_uri),
            client_id,
            client_secret: present(command.client_secret),
            code_verifier: present(command.code_verifier),
        })
    }
}

impl OAuthCommandService {
    /// Redeems an authorization code for an access token.
    ///
    /// Every check runs before the code is consumed; a code that fails validation stays
    /// redeemable. Once consumed it is never released, even if signing fails afterwards.
    pub async fn exchange(&self, command: TokenExchangeCommand) -> ApplicationResult<TokenResponseDto> {
        let request = ExchangeRequest::try_from(command)?;
        let client = self.authenticate_client(&request).await?;

        let now = self.clock.now();
        let code = self.load_redeemable_code(&request.code, now).await?;
        ensure_binding(&code, &request)?;
        verify_proof(&code, &request)?;

        if !self.tokens.consume_code(&code.code, now).await? {
            tracing::warn!(
                client_id = %client.id(),
                code = %fingerprint(&code.code),
                "authorization code lost a redemption race"
            );
            return Err(ApplicationError::invalid_grant("authorization code already used"));
        }

        self.issue_access_token(&code).await
    }

    async fn authenticate_client(&self, request: &ExchangeRequest) -> ApplicationResult<Client> {
        let client = self
            .clients
            .find_by_id(&request.client_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::invalid_client(format!("unknown client '{}'", request.client_id))
            })?;
        if let Some(secret) = &request.client_secret {
            if !client.secret_matches(secret) {
                return Err(ApplicationError::invalid_client("client authentication failed"));
            }
        }
        Ok(client)
    }

    async fn load_redeemable_code(
        &self,
        value: &str,
        now: DateTime<Utc>,
    ) -> ApplicationResult<AuthorizationCode> {
        let code = self
            .tokens
            .find_code(value)
            .await?
            .ok_or_else(|| ApplicationError::invalid_grant("authorization code not found"))?;

        if code.is_expired(now) {
            if let Err(err) = self.tokens.delete_code(&code.code).await {
                tracing::warn!(error = %err, "failed to delete expired authorization code");
            }
            return Err(ApplicationError::invalid_grant("authorization code expired"));
        }
        if code.used {
            return Err(ApplicationError::invalid_grant("authorization code already used"));
        }
        Ok(code)
    }

    async fn issue_access_token(&self, code: &AuthorizationCode) -> ApplicationResult<TokenResponseDto> {
        let issued_at = self.clock.now_seconds();
        let expires_at = issued_at + self.lifetimes.token_ttl;
        let claims = AccessClaims::new(
            Uuid::new_v4().to_string(),
            code.user_id.clone(),
            code.client_id.clone(),
            code.scope.clone(),
            issued_at,
            expires_at,
        )?;

        let access_token = self.token_manager.issue(&claims).await?;
        self.tokens
            .insert_token(AccessToken {
                access_token: access_token.clone(),
                client_id: code.client_id.clone(),
                user_id: code.user_id.clone(),
                scope: code.scope.clone(),
                created_at: issued_at,
                expires_at,
            })
            .await?;

        tracing::info!(
            client_id = %code.client_id,
            token_id = %claims.token_id,
            token = %fingerprint(&access_token),
            "access token issued"
        );

        Ok(TokenResponseDto {
            access_token,
            token_type: "bearer".to_string(),
            expires_in: (expires_at - issued_at).num_seconds(),
            scope: code.scope.clone(),
        })
    }
}

fn ensure_binding(code: &AuthorizationCode, request: &ExchangeRequest) -> ApplicationResult<()> {
    if code.client_id != request.client_id {
        return Err(ApplicationError::invalid_grant(
            "authorization code was issued to another client",
        ));
    }
    if request.redirect_uri.as_deref() != Some(code.redirect_uri.as_str()) {
        return Err(ApplicationError::invalid_grant("redirect_uri does not match"));
    }
    Ok(())
}

fn verify_proof(code: &AuthorizationCode, request: &ExchangeRequest) -> ApplicationResult<()> {
    match &code.challenge {
        Some(challenge) => {
            let verifier = request
                .code_verifier
                .as_deref()
                .ok_or_else(|| ApplicationError::invalid_grant("code_verifier is required"))?;
            if !challenge.verify(verifier) {
                return Err(ApplicationError::invalid_grant(
                    "code_verifier does not match code_challenge",
                ));
            }
        }
        // confidential client: the secret was already checked against the registry
        None if request.client_secret.is_none() => {
            return Err(ApplicationError::invalid_client(
                "client_secret is required for codes issued without PKCE",
            ));
        }
        None => {}
    }
    Ok(())
}
