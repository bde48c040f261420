// src/infrastructure/security/token.rs
use crate::application::{
    dto::AccessClaims,
    error::{ApplicationError, ApplicationResult},
    ports::{security::TokenManager, time::Clock},
};
use async_trait::async_trait;
use biscuit_auth::{
    Biscuit, KeyPair, PrivateKey, PublicKey,
    builder::{Algorithm, AuthorizerBuilder, Term},
};
use std::{collections::HashMap, sync::Arc, time::SystemTime};

/// Signs access tokens as Ed25519 biscuits. Verification time comes from the
/// injected clock rather than the host clock.
#[derive(Clone)]
pub struct BiscuitTokenManager {
    root: Arc<KeyPair>,
    public: PublicKey,
    clock: Arc<dyn Clock>,
}

impl BiscuitTokenManager {
    pub fn new(private_key_hex: &str, clock: Arc<dyn Clock>) -> ApplicationResult<Self> {
        let private = PrivateKey::from_bytes_hex(private_key_hex, Algorithm::Ed25519)
            .map_err(|err| ApplicationError::internal(err.to_string()))?;
        let keypair = KeyPair::from(&private);
        let public = keypair.public();

        Ok(Self {
            root: Arc::new(keypair),
            public,
            clock,
        })
    }
}

fn build_code_and_params(claims: &AccessClaims) -> (String, HashMap<String, Term>) {
    let mut params: HashMap<String, Term> = HashMap::new();
    params.insert("jti".to_string(), claims.token_id.clone().into());
    params.insert("sub".to_string(), claims.subject.clone().into());
    params.insert("aud".to_string(), claims.audience.clone().into());
    params.insert("issued".to_string(), SystemTime::from(claims.issued_at).into());
    params.insert("exp".to_string(), SystemTime::from(claims.expires_at).into());

    let mut code = String::from(
        r#"
                token_id({jti});
                subject({sub});
                audience({aud});
                issued_at({issued});
                expires_at({exp});
                token_type("access");
                check if time($now), $now >= {issued};
                check if time($now), $now < {exp};
                "#,
    );

    if let Some(scope) = claims.scope.as_ref() {
        code.push_str("scope({scope});\n");
        params.insert("scope".to_string(), scope.clone().into());
    }

    (code, params)
}

fn build_and_serialize_biscuit(
    code: &str,
    params: HashMap<String, Term>,
    root: &KeyPair,
) -> Result<String, ApplicationError> {
    let builder = Biscuit::builder()
        .code_with_params(code, params, HashMap::new())
        .map_err(|err| ApplicationError::internal(err.to_string()))?;

    let token = builder
        .build(root)
        .map_err(|err| ApplicationError::internal(err.to_string()))?;

    let sealed = token
        .seal()
        .map_err(|err| ApplicationError::internal(err.to_string()))?;
    sealed
        .to_base64()
        .map_err(|err| ApplicationError::internal(err.to_string()))
}

#[async_trait]
impl TokenManager for BiscuitTokenManager {
    async fn issue(&self, claims: &AccessClaims) -> ApplicationResult<String> {
        let (code, params) = build_code_and_params(claims);
        build_and_serialize_biscuit(&code, params, self.root.as_ref())
    }

    async fn authenticate(&self, token: &str) -> ApplicationResult<AccessClaims> {
        let biscuit = Biscuit::from_base64(token, self.public)
            .map_err(|err| ApplicationError::invalid_token(err.to_string()))?;

        let mut params: HashMap<String, Term> = HashMap::new();
        params.insert("now".to_string(), SystemTime::from(self.clock.now()).into());

        let mut authorizer = AuthorizerBuilder::new()
            .code_with_params(
                r#"time({now}); allow if token_type("access");"#,
                params,
                HashMap::new(),
            )
            .map_err(|err| ApplicationError::internal(err.to_string()))?
            .build(&biscuit)
            .map_err(|err| ApplicationError::invalid_token(err.to_string()))?;

        authorizer
            .authorize()
            .map_err(|err| ApplicationError::invalid_token(err.to_string()))?;

        let (facts, _, _, _) = authorizer.dump();
        crate::infrastructure::security::claims::parse_claims(facts)
    }
}
