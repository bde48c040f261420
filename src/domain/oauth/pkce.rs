// src/domain/oauth/pkce.rs
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::secret::constant_time_eq;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeChallengeMethod {
    S256,
    Plain,
}

impl CodeChallengeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeChallengeMethod::S256 => "S256",
            CodeChallengeMethod::Plain => "plain",
        }
    }
}

impl FromStr for CodeChallengeMethod {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "S256" => Ok(CodeChallengeMethod::S256),
            "plain" => Ok(CodeChallengeMethod::Plain),
            other => Err(DomainError::validation(format!(
                "unsupported code_challenge_method '{other}'"
            ))),
        }
    }
}

impl fmt::Display for CodeChallengeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The challenge half of a PKCE pair, as received on the authorize request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceChallenge {
    challenge: String,
    method: CodeChallengeMethod,
}

impl PkceChallenge {
    pub fn new(challenge: impl Into<String>, method: CodeChallengeMethod) -> DomainResult<Self> {
        let challenge = challenge.into();
        if challenge.is_empty() {
            return Err(DomainError::validation("code_challenge cannot be empty"));
        }
        Ok(Self { challenge, method })
    }

    /// Interprets the optional authorize parameters. A challenge without a method
    /// defaults to `plain`; a method without a challenge is rejected.
    pub fn from_request(challenge: Option<&str>, method: Option<&str>) -> DomainResult<Option<Self>> {
        match (challenge, method) {
            (None, None) => Ok(None),
            (None, Some(_)) => Err(DomainError::validation(
                "code_challenge_method supplied without code_challenge",
            )),
            (Some(challenge), None) => Self::new(challenge, CodeChallengeMethod::Plain).map(Some),
            (Some(challenge), Some(method)) => Self::new(challenge, method.parse()?).map(Some),
        }
    }

    pub fn challenge(&self) -> &str {
        &self.challenge
    }

    pub fn method(&self) -> CodeChallengeMethod {
        self.method
    }

    pub fn verify(&self, verifier: &str) -> bool {
        match self.method {
            CodeChallengeMethod::S256 => {
                let computed = s256_challenge(verifier);
                // some clients send the padded base64 form
                let stored = self.challenge.trim_end_matches('=');
                constant_time_eq(computed.as_bytes(), stored.as_bytes())
            }
            CodeChallengeMethod::Plain => {
                constant_time_eq(verifier.as_bytes(), self.challenge.as_bytes())
            }
        }
    }
}

/// `base64url(SHA256(verifier))` without padding.
pub fn s256_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}
