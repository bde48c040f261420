// src/domain/client/entity.rs
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::secret::constant_time_eq;
use url::Url;

/// A registered OAuth client. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    id: String,
    secret: String,
    redirect_domain: String,
}

impl Client {
    pub fn new(
        id: impl Into<String>,
        secret: impl Into<String>,
        redirect_domain: impl Into<String>,
    ) -> DomainResult<Self> {
        let id = id.into();
        let redirect_domain = redirect_domain.into();
        if id.trim().is_empty() {
            return Err(DomainError::validation("client id cannot be empty"));
        }
        let parsed = Url::parse(&redirect_domain).map_err(|err| {
            DomainError::validation(format!("redirect domain '{redirect_domain}' is not a URL: {err}"))
        })?;
        if parsed.host_str().is_none() {
            return Err(DomainError::validation(format!(
                "redirect domain '{redirect_domain}' has no host"
            )));
        }
        Ok(Self {
            id,
            secret: secret.into(),
            redirect_domain,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn redirect_domain(&self) -> &str {
        &self.redirect_domain
    }

    pub fn secret_matches(&self, candidate: &str) -> bool {
        constant_time_eq(self.secret.as_bytes(), candidate.as_bytes())
    }

    /// A redirect target is allowed when scheme, host and effective port equal those of
    /// the registered domain. Path, query and fragment are not constrained.
    pub fn allows_redirect(&self, redirect_uri: &Url) -> bool {
        let Ok(domain) = Url::parse(&self.redirect_domain) else {
            return false;
        };
        let allowed = domain.origin();
        allowed.is_tuple() && allowed == redirect_uri.origin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Client {
        Client::new("222222", "22222222", "http://localhost:3000").unwrap()
    }

    fn allows(raw: &str) -> bool {
        client().allows_redirect(&Url::parse(raw).unwrap())
    }

    #[test]
    fn rejects_invalid_construction() {
        assert!(Client::new("", "secret", "http://localhost:3000").is_err());
        assert!(Client::new("id", "secret", "not a url").is_err());
        assert!(Client::new("id", "secret", "mailto:someone@example.com").is_err());
    }

    #[test]
    fn same_origin_redirects_are_allowed() {
        assert!(allows("http://localhost:3000/callback"));
        assert!(allows("http://localhost:3000/deep/path?x=1#frag"));
        assert!(allows("http://localhost:3000"));
    }

    #[test]
    fn other_origins_are_rejected() {
        assert!(!allows("https://localhost:3000/callback"));
        assert!(!allows("http://localhost:3001/callback"));
        assert!(!allows("http://localhost.evil.example:3000/callback"));
        assert!(!allows("http://evil.example/callback"));
    }

    #[test]
    fn default_ports_compare_equal() {
        let client = Client::new("id", "secret", "https://app.example.com").unwrap();
        let explicit = Url::parse("https://app.example.com:443/cb").unwrap();
        assert!(client.allows_redirect(&explicit));
    }

    #[test]
    fn secret_comparison() {
        let client = client();
        assert!(client.secret_matches("22222222"));
        assert!(!client.secret_matches("2222222"));
        assert!(!client.secret_matches(""));
    }
}
