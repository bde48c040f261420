// src/domain/user/entity.rs
use crate::domain::errors::{DomainError, DomainResult};

/// Identity as exposed by the user directory. Accounts themselves are managed elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub email: String,
    pub name: String,
}

impl UserIdentity {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> DomainResult<Self> {
        let email = email.into();
        if !email.contains('@') {
            return Err(DomainError::validation(format!("'{email}' is not an email address")));
        }
        Ok(Self {
            email,
            name: name.into(),
        })
    }
}
