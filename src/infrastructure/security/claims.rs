// src/infrastructure/security/claims.rs
use crate::application::{
    dto::AccessClaims,
    error::{ApplicationError, ApplicationResult},
};
use biscuit_auth::builder::{Fact, Predicate, Term};
use chrono::{DateTime, Utc};

pub fn parse_claims(facts: Vec<Fact>) -> ApplicationResult<AccessClaims> {
    let ctx = ClaimsContext::from_facts(facts);
    build_access_claims(ctx)
}

fn build_access_claims(ctx: ClaimsContext) -> ApplicationResult<AccessClaims> {
    let token_id = ctx
        .token_id
        .ok_or_else(|| ApplicationError::invalid_token("missing token id"))?;
    let subject = ctx
        .subject
        .ok_or_else(|| ApplicationError::invalid_token("missing subject"))?;
    let audience = ctx
        .audience
        .ok_or_else(|| ApplicationError::invalid_token("missing audience"))?;
    let issued_at = ctx
        .issued_at
        .ok_or_else(|| ApplicationError::invalid_token("missing issued_at"))?;
    let expires_at = ctx
        .expires_at
        .ok_or_else(|| ApplicationError::invalid_token("missing expires_at"))?;

    AccessClaims::new(token_id, subject, audience, ctx.scope, issued_at, expires_at)
        .map_err(|err| ApplicationError::invalid_token(err.to_string()))
}

#[derive(Default)]
struct ClaimsContext {
    token_id: Option<String>,
    subject: Option<String>,
    audience: Option<String>,
    scope: Option<String>,
    issued_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
}

impl ClaimsContext {
    fn from_facts(facts: Vec<Fact>) -> Self {
        let mut ctx = ClaimsContext::default();
        for fact in facts {
            ctx.apply_predicate(fact.predicate);
        }
        ctx
    }

    fn apply_predicate(&mut self, predicate: Predicate) {
        match predicate.name.as_str() {
            "token_id" => self.token_id = first_str(&predicate),
            "subject" => self.subject = first_str(&predicate),
            "audience" => self.audience = first_str(&predicate),
            "scope" => self.scope = first_str(&predicate),
            "issued_at" => self.issued_at = first_date(&predicate),
            "expires_at" => self.expires_at = first_date(&predicate),
            _ => {}
        }
    }
}

fn first_str(predicate: &Predicate) -> Option<String> {
    match predicate.terms.first() {
        Some(Term::Str(value)) => Some(value.clone()),
        _ => None,
    }
}

fn first_date(predicate: &Predicate) -> Option<DateTime<Utc>> {
    match predicate.terms.first() {
        Some(Term::Date(seconds)) => {
            DateTime::<Utc>::from_timestamp(i64::try_from(*seconds).ok()?, 0)
        }
        _ => None,
    }
}
