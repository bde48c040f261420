// src/domain/secret.rs
//! Helpers for handling bearer secrets (codes, tokens, client secrets).
use subtle::ConstantTimeEq;

/// Length-revealing, content-constant-time equality.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// Short, non-reversible tag for a secret so it can appear in logs.
pub fn fingerprint(secret: &str) -> String {
    let digest = blake3::hash(secret.as_bytes());
    digest.to_hex()[..12].to_string()
}
