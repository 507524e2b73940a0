//! Caller identity, taken from the `sub` claim of a bearer token.
//!
//! # Trust boundary
//!
//! The token signature is NOT verified here. An upstream gateway owns
//! authentication; this relay only reads the claimed subject to partition
//! queues. The header's `alg` is not interpreted, and expiry, audience and
//! not-before claims are ignored as well.

use axum::http::HeaderValue;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{Map, Value};
use std::fmt;

/// Prefix of every per-identity queue key
pub const QUEUE_KEY_PREFIX: &str = "message::";

/// Opaque subject string. Case-sensitive, never normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    pub fn new(subject: impl Into<String>) -> Self {
        Self(subject.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Backend key of this identity's queue: `message::<identity>`.
    pub fn queue_key(&self) -> String {
        format!("{}{}", QUEUE_KEY_PREFIX, self.0)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why no identity could be taken from a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("authorization credential is missing")]
    MissingCredential,

    #[error("malformed bearer token: {0}")]
    MalformedToken(String),

    #[error("token has no string subject claim")]
    MissingSubject,
}

/// Resolve the caller identity from an `Authorization` header value.
pub fn extract_identity(authorization: Option<&HeaderValue>) -> Result<Identity, IdentityError> {
    let value = authorization
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(IdentityError::MissingCredential)?;

    let token = bearer_token(value)
        .ok_or_else(|| IdentityError::MalformedToken("expected 'Bearer <token>'".into()))?;

    subject_from_token(token)
}

/// Decode a token's claims without checking its signature and return `sub`.
pub fn subject_from_token(token: &str) -> Result<Identity, IdentityError> {
    let claims = unverified_claims(token)?;

    match claims.get("sub") {
        Some(Value::String(sub)) => Ok(Identity::new(sub.clone())),
        _ => Err(IdentityError::MissingSubject),
    }
}

/// Split a compact JWS into header, payload and signature and decode the
/// first two as JSON objects. The signature segment is never read.
fn unverified_claims(token: &str) -> Result<Map<String, Value>, IdentityError> {
    let mut segments = token.split('.');
    let (Some(header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(IdentityError::MalformedToken(
            "expected three dot-separated segments".into(),
        ));
    };

    decode_segment(header, "header")?;
    decode_segment(payload, "claims")
}

fn decode_segment(segment: &str, part: &str) -> Result<Map<String, Value>, IdentityError> {
    let raw = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| IdentityError::MalformedToken(format!("{} is not base64url: {}", part, e)))?;
    serde_json::from_slice(&raw)
        .map_err(|e| IdentityError::MalformedToken(format!("{} is not a JSON object: {}", part, e)))
}

fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
