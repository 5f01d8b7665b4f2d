use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AuthError, AuthResult};
use crate::roles::{ROLE_STUDENT, ROLE_TEACHER};

/// ASP.NET identity stacks emit the role under this claim URI instead of a
/// bare `role` key.
const ROLE_CLAIM_URI: &str = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role";

/// Identity projected from the credential token's claims segment.
///
/// The signature is never checked here: trust lives with the upstream that
/// issued the token and the gateway that relays it. This projection only
/// drives display state and client-side routing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionClaims {
    pub id: String,
    pub email: String,
    pub role: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionClaims {
    /// Expired iff `exp` is at or before `now`. No clock-skew leeway.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_teacher(&self) -> bool {
        self.role.eq_ignore_ascii_case(ROLE_TEACHER)
    }

    pub fn is_student(&self) -> bool {
        self.role.eq_ignore_ascii_case(ROLE_STUDENT)
    }
}

#[derive(Debug, Deserialize)]
struct ClaimsRepr {
    sub: String,
    #[serde(default)]
    jti: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default, rename = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role")]
    role_uri: Option<String>,
    exp: i64,
}

impl TryFrom<ClaimsRepr> for SessionClaims {
    type Error = AuthError;

    fn try_from(value: ClaimsRepr) -> AuthResult<Self> {
        let role = value
            .role
            .or(value.role_uri)
            .ok_or_else(|| AuthError::InvalidClaim("role", ROLE_CLAIM_URI.to_string()))?;

        let expires_at = Utc
            .timestamp_opt(value.exp, 0)
            .single()
            .ok_or_else(|| AuthError::InvalidClaim("exp", value.exp.to_string()))?;

        let id = value.jti.unwrap_or_else(|| value.sub.clone());

        Ok(Self {
            id,
            email: value.sub,
            role,
            expires_at,
        })
    }
}

/// Decode the claims segment of a credential token without verifying its
/// signature.
///
/// Fails closed: any malformed input (wrong segment count, bad base64url,
/// non-JSON payload, missing/mistyped claims) is an error, never a panic or
/// a partially populated value. Callers treat every error as
/// "unauthenticated".
pub fn decode_unverified(token: &str) -> AuthResult<SessionClaims> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(AuthError::MalformedToken);
    };

    let bytes = URL_SAFE_NO_PAD.decode(payload).map_err(|err| {
        debug!(error = %err, "credential token claims segment is not base64url");
        AuthError::InvalidBase64(err.to_string())
    })?;

    let repr: ClaimsRepr =
        serde_json::from_slice(&bytes).map_err(|err| AuthError::InvalidJson(err.to_string()))?;

    SessionClaims::try_from(repr)
}
