use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::json;

/// Forge an unsigned credential token; the session core never verifies
/// signatures, so any signature segment will do.
pub fn forge_token_at(role: &str, exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = json!({
        "sub": "user@example.edu",
        "jti": "b7f9d2e4-0001",
        "role": role,
        "exp": exp,
    });
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.forged-signature")
}

pub fn forge_token(role: &str, exp_offset_secs: i64) -> String {
    forge_token_at(role, chrono::Utc::now().timestamp() + exp_offset_secs)
}
