use anyhow::{Result, anyhow};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use quill_types::api::Claims;

/// Token lifetime.
const TOKEN_TTL_HOURS: i64 = 24;

/// Sign a `{id}` claim expiring in 24 hours.
pub fn issue(id: i64, secret: &str) -> Result<String> {
    let claims = Claims {
        id,
        exp: (chrono::Utc::now() + chrono::Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| anyhow!("token signing failed: {}", e))
}

/// Decode and verify a bearer token. Anything invalid or expired comes
/// back as `None`; the caller proceeds anonymously or rejects,
/// depending on its posture.
pub fn verify(token: &str, secret: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}
