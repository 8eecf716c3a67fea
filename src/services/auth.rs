use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

use crate::models::{auth::Claims, profile::Profile};

pub struct AuthService;

impl AuthService {
    /// Short-lived HS256 access token for a stored profile.
    pub fn generate_access_token(
        profile: &Profile,
        secret: &str,
        ttl_seconds: u64,
    ) -> anyhow::Result<String> {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: profile.id.to_string(),
            role: profile.kind(),
            iat: now,
            exp: now + ttl_seconds as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )?;
        Ok(token)
    }
}
