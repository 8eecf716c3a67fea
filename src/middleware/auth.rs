use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use tracing::warn;

use crate::{
    error::EngineError,
    models::{
        auth::{AuthenticatedUser, Claims},
        profile::Profile,
    },
    routes::api_error,
    services::profiles::ProfileService,
    AppState,
};

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or((StatusCode::UNAUTHORIZED, "Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or((StatusCode::UNAUTHORIZED, "Invalid Authorization header format"))?;

        let secret = parts
            .extensions
            .get::<JwtSecret>()
            .ok_or((StatusCode::INTERNAL_SERVER_ERROR, "JWT secret not configured"))?;

        decode_access_token(token, &secret.0)
            .map_err(|_| (StatusCode::UNAUTHORIZED, "Invalid or expired token"))
    }
}

/// Extension type to carry the JWT secret through request extensions.
#[derive(Clone)]
pub struct JwtSecret(pub String);

pub fn decode_access_token(token: &str, secret: &str) -> Result<AuthenticatedUser, anyhow::Error> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let data = decode::<Claims>(token, &key, &validation)?;
    let claims = data.claims;

    Ok(AuthenticatedUser {
        user_id: claims.sub.parse()?,
        role: claims.role,
    })
}

/// The stored profile of the authenticated caller.
#[derive(Debug, Clone)]
pub struct CurrentProfile(pub Profile);

impl FromRequestParts<AppState> for CurrentProfile {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        let profile = match ProfileService::resolve(&state.db, user.user_id).await {
            Ok(p) => p,
            Err(EngineError::NotFound(_)) => {
                return Err((StatusCode::UNAUTHORIZED, "Unknown profile").into_response());
            }
            Err(e) => return Err(api_error(e).into_response()),
        };

        // A role change since the token was minted invalidates the token.
        if profile.kind() != user.role {
            warn!(profile = %profile.id, token_role = %user.role, "token role is stale");
            return Err((StatusCode::UNAUTHORIZED, "Invalid or expired token").into_response());
        }

        Ok(CurrentProfile(profile))
    }
}
