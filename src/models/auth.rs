use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::profile::RoleKind;

/// Claims embedded in the JWT access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // profile UUID
    pub role: RoleKind,
    pub exp: usize,
    pub iat: usize,
}

/// Extracted from the validated JWT. Only says who the caller claims to be;
/// the stored profile is authoritative for role-specific fields.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub role: RoleKind,
}
