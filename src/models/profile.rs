use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{Entity, Versioned};
use crate::error::EngineError;

/// Role without its role-specific fields; used in tokens, filters and DTOs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    Student,
    Teacher,
    Admin,
}

impl std::fmt::Display for RoleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RoleKind::Student => "student",
            RoleKind::Teacher => "teacher",
            RoleKind::Admin => "admin",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for RoleKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(RoleKind::Student),
            "teacher" => Ok(RoleKind::Teacher),
            "admin" => Ok(RoleKind::Admin),
            _ => Err(EngineError::validation(format!("unknown role: {s}"))),
        }
    }
}

/// Role with the fields that only make sense for it.
/// Serialized flat into the profile: `{"role": "student", "promotion": "L3"}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Role {
    Student { promotion: String },
    Teacher {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        department: Option<String>,
    },
    Admin,
}

impl Role {
    pub fn kind(&self) -> RoleKind {
        match self {
            Role::Student { .. } => RoleKind::Student,
            Role::Teacher { .. } => RoleKind::Teacher,
            Role::Admin => RoleKind::Admin,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    #[serde(flatten)]
    pub role: Role,
    pub avatar_url: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn kind(&self) -> RoleKind {
        self.role.kind()
    }

    /// Cohort of a student; `None` for staff.
    pub fn promotion(&self) -> Option<&str> {
        match &self.role {
            Role::Student { promotion } => Some(promotion),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}

impl Entity for Profile {
    const KIND: &'static str = "profile";

    fn id(&self) -> Uuid {
        self.id
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.email.to_lowercase())
    }
}

impl Versioned for Profile {
    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

/// Body for POST /profiles (admin only).
#[derive(Debug, Clone, Deserialize)]
pub struct NewProfile {
    pub email: String,
    pub full_name: String,
    pub role: RoleKind,
    pub promotion: Option<String>,
    pub department: Option<String>,
    pub avatar_url: Option<String>,
}

impl NewProfile {
    /// The single place where role-specific fields are checked.
    pub fn into_role(&self) -> Result<Role, EngineError> {
        let promotion = self
            .promotion
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty());
        match self.role {
            RoleKind::Student => {
                let promotion = promotion
                    .ok_or_else(|| EngineError::validation("students require a promotion"))?;
                Ok(Role::Student { promotion: promotion.to_string() })
            }
            RoleKind::Teacher => Ok(Role::Teacher {
                department: self.department.clone().filter(|d| !d.trim().is_empty()),
            }),
            RoleKind::Admin => {
                if promotion.is_some() {
                    return Err(EngineError::validation("admins cannot belong to a promotion"));
                }
                Ok(Role::Admin)
            }
        }
    }
}
