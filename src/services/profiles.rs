use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::{
    db::{Db, Filter, StoreError},
    error::{DenyReason, EngineError, EngineResult},
    models::{
        course::Course,
        profile::{NewProfile, Profile, RoleKind},
    },
    services::{
        access::{self, Action, Target},
        attendance::roster_of,
    },
};

pub struct ProfileService;

impl ProfileService {
    /// Identity lookup: the stored profile behind an authenticated id.
    pub async fn resolve(db: &Db, user_id: Uuid) -> EngineResult<Profile> {
        db.get(user_id)
            .await
            .map_err(|e| EngineError::from_store("profile", e))
    }

    /// Admin creates a profile; role-specific fields are validated here once.
    pub async fn create(db: &Db, caller: &Profile, req: &NewProfile) -> EngineResult<Profile> {
        let role = req.into_role()?;
        let email = req.email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(EngineError::validation("a valid email is required"));
        }
        let full_name = req.full_name.trim();
        if full_name.is_empty() {
            return Err(EngineError::validation("full_name is required"));
        }

        let now = Utc::now();
        let profile = Profile {
            id: Uuid::new_v4(),
            email,
            full_name: full_name.to_string(),
            role,
            avatar_url: req.avatar_url.clone(),
            version: 0,
            created_at: now,
            updated_at: now,
        };
        access::require(caller, Action::Create, Target::Profile(&profile))?;

        db.insert(&profile).await.map_err(|e| match e {
            StoreError::Conflict => EngineError::validation("email is already in use"),
            other => EngineError::from_store("profile", other),
        })?;

        info!(profile = %profile.id, role = %profile.kind(), "profile created");
        Ok(profile)
    }

    /// Admin directory, optionally restricted to one role, ordered by name.
    pub async fn list(
        db: &Db,
        caller: &Profile,
        role: Option<RoleKind>,
    ) -> EngineResult<Vec<Profile>> {
        if !caller.is_admin() {
            return Err(EngineError::Unauthorized(DenyReason::WrongRole));
        }
        let filter = match role {
            Some(r) => Filter::new().eq("role", r),
            None => Filter::new(),
        };
        let mut profiles: Vec<Profile> = db
            .find(&filter)
            .await
            .map_err(|e| EngineError::from_store("profile", e))?;
        profiles.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(profiles)
    }

    /// Students of a promotion. Teachers see promotions they teach; admins any.
    pub async fn roster(db: &Db, caller: &Profile, promotion: &str) -> EngineResult<Vec<Profile>> {
        if !caller.is_admin() {
            let taught = courses_taught_by(db, caller.id).await?;
            access::require(caller, Action::Read, Target::Roster { promotion, taught: &taught })?;
        }
        roster_of(db, promotion).await
    }
}

pub(crate) async fn courses_taught_by(db: &Db, teacher_id: Uuid) -> EngineResult<Vec<Course>> {
    db.find(&Filter::new().eq("teacher_id", teacher_id))
        .await
        .map_err(|e| EngineError::from_store("course", e))
}
