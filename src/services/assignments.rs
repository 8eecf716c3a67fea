use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::{
    db::{Db, Filter},
    error::{DenyReason, EngineError, EngineResult},
    models::{
        assignment::{Assignment, AssignmentStatus, NewAssignment},
        course::Course,
        profile::{Profile, Role},
    },
    services::{
        access::{self, Action, Target},
        metrics,
        profiles::courses_taught_by,
    },
};

pub struct AssignmentService;

impl AssignmentService {
    /// Publish an assignment on one of the caller's courses.
    pub async fn create(
        db: &Db,
        caller: &Profile,
        new: &NewAssignment,
    ) -> EngineResult<Assignment> {
        let course: Course = db
            .get(new.course_id)
            .await
            .map_err(|e| EngineError::from_store("course", e))?;
        access::require(caller, Action::Create, Target::Course(&course))?;

        let title = new.title.trim();
        if title.is_empty() {
            return Err(EngineError::validation("title is required"));
        }
        if !new.max_points.is_finite() || new.max_points <= 0.0 {
            return Err(EngineError::validation(format!(
                "max_points must be positive, got {}",
                new.max_points
            )));
        }

        let assignment = Assignment {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: new.description.trim().to_string(),
            course_id: course.id,
            teacher_id: course.teacher_id,
            promotion: course.promotion.clone(),
            max_points: new.max_points,
            due_date: new.due_date,
            status: AssignmentStatus::Active,
            created_at: Utc::now(),
        };
        access::require(caller, Action::Create, Target::Assignment(&assignment))?;

        db.insert(&assignment)
            .await
            .map_err(|e| EngineError::from_store("assignment", e))?;

        metrics::record_transition("assignment", "active");
        info!(assignment = %assignment.id, course = %course.id, promotion = %assignment.promotion, "assignment published");
        Ok(assignment)
    }

    /// Active assignments of a promotion, soonest due first.
    pub async fn for_promotion(
        db: &Db,
        caller: &Profile,
        promotion: &str,
    ) -> EngineResult<Vec<Assignment>> {
        match &caller.role {
            Role::Admin => {}
            Role::Student { promotion: mine } => {
                if mine != promotion {
                    return Err(EngineError::Unauthorized(DenyReason::NotOwner));
                }
            }
            Role::Teacher { .. } => {
                let taught = courses_taught_by(db, caller.id).await?;
                if !taught.iter().any(|c| c.promotion == promotion) {
                    return Err(EngineError::Unauthorized(DenyReason::NotOwner));
                }
            }
        }

        let mut assignments: Vec<Assignment> = db
            .find(
                &Filter::new()
                    .eq("promotion", promotion)
                    .eq("status", AssignmentStatus::Active),
            )
            .await
            .map_err(|e| EngineError::from_store("assignment", e))?;
        assignments.sort_by(|a, b| a.due_date.cmp(&b.due_date));
        Ok(assignments)
    }

    /// Everything a teacher has published, newest first.
    pub async fn for_teacher(
        db: &Db,
        caller: &Profile,
        teacher_id: Uuid,
    ) -> EngineResult<Vec<Assignment>> {
        match caller.role {
            Role::Admin => {}
            Role::Teacher { .. } if caller.id == teacher_id => {}
            Role::Teacher { .. } => return Err(EngineError::Unauthorized(DenyReason::NotOwner)),
            Role::Student { .. } => return Err(EngineError::Unauthorized(DenyReason::WrongRole)),
        }

        let mut assignments: Vec<Assignment> = db
            .find(&Filter::new().eq("teacher_id", teacher_id))
            .await
            .map_err(|e| EngineError::from_store("assignment", e))?;
        assignments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(assignments)
    }
}
