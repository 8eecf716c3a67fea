use uuid::Uuid;

use crate::{
    db::{Db, Filter},
    error::{DenyReason, EngineError, EngineResult},
    models::{profile::{Profile, Role}, schedule::ScheduleItem},
    services::profiles::courses_taught_by,
};

pub struct ScheduleService;

impl ScheduleService {
    /// Occurrences of a promotion ordered by date then start time.
    /// Teachers only see the occurrences of their own courses.
    pub async fn for_promotion(
        db: &Db,
        caller: &Profile,
        promotion: &str,
    ) -> EngineResult<Vec<ScheduleItem>> {
        let only_courses: Option<Vec<Uuid>> = match &caller.role {
            Role::Admin => None,
            Role::Student { promotion: mine } => {
                if mine != promotion {
                    return Err(EngineError::Unauthorized(DenyReason::NotOwner));
                }
                None
            }
            Role::Teacher { .. } => {
                let taught = courses_taught_by(db, caller.id).await?;
                if !taught.iter().any(|c| c.promotion == promotion) {
                    return Err(EngineError::Unauthorized(DenyReason::NotOwner));
                }
                Some(taught.iter().map(|c| c.id).collect())
            }
        };

        let mut items: Vec<ScheduleItem> = db
            .find(&Filter::new().eq("promotion", promotion))
            .await
            .map_err(|e| EngineError::from_store("schedule item", e))?;
        if let Some(courses) = only_courses {
            items.retain(|i| courses.contains(&i.course_id));
        }

        items.sort_by(|a, b| a.date.cmp(&b.date).then(a.start_time.cmp(&b.start_time)));
        Ok(items)
    }
}
