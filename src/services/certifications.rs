use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    db::{Db, Filter, StoreError},
    error::{EngineError, EngineResult},
    models::{
        certification::{progress_percent, Certification, CertificationEnrollment},
        profile::Profile,
    },
    services::{
        access::{self, Action, Target},
        metrics,
    },
};

pub struct CertificationService;

impl CertificationService {
    pub async fn list_certifications(db: &Db) -> EngineResult<Vec<Certification>> {
        let mut certs: Vec<Certification> = db
            .find(&Filter::new())
            .await
            .map_err(|e| EngineError::from_store("certification", e))?;
        certs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(certs)
    }

    /// Enroll the calling student. One enrollment per (student, certification).
    pub async fn enroll(
        db: &Db,
        caller: &Profile,
        certification_id: Uuid,
    ) -> EngineResult<CertificationEnrollment> {
        let mut enrollment = CertificationEnrollment {
            id: Uuid::new_v4(),
            student_id: caller.id,
            certification_id,
            total_lessons: 0,
            completed_lessons: 0,
            progress: 0,
            certificate_earned: false,
            enrolled_at: Utc::now(),
            completed_at: None,
            version: 0,
        };
        access::require(caller, Action::Create, Target::Enrollment(&enrollment))?;

        let certification: Certification = db
            .get(certification_id)
            .await
            .map_err(|e| EngineError::from_store("certification", e))?;
        if certification.total_lessons == 0 {
            return Err(EngineError::validation("certification has no lessons"));
        }
        enrollment.total_lessons = certification.total_lessons;

        db.insert(&enrollment).await.map_err(|e| match e {
            StoreError::Conflict => EngineError::AlreadyEnrolled,
            other => EngineError::from_store("enrollment", other),
        })?;

        metrics::record_transition("enrollment", "enrolled");
        info!(
            enrollment = %enrollment.id,
            student = %caller.id,
            certification = %certification_id,
            "student enrolled"
        );
        Ok(enrollment)
    }

    /// Count one more completed lesson. Past the last lesson this is a no-op.
    pub async fn complete_lesson(
        db: &Db,
        caller: &Profile,
        enrollment_id: Uuid,
    ) -> EngineResult<CertificationEnrollment> {
        let mut enrollment: CertificationEnrollment = db
            .get(enrollment_id)
            .await
            .map_err(|e| EngineError::from_store("enrollment", e))?;
        access::require(caller, Action::Transition, Target::Enrollment(&enrollment))?;

        if enrollment.is_complete() {
            debug!(enrollment = %enrollment_id, "lesson completion ignored, already complete");
            return Ok(enrollment);
        }

        enrollment.completed_lessons += 1;
        enrollment.progress =
            progress_percent(enrollment.completed_lessons, enrollment.total_lessons);
        let earned_now = enrollment.is_complete() && !enrollment.certificate_earned;
        if earned_now {
            enrollment.certificate_earned = true;
            enrollment.completed_at = Some(Utc::now());
        }

        db.update(&mut enrollment).await.map_err(|e| match e {
            StoreError::Conflict => {
                EngineError::transition("enrollment was updated concurrently")
            }
            other => EngineError::from_store("enrollment", other),
        })?;

        if earned_now {
            metrics::record_transition("enrollment", "certified");
            info!(enrollment = %enrollment_id, student = %caller.id, "certificate earned");
        } else {
            debug!(
                enrollment = %enrollment_id,
                completed = enrollment.completed_lessons,
                total = enrollment.total_lessons,
                "lesson completed"
            );
        }
        Ok(enrollment)
    }

    pub async fn enrollments_for_student(
        db: &Db,
        caller: &Profile,
        student_id: Uuid,
    ) -> EngineResult<Vec<CertificationEnrollment>> {
        access::require(caller, Action::Read, Target::StudentRecords(student_id))?;
        let mut enrollments: Vec<CertificationEnrollment> = db
            .find(&Filter::new().eq("student_id", student_id))
            .await
            .map_err(|e| EngineError::from_store("enrollment", e))?;
        enrollments.sort_by(|a, b| b.enrolled_at.cmp(&a.enrolled_at));
        Ok(enrollments)
    }
}
