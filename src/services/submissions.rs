use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::{
    db::{Db, Filter, StoreError},
    error::{DenyReason, EngineError, EngineResult},
    models::{
        assignment::{Assignment, AssignmentStatus, Submission, SubmissionStatus},
        profile::{Profile, RoleKind},
    },
    services::{
        access::{self, Action, Target},
        metrics,
    },
};

pub struct SubmissionService;

impl SubmissionService {
    /// Hand in work for an active assignment of the student's promotion.
    pub async fn submit(
        db: &Db,
        caller: &Profile,
        assignment_id: Uuid,
        files: Vec<String>,
        comments: Option<String>,
    ) -> EngineResult<Submission> {
        let assignment = load_assignment(db, assignment_id).await?;

        let submission = Submission {
            id: Uuid::new_v4(),
            assignment_id,
            student_id: caller.id,
            files: files
                .into_iter()
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect(),
            comments: comments
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            grade: None,
            feedback: None,
            status: SubmissionStatus::Submitted,
            submitted_at: Utc::now(),
            graded_at: None,
            version: 0,
        };
        access::require(
            caller,
            Action::Create,
            Target::Submission { submission: &submission, assignment: &assignment },
        )?;

        if assignment.status != AssignmentStatus::Active {
            return Err(EngineError::transition("assignment is closed"));
        }
        if submission.files.is_empty() && submission.comments.is_none() {
            return Err(EngineError::validation("a submission needs files or comments"));
        }

        db.insert(&submission).await.map_err(|e| match e {
            StoreError::Conflict => EngineError::DuplicateSubmission,
            other => EngineError::from_store("submission", other),
        })?;

        metrics::record_transition("submission", "submitted");
        info!(submission = %submission.id, assignment = %assignment_id, "work submitted");
        Ok(submission)
    }

    /// Grade a submission of one of the caller's assignments. Grading happens once.
    pub async fn grade(
        db: &Db,
        caller: &Profile,
        submission_id: Uuid,
        grade: f64,
        feedback: Option<String>,
    ) -> EngineResult<Submission> {
        let mut submission: Submission = db
            .get(submission_id)
            .await
            .map_err(|e| EngineError::from_store("submission", e))?;
        let assignment = load_assignment(db, submission.assignment_id).await?;
        access::require(
            caller,
            Action::Transition,
            Target::Submission { submission: &submission, assignment: &assignment },
        )?;

        if submission.status == SubmissionStatus::Graded {
            return Err(EngineError::transition("submission is already graded"));
        }
        if !(0.0..=assignment.max_points).contains(&grade) {
            return Err(EngineError::validation(format!(
                "grade must be between 0 and {}, got {grade}",
                assignment.max_points
            )));
        }

        submission.grade = Some(grade);
        submission.feedback = feedback
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());
        submission.status = SubmissionStatus::Graded;
        submission.graded_at = Some(Utc::now());

        db.update(&mut submission).await.map_err(|e| match e {
            StoreError::Conflict => EngineError::transition("submission was graded concurrently"),
            other => EngineError::from_store("submission", other),
        })?;

        metrics::record_transition("submission", "graded");
        info!(submission = %submission_id, grade, "submission graded");
        Ok(submission)
    }

    pub async fn list_for_assignment(
        db: &Db,
        caller: &Profile,
        assignment_id: Uuid,
    ) -> EngineResult<Vec<Submission>> {
        let assignment = load_assignment(db, assignment_id).await?;
        // Students see only their own hand-in, never the whole class.
        if caller.kind() == RoleKind::Student {
            return Err(EngineError::Unauthorized(DenyReason::WrongRole));
        }
        access::require(caller, Action::Read, Target::Assignment(&assignment))?;
        let mut submissions: Vec<Submission> = db
            .find(&Filter::new().eq("assignment_id", assignment_id))
            .await
            .map_err(|e| EngineError::from_store("submission", e))?;
        submissions.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(submissions)
    }
}

async fn load_assignment(db: &Db, assignment_id: Uuid) -> EngineResult<Assignment> {
    db.get(assignment_id)
        .await
        .map_err(|e| EngineError::from_store("assignment", e))
}
