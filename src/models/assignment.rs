use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{Entity, Versioned};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Active,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assignment {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub course_id: Uuid,
    pub teacher_id: Uuid,
    pub promotion: String,
    pub max_points: f64,
    pub due_date: DateTime<Utc>,
    pub status: AssignmentStatus,
    pub created_at: DateTime<Utc>,
}

impl Entity for Assignment {
    const KIND: &'static str = "assignment";

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Submitted,
    Graded,
}

/// A student's hand-in. Only file names are kept; transport is external.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Submission {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub student_id: Uuid,
    pub files: Vec<String>,
    pub comments: Option<String>,
    pub grade: Option<f64>,
    pub feedback: Option<String>,
    pub status: SubmissionStatus,
    pub submitted_at: DateTime<Utc>,
    pub graded_at: Option<DateTime<Utc>>,
    pub version: i64,
}

impl Entity for Submission {
    const KIND: &'static str = "submission";

    fn id(&self) -> Uuid {
        self.id
    }

    fn unique_key(&self) -> Option<String> {
        Some(format!("{}:{}", self.assignment_id, self.student_id))
    }
}

impl Versioned for Submission {
    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

/// Body for POST /assignments. Teacher and promotion come from the course.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAssignment {
    pub course_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub max_points: f64,
    pub due_date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitAssignmentRequest {
    #[serde(default)]
    pub files: Vec<String>,
    pub comments: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GradeSubmissionRequest {
    pub grade: f64,
    pub feedback: Option<String>,
}
