use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{Entity, Versioned};
use crate::error::EngineError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Absence,
    GradeReview,
    ScheduleChange,
    Other,
}

impl std::str::FromStr for RequestKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "absence" => Ok(RequestKind::Absence),
            "grade_review" => Ok(RequestKind::GradeReview),
            "schedule_change" => Ok(RequestKind::ScheduleChange),
            "other" => Ok(RequestKind::Other),
            _ => Err(EngineError::validation(format!("unknown request type: {s}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    InProgress,
    Resolved,
    Closed,
}

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Resolved | RequestStatus::Closed)
    }

    /// The only moves the workflow allows.
    pub fn can_advance_to(self, next: RequestStatus) -> bool {
        use RequestStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress)
                | (Pending, Resolved)
                | (Pending, Closed)
                | (InProgress, Resolved)
                | (InProgress, Closed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::InProgress => "in_progress",
            RequestStatus::Resolved => "resolved",
            RequestStatus::Closed => "closed",
        }
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "in_progress" => Ok(RequestStatus::InProgress),
            "resolved" => Ok(RequestStatus::Resolved),
            "closed" => Ok(RequestStatus::Closed),
            _ => Err(EngineError::validation(format!("unknown request status: {s}"))),
        }
    }
}

/// A student request. `admin_response` is only ever set in a terminal status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Request {
    pub id: Uuid,
    pub student_id: Uuid,
    #[serde(rename = "type")]
    pub kind: RequestKind,
    pub subject: String,
    pub description: String,
    pub status: RequestStatus,
    pub admin_response: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Request {
    const KIND: &'static str = "request";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Versioned for Request {
    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

/// Body for POST /requests. `type` is kept as text so an unknown kind
/// surfaces as a validation error rather than a body rejection.
#[derive(Debug, Deserialize)]
pub struct SubmitRequestBody {
    #[serde(rename = "type")]
    pub kind: String,
    pub subject: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct AdvanceRequestBody {
    pub status: String,
    pub response: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RequestListQuery {
    pub status: Option<String>,
}
