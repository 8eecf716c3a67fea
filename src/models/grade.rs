use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::Entity;

/// Upper bound of the grading scale.
pub const GRADE_SCALE: f64 = 20.0;

/// A grade is immutable: `coefficient` and `subject` are copied from the
/// course when the grade is entered, so later course edits never rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Grade {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub subject: String,
    pub value: f64,
    pub coefficient: f64,
    pub grade_type: String,
    pub date_obtained: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Entity for Grade {
    const KIND: &'static str = "grade";

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Body for POST /grades.
#[derive(Debug, Deserialize)]
pub struct RecordGradeRequest {
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub value: f64,
    pub grade_type: String,
    pub date_obtained: NaiveDate,
}

/// Averages for one student.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GradeReport {
    pub student_id: Uuid,
    pub average: f64,
    pub by_subject: std::collections::BTreeMap<String, f64>,
    pub grades: Vec<Grade>,
}
