use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::Entity;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Course {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub teacher_id: Uuid,
    pub promotion: String,
    /// Weight applied to grades of this course; always > 0.
    pub coefficient: f64,
    pub created_at: DateTime<Utc>,
}

impl Entity for Course {
    const KIND: &'static str = "course";

    fn id(&self) -> Uuid {
        self.id
    }
}
