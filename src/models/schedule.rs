use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::Entity;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Cours,
    Td,
    Tp,
}

/// One occurrence of a course.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleItem {
    pub id: Uuid,
    pub course_id: Uuid,
    pub promotion: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub room: String,
    #[serde(rename = "type")]
    pub session_type: SessionType,
    pub created_at: DateTime<Utc>,
}

impl Entity for ScheduleItem {
    const KIND: &'static str = "schedule_item";

    fn id(&self) -> Uuid {
        self.id
    }
}
