use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{Entity, Versioned};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Certification {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub instructor_id: Uuid,
    pub duration: String,
    pub level: String,
    pub category: String,
    /// At least 1.
    pub total_lessons: u32,
    pub created_at: DateTime<Utc>,
}

impl Entity for Certification {
    const KIND: &'static str = "certification";

    fn id(&self) -> Uuid {
        self.id
    }
}

/// A student's progress through one certification. `total_lessons` is
/// copied at enrollment so progress is computed from the enrollment alone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CertificationEnrollment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub certification_id: Uuid,
    pub total_lessons: u32,
    pub completed_lessons: u32,
    pub progress: u32,
    pub certificate_earned: bool,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub version: i64,
}

impl CertificationEnrollment {
    pub fn is_complete(&self) -> bool {
        self.completed_lessons >= self.total_lessons
    }
}

impl Entity for CertificationEnrollment {
    const KIND: &'static str = "certification_enrollment";

    fn id(&self) -> Uuid {
        self.id
    }

    fn unique_key(&self) -> Option<String> {
        Some(format!("{}:{}", self.student_id, self.certification_id))
    }
}

impl Versioned for CertificationEnrollment {
    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

/// Percentage of lessons completed, rounded half up.
pub fn progress_percent(completed: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let completed = u64::from(completed.min(total));
    let total = u64::from(total);
    ((200 * completed + total) / (2 * total)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_bounds_are_exact() {
        assert_eq!(progress_percent(0, 7), 0);
        assert_eq!(progress_percent(7, 7), 100);
        assert_eq!(progress_percent(1, 1), 100);
    }

    #[test]
    fn progress_rounds_half_up() {
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(1, 8), 13); // 12.5
        assert_eq!(progress_percent(1, 200), 1); // 0.5
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(progress_percent(9, 4), 100);
    }
}
