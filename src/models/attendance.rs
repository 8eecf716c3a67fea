use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{Entity, Versioned};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Open,
    Submitted,
}

/// One student's line on a roll-call. `is_late` implies `is_present`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttendanceEntry {
    pub student_id: Uuid,
    pub student_name: String,
    pub is_present: bool,
    pub is_late: bool,
    pub notes: Option<String>,
}

impl AttendanceEntry {
    /// Apply a mark, keeping `is_late => is_present`.
    pub fn set(&mut self, is_present: bool, is_late: bool) {
        self.is_present = is_present;
        self.is_late = is_present && is_late;
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AttendanceSummary {
    pub total: u32,
    pub present: u32,
    pub absent: u32,
    pub late: u32,
    /// `present / total`, 0 for an empty roster.
    pub present_rate: f64,
}

impl AttendanceSummary {
    pub fn from_entries(entries: &[AttendanceEntry]) -> Self {
        let total = entries.len() as u32;
        let present = entries.iter().filter(|e| e.is_present).count() as u32;
        let late = entries.iter().filter(|e| e.is_present && e.is_late).count() as u32;
        let present_rate = if total == 0 {
            0.0
        } else {
            f64::from(present) / f64::from(total)
        };
        Self {
            total,
            present,
            absent: total - present,
            late,
            present_rate,
        }
    }
}

/// The roll-call of one course occurrence. Exactly one per occurrence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub occurrence_id: Uuid,
    pub course_id: Uuid,
    pub teacher_id: Uuid,
    pub promotion: String,
    pub date: NaiveDate,
    pub entries: Vec<AttendanceEntry>,
    pub status: AttendanceStatus,
    /// Frozen at submission.
    pub summary: Option<AttendanceSummary>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AttendanceRecord {
    pub fn is_submitted(&self) -> bool {
        self.status == AttendanceStatus::Submitted
    }

    pub fn entry_mut(&mut self, student_id: Uuid) -> Option<&mut AttendanceEntry> {
        self.entries.iter_mut().find(|e| e.student_id == student_id)
    }
}

impl Entity for AttendanceRecord {
    const KIND: &'static str = "attendance_record";

    fn id(&self) -> Uuid {
        self.id
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.occurrence_id.to_string())
    }
}

impl Versioned for AttendanceRecord {
    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

/// Excuse for one absence, kept apart from the frozen roll-call.
/// At most one per (record, student); re-justifying replaces the reason.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AbsenceJustification {
    pub id: Uuid,
    pub record_id: Uuid,
    pub student_id: Uuid,
    pub reason: String,
    pub justified_by: Uuid,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for AbsenceJustification {
    const KIND: &'static str = "absence_justification";

    fn id(&self) -> Uuid {
        self.id
    }

    fn unique_key(&self) -> Option<String> {
        Some(format!("{}:{}", self.record_id, self.student_id))
    }
}

impl Versioned for AbsenceJustification {
    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

/// An absence as seen from the student's side, derived from submitted roll-calls.
/// Excusal comes from a justification, never from the entry itself.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Absence {
    pub record_id: Uuid,
    pub occurrence_id: Uuid,
    pub course_id: Uuid,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub is_excused: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OpenAttendanceRequest {
    pub occurrence_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct MarkRequest {
    pub is_present: bool,
    #[serde(default)]
    pub is_late: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MarkAllRequest {
    pub is_present: bool,
}

#[derive(Debug, Deserialize)]
pub struct AnnotateRequest {
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JustifyRequest {
    pub reason: String,
}
