use std::collections::HashMap;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    db::{Db, Filter, StoreError},
    error::{EngineError, EngineResult},
    models::{
        attendance::{
            Absence, AbsenceJustification, AttendanceEntry, AttendanceRecord, AttendanceStatus,
            AttendanceSummary,
        },
        course::Course,
        profile::{Profile, RoleKind},
        schedule::ScheduleItem,
    },
    services::{
        access::{self, Action, Target},
        metrics,
    },
};

/// Roll-call starts with every student marked present and on time;
/// the teacher then marks the exceptions.
pub const DEFAULT_PRESENT: bool = true;

pub struct AttendanceService;

impl AttendanceService {
    /// Create the single attendance record of an occurrence, pre-filled
    /// with the promotion's roster.
    pub async fn open(
        db: &Db,
        caller: &Profile,
        occurrence_id: Uuid,
    ) -> EngineResult<AttendanceRecord> {
        let occurrence: ScheduleItem = db
            .get(occurrence_id)
            .await
            .map_err(|e| EngineError::from_store("occurrence", e))?;
        let course: Course = db
            .get(occurrence.course_id)
            .await
            .map_err(|e| EngineError::from_store("course", e))?;
        access::require(caller, Action::Create, Target::Course(&course))?;

        let existing: Vec<AttendanceRecord> = db
            .find(&Filter::new().eq("occurrence_id", occurrence_id))
            .await
            .map_err(|e| EngineError::from_store("attendance record", e))?;
        if !existing.is_empty() {
            return Err(EngineError::DuplicateSubmission);
        }

        let roster = roster_of(db, &occurrence.promotion).await?;
        let entries = roster
            .iter()
            .map(|s| AttendanceEntry {
                student_id: s.id,
                student_name: s.full_name.clone(),
                is_present: DEFAULT_PRESENT,
                is_late: false,
                notes: None,
            })
            .collect();

        let now = Utc::now();
        let record = AttendanceRecord {
            id: Uuid::new_v4(),
            occurrence_id,
            course_id: course.id,
            teacher_id: caller.id,
            promotion: occurrence.promotion.clone(),
            date: occurrence.date,
            entries,
            status: AttendanceStatus::Open,
            summary: None,
            submitted_at: None,
            version: 0,
            created_at: now,
            updated_at: now,
        };

        // A concurrent open of the same occurrence loses on the unique key.
        db.insert(&record).await.map_err(|e| match e {
            StoreError::Conflict => EngineError::DuplicateSubmission,
            other => EngineError::from_store("attendance record", other),
        })?;

        metrics::record_transition("attendance", "open");
        info!(
            record = %record.id,
            occurrence = %occurrence_id,
            students = record.entries.len(),
            "attendance opened"
        );
        Ok(record)
    }

    /// Mark one student. Setting `is_present = false` also clears `is_late`.
    /// `notes = None` leaves existing notes untouched.
    pub async fn mark(
        db: &Db,
        caller: &Profile,
        record_id: Uuid,
        student_id: Uuid,
        is_present: bool,
        is_late: bool,
        notes: Option<String>,
    ) -> EngineResult<AttendanceRecord> {
        let mut record = load(db, record_id).await?;
        access::require(caller, Action::Transition, Target::Attendance(&record))?;
        ensure_open(&record)?;

        let entry = record
            .entry_mut(student_id)
            .ok_or(EngineError::NotFound("attendance entry"))?;
        entry.set(is_present, is_late);
        if let Some(notes) = notes {
            entry.notes = clean_notes(notes);
        }

        save(db, &mut record).await?;
        Ok(record)
    }

    /// Bulk "all present" / "all absent". Lateness is reset either way.
    pub async fn mark_all(
        db: &Db,
        caller: &Profile,
        record_id: Uuid,
        is_present: bool,
    ) -> EngineResult<AttendanceRecord> {
        let mut record = load(db, record_id).await?;
        access::require(caller, Action::Transition, Target::Attendance(&record))?;
        ensure_open(&record)?;

        for entry in &mut record.entries {
            entry.set(is_present, false);
        }

        save(db, &mut record).await?;
        Ok(record)
    }

    /// Edit the notes of one entry. A submitted record is read-only.
    pub async fn annotate(
        db: &Db,
        caller: &Profile,
        record_id: Uuid,
        student_id: Uuid,
        notes: Option<String>,
    ) -> EngineResult<AttendanceRecord> {
        let mut record = load(db, record_id).await?;
        access::require(caller, Action::Write, Target::Attendance(&record))?;

        let entry = record
            .entry_mut(student_id)
            .ok_or(EngineError::NotFound("attendance entry"))?;
        entry.notes = notes.and_then(clean_notes);

        save(db, &mut record).await?;
        Ok(record)
    }

    /// Freeze the record and return its summary. Succeeds once per record.
    pub async fn submit(
        db: &Db,
        caller: &Profile,
        record_id: Uuid,
    ) -> EngineResult<AttendanceSummary> {
        let mut record = load(db, record_id).await?;
        access::require(caller, Action::Transition, Target::Attendance(&record))?;
        if record.is_submitted() {
            return Err(EngineError::AlreadySubmitted);
        }

        let summary = AttendanceSummary::from_entries(&record.entries);
        let now = Utc::now();
        record.status = AttendanceStatus::Submitted;
        record.summary = Some(summary);
        record.submitted_at = Some(now);
        record.updated_at = now;

        match db.update(&mut record).await {
            Ok(()) => {}
            Err(StoreError::Conflict) => {
                let current = load(db, record_id).await?;
                warn!(record = %record_id, "attendance submit lost a concurrent update");
                return Err(if current.is_submitted() {
                    EngineError::AlreadySubmitted
                } else {
                    EngineError::transition("attendance record was modified concurrently")
                });
            }
            Err(e) => return Err(EngineError::from_store("attendance record", e)),
        }

        metrics::record_transition("attendance", "submitted");
        info!(
            record = %record_id,
            present = summary.present,
            absent = summary.absent,
            late = summary.late,
            "attendance submitted"
        );
        Ok(summary)
    }

    pub async fn get(db: &Db, caller: &Profile, record_id: Uuid) -> EngineResult<AttendanceRecord> {
        let record = load(db, record_id).await?;
        access::require(caller, Action::Read, Target::Attendance(&record))?;
        Ok(record)
    }

    /// The record of an occurrence, if one has been opened.
    pub async fn for_occurrence(
        db: &Db,
        caller: &Profile,
        occurrence_id: Uuid,
    ) -> EngineResult<Option<AttendanceRecord>> {
        let occurrence: ScheduleItem = db
            .get(occurrence_id)
            .await
            .map_err(|e| EngineError::from_store("occurrence", e))?;
        let course: Course = db
            .get(occurrence.course_id)
            .await
            .map_err(|e| EngineError::from_store("course", e))?;
        access::require(caller, Action::Read, Target::Course(&course))?;

        let records: Vec<AttendanceRecord> = db
            .find(&Filter::new().eq("occurrence_id", occurrence_id))
            .await
            .map_err(|e| EngineError::from_store("attendance record", e))?;
        Ok(records.into_iter().next())
    }

    /// Absences of a student across submitted roll-calls, most recent first.
    pub async fn student_absences(
        db: &Db,
        caller: &Profile,
        student_id: Uuid,
    ) -> EngineResult<Vec<Absence>> {
        access::require(caller, Action::Read, Target::StudentRecords(student_id))?;

        let filter = Filter::new()
            .eq("status", AttendanceStatus::Submitted)
            .has("entries", json!({ "student_id": student_id, "is_present": false }));
        let records: Vec<AttendanceRecord> = db
            .find(&filter)
            .await
            .map_err(|e| EngineError::from_store("attendance record", e))?;

        let justifications: HashMap<Uuid, String> = db
            .find::<AbsenceJustification>(&Filter::new().eq("student_id", student_id))
            .await
            .map_err(|e| EngineError::from_store("absence justification", e))?
            .into_iter()
            .map(|j| (j.record_id, j.reason))
            .collect();

        let mut absences: Vec<Absence> = records
            .iter()
            .filter_map(|r| {
                let entry = r
                    .entries
                    .iter()
                    .find(|e| e.student_id == student_id && !e.is_present)?;
                let reason = justifications.get(&r.id).cloned();
                Some(Absence {
                    record_id: r.id,
                    occurrence_id: r.occurrence_id,
                    course_id: r.course_id,
                    date: r.date,
                    notes: entry.notes.clone(),
                    is_excused: reason.is_some(),
                    reason,
                })
            })
            .collect();
        absences.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(absences)
    }

    /// Excuse a student's absence on a submitted roll-call. The record itself
    /// stays frozen; the excuse lives in its own justification.
    pub async fn justify(
        db: &Db,
        caller: &Profile,
        record_id: Uuid,
        student_id: Uuid,
        reason: &str,
    ) -> EngineResult<AbsenceJustification> {
        let record = load(db, record_id).await?;
        access::require(caller, Action::Create, Target::Absence(&record))?;

        if !record.is_submitted() {
            return Err(EngineError::transition(
                "absences can only be justified once the roll-call is submitted",
            ));
        }
        let entry = record
            .entries
            .iter()
            .find(|e| e.student_id == student_id)
            .ok_or(EngineError::NotFound("attendance entry"))?;
        if entry.is_present {
            return Err(EngineError::validation("student was present"));
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(EngineError::validation("a reason is required"));
        }

        let existing: Option<AbsenceJustification> = db
            .find(
                &Filter::new()
                    .eq("record_id", record_id)
                    .eq("student_id", student_id),
            )
            .await
            .map_err(|e| EngineError::from_store("absence justification", e))?
            .into_iter()
            .next();

        let now = Utc::now();
        let justification = match existing {
            Some(mut j) => {
                j.reason = reason.to_string();
                j.justified_by = caller.id;
                j.updated_at = now;
                db.update(&mut j)
                    .await
                    .map_err(|e| EngineError::from_store("absence justification", e))?;
                j
            }
            None => {
                let j = AbsenceJustification {
                    id: Uuid::new_v4(),
                    record_id,
                    student_id,
                    reason: reason.to_string(),
                    justified_by: caller.id,
                    version: 0,
                    created_at: now,
                    updated_at: now,
                };
                db.insert(&j)
                    .await
                    .map_err(|e| EngineError::from_store("absence justification", e))?;
                j
            }
        };

        metrics::record_transition("absence", "justified");
        info!(record = %record_id, student = %student_id, by = %caller.id, "absence justified");
        Ok(justification)
    }
}

/// Students of a promotion, ordered by name.
pub(crate) async fn roster_of(db: &Db, promotion: &str) -> EngineResult<Vec<Profile>> {
    let mut students: Vec<Profile> = db
        .find(
            &Filter::new()
                .eq("role", RoleKind::Student)
                .eq("promotion", promotion),
        )
        .await
        .map_err(|e| EngineError::from_store("profile", e))?;
    students.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.id.cmp(&b.id)));
    Ok(students)
}

async fn load(db: &Db, record_id: Uuid) -> EngineResult<AttendanceRecord> {
    db.get(record_id)
        .await
        .map_err(|e| EngineError::from_store("attendance record", e))
}

fn ensure_open(record: &AttendanceRecord) -> EngineResult<()> {
    if record.is_submitted() {
        return Err(EngineError::transition("attendance record is already submitted"));
    }
    Ok(())
}

async fn save(db: &Db, record: &mut AttendanceRecord) -> EngineResult<()> {
    record.updated_at = Utc::now();
    db.update(record)
        .await
        .map_err(|e| EngineError::from_store("attendance record", e))
}

fn clean_notes(notes: String) -> Option<String> {
    let trimmed = notes.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
