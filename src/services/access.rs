//! Role and ownership checks shared by every workflow component.

use tracing::debug;
use uuid::Uuid;

use crate::error::{DenyReason, EngineError};
use crate::models::{
    assignment::{Assignment, Submission},
    attendance::AttendanceRecord,
    certification::CertificationEnrollment,
    course::Course,
    profile::{Profile, Role},
    request::Request,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    /// Content edit. Denied on entities in a terminal state.
    Write,
    /// State-machine move; terminal states are rejected by the owning component.
    Transition,
}

/// What an action is aimed at, with whatever context ownership depends on.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Profile(&'a Profile),
    /// Records naming one student: grades, requests, enrollments, absences.
    StudentRecords(Uuid),
    Course(&'a Course),
    Attendance(&'a AttendanceRecord),
    /// Excusing an absence recorded on this roll-call.
    Absence(&'a AttendanceRecord),
    Roster {
        promotion: &'a str,
        taught: &'a [Course],
    },
    Request(&'a Request),
    Enrollment(&'a CertificationEnrollment),
    Assignment(&'a Assignment),
    Submission {
        submission: &'a Submission,
        assignment: &'a Assignment,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }

    pub fn into_result(self) -> Result<(), EngineError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(EngineError::Unauthorized(reason)),
        }
    }
}

fn owner(is_owner: bool) -> Decision {
    if is_owner {
        Decision::Allow
    } else {
        Decision::Deny(DenyReason::NotOwner)
    }
}

const WRONG_ROLE: Decision = Decision::Deny(DenyReason::WrongRole);
const TERMINAL: Decision = Decision::Deny(DenyReason::TerminalState);

/// Deny unless a rule below explicitly allows.
pub fn authorize(caller: &Profile, action: Action, target: Target<'_>) -> Decision {
    let decision = match &caller.role {
        Role::Admin => admin(action, target),
        Role::Student { promotion } => student(caller.id, promotion, action, target),
        Role::Teacher { .. } => teacher(caller.id, action, target),
    };
    if let Decision::Deny(reason) = decision {
        debug!(caller = %caller.id, role = %caller.kind(), ?action, %reason, "access denied");
    }
    decision
}

/// Shorthand for `authorize(..).into_result()`.
pub fn require(caller: &Profile, action: Action, target: Target<'_>) -> Result<(), EngineError> {
    authorize(caller, action, target).into_result()
}

fn terminal(target: &Target<'_>) -> bool {
    match target {
        Target::Attendance(r) => r.is_submitted(),
        Target::Request(r) => r.status.is_terminal(),
        _ => false,
    }
}

fn admin(action: Action, target: Target<'_>) -> Decision {
    if action == Action::Read {
        return Decision::Allow;
    }
    if action == Action::Write && terminal(&target) {
        return TERMINAL;
    }
    match (target, action) {
        (Target::Request(_), Action::Transition | Action::Write) => Decision::Allow,
        (Target::Profile(_), Action::Create | Action::Write) => Decision::Allow,
        (Target::Absence(_), Action::Create | Action::Write) => Decision::Allow,
        _ => WRONG_ROLE,
    }
}

fn student(me: Uuid, my_promotion: &str, action: Action, target: Target<'_>) -> Decision {
    match target {
        Target::Profile(p) => match action {
            Action::Read => owner(p.id == me),
            _ => WRONG_ROLE,
        },
        Target::StudentRecords(student_id) => match action {
            Action::Read => owner(student_id == me),
            _ => WRONG_ROLE,
        },
        Target::Request(r) => match action {
            Action::Read | Action::Create => owner(r.student_id == me),
            Action::Write | Action::Transition => WRONG_ROLE,
        },
        Target::Enrollment(e) => owner(e.student_id == me),
        Target::Assignment(a) => match action {
            Action::Read => owner(a.promotion == my_promotion),
            _ => WRONG_ROLE,
        },
        Target::Submission { submission, assignment } => match action {
            Action::Read => owner(submission.student_id == me),
            Action::Create => {
                owner(submission.student_id == me && assignment.promotion == my_promotion)
            }
            Action::Write | Action::Transition => WRONG_ROLE,
        },
        Target::Course(_)
        | Target::Attendance(_)
        | Target::Absence(_)
        | Target::Roster { .. } => WRONG_ROLE,
    }
}

fn teacher(me: Uuid, action: Action, target: Target<'_>) -> Decision {
    match target {
        Target::Profile(p) => match action {
            Action::Read => owner(p.id == me),
            _ => WRONG_ROLE,
        },
        Target::Course(c) => owner(c.teacher_id == me),
        Target::Attendance(r) => {
            if r.teacher_id != me {
                return Decision::Deny(DenyReason::NotOwner);
            }
            if action == Action::Write && r.is_submitted() {
                return TERMINAL;
            }
            Decision::Allow
        }
        Target::Absence(r) => match action {
            Action::Read | Action::Create | Action::Write => owner(r.teacher_id == me),
            Action::Transition => WRONG_ROLE,
        },
        Target::Roster { promotion, taught } => match action {
            Action::Read => owner(
                taught
                    .iter()
                    .any(|c| c.teacher_id == me && c.promotion == promotion),
            ),
            _ => WRONG_ROLE,
        },
        Target::Assignment(a) => owner(a.teacher_id == me),
        Target::Submission { assignment, .. } => match action {
            Action::Read | Action::Transition => owner(assignment.teacher_id == me),
            _ => WRONG_ROLE,
        },
        Target::StudentRecords(_) | Target::Request(_) | Target::Enrollment(_) => WRONG_ROLE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        attendance::AttendanceStatus,
        request::{RequestKind, RequestStatus},
    };
    use chrono::Utc;

    fn profile(role: Role) -> Profile {
        let now = Utc::now();
        Profile {
            id: Uuid::new_v4(),
            email: format!("{}@campus.test", Uuid::new_v4()),
            full_name: "Test".into(),
            role,
            avatar_url: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn student() -> Profile {
        profile(Role::Student { promotion: "L3".into() })
    }

    fn teacher() -> Profile {
        profile(Role::Teacher { department: None })
    }

    fn admin() -> Profile {
        profile(Role::Admin)
    }

    fn request(student_id: Uuid, status: RequestStatus) -> Request {
        let now = Utc::now();
        Request {
            id: Uuid::new_v4(),
            student_id,
            kind: RequestKind::Other,
            subject: "s".into(),
            description: "d".into(),
            status,
            admin_response: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn course(teacher_id: Uuid, promotion: &str) -> Course {
        Course {
            id: Uuid::new_v4(),
            name: "Algo".into(),
            code: "ALG".into(),
            description: None,
            teacher_id,
            promotion: promotion.into(),
            coefficient: 2.0,
            created_at: Utc::now(),
        }
    }

    fn record(teacher_id: Uuid, status: AttendanceStatus) -> AttendanceRecord {
        let now = Utc::now();
        AttendanceRecord {
            id: Uuid::new_v4(),
            occurrence_id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            teacher_id,
            promotion: "L3".into(),
            date: now.date_naive(),
            entries: vec![],
            status,
            summary: None,
            submitted_at: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn student_cannot_transition_requests() {
        let s = student();
        let r = request(s.id, RequestStatus::Pending);
        assert_eq!(
            authorize(&s, Action::Transition, Target::Request(&r)),
            Decision::Deny(DenyReason::WrongRole)
        );
    }

    #[test]
    fn student_reads_only_own_records() {
        let s = student();
        let other = student();
        assert!(authorize(&s, Action::Read, Target::StudentRecords(s.id)).is_allowed());
        assert_eq!(
            authorize(&s, Action::Read, Target::StudentRecords(other.id)),
            Decision::Deny(DenyReason::NotOwner)
        );
        let theirs = request(other.id, RequestStatus::Pending);
        assert_eq!(
            authorize(&s, Action::Read, Target::Request(&theirs)),
            Decision::Deny(DenyReason::NotOwner)
        );
    }

    #[test]
    fn teacher_owns_only_their_courses() {
        let t = teacher();
        let mine = course(t.id, "L3");
        let theirs = course(Uuid::new_v4(), "L3");
        assert!(authorize(&t, Action::Create, Target::Course(&mine)).is_allowed());
        assert_eq!(
            authorize(&t, Action::Create, Target::Course(&theirs)),
            Decision::Deny(DenyReason::NotOwner)
        );
    }

    #[test]
    fn teacher_roster_scope_follows_taught_promotions() {
        let t = teacher();
        let taught = vec![course(t.id, "L3")];
        assert!(authorize(
            &t,
            Action::Read,
            Target::Roster { promotion: "L3", taught: &taught }
        )
        .is_allowed());
        assert_eq!(
            authorize(&t, Action::Read, Target::Roster { promotion: "M1", taught: &taught }),
            Decision::Deny(DenyReason::NotOwner)
        );
    }

    #[test]
    fn submitted_attendance_rejects_edits_but_not_transitions() {
        let t = teacher();
        let r = record(t.id, AttendanceStatus::Submitted);
        assert_eq!(
            authorize(&t, Action::Write, Target::Attendance(&r)),
            Decision::Deny(DenyReason::TerminalState)
        );
        // The recorder reports the state-machine violation itself.
        assert!(authorize(&t, Action::Transition, Target::Attendance(&r)).is_allowed());
    }

    #[test]
    fn admin_reads_everything_but_writes_only_requests_and_profiles() {
        let a = admin();
        let t = teacher();
        let r = record(t.id, AttendanceStatus::Open);
        assert!(authorize(&a, Action::Read, Target::Attendance(&r)).is_allowed());
        assert_eq!(
            authorize(&a, Action::Transition, Target::Attendance(&r)),
            Decision::Deny(DenyReason::WrongRole)
        );
        let req = request(Uuid::new_v4(), RequestStatus::Pending);
        assert!(authorize(&a, Action::Transition, Target::Request(&req)).is_allowed());
        assert!(authorize(&a, Action::Create, Target::Profile(&t)).is_allowed());
    }

    #[test]
    fn terminal_request_rejects_admin_edits() {
        let a = admin();
        let req = request(Uuid::new_v4(), RequestStatus::Closed);
        assert_eq!(
            authorize(&a, Action::Write, Target::Request(&req)),
            Decision::Deny(DenyReason::TerminalState)
        );
    }

    #[test]
    fn absences_are_excused_by_staff_only() {
        let t = teacher();
        let r = record(t.id, AttendanceStatus::Submitted);
        assert!(authorize(&t, Action::Create, Target::Absence(&r)).is_allowed());
        assert!(authorize(&admin(), Action::Write, Target::Absence(&r)).is_allowed());
        assert_eq!(
            authorize(&teacher(), Action::Create, Target::Absence(&r)),
            Decision::Deny(DenyReason::NotOwner)
        );
        assert_eq!(
            authorize(&student(), Action::Create, Target::Absence(&r)),
            Decision::Deny(DenyReason::WrongRole)
        );
    }

    #[test]
    fn deny_maps_to_unauthorized() {
        let s = student();
        let err = require(&s, Action::Create, Target::Profile(&s)).unwrap_err();
        assert!(matches!(err, EngineError::Unauthorized(DenyReason::WrongRole)));
    }
}
