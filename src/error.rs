use std::fmt;

use serde::Serialize;

use crate::db::StoreError;

/// Why the access gate refused an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DenyReason {
    NotOwner,
    WrongRole,
    TerminalState,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::NotOwner => "not-owner",
            DenyReason::WrongRole => "wrong-role",
            DenyReason::TerminalState => "terminal-state",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every failure an engine operation can surface to its caller.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("unauthorized: {0}")]
    Unauthorized(DenyReason),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("attendance record already submitted")]
    AlreadySubmitted,

    #[error("a record already exists for this occurrence")]
    DuplicateSubmission,

    #[error("student is already enrolled in this certification")]
    AlreadyEnrolled,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),
}

impl EngineError {
    /// Stable machine-readable code, one per failure kind.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Unauthorized(_) => "unauthorized",
            EngineError::Validation(_) => "validation_error",
            EngineError::InvalidTransition(_) => "invalid_transition",
            EngineError::AlreadySubmitted => "already_submitted",
            EngineError::DuplicateSubmission => "duplicate_submission",
            EngineError::AlreadyEnrolled => "already_enrolled",
            EngineError::NotFound(_) => "not_found",
            EngineError::CollaboratorUnavailable(_) => "collaborator_unavailable",
        }
    }

    /// Only collaborator failures may be retried; everything else is
    /// deterministic for the same input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::CollaboratorUnavailable(_))
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        EngineError::Validation(msg.into())
    }

    pub(crate) fn transition(msg: impl Into<String>) -> Self {
        EngineError::InvalidTransition(msg.into())
    }

    /// Map a store failure while touching an entity of the given name.
    pub(crate) fn from_store(entity: &'static str, err: StoreError) -> Self {
        match err {
            StoreError::NotFound => EngineError::NotFound(entity),
            StoreError::Conflict => {
                EngineError::InvalidTransition(format!("{entity} was modified concurrently"))
            }
            StoreError::Unavailable(msg) => EngineError::CollaboratorUnavailable(msg),
            StoreError::Decode(msg) => {
                EngineError::CollaboratorUnavailable(format!("undecodable {entity}: {msg}"))
            }
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let errors = [
            EngineError::Unauthorized(DenyReason::NotOwner),
            EngineError::Validation("x".into()),
            EngineError::InvalidTransition("x".into()),
            EngineError::AlreadySubmitted,
            EngineError::DuplicateSubmission,
            EngineError::AlreadyEnrolled,
            EngineError::NotFound("request"),
            EngineError::CollaboratorUnavailable("x".into()),
        ];
        let mut codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn only_collaborator_failures_are_retryable() {
        assert!(EngineError::CollaboratorUnavailable("timeout".into()).is_retryable());
        assert!(!EngineError::AlreadySubmitted.is_retryable());
        assert!(!EngineError::Unauthorized(DenyReason::WrongRole).is_retryable());
    }

    #[test]
    fn store_errors_map_to_engine_kinds() {
        assert!(matches!(
            EngineError::from_store("request", StoreError::NotFound),
            EngineError::NotFound("request")
        ));
        assert!(matches!(
            EngineError::from_store("request", StoreError::Conflict),
            EngineError::InvalidTransition(_)
        ));
        assert!(EngineError::from_store("request", StoreError::Unavailable("down".into()))
            .is_retryable());
    }

    #[test]
    fn deny_reason_renders_kebab_case() {
        assert_eq!(DenyReason::TerminalState.to_string(), "terminal-state");
        assert_eq!(
            EngineError::Unauthorized(DenyReason::NotOwner).to_string(),
            "unauthorized: not-owner"
        );
    }
}
