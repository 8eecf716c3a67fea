use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    db::{Db, Filter, StoreError},
    error::{DenyReason, EngineError, EngineResult},
    models::{
        profile::Profile,
        request::{Request, RequestKind, RequestStatus},
    },
    services::{
        access::{self, Action, Target},
        metrics,
    },
};

pub struct RequestService;

impl RequestService {
    /// File a new request in `pending`. `kind` is one of the request type names.
    pub async fn submit(
        db: &Db,
        caller: &Profile,
        kind: &str,
        subject: &str,
        description: &str,
    ) -> EngineResult<Request> {
        let now = Utc::now();
        let mut request = Request {
            id: Uuid::new_v4(),
            student_id: caller.id,
            kind: RequestKind::Other,
            subject: subject.trim().to_string(),
            description: description.trim().to_string(),
            status: RequestStatus::Pending,
            admin_response: None,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        // Ownership does not depend on the type, so it is parsed after the gate.
        access::require(caller, Action::Create, Target::Request(&request))?;

        request.kind = kind.trim().parse()?;
        if request.subject.is_empty() {
            return Err(EngineError::validation("subject is required"));
        }
        if request.description.is_empty() {
            return Err(EngineError::validation("description is required"));
        }

        db.insert(&request)
            .await
            .map_err(|e| EngineError::from_store("request", e))?;

        metrics::record_transition("request", RequestStatus::Pending.as_str());
        info!(request = %request.id, student = %caller.id, kind = ?request.kind, "request submitted");
        Ok(request)
    }

    /// Move a request forward. A response is required when resolving or closing.
    pub async fn advance(
        db: &Db,
        caller: &Profile,
        request_id: Uuid,
        next: &str,
        response: Option<&str>,
    ) -> EngineResult<Request> {
        let mut request = load(db, request_id).await?;
        access::require(caller, Action::Transition, Target::Request(&request))?;
        let next: RequestStatus = next.trim().parse()?;

        let from = request.status;
        if !from.can_advance_to(next) {
            return Err(EngineError::transition(format!(
                "request cannot move from {} to {}",
                from.as_str(),
                next.as_str()
            )));
        }

        let response = response.map(str::trim).filter(|r| !r.is_empty());
        if next.is_terminal() {
            let response = response.ok_or_else(|| {
                EngineError::validation(format!(
                    "a response is required to mark a request {}",
                    next.as_str()
                ))
            })?;
            request.admin_response = Some(response.to_string());
        } else if response.is_some() {
            debug!(request = %request_id, "response ignored outside a terminal status");
        }

        request.status = next;
        request.updated_at = Utc::now();

        db.update(&mut request).await.map_err(|e| match e {
            StoreError::Conflict => {
                EngineError::transition("request was advanced concurrently")
            }
            other => EngineError::from_store("request", other),
        })?;

        metrics::record_transition("request", next.as_str());
        info!(
            request = %request_id,
            from = from.as_str(),
            to = next.as_str(),
            admin = %caller.id,
            "request advanced"
        );
        Ok(request)
    }

    pub async fn get(db: &Db, caller: &Profile, request_id: Uuid) -> EngineResult<Request> {
        let request = load(db, request_id).await?;
        access::require(caller, Action::Read, Target::Request(&request))?;
        Ok(request)
    }

    /// Requests filed by one student, newest first.
    pub async fn list_for_student(
        db: &Db,
        caller: &Profile,
        student_id: Uuid,
    ) -> EngineResult<Vec<Request>> {
        access::require(caller, Action::Read, Target::StudentRecords(student_id))?;
        let mut requests: Vec<Request> = db
            .find(&Filter::new().eq("student_id", student_id))
            .await
            .map_err(|e| EngineError::from_store("request", e))?;
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    /// Admin queue, optionally restricted to one status, newest first.
    pub async fn list_all(
        db: &Db,
        caller: &Profile,
        status: Option<&str>,
    ) -> EngineResult<Vec<Request>> {
        if !caller.is_admin() {
            return Err(EngineError::Unauthorized(DenyReason::WrongRole));
        }
        let filter = match status {
            Some(s) => Filter::new().eq("status", s.trim().parse::<RequestStatus>()?),
            None => Filter::new(),
        };
        let mut requests: Vec<Request> = db
            .find(&filter)
            .await
            .map_err(|e| EngineError::from_store("request", e))?;
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }
}

async fn load(db: &Db, request_id: Uuid) -> EngineResult<Request> {
    db.get(request_id)
        .await
        .map_err(|e| EngineError::from_store("request", e))
}
