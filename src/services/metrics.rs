use lazy_static::lazy_static;
use prometheus::{register_counter_vec, register_gauge_vec, CounterVec, GaugeVec};
use tracing::{info, warn};

use crate::{
    db::{Db, Filter},
    error::EngineError,
    models::{
        attendance::{AttendanceRecord, AttendanceStatus},
        request::{Request, RequestStatus},
    },
};

lazy_static! {
    // ── Event counters ──────────────────────────────────────────────────────
    pub static ref TRANSITIONS_COUNTER: CounterVec = register_counter_vec!(
        "campus_transitions_total",
        "Workflow transitions applied, by entity and resulting state",
        &["entity", "state"]
    ).unwrap();

    pub static ref FAILURES_COUNTER: CounterVec = register_counter_vec!(
        "campus_failures_total",
        "Engine operations that failed, by error code",
        &["code"]
    ).unwrap();

    // ── Backlog gauges ──────────────────────────────────────────────────────
    pub static ref BACKLOG_GAUGE: GaugeVec = register_gauge_vec!(
        "campus_backlog_total",
        "Open attendance records and unresolved requests",
        &["kind"]
    ).unwrap();
}

pub fn record_transition(entity: &str, state: &str) {
    TRANSITIONS_COUNTER.with_label_values(&[entity, state]).inc();
}

pub fn record_failure(err: &EngineError) {
    FAILURES_COUNTER.with_label_values(&[err.code()]).inc();
}

/// Spawn the background backlog collector (refreshes every 5 minutes).
pub fn start(db: Db) {
    tokio::spawn(async move {
        loop {
            if let Err(e) = collect(&db).await {
                warn!("Metrics: collection failed: {}", e);
            }
            tokio::time::sleep(tokio::time::Duration::from_secs(300)).await;
        }
    });
}

async fn collect(db: &Db) -> anyhow::Result<()> {
    let open: Vec<AttendanceRecord> = db
        .find(&Filter::new().eq("status", AttendanceStatus::Open))
        .await?;
    BACKLOG_GAUGE
        .with_label_values(&["attendance_open"])
        .set(open.len() as f64);

    let mut unresolved = 0usize;
    for status in [RequestStatus::Pending, RequestStatus::InProgress] {
        let requests: Vec<Request> = db.find(&Filter::new().eq("status", status)).await?;
        unresolved += requests.len();
    }
    BACKLOG_GAUGE
        .with_label_values(&["requests_unresolved"])
        .set(unresolved as f64);

    info!(open_attendance = open.len(), unresolved_requests = unresolved, "Metrics: collected");
    Ok(())
}
