// Library exports for binary tools and tests
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use config::Config;
use db::Db;
use middleware::auth::JwtSecret;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: Arc<Config>,
}

/// Every route of the API, without CORS (added by the server binary).
pub fn app(state: AppState) -> Router {
    let jwt_secret = JwtSecret(state.config.jwt_secret.clone());

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::metrics::metrics_handler))
        // Profiles
        .route("/me", get(routes::profiles::me))
        .route("/profiles", get(routes::profiles::list_profiles).post(routes::profiles::create_profile))
        .route("/promotions/{promotion}/roster", get(routes::profiles::promotion_roster))
        .route("/promotions/{promotion}/schedule", get(routes::profiles::promotion_schedule))
        // Attendance
        .route("/attendance", post(routes::attendance::open_record))
        .route("/attendance/{id}", get(routes::attendance::get_record))
        .route("/attendance/{id}/entries", put(routes::attendance::mark_all))
        .route("/attendance/{id}/entries/{student_id}", put(routes::attendance::mark_student))
        .route("/attendance/{id}/entries/{student_id}/notes", put(routes::attendance::annotate))
        .route("/attendance/{id}/entries/{student_id}/justification", put(routes::attendance::justify_absence))
        .route("/attendance/{id}/submit", post(routes::attendance::submit_record))
        .route("/occurrences/{id}/attendance", get(routes::attendance::record_for_occurrence))
        // Student records
        .route("/students/{id}/grades", get(routes::students::grade_report))
        .route("/students/{id}/absences", get(routes::students::absences))
        .route("/students/{id}/requests", get(routes::students::requests))
        .route("/students/{id}/enrollments", get(routes::students::enrollments))
        .route("/grades", post(routes::grades::record_grade))
        // Requests
        .route("/requests", get(routes::requests::list_requests).post(routes::requests::submit_request))
        .route("/requests/{id}", get(routes::requests::get_request))
        .route("/requests/{id}/status", put(routes::requests::advance_request))
        // Certifications
        .route("/certifications", get(routes::certifications::list_certifications))
        .route("/certifications/{id}/enroll", post(routes::certifications::enroll))
        .route("/enrollments/{id}/lessons", post(routes::certifications::complete_lesson))
        // Assignments
        .route("/assignments", post(routes::assignments::create_assignment))
        .route("/promotions/{promotion}/assignments", get(routes::assignments::promotion_assignments))
        .route("/teachers/{id}/assignments", get(routes::assignments::teacher_assignments))
        .route("/assignments/{id}/submissions", get(routes::submissions::list_submissions).post(routes::submissions::submit_work))
        .route("/submissions/{id}/grade", put(routes::submissions::grade_submission))
        .layer(axum::Extension(jwt_secret))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
