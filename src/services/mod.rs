pub mod access;
pub mod assignments;
pub mod attendance;
pub mod auth;
pub mod certifications;
pub mod grades;
pub mod metrics;
pub mod profiles;
pub mod requests;
pub mod schedule;
pub mod submissions;
