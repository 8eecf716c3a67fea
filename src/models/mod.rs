pub mod assignment;
pub mod attendance;
pub mod auth;
pub mod certification;
pub mod chat;
pub mod course;
pub mod grade;
pub mod profile;
pub mod request;
pub mod schedule;
