pub mod config;
pub mod courses;
pub mod error;
pub mod telemetry;
