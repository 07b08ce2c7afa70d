pub mod config;
pub mod error;
pub mod highlight;
pub mod telemetry;
