//! Ports: the traits the application layer depends on.

pub mod data_source_port;
pub mod progress_port;
pub mod run_log_port;
