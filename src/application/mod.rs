//! Application layer: the use cases driving an export run.

pub mod catalog;
pub mod export_engine;
pub mod run_report;
