//! Adapters writing to the local filesystem.

pub mod csv_row_writer;
pub mod run_log_file;
