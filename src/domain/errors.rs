// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Core error definitions for the table exporter.
//!
//! This module provides a centralized `ExportError` enum and a `Result` type
//! used throughout the application. Errors fall into two groups: run-fatal
//! errors (the source cannot be reached or its schema cannot be read) stop
//! the whole export, every other error only fails the table being written.

use thiserror::Error;

/// Error types encountered during the export process.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection failed: {0}")]
    ConnectionError(String),

    #[error("Table discovery failed: {0}")]
    CatalogError(String),

    #[error("Export failed for {table}: {reason}")]
    TableError { table: String, reason: String },

    #[error("Write failed: {0}")]
    WriteError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ExportError {
    /// Returns true when the error must abort the remaining tables.
    pub fn is_run_fatal(&self) -> bool {
        matches!(
            self,
            ExportError::ConnectionError(_) | ExportError::CatalogError(_)
        )
    }

    /// Shorthand for a per-table failure.
    pub fn table(table: &str, reason: impl Into<String>) -> Self {
        ExportError::TableError {
            table: table.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<csv::Error> for ExportError {
    fn from(e: csv::Error) -> Self {
        ExportError::WriteError(e.to_string())
    }
}

/// A specialized Result type for the table exporter.
pub type Result<T> = std::result::Result<T, ExportError>;
