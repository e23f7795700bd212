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

//! # Domain Entities
//!
//! Entities are the "Nouns" of our application. They are simple data structures
//! (structs) that represent the things we are working with: the export settings,
//! the tables found in the source file, the values read from a row, and the
//! per-table results.
//!
//! We use the `serde` crate (Serialize/Deserialize) so that settings can be read
//! from an options file and results can be written as a JSON report.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;

/// Process exit status for a run that reached the end of its table list.
pub const EXIT_SUCCESS: i32 = 0;
/// Process exit status when the source could not be reached or read.
pub const EXIT_FATAL: i32 = 99;

/// Header of the extra column holding the source file path.
pub const SOURCE_FILENAME_COLUMN: &str = "SOURCE_FILENAME";

/// Only schema entries carrying this type marker are exported.
pub const USER_TABLE_TYPE: &str = "TABLE";

/// `Delimiter` is the single character that separates fields in a record.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    #[default]
    Comma,
    Tab,
    Pipe,
}

impl Delimiter {
    /// The byte written between two fields.
    pub fn as_byte(self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Tab => b'\t',
            Delimiter::Pipe => b'|',
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delimiter::Comma => write!(f, "comma"),
            Delimiter::Tab => write!(f, "tab"),
            Delimiter::Pipe => write!(f, "pipe"),
        }
    }
}

/// `FileNameCase` controls how the table name is cased in the output filename.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileNameCase {
    /// Keep the table name exactly as the source reports it.
    #[default]
    None,
    Lower,
    Upper,
}

/// `SourceFile` is the database file being exported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// The path exactly as the user supplied it.
    pub path: PathBuf,
    /// The day the file was created (or last modified when the platform
    /// does not record creation time).
    pub created: Option<NaiveDate>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, created: Option<NaiveDate>) -> Self {
        Self {
            path: path.into(),
            created,
        }
    }

    /// The value written into the `SOURCE_FILENAME` column.
    pub fn column_value(&self) -> String {
        self.path.to_string_lossy().to_lowercase()
    }
}

/// `ExportConfiguration` is the immutable snapshot of settings for one run.
///
/// It is built once by the configuration layer and moved into the engine.
#[derive(Debug, Clone)]
pub struct ExportConfiguration {
    pub source: SourceFile,
    pub output_directory: PathBuf,
    pub delimiter: Delimiter,
    /// Rewrite column names to `UPPER_SNAKE` form in the header row.
    pub clean_field_names: bool,
    pub file_name_case: FileNameCase,
    /// Append `_yyyy-MM-dd` (the source creation date) to output filenames.
    pub append_create_date: bool,
    /// Append a `SOURCE_FILENAME` column to every record.
    pub add_filename_column: bool,
    pub allow_overwrite: bool,
    /// Case-insensitive substring a table name must contain. Empty means all tables.
    pub table_filter: String,
}

impl ExportConfiguration {
    /// Creates a configuration with the default export rules.
    pub fn new(source: SourceFile, output_directory: impl Into<PathBuf>) -> Self {
        Self {
            source,
            output_directory: output_directory.into(),
            delimiter: Delimiter::Comma,
            clean_field_names: false,
            file_name_case: FileNameCase::None,
            append_create_date: false,
            add_filename_column: false,
            allow_overwrite: true,
            table_filter: String::new(),
        }
    }
}

/// `TableDescriptor` is one entry of the source schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub name: String,
    /// "TABLE" for user tables; system tables and views carry other markers.
    pub table_type: String,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>, table_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_type: table_type.into(),
        }
    }

    pub fn is_user_table(&self) -> bool {
        self.table_type == USER_TABLE_TYPE
    }
}

/// `FieldValue` is a single cell read from a row cursor.
///
/// Adapters convert whatever the driver hands them into one of these variants,
/// so the writer never needs to know where a value came from.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    DateTime(NaiveDateTime),
    Boolean(bool),
    Null,
}

impl FieldValue {
    /// Renders the value as it appears in the output file.
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Text(s) => Cow::Borrowed(s.as_str()),
            FieldValue::Integer(i) => Cow::Owned(i.to_string()),
            FieldValue::Float(f) => Cow::Owned(f.to_string()),
            FieldValue::DateTime(dt) => Cow::Owned(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            FieldValue::Boolean(true) => Cow::Borrowed("True"),
            FieldValue::Boolean(false) => Cow::Borrowed("False"),
            FieldValue::Null => Cow::Borrowed(""),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

/// The terminal state a table reaches during a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableStatus {
    Written,
    Skipped,
    Failed,
}

/// `TableReport` is the "Report Card" for one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableReport {
    pub table: String,
    pub output_file: String,
    pub status: TableStatus,
    /// How many data rows were written (header excluded).
    pub rows: u64,
    /// How long it took (in seconds).
    pub duration: f64,
    /// If it failed, this contains the reason why.
    pub error: Option<String>,
}

impl TableReport {
    pub fn written(table: String, output_file: String, rows: u64, duration: f64) -> Self {
        Self {
            table,
            output_file,
            status: TableStatus::Written,
            rows,
            duration,
            error: None,
        }
    }

    pub fn skipped(table: String, output_file: String) -> Self {
        Self {
            table,
            output_file,
            status: TableStatus::Skipped,
            rows: 0,
            duration: 0.0,
            error: None,
        }
    }

    pub fn failed(table: String, output_file: String, error: String, duration: f64) -> Self {
        Self {
            table,
            output_file,
            status: TableStatus::Failed,
            rows: 0,
            duration,
            error: Some(error),
        }
    }
}

/// `ExportResult` summarises a whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResult {
    /// 0 when the run reached the end of its table list, 99 when it was aborted.
    pub exit_code: i32,
    pub tables: Vec<TableReport>,
    pub fatal_error: Option<String>,
    pub duration: f64,
}

impl ExportResult {
    pub fn completed(tables: Vec<TableReport>, duration: f64) -> Self {
        Self {
            exit_code: EXIT_SUCCESS,
            tables,
            fatal_error: None,
            duration,
        }
    }

    pub fn aborted(tables: Vec<TableReport>, error: String, duration: f64) -> Self {
        Self {
            exit_code: EXIT_FATAL,
            tables,
            fatal_error: Some(error),
            duration,
        }
    }

    /// Rows written for `table`, if the run touched it.
    pub fn rows_for(&self, table: &str) -> Option<u64> {
        self.tables.iter().find(|t| t.table == table).map(|t| t.rows)
    }

    pub fn count(&self, status: TableStatus) -> usize {
        self.tables.iter().filter(|t| t.status == status).count()
    }
}
