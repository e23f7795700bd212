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

//! # Data Source Port
//!
//! This Port defines what it means to "read tables" from a source database.
//! It doesn't care IF the source is an Access file behind ODBC or an
//! in-memory fixture for testing. The engine only talks to these traits.
//!
//! The three traits mirror the lifetime of the resources they stand for:
//! a connector lives for the whole program, a data source for one run
//! (one open connection), and a row cursor for one table.

use crate::domain::entities::{FieldValue, TableDescriptor};
use crate::domain::errors::Result;

/// `DataSourceConnector` knows how to open the single connection of a run.
pub trait DataSourceConnector: Send + Sync {
    /// Opens the connection.
    ///
    /// Failure here is run-fatal and must be reported as
    /// `ExportError::ConnectionError`.
    fn connect(&self) -> Result<Box<dyn TableDataSource + '_>>;

    /// Human readable description of the source, for log lines.
    fn describe(&self) -> String;
}

/// `TableDataSource` is one open connection to the source database.
pub trait TableDataSource {
    /// Returns every schema entry (tables, system tables, views...) in the
    /// provider's native order.
    ///
    /// Failure is reported as `ExportError::CatalogError`.
    fn schema_entries(&mut self) -> Result<Vec<TableDescriptor>>;

    /// Opens a cursor over `SELECT [table].* FROM [table]`.
    ///
    /// Errors specific to this table must be `ExportError::TableError`; an
    /// `ExportError::ConnectionError` tells the engine the link itself is gone.
    fn open_cursor(&mut self, table: &str) -> Result<Box<dyn RowCursor + '_>>;
}

/// `RowCursor` walks the rows of one table.
///
/// Dropping the cursor releases it; the engine always drops it before
/// moving to the next table.
pub trait RowCursor {
    /// Number of columns in the result set.
    fn field_count(&self) -> usize;

    /// Name of the column at `index` (0-based), in the provider's column order.
    fn field_name(&self, index: usize) -> Result<String>;

    /// Advances to the next row. Returns `false` once the rows are exhausted.
    fn next_row(&mut self) -> Result<bool>;

    /// Value of the column at `index` in the current row.
    fn value(&self, index: usize) -> Result<FieldValue>;
}
