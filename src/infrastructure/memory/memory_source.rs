//! In-memory data source.
//!
//! Holds tables as plain vectors and can be told to fail at every point the
//! ODBC adapter can fail, which makes it the fixture for engine tests.
//! It also counts open cursors so callers can check they are released.

use crate::domain::entities::{FieldValue, TableDescriptor, USER_TABLE_TYPE};
use crate::domain::errors::{ExportError, Result};
use crate::ports::data_source_port::{DataSourceConnector, RowCursor, TableDataSource};
use std::sync::atomic::{AtomicUsize, Ordering};

/// One table (or view, or system table) of the in-memory source.
#[derive(Debug, Clone)]
pub struct MemoryTable {
    pub name: String,
    pub table_type: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<FieldValue>>,
    pub fail_open: bool,
    /// Reading this row index fails with a table error.
    pub fail_at_row: Option<usize>,
}

impl MemoryTable {
    pub fn new(name: &str, columns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            table_type: USER_TABLE_TYPE.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
            fail_open: false,
            fail_at_row: None,
        }
    }

    pub fn with_rows(mut self, rows: Vec<Vec<FieldValue>>) -> Self {
        self.rows = rows;
        self
    }

    pub fn of_type(mut self, table_type: &str) -> Self {
        self.table_type = table_type.to_string();
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn failing_at_row(mut self, row: usize) -> Self {
        self.fail_at_row = Some(row);
        self
    }
}

/// `DataSourceConnector` over a fixed set of `MemoryTable`s.
#[derive(Debug, Default)]
pub struct MemoryConnector {
    tables: Vec<MemoryTable>,
    refuse_connection: bool,
    fail_schema: bool,
    lose_connection_on: Option<String>,
    open_cursors: AtomicUsize,
    max_open_cursors: AtomicUsize,
}

impl MemoryConnector {
    pub fn new(tables: Vec<MemoryTable>) -> Self {
        Self {
            tables,
            ..Default::default()
        }
    }

    /// Every `connect` call fails.
    pub fn refusing_connections(mut self) -> Self {
        self.refuse_connection = true;
        self
    }

    /// The schema query fails.
    pub fn failing_schema(mut self) -> Self {
        self.fail_schema = true;
        self
    }

    /// Opening a cursor on `table` reports a lost connection.
    pub fn losing_connection_on(mut self, table: &str) -> Self {
        self.lose_connection_on = Some(table.to_string());
        self
    }

    /// Cursors currently alive.
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }

    /// Highest number of cursors that were ever alive at once.
    pub fn max_open_cursors(&self) -> usize {
        self.max_open_cursors.load(Ordering::SeqCst)
    }
}

impl DataSourceConnector for MemoryConnector {
    fn connect(&self) -> Result<Box<dyn TableDataSource + '_>> {
        if self.refuse_connection {
            return Err(ExportError::ConnectionError(
                "in-memory source refused the connection".to_string(),
            ));
        }
        Ok(Box::new(MemorySource { connector: self }))
    }

    fn describe(&self) -> String {
        format!("in-memory source ({} entries)", self.tables.len())
    }
}

struct MemorySource<'a> {
    connector: &'a MemoryConnector,
}

impl TableDataSource for MemorySource<'_> {
    fn schema_entries(&mut self) -> Result<Vec<TableDescriptor>> {
        if self.connector.fail_schema {
            return Err(ExportError::CatalogError(
                "in-memory schema query failed".to_string(),
            ));
        }
        Ok(self
            .connector
            .tables
            .iter()
            .map(|t| TableDescriptor::new(t.name.clone(), t.table_type.clone()))
            .collect())
    }

    fn open_cursor(&mut self, table: &str) -> Result<Box<dyn RowCursor + '_>> {
        let connector = self.connector;
        if connector.lose_connection_on.as_deref() == Some(table) {
            return Err(ExportError::ConnectionError(format!(
                "connection lost while opening {}",
                table
            )));
        }
        let data = connector
            .tables
            .iter()
            .find(|t| t.name == table)
            .ok_or_else(|| ExportError::table(table, "no such table"))?;
        if data.fail_open {
            return Err(ExportError::table(table, "cannot execute query"));
        }

        let open = connector.open_cursors.fetch_add(1, Ordering::SeqCst) + 1;
        connector.max_open_cursors.fetch_max(open, Ordering::SeqCst);
        Ok(Box::new(MemoryCursor {
            table: data,
            next: 0,
            current: None,
            open_cursors: &connector.open_cursors,
        }))
    }
}

struct MemoryCursor<'a> {
    table: &'a MemoryTable,
    next: usize,
    current: Option<usize>,
    open_cursors: &'a AtomicUsize,
}

impl RowCursor for MemoryCursor<'_> {
    fn field_count(&self) -> usize {
        self.table.columns.len()
    }

    fn field_name(&self, index: usize) -> Result<String> {
        self.table
            .columns
            .get(index)
            .cloned()
            .ok_or_else(|| ExportError::table(&self.table.name, format!("no column {}", index)))
    }

    fn next_row(&mut self) -> Result<bool> {
        if self.table.fail_at_row == Some(self.next) {
            return Err(ExportError::table(
                &self.table.name,
                format!("read failed at row {}", self.next),
            ));
        }
        if self.next < self.table.rows.len() {
            self.current = Some(self.next);
            self.next += 1;
            Ok(true)
        } else {
            self.current = None;
            Ok(false)
        }
    }

    fn value(&self, index: usize) -> Result<FieldValue> {
        let row = self
            .current
            .and_then(|r| self.table.rows.get(r))
            .ok_or_else(|| ExportError::table(&self.table.name, "no current row"))?;
        Ok(row.get(index).cloned().unwrap_or(FieldValue::Null))
    }
}

impl Drop for MemoryCursor<'_> {
    fn drop(&mut self) {
        self.open_cursors.fetch_sub(1, Ordering::SeqCst);
    }
}
