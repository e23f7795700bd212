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

//! ODBC adapter for Access database files.
//!
//! One `Environment` per connector, one connection per run, one statement
//! per table. Rows are fetched in text batches and converted with
//! [`parse_text_value`].

use crate::domain::entities::{FieldValue, TableDescriptor};
use crate::domain::errors::{ExportError, Result};
use crate::infrastructure::odbc::value_text::{parse_text_value, ColumnKind};
use crate::ports::data_source_port::{DataSourceConnector, RowCursor, TableDataSource};
use log::{debug, info};
use odbc_api::buffers::TextRowSet;
use odbc_api::{
    BlockCursor, Connection, ConnectionOptions, Cursor, DataType, Environment, ResultSetMetadata,
};
use std::collections::VecDeque;
use std::path::Path;

const FETCH_BATCH_ROWS: usize = 1000;
const MAX_TEXT_BYTES: usize = 65536;

pub struct OdbcAccessConnector {
    env: Environment,
    connection_string: String,
    source: String,
}

impl OdbcAccessConnector {
    pub fn new(source: &Path, driver: &str) -> Result<Self> {
        let env = Environment::new().map_err(|e| {
            ExportError::ConnectionError(format!(
                "Failed to create ODBC environment: {}. \
                 Make sure an ODBC driver manager is installed.",
                e
            ))
        })?;
        Ok(Self {
            env,
            connection_string: connection_string(driver, source),
            source: source.display().to_string(),
        })
    }
}

/// `Driver={..};DBQ=<path>;`
pub fn connection_string(driver: &str, source: &Path) -> String {
    format!("Driver={{{}}};DBQ={};", driver, source.display())
}

/// `SELECT [t].* FROM [t]` with the name bracket-quoted.
pub fn select_all_sql(table: &str) -> String {
    let quoted = format!("[{}]", table.replace(']', "]]"));
    format!("SELECT {}.* FROM {}", quoted, quoted)
}

fn is_link_failure(e: &odbc_api::Error) -> bool {
    // SQLSTATE class 08: connection exception
    e.to_string().contains("State: 08")
}

fn column_kind(data_type: DataType) -> ColumnKind {
    match data_type {
        DataType::Integer | DataType::SmallInt | DataType::TinyInt | DataType::BigInt => {
            ColumnKind::Integer
        }
        DataType::Real | DataType::Double | DataType::Float { .. } => ColumnKind::Float,
        DataType::Bit => ColumnKind::Boolean,
        DataType::Timestamp { .. } | DataType::Date => ColumnKind::DateTime,
        _ => ColumnKind::Text,
    }
}

impl DataSourceConnector for OdbcAccessConnector {
    fn connect(&self) -> Result<Box<dyn TableDataSource + '_>> {
        info!("Connecting to {}", self.source);
        let conn = self
            .env
            .connect_with_connection_string(&self.connection_string, ConnectionOptions::default())
            .map_err(|e| {
                ExportError::ConnectionError(format!("Failed to open {}: {}", self.source, e))
            })?;
        Ok(Box::new(OdbcSource { conn }))
    }

    fn describe(&self) -> String {
        self.connection_string.clone()
    }
}

struct OdbcSource<'env> {
    conn: Connection<'env>,
}

impl TableDataSource for OdbcSource<'_> {
    fn schema_entries(&mut self) -> Result<Vec<TableDescriptor>> {
        let catalog_err = |e: odbc_api::Error| {
            if is_link_failure(&e) {
                ExportError::ConnectionError(e.to_string())
            } else {
                ExportError::CatalogError(e.to_string())
            }
        };

        let mut cursor = self.conn.tables("", "", "", "").map_err(catalog_err)?;
        let buffers = TextRowSet::for_cursor(100, &mut cursor, Some(4096)).map_err(catalog_err)?;
        let mut row_cursor = cursor.bind_buffer(buffers).map_err(catalog_err)?;

        let mut entries = Vec::new();
        while let Some(batch) = row_cursor.fetch().map_err(catalog_err)? {
            for row_idx in 0..batch.num_rows() {
                let text = |col: usize| {
                    batch
                        .at(col, row_idx)
                        .map(|b| String::from_utf8_lossy(b).into_owned())
                        .unwrap_or_default()
                };
                // TABLE_CAT, TABLE_SCHEM, TABLE_NAME, TABLE_TYPE, REMARKS
                entries.push(TableDescriptor::new(text(2), text(3)));
            }
        }
        debug!("Schema query returned {} entries", entries.len());
        Ok(entries)
    }

    fn open_cursor(&mut self, table: &str) -> Result<Box<dyn RowCursor + '_>> {
        let table_err = |e: odbc_api::Error| {
            if is_link_failure(&e) {
                ExportError::ConnectionError(e.to_string())
            } else {
                ExportError::table(table, e.to_string())
            }
        };

        let sql = select_all_sql(table);
        debug!("SQL command={}", sql);
        let mut cursor = self
            .conn
            .execute(&sql, ())
            .map_err(table_err)?
            .ok_or_else(|| ExportError::table(table, "query returned no result set"))?;

        let num_cols = cursor.num_result_cols().map_err(table_err)?;
        let mut names = Vec::new();
        let mut kinds = Vec::new();
        for col in 1..=num_cols.max(0) as u16 {
            names.push(cursor.col_name(col).map_err(table_err)?);
            kinds.push(column_kind(cursor.col_data_type(col).map_err(table_err)?));
        }

        let buffers = TextRowSet::for_cursor(FETCH_BATCH_ROWS, &mut cursor, Some(MAX_TEXT_BYTES))
            .map_err(table_err)?;
        let block = cursor.bind_buffer(buffers).map_err(table_err)?;

        Ok(Box::new(OdbcCursor {
            table: table.to_string(),
            names,
            kinds,
            block: Some(block),
            pending: VecDeque::new(),
            current: Vec::new(),
        }))
    }
}

struct OdbcCursor<C: Cursor> {
    table: String,
    names: Vec<String>,
    kinds: Vec<ColumnKind>,
    /// `None` once the result set is exhausted; dropping it closes the statement.
    block: Option<BlockCursor<C, TextRowSet>>,
    pending: VecDeque<Vec<FieldValue>>,
    current: Vec<FieldValue>,
}

impl<C: Cursor> OdbcCursor<C> {
    fn fill(&mut self) -> Result<()> {
        let Some(block) = self.block.as_mut() else {
            return Ok(());
        };
        let fetched = block.fetch().map_err(|e| {
            if is_link_failure(&e) {
                ExportError::ConnectionError(e.to_string())
            } else {
                ExportError::table(&self.table, e.to_string())
            }
        })?;
        match fetched {
            Some(batch) => {
                for row_idx in 0..batch.num_rows() {
                    let row = self
                        .kinds
                        .iter()
                        .enumerate()
                        .map(|(col, kind)| parse_text_value(*kind, batch.at(col, row_idx)))
                        .collect();
                    self.pending.push_back(row);
                }
            }
            None => self.block = None,
        }
        Ok(())
    }
}

impl<C: Cursor> RowCursor for OdbcCursor<C> {
    fn field_count(&self) -> usize {
        self.names.len()
    }

    fn field_name(&self, index: usize) -> Result<String> {
        self.names
            .get(index)
            .cloned()
            .ok_or_else(|| ExportError::table(&self.table, format!("no column {}", index)))
    }

    fn next_row(&mut self) -> Result<bool> {
        while self.pending.is_empty() && self.block.is_some() {
            self.fill()?;
        }
        match self.pending.pop_front() {
            Some(row) => {
                self.current = row;
                Ok(true)
            }
            None => {
                self.current.clear();
                Ok(false)
            }
        }
    }

    fn value(&self, index: usize) -> Result<FieldValue> {
        self.current
            .get(index)
            .cloned()
            .ok_or_else(|| ExportError::table(&self.table, format!("no value at column {}", index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_ODBC_DRIVER;

    #[test]
    fn test_select_all_escapes_brackets() {
        assert_eq!(select_all_sql("Orders"), "SELECT [Orders].* FROM [Orders]");
        assert_eq!(
            select_all_sql("Odd]Name"),
            "SELECT [Odd]]Name].* FROM [Odd]]Name]"
        );
    }

    #[test]
    fn test_connection_string() {
        assert_eq!(
            connection_string(DEFAULT_ODBC_DRIVER, Path::new("/data/Sales.mdb")),
            "Driver={Microsoft Access Driver (*.mdb, *.accdb)};DBQ=/data/Sales.mdb;"
        );
    }

    #[test]
    fn test_column_kinds() {
        assert_eq!(column_kind(DataType::Integer), ColumnKind::Integer);
        assert_eq!(column_kind(DataType::Double), ColumnKind::Float);
        assert_eq!(column_kind(DataType::Bit), ColumnKind::Boolean);
        assert_eq!(column_kind(DataType::Date), ColumnKind::DateTime);
        assert_eq!(column_kind(DataType::Unknown), ColumnKind::Text);
    }
}
