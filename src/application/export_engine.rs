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

//! The core application logic that drives a whole export run.
//!
//! The engine opens the single connection of the run, asks the catalog for
//! the tables to export and then walks them one at a time. Every table ends
//! in one of three states:
//!
//! - **Written**: the file holds the header and every row.
//! - **Skipped**: the file already existed and overwriting is disabled.
//! - **Failed**: the cursor or the file broke; the error is logged and the
//!   next table starts.
//!
//! Only a lost connection or an unreadable schema stops the run early.

use crate::application::catalog;
use crate::domain::entities::{
    ExportConfiguration, ExportResult, TableReport, SOURCE_FILENAME_COLUMN,
};
use crate::domain::errors::Result;
use crate::domain::{field_names, output_path};
use crate::infrastructure::local_storage::csv_row_writer::CsvRowWriter;
use crate::ports::data_source_port::{DataSourceConnector, RowCursor, TableDataSource};
use crate::ports::progress_port::{ProgressSink, PROGRESS_INTERVAL};
use crate::ports::run_log_port::RunLog;
use log::{info, warn};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Exports every cataloged table of one source file.
pub struct ExportEngine {
    connector: Arc<dyn DataSourceConnector>,
    run_log: Arc<dyn RunLog>,
    progress: Arc<dyn ProgressSink>,
    config: ExportConfiguration,
}

impl ExportEngine {
    /// Creates a new ExportEngine with the provided components.
    pub fn new(
        connector: Arc<dyn DataSourceConnector>,
        run_log: Arc<dyn RunLog>,
        progress: Arc<dyn ProgressSink>,
        config: ExportConfiguration,
    ) -> Self {
        Self {
            connector,
            run_log,
            progress,
            config,
        }
    }

    /// Entry point for running the full export.
    ///
    /// Never fails: run-fatal errors are logged and turned into an
    /// `ExportResult` carrying exit status 99 and the tables handled so far.
    pub fn run(&self) -> ExportResult {
        let start_time = Instant::now();
        let source_name = self
            .config
            .source
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        self.run_log
            .write(&format!("# Processing source file: {}", source_name), false);

        let mut reports = Vec::new();
        match self.export_all(&mut reports) {
            Ok(()) => {
                let result =
                    ExportResult::completed(reports, start_time.elapsed().as_secs_f64());
                info!(
                    "Export finished: {} tables handled in {:.2}s",
                    result.tables.len(),
                    result.duration
                );
                result
            }
            Err(e) => {
                self.run_log.write(
                    &format!(
                        "ERROR caught while processing source file: {}",
                        self.config.source.path.display()
                    ),
                    true,
                );
                self.run_log.write(&e.to_string(), true);
                ExportResult::aborted(reports, e.to_string(), start_time.elapsed().as_secs_f64())
            }
        }
    }

    fn export_all(&self, reports: &mut Vec<TableReport>) -> Result<()> {
        self.run_log.write(
            &format!("INFO: Connecting to {}", self.connector.describe()),
            false,
        );
        let mut source = self.connector.connect()?;

        self.run_log.write("Detecting tables in source file...", true);
        let tables = catalog::list_tables(source.as_mut(), &self.config.table_filter)?;
        self.run_log
            .write(&format!("Found {} tables to process...", tables.len()), true);

        for table in &tables {
            let report = self.process_table(source.as_mut(), &table.name)?;
            reports.push(report);
        }
        Ok(())
    }

    /// Runs one table to its terminal state.
    ///
    /// `Err` is reserved for run-fatal errors; everything else becomes a
    /// `Failed` report.
    fn process_table(
        &self,
        source: &mut dyn TableDataSource,
        table: &str,
    ) -> Result<TableReport> {
        self.run_log
            .write(&format!("### Processing table [{}] ###", table), true);

        let output = output_path::resolve(
            table,
            &self.config.output_directory,
            self.config.file_name_case,
            self.config.append_create_date,
            self.config.source.created,
        );
        let output_name = output.display().to_string();
        self.run_log
            .write(&format!("OUTPUT_FILENAME={}", output_name), true);

        if output.exists() {
            if !self.config.allow_overwrite {
                self.run_log.write(
                    &format!("INFO: Output file exists. Skipping output for table {}", table),
                    true,
                );
                return Ok(TableReport::skipped(table.to_string(), output_name));
            }
            self.run_log
                .write("INFO: Output file exists and will be over-written.", true);
        }

        let start_time = Instant::now();
        match self.export_table(source, table, &output) {
            Ok(rows) => Ok(TableReport::written(
                table.to_string(),
                output_name,
                rows,
                start_time.elapsed().as_secs_f64(),
            )),
            Err(e) if e.is_run_fatal() => Err(e),
            Err(e) => {
                self.run_log.write(
                    &format!("ERROR: table [{}] was not exported: {}", table, e),
                    true,
                );
                Ok(TableReport::failed(
                    table.to_string(),
                    output_name,
                    e.to_string(),
                    start_time.elapsed().as_secs_f64(),
                ))
            }
        }
    }

    fn export_table(
        &self,
        source: &mut dyn TableDataSource,
        table: &str,
        output: &Path,
    ) -> Result<u64> {
        let mut cursor = source.open_cursor(table)?;

        let clean = self.config.clean_field_names;
        let header = (0..cursor.field_count())
            .map(|i| {
                cursor
                    .field_name(i)
                    .map(|raw| field_names::sanitize(&raw, clean).into_owned())
            })
            .collect::<Result<Vec<String>>>()?;
        self.run_log
            .write(&format!("Found {} Fields in table.", header.len()), true);

        let writer = CsvRowWriter::create(output, self.config.delimiter)?;
        match self.stream_rows(cursor.as_mut(), writer, &header) {
            Ok(rows) => Ok(rows),
            Err(e) => {
                drop(cursor);
                if let Err(rm) = std::fs::remove_file(output) {
                    warn!("Could not remove partial file {}: {}", output.display(), rm);
                }
                Err(e)
            }
        }
    }

    fn stream_rows<W: Write>(
        &self,
        cursor: &mut dyn RowCursor,
        mut writer: CsvRowWriter<W>,
        header: &[String],
    ) -> Result<u64> {
        let add_filename = self.config.add_filename_column;
        writer.write_header(header, add_filename.then_some(SOURCE_FILENAME_COLUMN))?;
        let source_value = add_filename.then(|| self.config.source.column_value());

        let mut values = Vec::with_capacity(header.len());
        let mut rows: u64 = 0;
        while cursor.next_row()? {
            values.clear();
            for i in 0..header.len() {
                values.push(cursor.value(i)?);
            }
            writer.write_row(&values, source_value.as_deref())?;
            rows += 1;
            if rows % PROGRESS_INTERVAL == 0 {
                self.progress.update(rows);
            }
        }
        writer.finish()?;

        self.progress.finish(rows);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{
        Delimiter, FieldValue, FileNameCase, SourceFile, TableStatus, EXIT_FATAL, EXIT_SUCCESS,
    };
    use crate::infrastructure::memory::memory_source::{MemoryConnector, MemoryTable};
    use chrono::NaiveDate;
    use std::fs;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingProgress {
        updates: Mutex<Vec<u64>>,
        finals: Mutex<Vec<u64>>,
    }

    impl ProgressSink for RecordingProgress {
        fn update(&self, rows: u64) {
            self.updates.lock().unwrap().push(rows);
        }
        fn finish(&self, rows: u64) {
            self.finals.lock().unwrap().push(rows);
        }
    }

    #[derive(Default)]
    struct MemoryRunLog {
        lines: Mutex<Vec<String>>,
    }

    impl MemoryRunLog {
        fn contains(&self, needle: &str) -> bool {
            self.lines.lock().unwrap().iter().any(|l| l.contains(needle))
        }
    }

    impl RunLog for MemoryRunLog {
        fn write(&self, line: &str, _echo: bool) {
            self.lines.lock().unwrap().push(line.to_string());
        }
    }

    struct Harness {
        engine: ExportEngine,
        progress: Arc<RecordingProgress>,
        log: Arc<MemoryRunLog>,
    }

    fn harness(connector: Arc<MemoryConnector>, config: ExportConfiguration) -> Harness {
        let progress = Arc::new(RecordingProgress::default());
        let log = Arc::new(MemoryRunLog::default());
        let engine = ExportEngine::new(connector, log.clone(), progress.clone(), config);
        Harness {
            engine,
            progress,
            log,
        }
    }

    fn config_for(dir: &Path) -> ExportConfiguration {
        ExportConfiguration::new(
            SourceFile::new("/data/Sales.mdb", NaiveDate::from_ymd_opt(2021, 3, 9)),
            dir,
        )
    }

    fn int_rows(n: usize) -> Vec<Vec<FieldValue>> {
        (0..n).map(|i| vec![FieldValue::Integer(i as i64)]).collect()
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_only_filtered_tables_are_exported() {
        let temp_dir = tempfile::tempdir().unwrap();
        let connector = Arc::new(MemoryConnector::new(vec![
            MemoryTable::new("Customers", &["ID"]).with_rows(int_rows(2)),
            MemoryTable::new("Orders", &["ID"]).with_rows(int_rows(3)),
        ]));
        let mut config = config_for(temp_dir.path());
        config.table_filter = "ord".to_string();

        let h = harness(connector, config);
        let result = h.engine.run();

        assert_eq!(result.exit_code, EXIT_SUCCESS);
        assert_eq!(result.tables.len(), 1);
        assert_eq!(result.rows_for("Orders"), Some(3));
        assert_eq!(dir_entries(temp_dir.path()), vec!["Orders.txt"]);
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("Orders.txt")).unwrap(),
            "ID\n0\n1\n2\n"
        );
    }

    #[test]
    fn test_clean_field_names_in_header() {
        let temp_dir = tempfile::tempdir().unwrap();
        let connector = Arc::new(MemoryConnector::new(vec![MemoryTable::new(
            "People",
            &["First Name!", "id"],
        )
        .with_rows(vec![vec!["Ann".into(), FieldValue::Integer(1)]])]));
        let mut config = config_for(temp_dir.path());
        config.clean_field_names = true;

        let result = harness(connector, config).engine.run();
        assert_eq!(result.exit_code, EXIT_SUCCESS);
        let content = fs::read_to_string(temp_dir.path().join("People.txt")).unwrap();
        assert_eq!(content, "FIRST_NAME,ID\nAnn,1\n");
    }

    #[test]
    fn test_source_filename_column() {
        let temp_dir = tempfile::tempdir().unwrap();
        let connector = Arc::new(MemoryConnector::new(vec![
            MemoryTable::new("Orders", &["ID", "Note"]).with_rows(vec![
                vec![FieldValue::Integer(1), "a".into()],
                vec![FieldValue::Integer(2), FieldValue::Null],
            ]),
        ]));
        let mut config = config_for(temp_dir.path());
        config.add_filename_column = true;

        harness(connector, config).engine.run();

        let mut rdr = csv::Reader::from_path(temp_dir.path().join("Orders.txt")).unwrap();
        let header: Vec<String> = rdr.headers().unwrap().iter().map(str::to_string).collect();
        assert_eq!(header, vec!["ID", "Note", "SOURCE_FILENAME"]);
        let mut rows = 0;
        for record in rdr.records() {
            let record = record.unwrap();
            assert_eq!(record.get(2), Some("/data/sales.mdb"));
            rows += 1;
        }
        assert_eq!(rows, 2);
    }

    #[test]
    fn test_connection_failure_is_fatal_and_writes_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let connector = Arc::new(
            MemoryConnector::new(vec![MemoryTable::new("Orders", &["ID"])]).refusing_connections(),
        );

        let h = harness(connector, config_for(temp_dir.path()));
        let result = h.engine.run();

        assert_eq!(result.exit_code, EXIT_FATAL);
        assert!(result.fatal_error.is_some());
        assert!(result.tables.is_empty());
        assert!(dir_entries(temp_dir.path()).is_empty());
        assert!(h.log.contains("ERROR caught while processing source file"));
    }

    #[test]
    fn test_schema_failure_is_fatal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let connector = Arc::new(
            MemoryConnector::new(vec![MemoryTable::new("Orders", &["ID"])]).failing_schema(),
        );

        let result = harness(connector, config_for(temp_dir.path())).engine.run();
        assert_eq!(result.exit_code, EXIT_FATAL);
        assert!(dir_entries(temp_dir.path()).is_empty());
    }

    #[test]
    fn test_existing_file_is_skipped_without_overwrite() {
        let temp_dir = tempfile::tempdir().unwrap();
        let existing = temp_dir.path().join("Orders.txt");
        fs::write(&existing, b"keep me").unwrap();
        let before = fs::metadata(&existing).unwrap().modified().unwrap();

        let connector = Arc::new(MemoryConnector::new(vec![
            MemoryTable::new("Orders", &["ID"]).with_rows(int_rows(5)),
        ]));
        let mut config = config_for(temp_dir.path());
        config.allow_overwrite = false;

        let h = harness(connector, config);
        let result = h.engine.run();

        assert_eq!(result.exit_code, EXIT_SUCCESS);
        assert_eq!(result.tables[0].status, TableStatus::Skipped);
        assert_eq!(result.tables[0].rows, 0);
        assert!(result.tables[0].error.is_none());
        assert_eq!(fs::read(&existing).unwrap(), b"keep me");
        assert_eq!(fs::metadata(&existing).unwrap().modified().unwrap(), before);
        assert!(h.progress.finals.lock().unwrap().is_empty());
        assert!(h.log.contains("Skipping output for table Orders"));
    }

    #[test]
    fn test_existing_file_is_replaced_with_overwrite() {
        let temp_dir = tempfile::tempdir().unwrap();
        let existing = temp_dir.path().join("Orders.txt");
        fs::write(&existing, b"stale content that is longer than the export").unwrap();

        let connector = Arc::new(MemoryConnector::new(vec![
            MemoryTable::new("Orders", &["ID"]).with_rows(int_rows(1)),
        ]));

        let h = harness(connector, config_for(temp_dir.path()));
        let result = h.engine.run();

        assert_eq!(result.tables[0].status, TableStatus::Written);
        assert_eq!(fs::read_to_string(&existing).unwrap(), "ID\n0\n");
        assert!(h.log.contains("will be over-written"));
    }

    #[test]
    fn test_progress_cadence() {
        let temp_dir = tempfile::tempdir().unwrap();
        let connector = Arc::new(MemoryConnector::new(vec![
            MemoryTable::new("Big", &["N"]).with_rows(int_rows(25_000)),
            MemoryTable::new("Even", &["N"]).with_rows(int_rows(20_000)),
            MemoryTable::new("Small", &["N"]).with_rows(int_rows(9_999)),
        ]));

        let h = harness(connector, config_for(temp_dir.path()));
        let result = h.engine.run();

        assert_eq!(result.rows_for("Big"), Some(25_000));
        assert_eq!(
            *h.progress.updates.lock().unwrap(),
            vec![10_000, 20_000, 10_000, 20_000]
        );
        assert_eq!(
            *h.progress.finals.lock().unwrap(),
            vec![25_000, 20_000, 9_999]
        );
    }

    #[test]
    fn test_cursor_open_failure_is_isolated() {
        let temp_dir = tempfile::tempdir().unwrap();
        let connector = Arc::new(MemoryConnector::new(vec![
            MemoryTable::new("Broken", &["ID"]).failing_open(),
            MemoryTable::new("Fine", &["ID"]).with_rows(int_rows(2)),
        ]));

        let h = harness(connector, config_for(temp_dir.path()));
        let result = h.engine.run();

        assert_eq!(result.exit_code, EXIT_SUCCESS);
        assert_eq!(result.tables[0].status, TableStatus::Failed);
        assert!(result.tables[0].error.as_deref().unwrap().contains("Broken"));
        assert_eq!(result.tables[1].status, TableStatus::Written);
        assert_eq!(dir_entries(temp_dir.path()), vec!["Fine.txt"]);
        assert!(h.log.contains("ERROR: table [Broken]"));
    }

    #[test]
    fn test_write_failure_is_isolated() {
        let temp_dir = tempfile::tempdir().unwrap();
        // a directory squatting on the output name makes file creation fail
        fs::create_dir(temp_dir.path().join("Orders.txt")).unwrap();
        let connector = Arc::new(MemoryConnector::new(vec![
            MemoryTable::new("Orders", &["ID"]).with_rows(int_rows(3)),
            MemoryTable::new("Products", &["ID"]).with_rows(int_rows(2)),
        ]));

        let h = harness(connector.clone(), config_for(temp_dir.path()));
        let result = h.engine.run();

        assert_eq!(result.exit_code, EXIT_SUCCESS);
        assert_eq!(result.tables[0].status, TableStatus::Failed);
        assert!(result.tables[0]
            .error
            .as_deref()
            .unwrap()
            .starts_with("Write failed"));
        assert_eq!(result.tables[1].status, TableStatus::Written);
        assert!(temp_dir.path().join("Orders.txt").is_dir());
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("Products.txt")).unwrap(),
            "ID\n0\n1\n"
        );
        assert_eq!(connector.open_cursors(), 0);
        assert!(h.log.contains("ERROR: table [Orders]"));
    }

    #[test]
    fn test_mid_stream_failure_releases_cursor_and_removes_partial_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let connector = Arc::new(MemoryConnector::new(vec![
            MemoryTable::new("Flaky", &["ID"])
                .with_rows(int_rows(5))
                .failing_at_row(3),
            MemoryTable::new("Fine", &["ID"]).with_rows(int_rows(2)),
        ]));

        let h = harness(connector.clone(), config_for(temp_dir.path()));
        let result = h.engine.run();

        assert_eq!(result.exit_code, EXIT_SUCCESS);
        assert_eq!(result.count(TableStatus::Failed), 1);
        assert_eq!(result.count(TableStatus::Written), 1);
        assert_eq!(dir_entries(temp_dir.path()), vec!["Fine.txt"]);
        assert_eq!(connector.open_cursors(), 0);
        assert_eq!(connector.max_open_cursors(), 1);
        assert_eq!(*h.progress.finals.lock().unwrap(), vec![2]);
    }

    #[test]
    fn test_lost_connection_stops_remaining_tables() {
        let temp_dir = tempfile::tempdir().unwrap();
        let connector = Arc::new(
            MemoryConnector::new(vec![
                MemoryTable::new("First", &["ID"]).with_rows(int_rows(1)),
                MemoryTable::new("Second", &["ID"]).with_rows(int_rows(1)),
                MemoryTable::new("Third", &["ID"]).with_rows(int_rows(1)),
            ])
            .losing_connection_on("Second"),
        );

        let result = harness(connector, config_for(temp_dir.path())).engine.run();

        assert_eq!(result.exit_code, EXIT_FATAL);
        assert_eq!(result.tables.len(), 1);
        assert_eq!(result.tables[0].table, "First");
        assert_eq!(dir_entries(temp_dir.path()), vec!["First.txt"]);
    }

    #[test]
    fn test_naming_rules_and_delimiter() {
        let temp_dir = tempfile::tempdir().unwrap();
        let connector = Arc::new(MemoryConnector::new(vec![MemoryTable::new(
            "Orders",
            &["ID", "Note"],
        )
        .with_rows(vec![vec![FieldValue::Integer(1), "a|b".into()]])]));
        let mut config = config_for(temp_dir.path());
        config.file_name_case = FileNameCase::Upper;
        config.append_create_date = true;
        config.delimiter = Delimiter::Pipe;

        harness(connector, config).engine.run();

        let path = temp_dir.path().join("ORDERS_2021-03-09.txt");
        assert_eq!(fs::read_to_string(path).unwrap(), "ID|Note\n1|\"a|b\"\n");
    }

    #[test]
    fn test_empty_table_gets_header_only() {
        let temp_dir = tempfile::tempdir().unwrap();
        let connector = Arc::new(MemoryConnector::new(vec![MemoryTable::new(
            "Empty",
            &["A", "B"],
        )]));

        let h = harness(connector, config_for(temp_dir.path()));
        let result = h.engine.run();

        assert_eq!(result.rows_for("Empty"), Some(0));
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("Empty.txt")).unwrap(),
            "A,B\n"
        );
        assert_eq!(*h.progress.finals.lock().unwrap(), vec![0]);
        assert!(h.progress.updates.lock().unwrap().is_empty());
    }
}
