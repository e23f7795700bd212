//! JSON summary of a finished run.

use crate::domain::entities::{ExportResult, TableStatus, EXIT_FATAL};
use crate::domain::errors::{ExportError, Result};
use log::info;
use serde_json::json;
use std::path::{Path, PathBuf};

/// Writes `report_<timestamp>.json` into `dir` and returns its path.
///
/// Aborted runs get no report: nothing more is written to `dir` once the
/// run has failed fatally, and `None` is returned.
pub fn write_report(result: &ExportResult, dir: &Path) -> Result<Option<PathBuf>> {
    if result.exit_code == EXIT_FATAL {
        return Ok(None);
    }
    let total_rows: u64 = result.tables.iter().map(|t| t.rows).sum();

    let report = json!({
        "summary": {
            "exit_code": result.exit_code,
            "total_tables": result.tables.len(),
            "written": result.count(TableStatus::Written),
            "skipped": result.count(TableStatus::Skipped),
            "failed": result.count(TableStatus::Failed),
            "total_rows": total_rows,
            "total_duration_seconds": result.duration,
            "fatal_error": result.fatal_error,
        },
        "details": result.tables
    });

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let report_path = dir.join(format!("report_{}.json", timestamp));

    std::fs::create_dir_all(dir)?;
    let file = std::fs::File::create(&report_path)?;
    serde_json::to_writer_pretty(file, &report)
        .map_err(|e| ExportError::WriteError(e.to_string()))?;

    info!("Run report written to {}", report_path.display());
    Ok(Some(report_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::TableReport;

    #[test]
    fn test_report_summarises_tables() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = ExportResult::completed(
            vec![
                TableReport::written("Orders".into(), "Orders.txt".into(), 42, 0.5),
                TableReport::skipped("Customers".into(), "Customers.txt".into()),
                TableReport::failed("Broken".into(), "Broken.txt".into(), "boom".into(), 0.1),
            ],
            1.0,
        );

        let path = write_report(&result, temp_dir.path()).unwrap().unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("report_") && name.ends_with(".json"));

        let value: serde_json::Value =
            serde_json::from_reader(std::fs::File::open(&path).unwrap()).unwrap();
        assert_eq!(value["summary"]["written"], 1);
        assert_eq!(value["summary"]["skipped"], 1);
        assert_eq!(value["summary"]["failed"], 1);
        assert_eq!(value["summary"]["total_rows"], 42);
        assert_eq!(value["details"][2]["status"], "FAILED");
        assert_eq!(value["details"][2]["error"], "boom");
    }

    #[test]
    fn test_aborted_run_writes_no_report() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = ExportResult::aborted(
            vec![TableReport::written("Orders".into(), "Orders.txt".into(), 1, 0.1)],
            "Connection failed: gone".into(),
            0.2,
        );

        assert!(write_report(&result, temp_dir.path()).unwrap().is_none());
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }
}
