//! # mdb-export
//!
//! Command-line front end: resolves configuration, wires the adapters into
//! the export engine, and maps the outcome to a process exit status.

use clap::Parser;
use log::{error, info, warn};
use mdb_table_exporter::application::export_engine::ExportEngine;
use mdb_table_exporter::application::run_report;
use mdb_table_exporter::config::{AppConfig, CliArgs};
use mdb_table_exporter::domain::entities::{ExportConfiguration, TableStatus, EXIT_FATAL};
use mdb_table_exporter::domain::errors::Result;
use mdb_table_exporter::infrastructure::console::progress::{ConsoleProgress, LogProgress};
use mdb_table_exporter::infrastructure::local_storage::run_log_file::RunLogFile;
use mdb_table_exporter::ports::data_source_port::DataSourceConnector;
use mdb_table_exporter::ports::progress_port::ProgressSink;
use mdb_table_exporter::ports::run_log_port::RunLog;
use std::io::IsTerminal;
use std::process;
use std::sync::Arc;

const EXIT_CONFIG_ERROR: i32 = 1;

fn main() {
    // 1. Parse Arguments
    let args = CliArgs::parse();

    // 2. Load Config (options file, then CLI overrides)
    let config = match AppConfig::load(&args) {
        Ok(c) => c,
        Err(e) => {
            init_logging(args.debug);
            error!("Failed to load config: {}", e);
            process::exit(EXIT_CONFIG_ERROR);
        }
    };

    // 3. Initialize Logging
    init_logging(config.debug);

    let run_log = Arc::new(match config.log_file_path() {
        Some(path) => RunLogFile::new(path),
        None => RunLogFile::console_only(),
    });
    if let Some(path) = run_log.path() {
        info!("Run log: {}", path.display());
    }
    if let Err(e) = run_log.trim() {
        warn!("Unable to trim log file: {}", e);
    }
    if let Some(path) = &config.missing_options_file {
        warn!("Options file {} not found; using defaults", path.display());
    }
    run_log.write(
        &format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        true,
    );

    let export_config = match config.resolve() {
        Ok(c) => c,
        Err(e) => {
            run_log.write(&format!("ERROR: {}", e), true);
            process::exit(EXIT_CONFIG_ERROR);
        }
    };
    info!(
        "Exporting {} to {} (delimiter: {})",
        export_config.source.path.display(),
        export_config.output_directory.display(),
        export_config.delimiter
    );

    // 4. Initialize Hexagonal Components
    let connector = match build_connector(&config, &export_config) {
        Ok(c) => c,
        Err(e) => {
            run_log.write(
                &format!(
                    "ERROR caught while processing source file: {}",
                    export_config.source.path.display()
                ),
                true,
            );
            run_log.write(&e.to_string(), true);
            process::exit(EXIT_FATAL);
        }
    };

    let progress: Arc<dyn ProgressSink> = if std::io::stdout().is_terminal() {
        Arc::new(ConsoleProgress::new())
    } else {
        Arc::new(LogProgress)
    };

    // 5. Run Engine
    let report_dir = export_config.output_directory.clone();
    let engine = ExportEngine::new(connector, run_log.clone(), progress, export_config);

    info!("Starting Export process...");
    let result = engine.run();

    run_log.write(
        &format!(
            "Export finished. {} written, {} skipped, {} failed in {:.2}s.",
            result.count(TableStatus::Written),
            result.count(TableStatus::Skipped),
            result.count(TableStatus::Failed),
            result.duration
        ),
        true,
    );

    if config.write_report {
        match run_report::write_report(&result, &report_dir) {
            Ok(Some(path)) => {
                run_log.write(&format!("Report written to {}", path.display()), false)
            }
            Ok(None) => run_log.write("No run report for an aborted run.", false),
            Err(e) => warn!("Unable to write run report: {}", e),
        }
    }

    process::exit(result.exit_code);
}

fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

#[cfg(feature = "odbc")]
fn build_connector(
    config: &AppConfig,
    export_config: &ExportConfiguration,
) -> Result<Arc<dyn DataSourceConnector>> {
    use mdb_table_exporter::infrastructure::odbc::access_adapter::OdbcAccessConnector;

    let connector = OdbcAccessConnector::new(&export_config.source.path, &config.odbc_driver)?;
    Ok(Arc::new(connector))
}

#[cfg(not(feature = "odbc"))]
fn build_connector(
    config: &AppConfig,
    _export_config: &ExportConfiguration,
) -> Result<Arc<dyn DataSourceConnector>> {
    Err(mdb_table_exporter::domain::errors::ExportError::ConnectionError(format!(
        "built without ODBC support; rebuild with `--features odbc` to use driver {}",
        config.odbc_driver
    )))
}
