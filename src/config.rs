//! Command-line arguments, the optional options file, and their resolution
//! into an `ExportConfiguration`.
//!
//! Precedence is defaults, then the options file, then the command line.

use crate::domain::entities::{Delimiter, ExportConfiguration, FileNameCase, SourceFile};
use crate::domain::errors::{ExportError, Result};
use chrono::{DateTime, Local, NaiveDate};
use clap::Parser;
use log::warn;
use serde::Deserialize;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Driver name registered by the Access Database Engine.
pub const DEFAULT_ODBC_DRIVER: &str = "Microsoft Access Driver (*.mdb, *.accdb)";

/// Run log file name used when none is configured.
pub const DEFAULT_LOG_FILE_NAME: &str = "mdb-export_log.txt";

/// Options file picked up from the executable's directory when `--config`
/// is not given.
pub const DEFAULT_OPTIONS_FILE_NAME: &str = "mdb-export.yaml";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub source: Option<String>,
    pub output_dir: Option<String>,
    pub delimiter: Delimiter,
    pub clean_field_names: bool,
    pub file_name_case: FileNameCase,
    pub append_create_date: bool,
    pub add_filename_column: bool,
    pub allow_overwrite: bool,
    pub table_filter: String,
    pub enable_log: bool,
    pub log_file: Option<String>,
    pub odbc_driver: String,
    pub write_report: bool,
    pub debug: bool,
    /// Options file that was asked for but not found; reported once logging is up.
    #[serde(skip)]
    pub missing_options_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source: None,
            output_dir: None,
            delimiter: Delimiter::Comma,
            clean_field_names: false,
            file_name_case: FileNameCase::None,
            append_create_date: false,
            add_filename_column: false,
            allow_overwrite: true,
            table_filter: String::new(),
            enable_log: true,
            log_file: None,
            odbc_driver: DEFAULT_ODBC_DRIVER.to_string(),
            write_report: false,
            debug: false,
            missing_options_file: None,
        }
    }
}

#[derive(Parser, Debug, Default)]
#[command(
    author,
    version,
    about = "Export every table of an Access database into delimited text files",
    long_about = None
)]
pub struct CliArgs {
    /// Source database file (.mdb / .accdb)
    #[arg(short, long)]
    pub source: Option<String>,

    /// Output directory (default: the source file's directory)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Only export tables whose name contains this text (case-insensitive)
    #[arg(long)]
    pub filter: Option<String>,

    /// Skip tables whose output file already exists
    #[arg(long)]
    pub no_overwrite: bool,

    /// Lowercase output file names
    #[arg(long, conflicts_with = "upper")]
    pub lower: bool,

    /// Uppercase output file names
    #[arg(long)]
    pub upper: bool,

    /// Tab-delimited output
    #[arg(short, long, conflicts_with = "pipe")]
    pub tab: bool,

    /// Pipe-delimited output
    #[arg(short, long)]
    pub pipe: bool,

    /// Clean up field names in the header record
    #[arg(long)]
    pub clean: bool,

    /// Append the source file's creation date to output file names
    #[arg(long)]
    pub add_date: bool,

    /// Append a SOURCE_FILENAME column to every record
    #[arg(long)]
    pub add_filename: bool,

    /// Path to options file (YAML or JSON)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Do not write the run log file
    #[arg(long)]
    pub no_log: bool,

    /// Run log location
    #[arg(long)]
    pub log_file: Option<String>,

    /// ODBC driver name
    #[arg(long)]
    pub odbc_driver: Option<String>,

    /// Write a JSON run report into the output directory
    #[arg(long)]
    pub report: bool,

    /// Verbose diagnostic logging
    #[arg(long)]
    pub debug: bool,
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| {
            ExportError::ConfigError(format!("cannot open {}: {}", path.display(), e))
        })?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let is_json = path.extension().is_some_and(|ext| ext == "json");
        let config: AppConfig = if is_json {
            serde_json::from_str(&contents)
                .map_err(|e| ExportError::ConfigError(format!("{}: {}", path.display(), e)))?
        } else {
            serde_yaml::from_str(&contents)
                .map_err(|e| ExportError::ConfigError(format!("{}: {}", path.display(), e)))?
        };

        Ok(config)
    }

    /// Loads the options file and applies the command line on top.
    ///
    /// The file is the one named by `--config`, else `mdb-export.yaml` next
    /// to the executable when present. A `--config` file that does not exist
    /// is noted in `missing_options_file` and the defaults are used.
    pub fn load(args: &CliArgs) -> Result<Self> {
        Self::load_with_default(args, exe_dir().join(DEFAULT_OPTIONS_FILE_NAME))
    }

    fn load_with_default(args: &CliArgs, default_file: PathBuf) -> Result<Self> {
        let mut config = match args.config.as_deref().map(PathBuf::from) {
            Some(path) if path.is_file() => Self::from_file(&path)?,
            Some(path) => Self {
                missing_options_file: Some(path),
                ..Self::default()
            },
            None if default_file.is_file() => Self::from_file(&default_file)?,
            None => Self::default(),
        };
        config.merge_cli(args);
        Ok(config)
    }

    pub fn merge_cli(&mut self, args: &CliArgs) {
        if let Some(s) = &args.source { self.source = Some(s.clone()); }
        if let Some(o) = &args.output { self.output_dir = Some(o.clone()); }
        if let Some(f) = &args.filter { self.table_filter = f.clone(); }
        if args.no_overwrite { self.allow_overwrite = false; }
        if args.lower { self.file_name_case = FileNameCase::Lower; }
        if args.upper { self.file_name_case = FileNameCase::Upper; }
        if args.tab { self.delimiter = Delimiter::Tab; }
        if args.pipe { self.delimiter = Delimiter::Pipe; }
        if args.clean { self.clean_field_names = true; }
        if args.add_date { self.append_create_date = true; }
        if args.add_filename { self.add_filename_column = true; }
        if args.no_log { self.enable_log = false; }
        if let Some(l) = &args.log_file { self.log_file = Some(l.clone()); }
        if let Some(d) = &args.odbc_driver { self.odbc_driver = d.clone(); }
        if args.report { self.write_report = true; }
        if args.debug { self.debug = true; }
    }

    /// Where the run log goes, or `None` when it is disabled.
    pub fn log_file_path(&self) -> Option<PathBuf> {
        if !self.enable_log {
            return None;
        }
        if let Some(path) = &self.log_file {
            return Some(PathBuf::from(path));
        }
        Some(exe_dir().join(DEFAULT_LOG_FILE_NAME))
    }

    /// Builds the engine's settings, inspecting the source file on the way.
    pub fn resolve(&self) -> Result<ExportConfiguration> {
        let source = self
            .source
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ExportError::ConfigError("no source database file given (use --source)".to_string())
            })?;
        let source_path = PathBuf::from(source);
        let meta = fs::metadata(&source_path).map_err(|e| {
            ExportError::ConfigError(format!("cannot read source file {}: {}", source, e))
        })?;
        if !meta.is_file() {
            return Err(ExportError::ConfigError(format!(
                "source {} is not a file",
                source
            )));
        }

        let source_dir = source_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let output_directory = match &self.output_dir {
            Some(dir) if Path::new(dir).is_dir() => PathBuf::from(dir),
            Some(dir) => {
                warn!(
                    "Output directory {} does not exist; writing to {}",
                    dir,
                    source_dir.display()
                );
                source_dir
            }
            None => source_dir,
        };
        let output_directory = std::path::absolute(&output_directory).map_err(|e| {
            ExportError::ConfigError(format!(
                "cannot resolve output directory {}: {}",
                output_directory.display(),
                e
            ))
        })?;

        let created = creation_date(&meta);
        if date_suffix_missing(self.append_create_date, created) {
            warn!(
                "No creation date available for {}; output file names get no date suffix",
                source
            );
        }

        let mut config =
            ExportConfiguration::new(SourceFile::new(source_path, created), output_directory);
        config.delimiter = self.delimiter;
        config.clean_field_names = self.clean_field_names;
        config.file_name_case = self.file_name_case;
        config.append_create_date = self.append_create_date;
        config.add_filename_column = self.add_filename_column;
        config.allow_overwrite = self.allow_overwrite;
        config.table_filter = self.table_filter.clone();
        Ok(config)
    }
}

/// True when names should carry a date but the source has none.
fn date_suffix_missing(append_create_date: bool, created: Option<NaiveDate>) -> bool {
    append_create_date && created.is_none()
}

fn exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Creation day in local time, or the modification day where the
/// filesystem does not record creation.
fn creation_date(meta: &fs::Metadata) -> Option<NaiveDate> {
    meta.created()
        .or_else(|_| meta.modified())
        .ok()
        .map(|t| DateTime::<Local>::from(t).date_naive())
}
