//! Append-only run log kept next to the executable.
//!
//! Every line is stamped with the local time. The file is trimmed to its
//! newer half at startup once it grows past `MAX_LOG_BYTES`.

use crate::ports::run_log_port::RunLog;
use log::{debug, warn};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Size above which `trim` cuts the log in half.
pub const MAX_LOG_BYTES: u64 = 128 * 1024;

/// `RunLog` implementation writing to a text file and echoing to stdout.
pub struct RunLogFile {
    path: Option<PathBuf>,
    lock: Mutex<()>,
}

impl RunLogFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            lock: Mutex::new(()),
        }
    }

    /// A log that only echoes to the console (`--no-log`).
    pub fn console_only() -> Self {
        Self {
            path: None,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Drops the older half of the file when it exceeds `MAX_LOG_BYTES`.
    ///
    /// The cut is moved forward to the next line break so no partial line
    /// survives. Returns whether the file was rewritten.
    pub fn trim(&self) -> io::Result<bool> {
        let Some(path) = &self.path else {
            return Ok(false);
        };
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());

        let len = match fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };
        if len <= MAX_LOG_BYTES {
            return Ok(false);
        }

        let content = fs::read(path)?;
        let mut cut = content.len() / 2;
        if let Some(nl) = content[cut..].iter().position(|b| *b == b'\n') {
            cut += nl + 1;
        }
        fs::write(path, &content[cut..])?;
        debug!("Trimmed run log {} from {} to {} bytes", path.display(), len, content.len() - cut);
        Ok(true)
    }

    fn append(&self, line: &str) -> io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(file, "{}|{}", stamp, line)
    }
}

impl RunLog for RunLogFile {
    fn write(&self, line: &str, echo: bool) {
        if echo {
            println!("{}", line);
        }
        debug!("{}", line);
        if let Err(e) = self.append(line) {
            warn!("Unable to write to log file: {}", e);
        }
    }
}
