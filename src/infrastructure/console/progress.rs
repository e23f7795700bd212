//! Progress reporting for table exports
//!
//! `ConsoleProgress` redraws a single spinner line in place using the
//! `indicatif` crate; `LogProgress` writes a log line per update for
//! non-interactive runs. Both only react to the calls the engine makes.

use crate::ports::progress_port::ProgressSink;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::sync::Mutex;

/// Progress shown on an interactive terminal.
pub struct ConsoleProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn spinner() -> ProgressBar {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
            bar.set_style(style);
        }
        bar
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ConsoleProgress {
    fn update(&self, rows: u64) {
        let mut slot = self.bar.lock().unwrap_or_else(|p| p.into_inner());
        let bar = slot.get_or_insert_with(Self::spinner);
        bar.set_message(format!("{} rows written.", format_number(rows)));
        bar.tick();
    }

    fn finish(&self, rows: u64) {
        let mut slot = self.bar.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(bar) = slot.take() {
            bar.finish_and_clear();
        }
        println!("{} total rows written to output file.", format_number(rows));
    }
}

/// Progress written to the diagnostic log.
#[derive(Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn update(&self, rows: u64) {
        info!("{} rows written.", format_number(rows));
    }

    fn finish(&self, rows: u64) {
        info!("{} total rows written to output file.", format_number(rows));
    }
}

/// Format a number with thousand separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}
