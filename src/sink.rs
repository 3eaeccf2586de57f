//! Append-only file destination for `log` records.
//!
//! Every record becomes a single `<timestamp>:<LEVEL>:<message>` line. The file is opened
//! once, never truncated and never rotated.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use chrono::{DateTime, Local};
use log::{Level, LevelFilter, Log, Metadata, Record};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

pub fn format_line(timestamp: &DateTime<Local>, level: Level, message: &str) -> String {
    format!("{}:{level}:{message}", timestamp.format(TIMESTAMP_FORMAT))
}

pub struct FileSink {
    path: PathBuf,
    file: Mutex<File>,
    level: LevelFilter,
}

impl FileSink {
    /// Open (or create) the log file for appending
    pub fn open(path: &Path) -> anyhow::Result<FileSink> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        Ok(FileSink {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            level: LevelFilter::Info,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Register as the process-wide logger
    pub fn install(self) -> anyhow::Result<()> {
        let level = self.level;
        log::set_boxed_logger(Box::new(self)).context("A logger is already installed")?;
        log::set_max_level(level);
        Ok(())
    }
}

impl Log for FileSink {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(&Local::now(), record.level(), &record.args().to_string());
        let Ok(mut file) = self.file.lock() else {
            eprintln!("Log file {} is poisoned, dropping: {line}", self.path.display());
            return;
        };
        if let Err(e) = writeln!(file, "{line}") {
            eprintln!("Couldn't write to log file {}: {e}", self.path.display());
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}
