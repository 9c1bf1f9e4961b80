//! File-backed logger. The terminal belongs to the UI, so records go to disk.

use anyhow::{Context, Result, anyhow};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct FileLogger {
    file: Mutex<File>,
    start: Instant,
    level: LevelFilter,
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(self.start.elapsed(), record.level(), record.target(), record.args());
        if let Ok(mut f) = self.file.lock() {
            let _ = writeln!(f, "{}", line);
        }
    }

    fn flush(&self) {
        if let Ok(mut f) = self.file.lock() {
            let _ = f.flush();
        }
    }
}

fn format_line(elapsed: Duration, level: Level, target: &str, args: impl std::fmt::Display) -> String {
    format!("{:>9.3}s {:<5} {}: {}", elapsed.as_secs_f64(), level, target, args)
}

/// Install the logger, appending to `path`. `LevelFilter::Off` installs nothing.
pub fn init(path: &Path, level: LevelFilter) -> Result<()> {
    if level == LevelFilter::Off {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    log::set_boxed_logger(Box::new(FileLogger {
        file: Mutex::new(file),
        start: Instant::now(),
        level,
    }))
    .map_err(|e| anyhow!("installing logger: {}", e))?;
    log::set_max_level(level);
    Ok(())
}
