//! Logger utility for application-wide logging
//!
//! A `log::Log` implementation that mirrors every record to a file and the
//! console. Without a log file the binary falls back to `env_logger`.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use log::{Level, Log, Metadata, Record};

use crate::errors::{DustError, DustResult};

/// File-plus-console logger
pub struct Logger {
    file: Mutex<File>,
    level: Level,
}

impl Logger {
    /// Creates a logger writing to `log_file`, truncating it
    pub fn new(log_file: &Path, level: Level) -> io::Result<Self> {
        let file = File::create(log_file)?;
        Ok(Logger {
            file: Mutex::new(file),
            level,
        })
    }

    /// Appends one line to the log file
    pub fn write_line(&self, message: &str) -> io::Result<()> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))?;
        writeln!(file, "{}", message)?;
        file.flush()
    }

    /// Install as the global logger
    pub fn init_global_logger(log_file: &Path, level: Level) -> io::Result<()> {
        let logger = Logger::new(log_file, level)?;

        if log::set_boxed_logger(Box::new(logger)).is_err() {
            eprintln!("Warning: Global logger was already initialized");
        }

        log::set_max_level(level.to_level_filter());
        Ok(())
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let message = format!("[{}] {}", record.level(), record.args());
            let _ = self.write_line(&message);

            // Records go to stderr so stdout stays clean for command output
            eprintln!("{}", message);
        }
    }

    fn flush(&self) {}
}

/// Set up logging for the binary
///
/// `--log-file` selects the file logger; otherwise `env_logger` honours
/// `RUST_LOG`, defaulting to `info` (`debug` when verbose).
pub fn init_logging(log_file: Option<&Path>, verbose: bool) -> DustResult<()> {
    let level = if verbose { Level::Debug } else { Level::Info };

    match log_file {
        Some(path) => Logger::init_global_logger(path, level).map_err(|e| {
            DustError::Config(format!("Cannot open log file {}: {}", path.display(), e))
        }),
        None => {
            let default = if verbose { "debug" } else { "info" };
            let env = env_logger::Env::default().default_filter_or(default);
            let _ = env_logger::Builder::from_env(env).try_init();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_records_reach_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dustkit.log");
        let logger = Logger::new(&path, Level::Info).unwrap();

        logger.log(
            &Record::builder()
                .level(Level::Info)
                .args(format_args!("cropped {} rows", 12))
                .build(),
        );
        logger.log(
            &Record::builder()
                .level(Level::Debug)
                .args(format_args!("hidden"))
                .build(),
        );

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "[INFO] cropped 12 rows\n");
    }
}
