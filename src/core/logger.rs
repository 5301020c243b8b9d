//! Logger - the sink every pipeline stage reports through
//!
//! Library code never prints. Callers hand a [`Logger`] to editors, the
//! result collector and the orchestrator; the CLI uses [`ConsoleLogger`],
//! tests and log viewers use [`MemoryLogger`].

use chrono::Local;
use console::style;
use std::sync::Mutex;

/// Severity of a log message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Info => write!(f, "info"),
            Level::Warn => write!(f, "warn"),
            Level::Error => write!(f, "error"),
        }
    }
}

/// Destination for pipeline diagnostics
pub trait Logger: Send + Sync {
    fn log(&self, level: Level, message: &str);

    fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }
}

/// Styled, timestamped output on stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleLogger {
    /// Suppress `Info` messages
    pub quiet: bool,
}

impl ConsoleLogger {
    pub fn new() -> Self {
        Self { quiet: false }
    }

    pub fn quiet() -> Self {
        Self { quiet: true }
    }
}

impl Logger for ConsoleLogger {
    fn log(&self, level: Level, message: &str) {
        if self.quiet && level == Level::Info {
            return;
        }
        let stamp = Local::now().format("%H:%M:%S");
        let tag = match level {
            Level::Info => style("info ").blue(),
            Level::Warn => style("warn ").yellow(),
            Level::Error => style("error").red().bold(),
        };
        eprintln!("{} {} {}", style(stamp).dim(), tag, message);
    }
}

/// Collects messages in memory
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<(Level, String)>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far
    pub fn entries(&self) -> Vec<(Level, String)> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Messages logged at exactly `level`
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }

    /// True if any message at `level` contains `needle`
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.messages(level).iter().any(|m| m.contains(needle))
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: Level, message: &str) {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.push((level, message.to_string()));
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _level: Level, _message: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_logger_records_levels_in_order() {
        let logger = MemoryLogger::new();
        logger.info("starting");
        logger.warn("missing file");
        logger.error("failed");

        let entries = logger.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], (Level::Info, "starting".to_string()));
        assert_eq!(entries[1].0, Level::Warn);
        assert_eq!(entries[2].0, Level::Error);
    }

    #[test]
    fn test_memory_logger_filters_by_level() {
        let logger = MemoryLogger::new();
        logger.warn("a");
        logger.info("b");
        logger.warn("c");

        assert_eq!(logger.messages(Level::Warn), vec!["a", "c"]);
        assert!(logger.contains(Level::Info, "b"));
        assert!(!logger.contains(Level::Error, "b"));
    }

    #[test]
    fn test_level_display() {
        assert_eq!(Level::Warn.to_string(), "warn");
        assert_eq!(Level::Error.to_string(), "error");
    }
}
