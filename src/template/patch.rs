//! Best-effort patching and atomic file writes shared by the editors

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::core::logger::Logger;
use crate::template::TemplateError;

/// Result of a single patch attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    Applied,
    NotFound,
}

impl PatchOutcome {
    pub fn from_count(count: usize) -> Self {
        if count == 0 {
            PatchOutcome::NotFound
        } else {
            PatchOutcome::Applied
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, PatchOutcome::Applied)
    }
}

/// How a `NotFound` patch is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum PatchMode {
    /// Log a warning and carry on
    #[default]
    Tolerant,
    /// Fail the run
    Strict,
}

impl std::fmt::Display for PatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatchMode::Tolerant => write!(f, "tolerant"),
            PatchMode::Strict => write!(f, "strict"),
        }
    }
}

impl PatchMode {
    /// Apply the mode to an outcome: warn, or turn `NotFound` into an error
    pub fn settle(
        &self,
        outcome: PatchOutcome,
        message: &str,
        path: &Path,
        logger: &dyn Logger,
    ) -> Result<PatchOutcome, TemplateError> {
        match (outcome, self) {
            (PatchOutcome::Applied, _) => Ok(outcome),
            (PatchOutcome::NotFound, PatchMode::Tolerant) => {
                logger.warn(message);
                Ok(outcome)
            }
            (PatchOutcome::NotFound, PatchMode::Strict) => Err(TemplateError::PatchNotFound {
                message: message.to_string(),
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Replace `path` with `contents` via a temporary file in the same directory
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), TemplateError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let io_err = |source| TemplateError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(contents.as_bytes()).map_err(io_err)?;
    tmp.flush().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

pub fn read_text(path: &Path) -> Result<String, TemplateError> {
    std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_json(text: &str, path: &Path) -> Result<Value, TemplateError> {
    serde_json::from_str(text).map_err(|source| TemplateError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// JSON with a four space indent, the layout of the solver's own templates
pub fn to_pretty_json(value: &Value, path: &Path) -> Result<String, TemplateError> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser).map_err(|source| TemplateError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    // serde_json only ever emits UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Float text that always reads back as a float (`1.0`, not `1`)
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::logger::{Level, MemoryLogger};
    use tempfile::tempdir;

    #[test]
    fn test_tolerant_mode_warns() {
        let logger = MemoryLogger::new();
        let outcome = PatchMode::Tolerant
            .settle(PatchOutcome::NotFound, "Could not find 'x'", Path::new("a.json"), &logger)
            .unwrap();
        assert_eq!(outcome, PatchOutcome::NotFound);
        assert!(logger.contains(Level::Warn, "Could not find 'x'"));
    }

    #[test]
    fn test_strict_mode_fails() {
        let logger = MemoryLogger::new();
        let err = PatchMode::Strict
            .settle(PatchOutcome::NotFound, "Could not find 'x'", Path::new("a.json"), &logger)
            .unwrap_err();
        assert!(matches!(err, TemplateError::PatchNotFound { .. }));
        assert!(logger.entries().is_empty());
    }

    #[test]
    fn test_applied_passes_in_both_modes() {
        let logger = MemoryLogger::new();
        for mode in [PatchMode::Tolerant, PatchMode::Strict] {
            let outcome = mode
                .settle(PatchOutcome::Applied, "unused", Path::new("a.json"), &logger)
                .unwrap();
            assert!(outcome.is_applied());
        }
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file.txt");
        std::fs::write(&path, "old").unwrap();
        write_atomic(&path, "new").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_pretty_json_uses_four_spaces() {
        let value: Value = serde_json::json!({"a": {"b": 1}});
        let text = to_pretty_json(&value, Path::new("x.json")).unwrap();
        assert!(text.contains("\n    \"a\": {\n        \"b\": 1"));
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(3600.0), "3600.0");
        assert_eq!(format_float(0.01), "0.01");
        assert_eq!(format_float(-2.5), "-2.5");
    }
}
