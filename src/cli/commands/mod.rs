//! CLI command implementations

pub mod collect;
pub mod inspect;
pub mod run;

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::Path;

use crate::core::test_type::TestType;
use crate::results::collector::CombinedResult;
use crate::results::export::export_csv;

/// Write the plot series of a result and report the files on stderr
pub(crate) fn export_series(dir: &Path, test_type: TestType, result: &CombinedResult) -> Result<()> {
    let written = export_csv(dir, test_type, result).into_diagnostic()?;
    eprintln!(
        "{} Exported {} series to {}",
        style("✓").green(),
        written.len(),
        style(dir.display()).cyan()
    );
    Ok(())
}
