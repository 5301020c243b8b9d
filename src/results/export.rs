//! CSV export of plot series
//!
//! One two-column file per chart, named `<tag>_plot<index>.csv`, headed by
//! the chart's x and y axis labels.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::test_type::TestType;
use crate::results::collector::CombinedResult;
use crate::results::series::{series_for, PlotSeries};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to create export directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("No matching data found to export for {0}")]
    NothingToExport(TestType),
}

pub fn series_file_name(test_type: TestType, series: &PlotSeries) -> String {
    format!("{}_plot{}.csv", test_type.tag(), series.index)
}

/// Write one series as a CSV file
pub fn write_series_csv(path: &Path, series: &PlotSeries) -> Result<(), ExportError> {
    let csv_err = |source| ExportError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    writer
        .write_record([series.x_label, series.y_label])
        .map_err(csv_err)?;
    for (x, y) in series.points() {
        writer
            .write_record([x.to_string(), y.to_string()])
            .map_err(csv_err)?;
    }
    writer
        .flush()
        .map_err(|e| csv_err(csv::Error::from(e)))?;
    Ok(())
}

/// Export every available chart of a result; returns the written files
pub fn export_csv(
    dir: &Path,
    test_type: TestType,
    result: &CombinedResult,
) -> Result<Vec<PathBuf>, ExportError> {
    let series = series_for(test_type, result);
    if series.is_empty() {
        return Err(ExportError::NothingToExport(test_type));
    }

    std::fs::create_dir_all(dir).map_err(|source| ExportError::Directory {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::with_capacity(series.len());
    for s in &series {
        let path = dir.join(series_file_name(test_type, s));
        write_series_csv(&path, s)?;
        written.push(path);
    }
    Ok(written)
}
