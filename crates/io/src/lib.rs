// Comparison artifact output: CSV tables and SVG plots

pub mod plot;
pub mod table;

use std::fmt;
use std::path::{Path, PathBuf};

use polcmp_recon::{AlignedRecord, Observable, PolarizationKey};

pub use plot::PlotSink;
pub use table::TableSink;

#[derive(Debug)]
pub enum ExportError {
    /// Directory creation or file write failed.
    Io { path: PathBuf, message: String },
    /// CSV encoding failed.
    Table { path: PathBuf, message: String },
    /// Plot rendering failed.
    Plot { path: PathBuf, message: String },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "cannot write {}: {message}", path.display()),
            Self::Table { path, message } => write!(f, "table {}: {message}", path.display()),
            Self::Plot { path, message } => write!(f, "plot {}: {message}", path.display()),
        }
    }
}

impl std::error::Error for ExportError {}

/// Consumer of aligned records. Returns the paths it wrote.
pub trait ExportSink {
    fn export(&mut self, record: &AlignedRecord<'_>) -> Result<Vec<PathBuf>, ExportError>;
}

/// `{observable}_pol_{key}.{ext}`, e.g. `density_pol_0.5.csv`.
pub fn artifact_name(observable: Observable, key: PolarizationKey, ext: &str) -> String {
    format!("{}_pol_{key}.{ext}", observable.file_stem())
}

/// Create each directory (and parents) if absent.
pub fn prepare_output_dirs<'p>(dirs: impl IntoIterator<Item = &'p Path>) -> Result<(), ExportError> {
    for dir in dirs {
        std::fs::create_dir_all(dir).map_err(|e| ExportError::Io {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;
    }
    Ok(())
}
