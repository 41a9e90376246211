// Semicolon-delimited comparison tables

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use polcmp_recon::{AlignedRecord, ComparisonSeries, Observable, Source};

use crate::{artifact_name, ExportError, ExportSink};

pub const TABLE_DELIMITER: u8 = b';';

/// `site;TFA_dens;DMRG_dens` style header for one observable.
pub fn table_header(observable: Observable) -> [String; 3] {
    [
        "site".to_string(),
        format!("{}_{}", Source::Variational.label(), observable.label()),
        format!("{}_{}", Source::Reference.label(), observable.label()),
    ]
}

/// Write one observable's comparison as header + one row per site.
pub fn write_comparison_table(series: &ComparisonSeries<'_>, writer: impl Write) -> Result<(), String> {
    let mut csv = csv::WriterBuilder::new()
        .delimiter(TABLE_DELIMITER)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv.write_record(table_header(series.observable))
        .map_err(|e| format!("CSV write error: {e}"))?;

    for (site, tfa, dmrg) in series.rows() {
        csv.write_record(&[site.to_string(), tfa.to_string(), dmrg.to_string()])
            .map_err(|e| format!("CSV write error: {e}"))?;
    }

    csv.flush().map_err(|e| format!("CSV flush error: {e}"))?;
    Ok(())
}

/// Writes `{observable}_pol_{key}.csv` for both observables into one directory.
#[derive(Debug, Clone)]
pub struct TableSink {
    dir: PathBuf,
}

impl TableSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn write_one(&self, series: &ComparisonSeries<'_>) -> Result<PathBuf, ExportError> {
        let path = self.dir.join(artifact_name(series.observable, series.key, "csv"));
        let file = File::create(&path)
            .map_err(|e| ExportError::Io { path: path.clone(), message: e.to_string() })?;
        write_comparison_table(series, BufWriter::new(file))
            .map_err(|message| ExportError::Table { path: path.clone(), message })?;
        Ok(path)
    }
}

impl ExportSink for TableSink {
    fn export(&mut self, record: &AlignedRecord<'_>) -> Result<Vec<PathBuf>, ExportError> {
        let mut written = Vec::with_capacity(Observable::ALL.len());
        for observable in Observable::ALL {
            let path = self.write_one(&record.series(observable))?;
            log::debug!("wrote {}", path.display());
            written.push(path);
        }
        Ok(written)
    }
}
