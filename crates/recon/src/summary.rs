use std::path::PathBuf;

use serde::Serialize;

use crate::diagnostics::{Diagnostic, Severity};
use crate::matcher::SkipNotice;
use crate::model::PolarizationKey;
use crate::reference::ReferenceStrategy;

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub strategy: ReferenceStrategy,
    pub sites: usize,
    pub engine_version: String,
    pub run_at: String,
}

impl ReconMeta {
    pub fn new(config_name: impl Into<String>, strategy: ReferenceStrategy, sites: usize) -> Self {
        Self {
            config_name: config_name.into(),
            strategy,
            sites,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportFailure {
    pub key: PolarizationKey,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DiagnosticCounts {
    pub errors: usize,
    pub warnings: usize,
    pub notices: usize,
}

impl DiagnosticCounts {
    pub fn tally<'d>(diagnostics: impl IntoIterator<Item = &'d Diagnostic>) -> Self {
        let mut counts = Self::default();
        for d in diagnostics {
            match d.severity() {
                Severity::Error => counts.errors += 1,
                Severity::Warning => counts.warnings += 1,
                Severity::Notice => counts.notices += 1,
            }
        }
        counts
    }
}

/// What a comparison run did, key by key.
#[derive(Debug, Clone, Serialize)]
pub struct ReconSummary {
    pub meta: ReconMeta,
    pub reference_keys: usize,
    pub variational_keys: usize,
    pub common: Vec<PolarizationKey>,
    pub aligned: Vec<PolarizationKey>,
    pub skipped: Vec<SkipNotice>,
    pub export_failures: Vec<ExportFailure>,
    pub artifacts: Vec<PathBuf>,
    pub diagnostics: DiagnosticCounts,
}

impl ReconSummary {
    pub fn new(
        meta: ReconMeta,
        reference_keys: usize,
        variational_keys: usize,
        common: Vec<PolarizationKey>,
        diagnostics: DiagnosticCounts,
    ) -> Self {
        Self {
            meta,
            reference_keys,
            variational_keys,
            common,
            aligned: Vec::new(),
            skipped: Vec::new(),
            export_failures: Vec::new(),
            artifacts: Vec::new(),
            diagnostics,
        }
    }

    pub fn record_aligned(&mut self, key: PolarizationKey, artifacts: Vec<PathBuf>) {
        self.aligned.push(key);
        self.artifacts.extend(artifacts);
    }

    pub fn record_skipped(&mut self, notice: SkipNotice) {
        self.skipped.push(notice);
    }

    pub fn record_export_failure(&mut self, key: PolarizationKey, message: impl Into<String>) {
        self.export_failures.push(ExportFailure { key, message: message.into() });
    }
}
