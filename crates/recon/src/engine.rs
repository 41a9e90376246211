use crate::config::RunConfig;
use crate::diagnostics::{Diagnostic, ParseOutcome};
use crate::error::ReconError;
use crate::matcher::Reconciler;
use crate::reference::parse_reference_file;
use crate::summary::{DiagnosticCounts, ReconMeta, ReconSummary};
use crate::variational::load_variational;

/// Both parsed sources for one run.
#[derive(Debug, Clone)]
pub struct ReconInput {
    pub reference: ParseOutcome,
    pub variational: ParseOutcome,
}

impl ReconInput {
    /// Reference diagnostics first, then variational, each in raise order.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.reference.diagnostics.iter().chain(self.variational.diagnostics.iter())
    }

    pub fn reconciler(&self, sites: usize) -> Result<Reconciler<'_>, ReconError> {
        Reconciler::new(&self.reference.dataset, &self.variational.dataset, sites)
    }

    /// Start a summary for a run over these inputs.
    pub fn summary(&self, config: &RunConfig, reconciler: &Reconciler<'_>) -> ReconSummary {
        ReconSummary::new(
            ReconMeta::new(config.name.clone(), config.reference.strategy, config.lattice.sites),
            self.reference.dataset.len(),
            self.variational.dataset.len(),
            reconciler.common_keys().to_vec(),
            DiagnosticCounts::tally(self.diagnostics()),
        )
    }
}

/// Parse the reference file, then every variational file, per `config`.
///
/// Only an unreadable reference file or a bad glob pattern fails here;
/// everything else lands in the outcomes' diagnostics.
pub fn load_inputs(config: &RunConfig) -> Result<ReconInput, ReconError> {
    let reference = parse_reference_file(
        &config.reference.file,
        config.reference.strategy,
        config.lattice.sites,
    )?;
    let variational = load_variational(&config.variational.pattern, &config.variational.comment_prefix)?;
    Ok(ReconInput { reference, variational })
}
