//! `polcmp-recon` - DMRG/TFA site-observable reconciliation engine.
//!
//! Parses both sources into polarization-keyed datasets, intersects them and
//! yields aligned per-site records. Rendering and table output live in
//! `polcmp-io`.

pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod model;
pub mod reference;
pub mod summary;
pub mod variational;

pub use config::RunConfig;
pub use diagnostics::{Diagnostic, ParseOutcome, Severity};
pub use engine::{load_inputs, ReconInput};
pub use error::ReconError;
pub use matcher::{KeyOutcome, Reconciler, SkipNotice};
pub use model::{
    AlignedRecord, ComparisonSeries, Dataset, Observable, ObservablePair, PolarizationKey, Source,
    DEFAULT_LATTICE_SITES,
};
pub use reference::{ReferenceParser, ReferenceStrategy};
pub use summary::ReconSummary;
