use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ReconError;
use crate::model::DEFAULT_LATTICE_SITES;
use crate::reference::ReferenceStrategy;
use crate::variational::{DEFAULT_COMMENT_PREFIX, DEFAULT_PATTERN};

pub const DEFAULT_REFERENCE_FILE: &str = "ferU-4.txt";
pub const DEFAULT_PLOTS_DIR: &str = "resultados_graficos";
pub const DEFAULT_TABLES_DIR: &str = "resultados_csv";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Everything one comparison run needs. Every field has a default, so an
/// empty document describes the stock pipeline.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub reference: ReferenceConfig,
    #[serde(default)]
    pub variational: VariationalConfig,
    #[serde(default)]
    pub lattice: LatticeConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_name() -> String {
    "dmrg-vs-tfa".into()
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            reference: ReferenceConfig::default(),
            variational: VariationalConfig::default(),
            lattice: LatticeConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferenceConfig {
    #[serde(default = "default_reference_file")]
    pub file: PathBuf,
    #[serde(default)]
    pub strategy: ReferenceStrategy,
}

fn default_reference_file() -> PathBuf {
    PathBuf::from(DEFAULT_REFERENCE_FILE)
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self { file: default_reference_file(), strategy: ReferenceStrategy::default() }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariationalConfig {
    #[serde(default = "default_pattern")]
    pub pattern: String,
    #[serde(default = "default_comment_prefix")]
    pub comment_prefix: String,
}

fn default_pattern() -> String {
    DEFAULT_PATTERN.into()
}

fn default_comment_prefix() -> String {
    DEFAULT_COMMENT_PREFIX.into()
}

impl Default for VariationalConfig {
    fn default() -> Self {
        Self { pattern: default_pattern(), comment_prefix: default_comment_prefix() }
    }
}

// ---------------------------------------------------------------------------
// Lattice + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LatticeConfig {
    #[serde(default = "default_sites")]
    pub sites: usize,
}

fn default_sites() -> usize {
    DEFAULT_LATTICE_SITES
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self { sites: DEFAULT_LATTICE_SITES }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_plots_dir")]
    pub plots_dir: PathBuf,
    #[serde(default = "default_tables_dir")]
    pub tables_dir: PathBuf,
    #[serde(default = "default_true")]
    pub plots: bool,
    #[serde(default = "default_true")]
    pub tables: bool,
}

fn default_plots_dir() -> PathBuf {
    PathBuf::from(DEFAULT_PLOTS_DIR)
}

fn default_tables_dir() -> PathBuf {
    PathBuf::from(DEFAULT_TABLES_DIR)
}

fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            plots_dir: default_plots_dir(),
            tables_dir: default_tables_dir(),
            plots: true,
            tables: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl RunConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: RunConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file, resolving its relative paths
    /// against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ReconError> {
        let input = std::fs::read_to_string(path).map_err(|e| ReconError::io(path, e))?;
        let mut config = Self::from_toml(&input)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_paths(base_dir);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.lattice.sites == 0 {
            return Err(ReconError::ConfigValidation("lattice.sites must be at least 1".into()));
        }
        if self.variational.pattern.trim().is_empty() {
            return Err(ReconError::ConfigValidation("variational.pattern is empty".into()));
        }
        if self.variational.comment_prefix.is_empty() {
            return Err(ReconError::ConfigValidation("variational.comment_prefix is empty".into()));
        }
        if self.reference.file.as_os_str().is_empty() {
            return Err(ReconError::ConfigValidation("reference.file is empty".into()));
        }
        if self.output.plots_dir.as_os_str().is_empty() || self.output.tables_dir.as_os_str().is_empty() {
            return Err(ReconError::ConfigValidation("output directories must not be empty".into()));
        }
        Ok(())
    }

    /// Anchor relative inputs and outputs at `base_dir`.
    pub fn resolve_paths(&mut self, base_dir: &Path) {
        if base_dir.as_os_str().is_empty() {
            return;
        }
        let anchor = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base_dir.join(&*p);
            }
        };
        anchor(&mut self.reference.file);
        anchor(&mut self.output.plots_dir);
        anchor(&mut self.output.tables_dir);
        if Path::new(&self.variational.pattern).is_relative() {
            // the base is a literal path, only the pattern itself may glob
            let base = glob::Pattern::escape(&base_dir.to_string_lossy());
            let joined = Path::new(&base).join(&self.variational.pattern);
            self.variational.pattern = joined.to_string_lossy().into_owned();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_stock_pipeline() {
        let config = RunConfig::from_toml("").unwrap();
        assert_eq!(config.reference.file, PathBuf::from("ferU-4.txt"));
        assert_eq!(config.reference.strategy, ReferenceStrategy::Forward);
        assert_eq!(config.variational.pattern, "tfa_output_Nup*.txt");
        assert_eq!(config.variational.comment_prefix, "#");
        assert_eq!(config.lattice.sites, 100);
        assert_eq!(config.output.plots_dir, PathBuf::from("resultados_graficos"));
        assert_eq!(config.output.tables_dir, PathBuf::from("resultados_csv"));
        assert!(config.output.plots && config.output.tables);
    }

    #[test]
    fn parse_full_config() {
        let input = r#"
name = "n1.5U-10"

[reference]
file = "n1.5U-10.txt"
strategy = "paired"

[variational]
pattern = "runs/tfa_*.dat"
comment_prefix = "%"

[lattice]
sites = 64

[output]
plots_dir = "plots"
tables_dir = "tables"
plots = false
"#;
        let config = RunConfig::from_toml(input).unwrap();
        assert_eq!(config.name, "n1.5U-10");
        assert_eq!(config.reference.strategy, ReferenceStrategy::Paired);
        assert_eq!(config.variational.pattern, "runs/tfa_*.dat");
        assert_eq!(config.variational.comment_prefix, "%");
        assert_eq!(config.lattice.sites, 64);
        assert!(!config.output.plots);
        assert!(config.output.tables);
    }

    #[test]
    fn reject_zero_sites() {
        let err = RunConfig::from_toml("[lattice]\nsites = 0\n").unwrap_err();
        assert!(err.to_string().contains("lattice.sites"));
    }

    #[test]
    fn reject_unknown_strategy() {
        let err = RunConfig::from_toml("[reference]\nstrategy = \"reverse\"\n").unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn reject_unknown_field() {
        let err = RunConfig::from_toml("[lattice]\nsize = 100\n").unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let mut config = RunConfig::from_toml("[reference]\nfile = \"/abs/dmrg.txt\"\n").unwrap();
        config.resolve_paths(Path::new("/data/run1"));
        assert_eq!(config.reference.file, PathBuf::from("/abs/dmrg.txt"));
        assert_eq!(config.output.tables_dir, PathBuf::from("/data/run1/resultados_csv"));
        assert_eq!(config.variational.pattern, "/data/run1/tfa_output_Nup*.txt");
    }

    #[test]
    fn base_dir_glob_characters_are_literal() {
        let mut config = RunConfig::default();
        config.resolve_paths(Path::new("/data/runs[1]?"));
        assert_eq!(config.variational.pattern, "/data/runs[[]1[]][?]/tfa_output_Nup*.txt");
        assert_eq!(config.reference.file, PathBuf::from("/data/runs[1]?/ferU-4.txt"));
    }
}
