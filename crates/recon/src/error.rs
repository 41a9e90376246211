use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (zero lattice sites, empty pattern, etc.).
    ConfigValidation(String),
    /// The variational glob pattern is not a valid pattern.
    Pattern { pattern: String, message: String },
    /// A required input could not be read.
    Io { path: PathBuf, message: String },
    /// No polarization is present in both datasets.
    NoCommonPolarizations { reference_keys: usize, variational_keys: usize },
}

impl ReconError {
    pub fn io(path: impl Into<PathBuf>, err: impl fmt::Display) -> Self {
        Self::Io { path: path.into(), message: err.to_string() }
    }
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Pattern { pattern, message } => {
                write!(f, "invalid file pattern '{pattern}': {message}")
            }
            Self::Io { path, message } => write!(f, "cannot read {}: {message}", path.display()),
            Self::NoCommonPolarizations { reference_keys, variational_keys } => write!(
                f,
                "no common polarizations between DMRG and TFA \
                 ({reference_keys} DMRG key(s), {variational_keys} TFA key(s))"
            ),
        }
    }
}

impl std::error::Error for ReconError {}
