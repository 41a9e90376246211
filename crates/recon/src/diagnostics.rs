//! Recoverable conditions raised while loading either source.
//!
//! None of these stop a run. Parsers collect them next to the dataset they
//! built and the front end decides how to print them.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::model::{Dataset, PolarizationKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Notice,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Notice => write!(f, "NOTE"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A marker line with the wrong token count or a non-numeric token.
    MalformedRecord {
        #[serde(skip_serializing_if = "Option::is_none")]
        file: Option<PathBuf>,
        line: usize,
        content: String,
        reason: String,
    },
    /// Adjacent magnetization/density records disagree on the site index.
    SiteMismatch {
        line: usize,
        magnetization_site: i64,
        density_site: i64,
        magnetization_line: String,
        density_line: String,
    },
    /// A magnetization record with no preceding density record to attach to.
    OrphanMagnetization { line: usize, content: String },
    /// A marker line that is not part of a magnetization/density pair.
    UnpairedRecord { line: usize, content: String },
    /// A key whose vectors do not cover the lattice.
    IncompleteKey {
        key: PolarizationKey,
        density_len: usize,
        magnetization_len: usize,
        expected: usize,
    },
    /// A variational file with no data lines.
    EmptyFile { file: PathBuf },
    /// A variational file whose density sum is zero (or ratio non-finite).
    DegenerateDensity { file: PathBuf, density_sum: f64 },
    UnreadableFile { file: PathBuf, message: String },
    /// Two variational files derived the same key; the later one was kept.
    KeyCollision { key: PolarizationKey, replaced: PathBuf, kept: PathBuf },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Self::MalformedRecord { .. }
            | Self::SiteMismatch { .. }
            | Self::UnreadableFile { .. } => Severity::Error,
            Self::IncompleteKey { .. }
            | Self::OrphanMagnetization { .. }
            | Self::DegenerateDensity { .. }
            | Self::KeyCollision { .. } => Severity::Warning,
            Self::UnpairedRecord { .. } | Self::EmptyFile { .. } => Severity::Notice,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.severity())?;
        match self {
            Self::MalformedRecord { file, line, content, reason } => {
                if let Some(file) = file {
                    write!(f, "{}:{line}: {reason}: {content}", file.display())
                } else {
                    write!(f, "line {line}: {reason}: {content}")
                }
            }
            Self::SiteMismatch {
                line,
                magnetization_site,
                density_site,
                magnetization_line,
                density_line,
            } => write!(
                f,
                "lines {line} and {}: site {magnetization_site} != site {density_site}\n  current line: {magnetization_line}\n  next line:    {density_line}",
                line + 1
            ),
            Self::OrphanMagnetization { line, content } => {
                write!(f, "line {line}: magnetization before any density record, dropped: {content}")
            }
            Self::UnpairedRecord { line, content } => {
                write!(f, "line {line}: record outside a magnetization/density pair, ignored: {content}")
            }
            Self::IncompleteKey { key, density_len, magnetization_len, expected } => write!(
                f,
                "polarization {key} incomplete: {density_len} densities, \
                 {magnetization_len} magnetizations (expected {expected})"
            ),
            Self::EmptyFile { file } => write!(f, "{}: no data lines", file.display()),
            Self::DegenerateDensity { file, density_sum } => write!(
                f,
                "{}: total density {density_sum} cannot normalize polarization, file skipped",
                file.display()
            ),
            Self::UnreadableFile { file, message } => {
                write!(f, "{}: cannot read: {message}", file.display())
            }
            Self::KeyCollision { key, replaced, kept } => write!(
                f,
                "polarization {key} derived by both {} and {}; keeping {}",
                replaced.display(),
                kept.display(),
                kept.display()
            ),
        }
    }
}

/// A dataset plus everything worth reporting about how it was built.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub dataset: Dataset,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseOutcome {
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.diagnostics.iter().filter(|d| d.severity() == Severity::Error)
    }

    pub fn incomplete_keys(&self) -> Vec<PolarizationKey> {
        self.diagnostics
            .iter()
            .filter_map(|d| match d {
                Diagnostic::IncompleteKey { key, .. } => Some(*key),
                _ => None,
            })
            .collect()
    }
}

/// Records `diagnostic` and mirrors it to the `log` facade.
pub(crate) fn raise(diagnostics: &mut Vec<Diagnostic>, diagnostic: Diagnostic) {
    log::warn!("{diagnostic}");
    diagnostics.push(diagnostic);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_severity() {
        let d = Diagnostic::MalformedRecord {
            file: None,
            line: 7,
            content: "LessUpDn 3".into(),
            reason: "expected 3 tokens, found 2".into(),
        };
        assert_eq!(d.to_string(), "[ERROR] line 7: expected 3 tokens, found 2: LessUpDn 3");
    }

    #[test]
    fn incomplete_key_names_lengths() {
        let d = Diagnostic::IncompleteKey {
            key: PolarizationKey::from_value(0.5).unwrap(),
            density_len: 100,
            magnetization_len: 99,
            expected: 100,
        };
        assert_eq!(d.severity(), Severity::Warning);
        let s = d.to_string();
        assert!(s.starts_with("[WARN] polarization 0.5"));
        assert!(s.contains("99 magnetizations"));
    }

    #[test]
    fn serializes_with_kind_tag() {
        let d = Diagnostic::EmptyFile { file: PathBuf::from("a.txt") };
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["kind"], "empty_file");
        assert_eq!(json["file"], "a.txt");
    }
}
