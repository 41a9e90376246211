//! TFA output loader.
//!
//! One file per polarization. Data lines carry at least three columns:
//! site, density, magnetization. The polarization itself is not written in
//! the file and is derived from the totals:
//! `round(sum(magnetization) / sum(density), 2)`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::diagnostics::{raise, Diagnostic, ParseOutcome};
use crate::error::ReconError;
use crate::model::{Dataset, ObservablePair, PolarizationKey, Source};

pub const DEFAULT_PATTERN: &str = "tfa_output_Nup*.txt";
pub const DEFAULT_COMMENT_PREFIX: &str = "#";

/// Derive the key for one file's vectors.
///
/// `Err` carries the density sum when it cannot normalize the total
/// magnetization (zero, or a non-finite ratio).
pub fn derive_key(pair: &ObservablePair) -> Result<PolarizationKey, f64> {
    let density_sum: f64 = pair.density.iter().sum();
    let magnetization_sum: f64 = pair.magnetization.iter().sum();
    if density_sum == 0.0 {
        return Err(density_sum);
    }
    PolarizationKey::from_value(magnetization_sum / density_sum).ok_or(density_sum)
}

/// Parse one file's content.
///
/// Returns `None` (after raising a diagnostic) when the file has no data
/// lines or its density total is degenerate.
pub fn parse_variational_str(
    content: &str,
    comment_prefix: &str,
    file: &Path,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<(PolarizationKey, ObservablePair)> {
    let mut pair = ObservablePair::default();

    for (idx, line) in content.lines().enumerate() {
        if line.starts_with(comment_prefix) {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 3 {
            continue;
        }
        match (tokens[1].parse::<f64>(), tokens[2].parse::<f64>()) {
            (Ok(density), Ok(magnetization)) => {
                pair.density.push(density);
                pair.magnetization.push(magnetization);
            }
            _ => raise(
                diagnostics,
                Diagnostic::MalformedRecord {
                    file: Some(file.to_path_buf()),
                    line: idx + 1,
                    content: line.trim().to_string(),
                    reason: "density/magnetization columns are not numbers".into(),
                },
            ),
        }
    }

    if pair.density.is_empty() {
        raise(diagnostics, Diagnostic::EmptyFile { file: file.to_path_buf() });
        return None;
    }

    match derive_key(&pair) {
        Ok(key) => Some((key, pair)),
        Err(density_sum) => {
            raise(
                diagnostics,
                Diagnostic::DegenerateDensity { file: file.to_path_buf(), density_sum },
            );
            None
        }
    }
}

/// Expand `pattern` and return matching paths in lexical order.
pub fn matching_files(
    pattern: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Vec<PathBuf>, ReconError> {
    let entries = glob::glob(pattern).map_err(|e| ReconError::Pattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => files.push(path),
            Err(e) => raise(
                diagnostics,
                Diagnostic::UnreadableFile { file: e.path().to_path_buf(), message: e.error().to_string() },
            ),
        }
    }
    files.sort();
    Ok(files)
}

/// Load every file matching `pattern`.
///
/// Files are processed in lexical order; when two files derive the same key
/// the later one wins and the collision is reported.
pub fn load_variational(pattern: &str, comment_prefix: &str) -> Result<ParseOutcome, ReconError> {
    let mut diagnostics = Vec::new();
    let files = matching_files(pattern, &mut diagnostics)?;
    log::debug!("variational: {} file(s) match '{pattern}'", files.len());

    let mut dataset = Dataset::new(Source::Variational);
    let mut origin: HashMap<PolarizationKey, PathBuf> = HashMap::new();

    for path in files {
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                raise(&mut diagnostics, Diagnostic::UnreadableFile { file: path, message: e.to_string() });
                continue;
            }
        };

        let Some((key, pair)) = parse_variational_str(&content, comment_prefix, &path, &mut diagnostics)
        else {
            continue;
        };

        log::debug!("{} -> polarization {key} ({} sites)", path.display(), pair.density.len());
        if let Some(replaced) = origin.insert(key, path.clone()) {
            raise(&mut diagnostics, Diagnostic::KeyCollision { key, replaced, kept: path });
        }
        dataset.insert(key, pair);
    }

    Ok(ParseOutcome { dataset, diagnostics })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
