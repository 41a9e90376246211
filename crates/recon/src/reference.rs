//! DMRG output parser.
//!
//! The reference file is a mixed stream of log lines. Two record shapes carry
//! data:
//!
//! ```text
//! #Ntot_per_site <site> <polarization> <density>
//! LessUpDn <site> <magnetization>
//! ```
//!
//! Every other line is ignored. Two scan strategies exist because producers
//! disagree on record order; see [`ReferenceStrategy`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diagnostics::{raise, Diagnostic, ParseOutcome};
use crate::error::ReconError;
use crate::model::{Dataset, PolarizationKey, Source};

pub const DENSITY_MARKER: &str = "#Ntot_per_site";
pub const MAGNETIZATION_MARKER: &str = "LessUpDn";

// ---------------------------------------------------------------------------
// Strategy selection
// ---------------------------------------------------------------------------

/// How density and magnetization records are associated with a polarization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceStrategy {
    /// Density record first; each magnetization attaches to the most recent
    /// density record's polarization.
    #[default]
    Forward,
    /// Magnetization record immediately followed by its density record, with
    /// the two site indices cross-checked.
    Paired,
}

impl ReferenceStrategy {
    pub fn parser(self, sites: usize) -> Box<dyn ReferenceParser> {
        match self {
            Self::Forward => Box::new(ForwardScan { sites }),
            Self::Paired => Box::new(PairedScan { sites }),
        }
    }
}

impl std::fmt::Display for ReferenceStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forward => write!(f, "forward"),
            Self::Paired => write!(f, "paired"),
        }
    }
}

pub trait ReferenceParser {
    fn parse_str(&self, input: &str) -> ParseOutcome;
}

/// Read `path` in full and parse it with `strategy`.
pub fn parse_reference_file(
    path: &Path,
    strategy: ReferenceStrategy,
    sites: usize,
) -> Result<ParseOutcome, ReconError> {
    let content = std::fs::read_to_string(path).map_err(|e| ReconError::io(path, e))?;
    log::debug!("parsing {} with {strategy} strategy", path.display());
    Ok(strategy.parser(sites).parse_str(&content))
}

// ---------------------------------------------------------------------------
// Record shapes
// ---------------------------------------------------------------------------

enum Line<'a> {
    Density(Vec<&'a str>),
    Magnetization(Vec<&'a str>),
    Other,
}

fn classify(line: &str) -> Line<'_> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.first().copied() {
        Some(DENSITY_MARKER) => Line::Density(tokens),
        Some(MAGNETIZATION_MARKER) => Line::Magnetization(tokens),
        _ => Line::Other,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DensityRecord {
    site: i64,
    key: PolarizationKey,
    density: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct MagnetizationRecord {
    site: i64,
    magnetization: f64,
}

fn parse_site(token: &str) -> Result<i64, String> {
    token.parse().map_err(|_| format!("site index '{token}' is not an integer"))
}

fn parse_float(token: &str, what: &str) -> Result<f64, String> {
    token.parse().map_err(|_| format!("{what} '{token}' is not a number"))
}

/// Marker, site, polarization, density. A trailing fifth field is tolerated.
fn parse_density(tokens: &[&str]) -> Result<DensityRecord, String> {
    if tokens.len() != 4 && tokens.len() != 5 {
        return Err(format!(
            "{DENSITY_MARKER} record needs 4 tokens, found {}",
            tokens.len()
        ));
    }
    let site = parse_site(tokens[1])?;
    let polarization = parse_float(tokens[2], "polarization")?;
    let density = parse_float(tokens[3], "density")?;
    let key = PolarizationKey::from_value(polarization)
        .ok_or_else(|| format!("polarization '{}' is not finite", tokens[2]))?;
    Ok(DensityRecord { site, key, density })
}

fn parse_magnetization(tokens: &[&str]) -> Result<MagnetizationRecord, String> {
    if tokens.len() != 3 {
        return Err(format!(
            "{MAGNETIZATION_MARKER} record needs 3 tokens, found {}",
            tokens.len()
        ));
    }
    let site = parse_site(tokens[1])?;
    let magnetization = parse_float(tokens[2], "magnetization")?;
    Ok(MagnetizationRecord { site, magnetization })
}

fn malformed(line: usize, content: &str, reason: String) -> Diagnostic {
    Diagnostic::MalformedRecord { file: None, line, content: content.trim().to_string(), reason }
}

fn finish(dataset: Dataset, mut diagnostics: Vec<Diagnostic>, sites: usize) -> ParseOutcome {
    for incomplete in dataset.incomplete(sites) {
        raise(
            &mut diagnostics,
            Diagnostic::IncompleteKey {
                key: incomplete.key,
                density_len: incomplete.density_len,
                magnetization_len: incomplete.magnetization_len,
                expected: sites,
            },
        );
    }
    log::debug!("reference: {} polarization(s), {} diagnostic(s)", dataset.len(), diagnostics.len());
    ParseOutcome { dataset, diagnostics }
}

// ---------------------------------------------------------------------------
// Forward scan
// ---------------------------------------------------------------------------

/// Line-by-line scan; magnetization follows the last density record seen.
#[derive(Debug, Clone, Copy)]
pub struct ForwardScan {
    pub sites: usize,
}

impl ReferenceParser for ForwardScan {
    fn parse_str(&self, input: &str) -> ParseOutcome {
        let mut dataset = Dataset::new(Source::Reference);
        let mut diagnostics = Vec::new();
        let mut current: Option<PolarizationKey> = None;

        for (idx, raw) in input.lines().enumerate() {
            let line_no = idx + 1;
            match classify(raw) {
                Line::Density(tokens) => match parse_density(&tokens) {
                    Ok(rec) => {
                        dataset.push_density(rec.key, rec.density);
                        current = Some(rec.key);
                    }
                    Err(reason) => raise(&mut diagnostics, malformed(line_no, raw, reason)),
                },
                Line::Magnetization(tokens) => match parse_magnetization(&tokens) {
                    Ok(rec) => match current {
                        Some(key) => dataset.push_magnetization(key, rec.magnetization),
                        None => raise(
                            &mut diagnostics,
                            Diagnostic::OrphanMagnetization {
                                line: line_no,
                                content: raw.trim().to_string(),
                            },
                        ),
                    },
                    Err(reason) => raise(&mut diagnostics, malformed(line_no, raw, reason)),
                },
                Line::Other => {}
            }
        }

        finish(dataset, diagnostics, self.sites)
    }
}

// ---------------------------------------------------------------------------
// Paired scan
// ---------------------------------------------------------------------------

/// Strict adjacent-pair scan: `LessUpDn` line, then `#Ntot_per_site` line.
#[derive(Debug, Clone, Copy)]
pub struct PairedScan {
    pub sites: usize,
}

impl PairedScan {
    fn parse_pair(
        mag_tokens: &[&str],
        dens_tokens: &[&str],
        line_no: usize,
        mag_raw: &str,
        dens_raw: &str,
    ) -> Result<(MagnetizationRecord, DensityRecord), Diagnostic> {
        let mag = parse_magnetization(mag_tokens).map_err(|reason| {
            malformed(line_no, mag_raw, format!("{reason}; pair at lines {line_no}-{} dropped", line_no + 1))
        })?;
        let dens = parse_density(dens_tokens).map_err(|reason| {
            malformed(
                line_no + 1,
                dens_raw,
                format!("{reason}; pair at lines {line_no}-{} dropped", line_no + 1),
            )
        })?;
        if mag.site != dens.site {
            return Err(Diagnostic::SiteMismatch {
                line: line_no,
                magnetization_site: mag.site,
                density_site: dens.site,
                magnetization_line: mag_raw.trim().to_string(),
                density_line: dens_raw.trim().to_string(),
            });
        }
        Ok((mag, dens))
    }
}

impl ReferenceParser for PairedScan {
    fn parse_str(&self, input: &str) -> ParseOutcome {
        let mut dataset = Dataset::new(Source::Reference);
        let mut diagnostics = Vec::new();
        let lines: Vec<&str> = input.lines().collect();

        let mut i = 0;
        while i < lines.len() {
            let line_no = i + 1;
            let current = classify(lines[i]);
            let next = lines.get(i + 1).map(|l| classify(l));

            match (current, next) {
                (Line::Magnetization(mag_tokens), Some(Line::Density(dens_tokens))) => {
                    match Self::parse_pair(&mag_tokens, &dens_tokens, line_no, lines[i], lines[i + 1]) {
                        Ok((mag, dens)) => {
                            dataset.push_magnetization(dens.key, mag.magnetization);
                            dataset.push_density(dens.key, dens.density);
                        }
                        Err(diagnostic) => raise(&mut diagnostics, diagnostic),
                    }
                    i += 2;
                }
                (Line::Magnetization(_), _) | (Line::Density(_), _) => {
                    raise(
                        &mut diagnostics,
                        Diagnostic::UnpairedRecord { line: line_no, content: lines[i].trim().to_string() },
                    );
                    i += 1;
                }
                (Line::Other, _) => i += 1,
            }
        }

        finish(dataset, diagnostics, self.sites)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn key(v: f64) -> PolarizationKey {
        PolarizationKey::from_value(v).unwrap()
    }

    fn forward(input: &str, sites: usize) -> ParseOutcome {
        ForwardScan { sites }.parse_str(input)
    }

    fn paired(input: &str, sites: usize) -> ParseOutcome {
        PairedScan { sites }.parse_str(input)
    }

    #[test]
    fn forward_attaches_magnetization_to_current_polarization() {
        let input = "\
sweep 1 energy -12.3
#Ntot_per_site 1 0.5 0.9
LessUpDn 1 0.1
#Ntot_per_site 2 0.5 1.1
LessUpDn 2 -0.1
#Ntot_per_site 1 0.2 0.7
LessUpDn 1 0.05
";
        let out = forward(input, 2);
        let half = out.dataset.get(key(0.5)).unwrap();
        assert_eq!(half.density, vec![0.9, 1.1]);
        assert_eq!(half.magnetization, vec![0.1, -0.1]);
        let fifth = out.dataset.get(key(0.2)).unwrap();
        assert_eq!(fifth.density, vec![0.7]);
        assert_eq!(fifth.magnetization, vec![0.05]);
        // 0.2 only has one site out of two
        assert_eq!(out.incomplete_keys(), vec![key(0.2)]);
    }

    #[test]
    fn forward_preserves_line_order_not_site_order() {
        let input = "\
#Ntot_per_site 3 0.5 0.3
#Ntot_per_site 1 0.5 0.1
#Ntot_per_site 2 0.5 0.2
";
        let out = forward(input, 3);
        assert_eq!(out.dataset.get(key(0.5)).unwrap().density, vec![0.3, 0.1, 0.2]);
    }

    #[test]
    fn forward_drops_magnetization_before_any_density() {
        let input = "LessUpDn 1 0.3\n#Ntot_per_site 1 0.5 1.0\n";
        let out = forward(input, 1);
        assert!(out.dataset.get(key(0.5)).unwrap().magnetization.is_empty());
        assert!(matches!(out.diagnostics[0], Diagnostic::OrphanMagnetization { line: 1, .. }));
    }

    #[test]
    fn forward_reports_and_skips_malformed_lines() {
        let input = "\
#Ntot_per_site 1 0.5 1.0
LessUpDn 1 abc
LessUpDn 1 0.2 extra
#Ntot_per_site x 0.5 1.0
#Ntot_per_site 2 0.5
LessUpDn 1 0.3
";
        let out = forward(input, 1);
        let pair = out.dataset.get(key(0.5)).unwrap();
        assert_eq!(pair.density, vec![1.0]);
        assert_eq!(pair.magnetization, vec![0.3]);
        let lines: Vec<usize> = out
            .diagnostics
            .iter()
            .filter_map(|d| match d {
                Diagnostic::MalformedRecord { line, .. } => Some(*line),
                _ => None,
            })
            .collect();
        assert_eq!(lines, vec![2, 3, 4, 5]);
    }

    #[test]
    fn density_record_tolerates_trailing_field() {
        let out = forward("#Ntot_per_site 1 0.5 1.0 0.0\n", 1);
        assert_eq!(out.dataset.get(key(0.5)).unwrap().density, vec![1.0]);
    }

    #[test]
    fn marker_must_be_a_whole_token() {
        let out = forward("#Ntot_per_site_total 1 0.5 1.0\nLessUpDnX 1 0.2\n", 1);
        assert!(out.dataset.is_empty());
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn non_finite_polarization_is_malformed() {
        let out = forward("#Ntot_per_site 1 nan 1.0\n", 1);
        assert!(out.dataset.is_empty());
        assert_eq!(out.errors().count(), 1);
    }

    #[test]
    fn polarization_is_rounded_at_insertion() {
        let out = forward("#Ntot_per_site 1 0.4999 1.0\n#Ntot_per_site 2 0.5001 1.0\n", 2);
        assert_eq!(out.dataset.len(), 1);
        assert_eq!(out.dataset.get(key(0.5)).unwrap().density.len(), 2);
    }

    #[test]
    fn paired_reads_adjacent_records() {
        let input = "\
header line
LessUpDn 1 0.1
#Ntot_per_site 1 0.5 0.9
LessUpDn 2 -0.1
#Ntot_per_site 2 0.5 1.1
";
        let out = paired(input, 2);
        let pair = out.dataset.get(key(0.5)).unwrap();
        assert_eq!(pair.density, vec![0.9, 1.1]);
        assert_eq!(pair.magnetization, vec![0.1, -0.1]);
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn paired_drops_pair_on_site_mismatch() {
        let input = "\
LessUpDn 1 0.1
#Ntot_per_site 1 0.5 0.9
LessUpDn 3 0.2
#Ntot_per_site 2 0.5 1.1
";
        let out = paired(input, 1);
        let pair = out.dataset.get(key(0.5)).unwrap();
        assert_eq!(pair.density, vec![0.9]);
        assert_eq!(pair.magnetization, vec![0.1]);
        assert!(matches!(
            out.diagnostics[0],
            Diagnostic::SiteMismatch { line: 3, magnetization_site: 3, density_site: 2, .. }
        ));
    }

    #[test]
    fn paired_drops_whole_pair_on_malformed_half() {
        let input = "\
LessUpDn 1 oops
#Ntot_per_site 1 0.5 0.9
LessUpDn 1 0.1
#Ntot_per_site 1 0.5 0.8
";
        let out = paired(input, 1);
        let pair = out.dataset.get(key(0.5)).unwrap();
        assert_eq!(pair.density, vec![0.8]);
        assert_eq!(pair.magnetization, vec![0.1]);
        assert_eq!(out.errors().count(), 1);
    }

    #[test]
    fn paired_reports_unpaired_records() {
        let input = "\
#Ntot_per_site 1 0.5 0.9
LessUpDn 1 0.1
";
        let out = paired(input, 1);
        assert!(out.dataset.is_empty());
        assert_eq!(out.diagnostics.len(), 2);
        assert!(out
            .diagnostics
            .iter()
            .all(|d| matches!(d, Diagnostic::UnpairedRecord { .. })));
    }

    #[test]
    fn strategies_disagree_on_the_same_stream() {
        // density-first stream: the paired scan matches each LessUpDn with the
        // next site's density and rejects every pair
        let input = "\
#Ntot_per_site 1 0.5 0.9
LessUpDn 1 0.1
#Ntot_per_site 2 0.5 1.1
LessUpDn 2 -0.1
";
        let fwd = forward(input, 2);
        let prd = paired(input, 2);
        assert_eq!(fwd.dataset.get(key(0.5)).unwrap().density, vec![0.9, 1.1]);
        assert!(fwd.diagnostics.is_empty());
        assert!(prd.dataset.is_empty());
        assert!(prd
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::SiteMismatch { magnetization_site: 1, density_site: 2, .. })));
    }

    #[test]
    fn strategy_deserializes_snake_case() {
        #[derive(Deserialize)]
        struct Probe {
            strategy: ReferenceStrategy,
        }
        let p: Probe = toml::from_str("strategy = \"paired\"").unwrap();
        assert_eq!(p.strategy, ReferenceStrategy::Paired);
        assert!(toml::from_str::<Probe>("strategy = \"backwards\"").is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = parse_reference_file(Path::new("/nonexistent/ferU-4.txt"), ReferenceStrategy::Forward, 100)
            .unwrap_err();
        assert!(matches!(err, ReconError::Io { .. }));
    }
}
