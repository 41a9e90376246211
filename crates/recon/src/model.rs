use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

/// Lattice size every comparable vector must have unless the run config says otherwise.
pub const DEFAULT_LATTICE_SITES: usize = 100;

/// Decimal places a polarization is rounded to before it is used as a key.
pub const KEY_DECIMALS: u32 = 2;

const KEY_SCALE: i64 = 10_i64.pow(KEY_DECIMALS);

/// Multiples of `1 / TIE_GRID` are the only binary values that can sit
/// exactly halfway between two keys.
const TIE_GRID: f64 = (1_i64 << (KEY_DECIMALS + 1)) as f64;

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Polarization rounded to [`KEY_DECIMALS`] places.
///
/// Stored as a count of hundredths so that equality, ordering and hashing are
/// exact. Both sources build keys through [`PolarizationKey::from_value`], so
/// a reference polarization of `0.5` and a derived variational ratio of
/// `0.4999` land on the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PolarizationKey(i64);

impl PolarizationKey {
    /// Round the exact binary value of `value` to [`KEY_DECIMALS`] places,
    /// half-to-even on true ties. `None` for NaN/inf or out-of-range values.
    ///
    /// Scaling first (`value * 100`) is not enough: `0.805` is stored as
    /// slightly more than 0.805 but scales to exactly `80.5`.
    pub fn from_value(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        if (value * TIE_GRID).fract() == 0.0 {
            // on the tie grid the scaled value is exact
            let scaled = (value * KEY_SCALE as f64).round_ties_even();
            if scaled.abs() >= i64::MAX as f64 {
                return None;
            }
            return Some(Self(scaled as i64));
        }
        // fixed-precision formatting rounds the exact value
        let text = format!("{value:.prec$}", prec = KEY_DECIMALS as usize);
        text.replace('.', "").parse().ok().map(Self)
    }

    pub fn from_hundredths(hundredths: i64) -> Self {
        Self(hundredths)
    }

    pub fn hundredths(self) -> i64 {
        self.0
    }

    pub fn value(self) -> f64 {
        self.0 as f64 / KEY_SCALE as f64
    }
}

impl fmt::Display for PolarizationKey {
    /// Shortest decimal form with at least one fractional digit (`0.5`, `1.0`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.value())
    }
}

impl Serialize for PolarizationKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.value())
    }
}

// ---------------------------------------------------------------------------
// Sources + observables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// DMRG output, treated as ground truth.
    Reference,
    /// TFA output files.
    Variational,
}

impl Source {
    pub fn label(self) -> &'static str {
        match self {
            Self::Reference => "DMRG",
            Self::Variational => "TFA",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Observable {
    Density,
    Magnetization,
}

impl Observable {
    pub const ALL: [Observable; 2] = [Observable::Density, Observable::Magnetization];

    /// Stem used in artifact file names (`density_pol_0.5.csv`).
    pub fn file_stem(self) -> &'static str {
        match self {
            Self::Density => "density",
            Self::Magnetization => "magnetization",
        }
    }

    /// Short column label (`TFA_dens`, `DMRG_mag`).
    pub fn label(self) -> &'static str {
        match self {
            Self::Density => "dens",
            Self::Magnetization => "mag",
        }
    }

    pub fn axis_label(self) -> &'static str {
        match self {
            Self::Density => "Density n_i",
            Self::Magnetization => "Magnetization m_i",
        }
    }

    pub fn title(self, key: PolarizationKey) -> String {
        match self {
            Self::Density => format!("Local density (polarization = {key})"),
            Self::Magnetization => format!("Local magnetization (polarization = {key})"),
        }
    }
}

impl fmt::Display for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

// ---------------------------------------------------------------------------
// Per-source collections
// ---------------------------------------------------------------------------

/// Ordered per-site values, in the order the source lists them.
pub type SiteVector = Vec<f64>;

/// Density and magnetization vectors for one polarization from one source.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ObservablePair {
    pub density: SiteVector,
    pub magnetization: SiteVector,
}

impl ObservablePair {
    pub fn new(density: SiteVector, magnetization: SiteVector) -> Self {
        Self { density, magnetization }
    }

    pub fn is_complete(&self, sites: usize) -> bool {
        self.density.len() == sites && self.magnetization.len() == sites
    }
}

/// A key whose vectors do not cover the lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IncompleteKey {
    pub key: PolarizationKey,
    pub density_len: usize,
    pub magnetization_len: usize,
}

/// All observable pairs parsed from one source, keyed by polarization.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    source: Source,
    entries: BTreeMap<PolarizationKey, ObservablePair>,
}

impl Dataset {
    pub fn new(source: Source) -> Self {
        Self { source, entries: BTreeMap::new() }
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn push_density(&mut self, key: PolarizationKey, value: f64) {
        self.entries.entry(key).or_default().density.push(value);
    }

    pub fn push_magnetization(&mut self, key: PolarizationKey, value: f64) {
        self.entries.entry(key).or_default().magnetization.push(value);
    }

    /// Insert a whole pair, returning the one it replaced.
    pub fn insert(&mut self, key: PolarizationKey, pair: ObservablePair) -> Option<ObservablePair> {
        self.entries.insert(key, pair)
    }

    pub fn get(&self, key: PolarizationKey) -> Option<&ObservablePair> {
        self.entries.get(&key)
    }

    pub fn contains(&self, key: PolarizationKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = PolarizationKey> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PolarizationKey, &ObservablePair)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn incomplete(&self, sites: usize) -> Vec<IncompleteKey> {
        self.entries
            .iter()
            .filter(|(_, pair)| !pair.is_complete(sites))
            .map(|(key, pair)| IncompleteKey {
                key: *key,
                density_len: pair.density.len(),
                magnetization_len: pair.magnetization.len(),
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Aligned output
// ---------------------------------------------------------------------------

/// Both sources' vectors for one polarization, all of lattice length.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRecord<'a> {
    pub key: PolarizationKey,
    /// 1-based site indices.
    pub sites: Vec<usize>,
    pub tfa_density: &'a [f64],
    pub dmrg_density: &'a [f64],
    pub tfa_magnetization: &'a [f64],
    pub dmrg_magnetization: &'a [f64],
}

/// One observable of an [`AlignedRecord`], ready for a sink.
#[derive(Debug, Clone, Copy)]
pub struct ComparisonSeries<'r> {
    pub key: PolarizationKey,
    pub observable: Observable,
    pub sites: &'r [usize],
    pub variational: &'r [f64],
    pub reference: &'r [f64],
}

impl ComparisonSeries<'_> {
    /// `(site, variational, reference)` rows.
    pub fn rows(&self) -> impl Iterator<Item = (usize, f64, f64)> + '_ {
        self.sites
            .iter()
            .zip(self.variational.iter().zip(self.reference.iter()))
            .map(|(site, (tfa, dmrg))| (*site, *tfa, *dmrg))
    }
}

impl<'a> AlignedRecord<'a> {
    pub fn series(&self, observable: Observable) -> ComparisonSeries<'_> {
        let (variational, reference) = match observable {
            Observable::Density => (self.tfa_density, self.dmrg_density),
            Observable::Magnetization => (self.tfa_magnetization, self.dmrg_magnetization),
        };
        ComparisonSeries {
            key: self.key,
            observable,
            sites: &self.sites,
            variational,
            reference,
        }
    }

    pub fn site_count(&self) -> usize {
        self.sites.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
