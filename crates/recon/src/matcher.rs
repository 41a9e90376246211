use std::fmt;

use serde::Serialize;

use crate::error::ReconError;
use crate::model::{AlignedRecord, Dataset, PolarizationKey};

/// Keys present in both datasets, ascending.
pub fn common_keys(reference: &Dataset, variational: &Dataset) -> Vec<PolarizationKey> {
    reference.keys().filter(|k| variational.contains(*k)).collect()
}

/// Why a common key produced no aligned record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SkipNotice {
    pub key: PolarizationKey,
    pub n_tfa: usize,
    pub n_dmrg: usize,
    pub m_tfa: usize,
    pub m_dmrg: usize,
}

impl fmt::Display for SkipNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[SKIP] wrong size for pol={}: n_tfa={}, n_dmrg={}, m_tfa={}, m_dmrg={}",
            self.key, self.n_tfa, self.n_dmrg, self.m_tfa, self.m_dmrg
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome<'a> {
    Aligned(AlignedRecord<'a>),
    Skipped(SkipNotice),
}

impl KeyOutcome<'_> {
    pub fn key(&self) -> PolarizationKey {
        match self {
            Self::Aligned(record) => record.key,
            Self::Skipped(notice) => notice.key,
        }
    }
}

/// Walks the sorted common keys of two datasets, yielding one outcome per key.
///
/// Holds no state beyond the key list; each key is aligned independently.
#[derive(Debug)]
pub struct Reconciler<'a> {
    reference: &'a Dataset,
    variational: &'a Dataset,
    sites: usize,
    keys: Vec<PolarizationKey>,
}

impl<'a> Reconciler<'a> {
    /// Fails with [`ReconError::NoCommonPolarizations`] when the datasets share no key.
    pub fn new(
        reference: &'a Dataset,
        variational: &'a Dataset,
        sites: usize,
    ) -> Result<Self, ReconError> {
        let keys = common_keys(reference, variational);
        if keys.is_empty() {
            return Err(ReconError::NoCommonPolarizations {
                reference_keys: reference.len(),
                variational_keys: variational.len(),
            });
        }
        log::debug!("{} common polarization(s)", keys.len());
        Ok(Self { reference, variational, sites, keys })
    }

    pub fn common_keys(&self) -> &[PolarizationKey] {
        &self.keys
    }

    /// Align one key. Keys missing from either dataset read as empty vectors.
    pub fn align(&self, key: PolarizationKey) -> KeyOutcome<'a> {
        let empty: &'a [f64] = &[];
        let dmrg = self.reference.get(key);
        let tfa = self.variational.get(key);

        let n_dmrg = dmrg.map_or(empty, |p| p.density.as_slice());
        let m_dmrg = dmrg.map_or(empty, |p| p.magnetization.as_slice());
        let n_tfa = tfa.map_or(empty, |p| p.density.as_slice());
        let m_tfa = tfa.map_or(empty, |p| p.magnetization.as_slice());

        let sized = [n_tfa, n_dmrg, m_tfa, m_dmrg].iter().all(|v| v.len() == self.sites);
        if !sized {
            return KeyOutcome::Skipped(SkipNotice {
                key,
                n_tfa: n_tfa.len(),
                n_dmrg: n_dmrg.len(),
                m_tfa: m_tfa.len(),
                m_dmrg: m_dmrg.len(),
            });
        }

        KeyOutcome::Aligned(AlignedRecord {
            key,
            sites: (1..=self.sites).collect(),
            tfa_density: n_tfa,
            dmrg_density: n_dmrg,
            tfa_magnetization: m_tfa,
            dmrg_magnetization: m_dmrg,
        })
    }

    /// Lazily align every common key in ascending order.
    pub fn outcomes(&self) -> impl Iterator<Item = KeyOutcome<'a>> + '_ {
        self.keys.iter().map(move |key| self.align(*key))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ObservablePair, Source};

    fn key(v: f64) -> PolarizationKey {
        PolarizationKey::from_value(v).unwrap()
    }

    fn full(sites: usize, fill: f64) -> ObservablePair {
        ObservablePair::new(vec![fill; sites], vec![fill / 2.0; sites])
    }

    #[test]
    fn intersection_is_sorted() {
        let mut dmrg = Dataset::new(Source::Reference);
        let mut tfa = Dataset::new(Source::Variational);
        for v in [0.9, 0.1, 0.5, 0.3] {
            dmrg.insert(key(v), full(4, 1.0));
        }
        for v in [0.5, 0.7, 0.1, 0.9] {
            tfa.insert(key(v), full(4, 1.0));
        }
        let r = Reconciler::new(&dmrg, &tfa, 4).unwrap();
        assert_eq!(r.common_keys(), &[key(0.1), key(0.5), key(0.9)]);
    }

    #[test]
    fn empty_intersection_is_an_error() {
        let mut dmrg = Dataset::new(Source::Reference);
        dmrg.insert(key(0.5), full(4, 1.0));
        let tfa = Dataset::new(Source::Variational);
        let err = Reconciler::new(&dmrg, &tfa, 4).unwrap_err();
        assert!(matches!(
            err,
            ReconError::NoCommonPolarizations { reference_keys: 1, variational_keys: 0 }
        ));
    }

    #[test]
    fn aligned_record_has_one_based_sites() {
        let mut dmrg = Dataset::new(Source::Reference);
        let mut tfa = Dataset::new(Source::Variational);
        dmrg.insert(key(0.5), full(3, 1.0));
        tfa.insert(key(0.5), full(3, 2.0));
        let r = Reconciler::new(&dmrg, &tfa, 3).unwrap();
        match r.align(key(0.5)) {
            KeyOutcome::Aligned(rec) => {
                assert_eq!(rec.sites, vec![1, 2, 3]);
                assert_eq!(rec.tfa_density, &[2.0, 2.0, 2.0]);
                assert_eq!(rec.dmrg_magnetization, &[0.5, 0.5, 0.5]);
            }
            other => panic!("expected aligned record, got {other:?}"),
        }
    }

    #[test]
    fn short_vector_in_either_source_skips_the_key() {
        let mut dmrg = Dataset::new(Source::Reference);
        let mut tfa = Dataset::new(Source::Variational);
        let mut short = full(4, 1.0);
        short.magnetization.pop();
        dmrg.insert(key(0.5), short);
        tfa.insert(key(0.5), full(4, 1.0));
        dmrg.insert(key(0.6), full(4, 1.0));
        tfa.insert(key(0.6), full(5, 1.0));
        dmrg.insert(key(0.7), full(4, 1.0));
        tfa.insert(key(0.7), full(4, 1.0));

        let r = Reconciler::new(&dmrg, &tfa, 4).unwrap();
        let outcomes: Vec<_> = r.outcomes().collect();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(
            outcomes[0],
            KeyOutcome::Skipped(SkipNotice { key: key(0.5), n_tfa: 4, n_dmrg: 4, m_tfa: 4, m_dmrg: 3 })
        );
        assert_eq!(
            outcomes[1],
            KeyOutcome::Skipped(SkipNotice { key: key(0.6), n_tfa: 5, n_dmrg: 4, m_tfa: 5, m_dmrg: 4 })
        );
        assert!(matches!(outcomes[2], KeyOutcome::Aligned(_)));
    }

    #[test]
    fn skip_notice_line() {
        let notice = SkipNotice { key: key(0.5), n_tfa: 100, n_dmrg: 100, m_tfa: 100, m_dmrg: 99 };
        assert_eq!(
            notice.to_string(),
            "[SKIP] wrong size for pol=0.5: n_tfa=100, n_dmrg=100, m_tfa=100, m_dmrg=99"
        );
    }
}
