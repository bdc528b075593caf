//! Proposing which analytes might overlap one another.
//!
//! Building an [`OverlapSpace`](crate::overlap::OverlapSpace) for every pair of
//! analytes is quadratic, so a [`CandidateSource`] narrows each base analyte's
//! partners down before the exact geometric test is run.
use std::collections::HashMap;

use crate::analyte::{AnalyteId, AnalyteResult};
use crate::geometry::intervals_overlap;
use crate::overlap::OverlapConfig;

/// The capability to propose the analytes that may overlap `base`
pub trait CandidateSource {
    /// The ids of analytes in `pool` which may overlap `base`. May include `base`
    /// itself, which is ignored.
    fn candidates_for(&self, base: &AnalyteResult, pool: &[AnalyteResult]) -> Vec<AnalyteId>;
}

/// Explicitly paired analytes, keyed by the base analyte
impl CandidateSource for HashMap<AnalyteId, Vec<AnalyteId>> {
    fn candidates_for(&self, base: &AnalyteResult, _pool: &[AnalyteResult]) -> Vec<AnalyteId> {
        self.get(&base.id)
            .map(|ids| ids.iter().filter(|id| **id != base.id).cloned().collect())
            .unwrap_or_default()
    }
}

/// Proposes analytes which co-elute with the base analyte and whose isotopic
/// envelope could reach its monoisotopic m/z, or whose monoisotopic peak falls
/// within the base analyte's own envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximitySearch {
    pub neutron_mass: f64,
    pub max_isotopes: usize,
    /// Extra m/z slack on either side of the envelope
    pub mz_tolerance: f64,
}

impl Default for ProximitySearch {
    fn default() -> Self {
        Self::from_config(&OverlapConfig::default(), 0.05)
    }
}

impl ProximitySearch {
    pub fn new(neutron_mass: f64, max_isotopes: usize, mz_tolerance: f64) -> Self {
        Self {
            neutron_mass,
            max_isotopes,
            mz_tolerance,
        }
    }

    pub fn from_config(config: &OverlapConfig, mz_tolerance: f64) -> Self {
        Self::new(config.neutron_mass, config.max_isotopes, mz_tolerance)
    }

    /// The furthest an envelope of this charge state extends from its monoisotopic peak
    pub fn reach(&self, charge: i32) -> f64 {
        self.max_isotopes as f64 * self.neutron_mass / charge.unsigned_abs().max(1) as f64
            + self.mz_tolerance
    }

    pub fn is_candidate(&self, base: &AnalyteResult, other: &AnalyteResult) -> bool {
        if base.id == other.id {
            return false;
        }
        let (Some(base_span), Some(other_span)) = (base.time_span(), other.time_span()) else {
            return false;
        };
        if !intervals_overlap(&base_span, &other_span) {
            return false;
        }
        let (Some(base_mz), Some(other_mz)) = (base.monoisotopic_mz(), other.monoisotopic_mz())
        else {
            return false;
        };
        let charge = match (base.charge(), other.charge()) {
            (Some(a), Some(b)) => a.abs().min(b.abs()),
            (Some(z), None) | (None, Some(z)) => z,
            (None, None) => 1,
        };
        let delta = other_mz - base_mz;
        if delta.abs() <= self.reach(charge) {
            return true;
        }
        // A heavier analyte can still land on any of the base's own isotopes
        let step = self.neutron_mass / charge.unsigned_abs().max(1) as f64;
        let base_extent = base.isotope_count().saturating_sub(1) as f64 * step + self.mz_tolerance;
        delta > 0.0 && delta <= base_extent
    }
}

impl CandidateSource for ProximitySearch {
    fn candidates_for(&self, base: &AnalyteResult, pool: &[AnalyteResult]) -> Vec<AnalyteId> {
        let found: Vec<AnalyteId> = pool
            .iter()
            .filter(|other| self.is_candidate(base, other))
            .map(|other| other.id.clone())
            .collect();
        log::trace!("{} has {} overlap candidates", base.id, found.len());
        found
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::overlap::C13_NEUTRON_SHIFT;
    use crate::test_data::*;

    use rstest::rstest;

    #[rstest]
    #[case::neighbor(700.0 + C13_NEUTRON_SHIFT, 10.0, 12.0, true)]
    #[case::below(700.0 - 2.0 * C13_NEUTRON_SHIFT, 10.0, 12.0, true)]
    #[case::too_far(706.0, 10.0, 12.0, false)]
    #[case::later(700.0 + C13_NEUTRON_SHIFT, 12.0, 14.0, false)]
    #[case::straddling(700.0 + C13_NEUTRON_SHIFT, 11.5, 14.0, true)]
    fn test_proximity(#[case] mz: f64, #[case] start: f64, #[case] end: f64, #[case] expected: bool) {
        let base = ladder("A", 700.0, 1, &[1000.0, 400.0]);
        let other = AnalyteResult::new("B", vec![vec![rect_at(100.0, mz, 1, start, end)]]);
        let search = ProximitySearch::default();
        assert_eq!(search.is_candidate(&base, &other), expected);
    }

    #[rstest]
    #[case::within_base_envelope(4.0, true)]
    #[case::past_base_envelope(5.0, false)]
    #[case::lighter(-4.0, false)]
    fn test_heavier_analyte_on_late_isotope(#[case] shift: f64, #[case] expected: bool) {
        let base = ladder("A", 700.0, 1, &[1000.0, 500.0, 250.0, 120.0, 100.0]);
        let other = ladder("B", 700.0 + shift * C13_NEUTRON_SHIFT, 1, &[80.0]);
        assert_eq!(ProximitySearch::default().is_candidate(&base, &other), expected);
    }

    #[test]
    fn test_doubly_charged_reach() {
        let search = ProximitySearch::new(C13_NEUTRON_SHIFT, 3, 0.0);
        assert!((search.reach(2) - 1.5 * C13_NEUTRON_SHIFT).abs() < 1e-12);
        assert!((search.reach(0) - 3.0 * C13_NEUTRON_SHIFT).abs() < 1e-12);
    }

    #[test]
    fn test_sources_exclude_base() {
        let pool = vec![
            ladder("A", 700.0, 1, &[1000.0]),
            ladder("B", 701.0, 1, &[500.0]),
            ladder("C", 900.0, 1, &[500.0]),
        ];
        let found = ProximitySearch::default().candidates_for(&pool[0], &pool);
        assert_eq!(found, vec![AnalyteId::from("B")]);

        let mut pairs: HashMap<AnalyteId, Vec<AnalyteId>> = HashMap::new();
        pairs.insert("A".into(), vec!["A".into(), "C".into()]);
        assert_eq!(pairs.candidates_for(&pool[0], &pool), vec![AnalyteId::from("C")]);
        assert!(pairs.candidates_for(&pool[1], &pool).is_empty());
    }
}
