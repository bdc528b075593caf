use mzpeaks::coordinate::SimpleInterval;

use crate::analyte::{AnalyteId, AnalyteResult, IsotopeDistribution};
use crate::geometry::{
    contains_closed, intervals_overlap, is_relatively_close, overlap_fraction, parameters_close,
    shift_interval, SAME_PEAK_TOLERANCE,
};
use crate::peak::{IsotopePeak, PeakGeometry};

use super::table::{OverlapHit, PeakIsotopeTable};
use super::OverlapConfig;

/// Estimate the monoisotopic area of `peak`, averaging it with the area implied by
/// a co-eluting second isotope peak when one is available.
fn estimate_zero_area(
    peak: &IsotopePeak,
    first_isotope: &[IsotopePeak],
    distribution: &IsotopeDistribution,
) -> f64 {
    let (Some(reference), Some(next)) = (distribution.get(0), distribution.get(1)) else {
        return peak.area;
    };
    if next <= 0.0 {
        return peak.area;
    }
    let apex = peak.apex_time();
    match first_isotope
        .iter()
        .find(|p| p.area > 0.0 && contains_closed(&p.time_window(), apex))
    {
        Some(p) => (peak.area + p.area * reference / next) / 2.0,
        None => peak.area,
    }
}

fn is_same_peak(a: &IsotopePeak, b: &IsotopePeak) -> bool {
    a.shape.same_representation(&b.shape)
        && is_relatively_close(a.area, b.area, SAME_PEAK_TOLERANCE)
        && parameters_close(
            &a.shape_parameters(),
            &b.shape_parameters(),
            SAME_PEAK_TOLERANCE,
        )
}

/// The projected isotopic footprint of one analyte, and the parts of a base
/// analyte's peaks that it intersects.
///
/// Each monoisotopic peak of the analyte contributes one time window and
/// `max_isotopes` m/z windows, spaced `neutron_mass / z` apart (towards lower m/z
/// if the distribution is negative).
#[derive(Debug, Clone)]
pub struct OverlapSpace {
    id: AnalyteId,
    max_isotopes: usize,
    config: OverlapConfig,
    distribution: IsotopeDistribution,
    reference_peaks: Vec<IsotopePeak>,
    time_ranges: Vec<SimpleInterval<f64>>,
    mz_ranges: PeakIsotopeTable<SimpleInterval<f64>>,
    zero_areas: Vec<f64>,
    /// Indexed by (base probe, base isotope)
    overlaps: PeakIsotopeTable<Vec<OverlapHit>>,
}

impl OverlapSpace {
    /// Build the footprint of `analyte` from its raw peaks
    pub fn new(
        analyte: &AnalyteResult,
        distribution: &IsotopeDistribution,
        max_isotopes: usize,
        config: OverlapConfig,
    ) -> Self {
        let mut this = Self {
            id: analyte.id.clone(),
            max_isotopes,
            config,
            distribution: distribution.clone(),
            reference_peaks: Vec::new(),
            time_ranges: Vec::new(),
            mz_ranges: PeakIsotopeTable::default(),
            zero_areas: Vec::new(),
            overlaps: PeakIsotopeTable::default(),
        };
        this.set_parameter_set(analyte, distribution);
        this
    }

    /// Re-populate the time and m/z windows and zero-isotope areas from `analyte`.
    ///
    /// Any previously determined overlaps are discarded.
    pub fn set_parameter_set(&mut self, analyte: &AnalyteResult, distribution: &IsotopeDistribution) {
        self.id = analyte.id.clone();
        self.distribution = distribution.clone();
        self.reference_peaks = analyte.peaks(0).to_vec();

        let direction = if distribution.is_negative() { -1.0 } else { 1.0 };
        let n_peaks = self.reference_peaks.len();

        self.time_ranges = Vec::with_capacity(n_peaks);
        self.zero_areas = Vec::with_capacity(n_peaks);
        let mut mz_cells = Vec::with_capacity(n_peaks * self.max_isotopes);

        for peak in self.reference_peaks.iter() {
            self.time_ranges.push(peak.time_window());
            let mz = peak.mz_window();
            let step = direction * self.config.neutron_mass / peak.abs_charge();
            for isotope in 0..self.max_isotopes {
                mz_cells.push(shift_interval(&mz, isotope as f64 * step));
            }
            self.zero_areas
                .push(estimate_zero_area(peak, analyte.peaks(1), distribution));
        }

        self.mz_ranges = PeakIsotopeTable::from_cells(mz_cells, n_peaks, self.max_isotopes);
        self.overlaps = PeakIsotopeTable::default();
    }

    fn find_hits(&self, peak: &IsotopePeak) -> Vec<OverlapHit> {
        let time = peak.time_window();
        let mz = peak.mz_window();
        let mut hits = Vec::new();
        let mut best: Option<(OverlapHit, f64)> = None;

        for (other_peak, other_time) in self.time_ranges.iter().enumerate() {
            if !intervals_overlap(&time, other_time) {
                continue;
            }
            for (other_isotope, other_mz) in self.mz_ranges.row(other_peak).iter().enumerate() {
                if !intervals_overlap(&mz, other_mz) {
                    continue;
                }
                let hit = OverlapHit::new(other_peak, other_isotope);
                if self.config.use_most_overlapping_isotope_only {
                    let fraction = overlap_fraction(&mz, other_mz);
                    if best.map_or(true, |(_, best_fraction)| fraction > best_fraction) {
                        best = Some((hit, fraction));
                    }
                } else {
                    hits.push(hit);
                }
            }
        }
        if let Some((hit, _)) = best {
            hits.push(hit);
        }
        hits
    }

    /// Test every peak of every isotope of `base` against this footprint,
    /// replacing the recorded overlaps.
    ///
    /// Returns whether any of `base`'s peaks intersect the footprint.
    pub fn determine_overlapping_parts(&mut self, base: &AnalyteResult) -> bool {
        let n_probes = base.isotopes.iter().map(|v| v.len()).max().unwrap_or_default();
        self.overlaps.reset(n_probes, base.isotope_count());

        let mut found = false;
        for (isotope, probes) in base.isotopes.iter().enumerate() {
            for (probe, peak) in probes.iter().enumerate() {
                let hits = self.find_hits(peak);
                if hits.is_empty() {
                    continue;
                }
                found = true;
                if log::log_enabled!(log::Level::Trace) {
                    let labels: Vec<String> = hits.iter().map(|h| h.to_string()).collect();
                    log::trace!(
                        "{} isotope {isotope} probe {probe} is overlapped by {} at {labels:?}",
                        base.id,
                        self.id
                    );
                }
                if let Some(cell) = self.overlaps.get_mut(probe, isotope) {
                    *cell = hits;
                }
            }
        }
        found
    }

    /// The area this analyte is expected to contribute to probe `probe` of isotope
    /// `isotope` of the base analyte.
    ///
    /// Overlapping isotopes beyond the end of the distribution contribute nothing.
    pub fn get_other_isotope_area(&self, isotope: usize, probe: usize) -> f64 {
        self.overlaps_at(isotope, probe)
            .iter()
            .map(|hit| match self.distribution.ratio_to_reference(hit.isotope) {
                Some(ratio) => self.zero_areas[hit.peak] * ratio,
                None => {
                    log::warn!(
                        "Isotope {} of {} lies beyond its isotope distribution of length {}, skipping",
                        hit.isotope,
                        self.id,
                        self.distribution.len()
                    );
                    0.0
                }
            })
            .sum()
    }

    /// The isotopes of the base analyte with at least one overlapped probe
    pub fn affected_isotopes(&self) -> Vec<usize> {
        (0..self.overlaps.n_isotopes())
            .filter(|isotope| {
                (0..self.overlaps.n_peaks()).any(|probe| !self.overlaps_at(*isotope, probe).is_empty())
            })
            .collect()
    }

    /// The footprint cells overlapping probe `probe` of isotope `isotope` of the base analyte
    pub fn overlaps_at(&self, isotope: usize, probe: usize) -> &[OverlapHit] {
        self.overlaps
            .get(probe, isotope)
            .map(|v| v.as_slice())
            .unwrap_or_default()
    }

    pub fn has_overlap(&self) -> bool {
        self.overlaps.iter().any(|(_, hits)| !hits.is_empty())
    }

    /// Whether `other` describes the same physical footprint as `self`.
    ///
    /// Both must have the same number of monoisotopic peaks, and every peak of
    /// `other` must match a peak of `self` to within 1% on its area and its shape.
    pub fn is_the_same(&self, other: &Self) -> bool {
        if self.reference_peaks.len() != other.reference_peaks.len() {
            return false;
        }
        other
            .reference_peaks
            .iter()
            .all(|theirs| self.reference_peaks.iter().any(|ours| is_same_peak(ours, theirs)))
    }

    pub fn id(&self) -> &AnalyteId {
        &self.id
    }

    pub fn max_isotopes(&self) -> usize {
        self.max_isotopes
    }

    pub fn is_negative(&self) -> bool {
        self.distribution.is_negative()
    }

    pub fn distribution(&self) -> &IsotopeDistribution {
        &self.distribution
    }

    pub fn config(&self) -> &OverlapConfig {
        &self.config
    }

    /// The number of monoisotopic peaks making up the footprint
    pub fn probe_count(&self) -> usize {
        self.reference_peaks.len()
    }

    pub fn zero_area(&self, peak: usize) -> Option<f64> {
        self.zero_areas.get(peak).copied()
    }

    pub fn time_range(&self, peak: usize) -> Option<&SimpleInterval<f64>> {
        self.time_ranges.get(peak)
    }

    pub fn mz_range(&self, peak: usize, isotope: usize) -> Option<&SimpleInterval<f64>> {
        self.mz_ranges.get(peak, isotope)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::overlap::C13_NEUTRON_SHIFT;
    use crate::peak::{EllipticalRegion, RectangularRegion};
    use crate::test_data::*;
    use rstest::rstest;

    #[rstest]
    #[case::disjoint_time(0.0, 20.0, 22.0)]
    #[case::disjoint_mz(1.0, 10.0, 12.0)]
    #[case::touching_time(0.0, 12.0, 14.0)]
    #[case::touching_mz(0.5, 10.0, 12.0)]
    fn test_no_overlap(#[case] mz_offset: f64, #[case] start: f64, #[case] end: f64) {
        let other = AnalyteResult::new(
            "B",
            vec![vec![IsotopePeak::new(500.0, 1, RectangularRegion::symmetric(10.0, 12.0, 700.0, 0.25))]],
        );
        let base = AnalyteResult::new(
            "A",
            vec![vec![IsotopePeak::new(
                1000.0,
                1,
                RectangularRegion::symmetric(start, end, 700.0 + mz_offset, 0.25),
            )]],
        );
        let mut space = OverlapSpace::new(&other, &distribution(&[1.0, 0.5]), 1, OverlapConfig::default());
        assert!(!space.determine_overlapping_parts(&base));
        assert!(!space.has_overlap());
        assert!(space.affected_isotopes().is_empty());
        assert_eq!(space.get_other_isotope_area(0, 0), 0.0);
    }

    #[test_log::test]
    fn test_isotope_projection() {
        let other = ladder("B", 700.0, 2, &[500.0]);
        let space = OverlapSpace::new(&other, &distribution(&[1.0, 0.5, 0.2]), 3, OverlapConfig::default());
        assert_eq!(space.probe_count(), 1);
        let iso2 = space.mz_range(0, 2).unwrap();
        assert!((iso2.start - (699.99 + C13_NEUTRON_SHIFT)).abs() < 1e-9);
        assert!((iso2.end - (700.01 + C13_NEUTRON_SHIFT)).abs() < 1e-9);
        assert!(space.mz_range(0, 3).is_none());
        let time = space.time_range(0).unwrap();
        assert_eq!((time.start, time.end), (10.0, 12.0));
    }

    #[test_log::test]
    fn test_overlap_detection_is_idempotent() {
        let other = ladder("B", 700.0 - C13_NEUTRON_SHIFT, 1, &[500.0]);
        let base = ladder("A", 700.0, 1, &[1000.0, 200.0]);
        let mut space = OverlapSpace::new(&other, &distribution(&[1.0, 0.4, 0.1]), 3, OverlapConfig::default());

        assert!(space.determine_overlapping_parts(&base));
        let first: Vec<Vec<OverlapHit>> = (0..2).map(|i| space.overlaps_at(i, 0).to_vec()).collect();
        assert!(space.determine_overlapping_parts(&base));
        let second: Vec<Vec<OverlapHit>> = (0..2).map(|i| space.overlaps_at(i, 0).to_vec()).collect();

        assert_eq!(first, second);
        assert_eq!(first[0], vec![OverlapHit::new(0, 1)]);
        assert_eq!(first[1], vec![OverlapHit::new(0, 2)]);
        assert_eq!(space.affected_isotopes(), vec![0, 1]);
        assert!((space.get_other_isotope_area(0, 0) - 200.0).abs() < 1e-9);
        assert!((space.get_other_isotope_area(1, 0) - 50.0).abs() < 1e-9);
    }

    #[rstest]
    #[case(false, vec![OverlapHit::new(0, 0), OverlapHit::new(0, 1)])]
    #[case(true, vec![OverlapHit::new(0, 1)])]
    fn test_most_overlapping_isotope_only(#[case] most_only: bool, #[case] expected: Vec<OverlapHit>) {
        let other = ladder("B", 700.0, 1, &[500.0]);
        // One broad base peak reaching a quarter of the way into isotope 0 and
        // three quarters of the way into isotope 1
        let broad = IsotopePeak::new(
            2000.0,
            1,
            RectangularRegion::new(10.0, 12.0, 11.0, 700.5, 0.495, 0.5084),
        );
        let base = AnalyteResult::new("A", vec![vec![broad]]);
        let config = OverlapConfig::default().use_most_overlapping_isotope_only(most_only);
        let mut space = OverlapSpace::new(&other, &distribution(&[1.0, 0.5]), 3, config);
        assert!(space.determine_overlapping_parts(&base));
        assert_eq!(space.overlaps_at(0, 0), expected.as_slice());
        if most_only {
            assert!(space.overlaps_at(0, 0).len() <= 1);
        }
    }

    #[test]
    fn test_negative_distribution() {
        let other = ladder("B", 700.0 + 2.0 * C13_NEUTRON_SHIFT, 1, &[500.0]);
        let base = ladder("A", 700.0, 1, &[1000.0]);
        let dist = IsotopeDistribution::negative(vec![1.0, 0.5, 0.25]).unwrap();
        let mut space = OverlapSpace::new(&other, &dist, 3, OverlapConfig::default());
        assert!(space.is_negative());
        assert!(space.determine_overlapping_parts(&base));
        assert_eq!(space.overlaps_at(0, 0), &[OverlapHit::new(0, 2)]);
        assert!((space.get_other_isotope_area(0, 0) - 125.0).abs() < 1e-9);
    }

    #[rstest]
    #[case::apex_covered(10.5, 11.5, 800.0)]
    #[case::apex_missed(11.5, 12.0, 1000.0)]
    fn test_zero_area_estimate(#[case] start: f64, #[case] end: f64, #[case] expected: f64) {
        let other = AnalyteResult::new(
            "B",
            vec![
                vec![rect(1000.0, 700.0, 1)],
                vec![rect_at(300.0, 700.0 + C13_NEUTRON_SHIFT, 1, start, end)],
            ],
        );
        let space = OverlapSpace::new(&other, &distribution(&[1.0, 0.5]), 2, OverlapConfig::default());
        assert!((space.zero_area(0).unwrap() - expected).abs() < 1e-9);

        let short = OverlapSpace::new(&other, &distribution(&[1.0]), 2, OverlapConfig::default());
        assert_eq!(short.zero_area(0), Some(1000.0));
    }

    #[test_log::test]
    fn test_short_distribution_is_skipped() {
        let other = ladder("B", 700.0, 1, &[500.0]);
        let base = ladder("A", 700.0 + C13_NEUTRON_SHIFT, 1, &[1000.0]);
        let mut space = OverlapSpace::new(&other, &distribution(&[1.0]), 3, OverlapConfig::default());
        assert!(space.determine_overlapping_parts(&base));
        assert_eq!(space.overlaps_at(0, 0), &[OverlapHit::new(0, 1)]);
        assert_eq!(space.get_other_isotope_area(0, 0), 0.0);
    }

    #[test]
    fn test_elliptical_overlap() {
        let other = AnalyteResult::new(
            "B",
            vec![vec![IsotopePeak::new(400.0, 1, EllipticalRegion::new(11.0, 0.6, 700.0, 0.008))]],
        );
        let near = AnalyteResult::new(
            "A",
            vec![vec![IsotopePeak::new(900.0, 1, EllipticalRegion::new(11.5, 0.6, 700.005, 0.008))]],
        );
        let far = AnalyteResult::new(
            "C",
            vec![vec![IsotopePeak::new(900.0, 1, EllipticalRegion::new(13.0, 0.6, 700.0, 0.008))]],
        );
        let mut space = OverlapSpace::new(&other, &distribution(&[1.0, 0.5]), 2, OverlapConfig::default());
        assert!(space.determine_overlapping_parts(&near));
        assert!((space.get_other_isotope_area(0, 0) - 400.0).abs() < 1e-9);
        assert!(!space.determine_overlapping_parts(&far));
    }

    #[test]
    fn test_is_the_same() {
        let dist = distribution(&[1.0, 0.5]);
        let config = OverlapConfig::default();
        let a = OverlapSpace::new(&ladder("B", 700.0, 1, &[500.0]), &dist, 3, config.clone());
        let b = OverlapSpace::new(&ladder("B2", 700.0, 1, &[500.0]), &dist, 3, config.clone());
        assert!(a.is_the_same(&a));
        assert!(a.is_the_same(&b));
        assert!(b.is_the_same(&a));

        let within = OverlapSpace::new(&ladder("C", 700.0, 1, &[504.0]), &dist, 3, config.clone());
        assert!(a.is_the_same(&within));
        let bigger = OverlapSpace::new(&ladder("C", 700.0, 1, &[520.0]), &dist, 3, config.clone());
        assert!(!a.is_the_same(&bigger));

        let ellipse = AnalyteResult::new(
            "D",
            vec![vec![IsotopePeak::new(500.0, 1, EllipticalRegion::new(11.0, 1.0, 700.0, 0.01))]],
        );
        let ellipse = OverlapSpace::new(&ellipse, &dist, 3, config.clone());
        assert!(!a.is_the_same(&ellipse));

        let two_peaks = AnalyteResult::new(
            "E",
            vec![vec![rect(500.0, 700.0, 1), rect_at(300.0, 700.0, 1, 20.0, 22.0)]],
        );
        let two_peaks = OverlapSpace::new(&two_peaks, &dist, 3, config);
        assert!(!a.is_the_same(&two_peaks));
    }
}
