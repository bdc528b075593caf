use crate::analyte::{AnalyteId, AnalyteResult};
use crate::ledger::ResolutionLedger;
use crate::peak::IsotopePeak;

use super::space::OverlapSpace;

/// All of the [`OverlapSpace`]s affecting one base analyte.
///
/// No two members are [`OverlapSpace::is_the_same`].
#[derive(Debug, Clone, Default)]
pub struct OverlapRegistry {
    id: AnalyteId,
    spaces: Vec<OverlapSpace>,
    /// For each isotope of the base analyte, the indices of the members which overlap it
    iso_affected_by: Vec<Vec<usize>>,
}

impl OverlapRegistry {
    pub fn new(id: AnalyteId) -> Self {
        Self {
            id,
            spaces: Vec::new(),
            iso_affected_by: Vec::new(),
        }
    }

    pub fn id(&self) -> &AnalyteId {
        &self.id
    }

    /// Add `space` unless an equivalent footprint is already present.
    ///
    /// Returns whether `space` was added.
    pub fn add_overlap_location(&mut self, space: OverlapSpace) -> bool {
        if let Some(existing) = self.spaces.iter().find(|s| s.is_the_same(&space)) {
            log::debug!(
                "{} is indistinguishable from {} overlapping {}, skipping",
                space.id(),
                existing.id(),
                self.id
            );
            return false;
        }
        let index = self.spaces.len();
        for isotope in space.affected_isotopes() {
            if self.iso_affected_by.len() <= isotope {
                self.iso_affected_by.resize_with(isotope + 1, Vec::new);
            }
            self.iso_affected_by[isotope].push(index);
        }
        self.spaces.push(space);
        true
    }

    /// Whether every overlapping analyte is either resolved or explicitly removed,
    /// the precondition for [`OverlapRegistry::make_isotopic_correction`].
    pub fn is_correction_possible<L: ResolutionLedger + ?Sized>(&self, ledger: &L) -> bool {
        self.spaces.iter().all(|space| ledger.is_settled(space.id()))
    }

    /// Subtract the expected contribution of every overlapping analyte from the peaks
    /// of `target`, which must be the raw result the members were determined against.
    ///
    /// Peaks left with no area are removed. The isotope sequence is truncated at the
    /// first isotope whose peaks were all removed. Isotopes which were already empty
    /// are passed through.
    pub fn make_isotopic_correction(&self, mut target: AnalyteResult) -> AnalyteResult {
        let raw_isotopes = std::mem::take(&mut target.isotopes);
        let mut isotopes = Vec::with_capacity(raw_isotopes.len());

        for (isotope, probes) in raw_isotopes.into_iter().enumerate() {
            let was_empty = probes.is_empty();
            let affecting = self.affected_by(isotope);
            let surviving: Vec<IsotopePeak> = if affecting.is_empty() {
                probes
            } else {
                probes
                    .into_iter()
                    .enumerate()
                    .filter_map(|(probe, mut peak)| {
                        let other_area: f64 = affecting
                            .iter()
                            .map(|i| self.spaces[*i].get_other_isotope_area(isotope, probe))
                            .sum();
                        peak.area -= other_area;
                        if peak.area > 0.0 {
                            Some(peak)
                        } else {
                            log::debug!(
                                "Probe {probe} of isotope {isotope} of {} is consumed by overlapping analytes",
                                target.id
                            );
                            None
                        }
                    })
                    .collect()
            };
            if surviving.is_empty() && !was_empty {
                log::debug!("{} truncated to {isotope} isotopes", target.id);
                break;
            }
            isotopes.push(surviving);
        }

        target.isotopes = isotopes;
        target.update_area();
        target
    }

    /// Rebuild every member from the corrected results in `ledger`, re-testing each
    /// against `base`.
    ///
    /// Members the ledger cannot resolve, including explicitly removed analytes, are
    /// dropped, as are members which no longer overlap. Returns whether any overlap
    /// remains.
    pub fn reinit_overlap_locations<L: ResolutionLedger + ?Sized>(
        &mut self,
        base: &AnalyteResult,
        ledger: &L,
        max_isotopes: usize,
    ) -> bool {
        let previous = std::mem::take(&mut self.spaces);
        self.iso_affected_by.clear();

        for space in previous {
            let Some(corrected) = ledger.resolved(space.id()) else {
                log::debug!("Dropping unresolved {} from {}", space.id(), self.id);
                continue;
            };
            let mut rebuilt = OverlapSpace::new(
                corrected,
                space.distribution(),
                max_isotopes,
                space.config().clone(),
            );
            if rebuilt.determine_overlapping_parts(base) {
                self.add_overlap_location(rebuilt);
            } else {
                log::debug!("{} no longer overlaps {}", space.id(), self.id);
            }
        }
        self.has_overlap()
    }

    pub fn has_overlap(&self) -> bool {
        !self.spaces.is_empty()
    }

    pub fn len(&self) -> usize {
        self.spaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spaces.is_empty()
    }

    pub fn spaces(&self) -> &[OverlapSpace] {
        &self.spaces
    }

    pub fn overlapping_ids(&self) -> impl Iterator<Item = &AnalyteId> {
        self.spaces.iter().map(|s| s.id())
    }

    /// The indices into [`OverlapRegistry::spaces`] of members overlapping `isotope`
    pub fn affected_by(&self, isotope: usize) -> &[usize] {
        self.iso_affected_by
            .get(isotope)
            .map(|v| v.as_slice())
            .unwrap_or_default()
    }
}
