//! Correcting a whole set of analytes for their mutual isotopic overlaps.
//!
//! An analyte can only be corrected once every analyte overlapping it has been
//! corrected, because the contribution to subtract is scaled from the overlapping
//! analyte's own corrected monoisotopic area. [`IsotopicOverlapCorrector`] resolves
//! analytes in dependency order, and decides what to do when analytes overlap
//! each other circularly according to the [`CyclePolicy`].
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet, VecDeque};

#[cfg(feature = "parallelism")]
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use thiserror::Error;

use crate::analyte::{AnalyteId, AnalyteResult, DistributionError, IsotopeDistribution};
use crate::candidates::CandidateSource;
use crate::ledger::CorrectionLedger;
use crate::overlap::{OverlapConfig, OverlapRegistry, OverlapSpace};

/// How to proceed when every remaining analyte waits on another remaining analyte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CyclePolicy {
    /// Correct the least entangled analyte while ignoring its unresolved overlaps,
    /// then continue
    #[default]
    Break,
    /// Stop and report the remaining analytes as unresolved
    Report,
}

/// All the ways a correction run can fail
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CorrectionError {
    #[error("Analyte {0} was added more than once")]
    DuplicateAnalyte(AnalyteId),
    #[error("Analyte {0} is not known to the corrector")]
    UnknownAnalyte(AnalyteId),
    #[error("Analyte {id} has an invalid isotope distribution: {source}")]
    Distribution {
        id: AnalyteId,
        #[source]
        source: DistributionError,
    },
}

/// The result of [`IsotopicOverlapCorrector::correct`]
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CorrectionOutcome {
    /// The corrected result of every resolved analyte
    pub corrected: HashMap<AnalyteId, AnalyteResult>,
    /// The order in which analytes were corrected
    pub resolution_order: Vec<AnalyteId>,
    /// Analytes corrected while ignoring overlaps which were not yet resolved
    pub broken_cycles: Vec<AnalyteId>,
    /// Analytes left uncorrected under [`CyclePolicy::Report`]
    pub unresolved: Vec<AnalyteId>,
}

impl CorrectionOutcome {
    pub fn get(&self, id: &AnalyteId) -> Option<&AnalyteResult> {
        self.corrected.get(id)
    }

    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Holds the raw analytes of one run and corrects them against one-another
#[derive(Debug, Clone, Default)]
pub struct IsotopicOverlapCorrector {
    pub config: OverlapConfig,
    analytes: Vec<AnalyteResult>,
    distributions: Vec<IsotopeDistribution>,
    index: HashMap<AnalyteId, usize>,
    removed: HashSet<AnalyteId>,
}

impl IsotopicOverlapCorrector {
    pub fn new(config: OverlapConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Add an analyte's raw result with its theoretical isotope distribution,
    /// returning its position in the input order
    pub fn add_analyte(
        &mut self,
        result: AnalyteResult,
        distribution: IsotopeDistribution,
    ) -> Result<usize, CorrectionError> {
        if self.index.contains_key(&result.id) {
            return Err(CorrectionError::DuplicateAnalyte(result.id));
        }
        let i = self.analytes.len();
        self.index.insert(result.id.clone(), i);
        self.analytes.push(result);
        self.distributions.push(distribution);
        Ok(i)
    }

    /// Like [`IsotopicOverlapCorrector::add_analyte`], validating the abundances first
    pub fn add_analyte_from_abundances(
        &mut self,
        result: AnalyteResult,
        abundances: Vec<f64>,
        negative: bool,
    ) -> Result<usize, CorrectionError> {
        let distribution = if negative {
            IsotopeDistribution::negative(abundances)
        } else {
            IsotopeDistribution::new(abundances)
        }
        .map_err(|source| CorrectionError::Distribution {
            id: result.id.clone(),
            source,
        })?;
        self.add_analyte(result, distribution)
    }

    /// Exclude an analyte from correction. It no longer blocks the analytes it
    /// overlaps, and nothing is subtracted on its behalf.
    pub fn mark_removed(&mut self, id: &AnalyteId) -> Result<(), CorrectionError> {
        if !self.index.contains_key(id) {
            return Err(CorrectionError::UnknownAnalyte(id.clone()));
        }
        self.removed.insert(id.clone());
        Ok(())
    }

    pub fn is_removed(&self, id: &AnalyteId) -> bool {
        self.removed.contains(id)
    }

    pub fn len(&self) -> usize {
        self.analytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analytes.is_empty()
    }

    pub fn analytes(&self) -> &[AnalyteResult] {
        &self.analytes
    }

    pub fn get(&self, id: &AnalyteId) -> Option<(&AnalyteResult, &IsotopeDistribution)> {
        self.index
            .get(id)
            .map(|i| (&self.analytes[*i], &self.distributions[*i]))
    }

    fn build_registry<S: CandidateSource + ?Sized>(
        &self,
        base_index: usize,
        candidates: &S,
    ) -> Result<Option<OverlapRegistry>, CorrectionError> {
        let base = &self.analytes[base_index];
        if self.removed.contains(&base.id) {
            return Ok(None);
        }
        let mut registry = OverlapRegistry::new(base.id.clone());
        for other_id in candidates.candidates_for(base, &self.analytes) {
            if other_id == base.id || self.removed.contains(&other_id) {
                continue;
            }
            let other_index = *self
                .index
                .get(&other_id)
                .ok_or_else(|| CorrectionError::UnknownAnalyte(other_id.clone()))?;
            let mut space = OverlapSpace::new(
                &self.analytes[other_index],
                &self.distributions[other_index],
                self.config.max_isotopes,
                self.config.clone(),
            );
            if space.determine_overlapping_parts(base) {
                registry.add_overlap_location(space);
            }
        }
        Ok(Some(registry))
    }

    /// Build the [`OverlapRegistry`] of every analyte from the raw data, in input
    /// order. Removed analytes have no registry.
    #[cfg(feature = "parallelism")]
    pub fn build_registries<S: CandidateSource + Sync + ?Sized>(
        &self,
        candidates: &S,
    ) -> Result<Vec<Option<OverlapRegistry>>, CorrectionError> {
        (0..self.analytes.len())
            .into_par_iter()
            .map(|i| self.build_registry(i, candidates))
            .collect()
    }

    /// Build the [`OverlapRegistry`] of every analyte from the raw data, in input
    /// order. Removed analytes have no registry.
    #[cfg(not(feature = "parallelism"))]
    pub fn build_registries<S: CandidateSource + Sync + ?Sized>(
        &self,
        candidates: &S,
    ) -> Result<Vec<Option<OverlapRegistry>>, CorrectionError> {
        (0..self.analytes.len())
            .map(|i| self.build_registry(i, candidates))
            .collect()
    }

    /// Correct every analyte which is not removed, each after all of the analytes
    /// overlapping it.
    pub fn correct<S: CandidateSource + Sync + ?Sized>(
        &self,
        candidates: &S,
    ) -> Result<CorrectionOutcome, CorrectionError> {
        let n = self.analytes.len();
        log::info!(
            "Correcting isotopic overlaps among {} analytes ({} removed)",
            n,
            self.removed.len()
        );
        let mut registries = self.build_registries(candidates)?;

        let mut pending = vec![0usize; n];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (i, registry) in registries.iter().enumerate() {
            let Some(registry) = registry else {
                continue;
            };
            for id in registry.overlapping_ids() {
                if let Some(j) = self.index.get(id) {
                    pending[i] += 1;
                    dependents[*j].push(i);
                }
            }
        }
        let dependency_counts = pending.clone();

        let mut ledger = CorrectionLedger::with_removed(self.removed.iter().cloned());
        let mut outcome = CorrectionOutcome::default();
        let mut resolved = vec![false; n];
        let mut queued = vec![false; n];
        let mut queue = VecDeque::new();
        for i in 0..n {
            if registries[i].is_some() && pending[i] == 0 {
                queued[i] = true;
                queue.push_back(i);
            }
        }
        let mut remaining = registries.iter().filter(|r| r.is_some()).count();

        loop {
            while let Some(i) = queue.pop_front() {
                let Some(registry) = registries[i].as_mut() else {
                    continue;
                };
                let base = &self.analytes[i];
                registry.reinit_overlap_locations(base, &ledger, self.config.max_isotopes);
                debug_assert!(registry.is_correction_possible(&ledger));

                let corrected = registry.make_isotopic_correction(base.clone());
                log::debug!(
                    "Corrected {} against {} overlaps: {:.3} -> {:.3}",
                    base.id,
                    registry.len(),
                    base.area,
                    corrected.area
                );
                ledger.resolve(corrected);
                outcome.resolution_order.push(base.id.clone());
                resolved[i] = true;
                remaining -= 1;

                for d in dependents[i].iter().copied() {
                    pending[d] = pending[d].saturating_sub(1);
                    if pending[d] == 0 && !resolved[d] && !queued[d] {
                        queued[d] = true;
                        queue.push_back(d);
                    }
                }
            }

            if remaining == 0 {
                break;
            }

            let stalled: Vec<usize> = (0..n)
                .filter(|i| registries[*i].is_some() && !resolved[*i])
                .collect();
            log::warn!(
                "{} analytes overlap each other circularly: {}",
                stalled.len(),
                stalled
                    .iter()
                    .map(|i| self.analytes[*i].id.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );

            match self.config.cycle_policy {
                CyclePolicy::Report => {
                    outcome.unresolved = stalled
                        .into_iter()
                        .map(|i| self.analytes[i].id.clone())
                        .collect();
                    break;
                }
                CyclePolicy::Break => {
                    let Some(chosen) = stalled.iter().copied().min_by_key(|i| {
                        (pending[*i], Reverse(dependency_counts[*i] - pending[*i]), *i)
                    }) else {
                        break;
                    };
                    log::warn!(
                        "Correcting {} while ignoring {} unresolved overlaps",
                        self.analytes[chosen].id,
                        pending[chosen]
                    );
                    outcome.broken_cycles.push(self.analytes[chosen].id.clone());
                    queued[chosen] = true;
                    queue.push_back(chosen);
                }
            }
        }

        outcome.corrected = ledger.into_corrected();
        log::info!(
            "Corrected {} analytes, broke {} cycles, left {} unresolved",
            outcome.corrected.len(),
            outcome.broken_cycles.len(),
            outcome.unresolved.len()
        );
        Ok(outcome)
    }
}
