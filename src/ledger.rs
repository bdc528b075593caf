//! Bookkeeping of which analytes have been finalized during a correction run.
use std::collections::{HashMap, HashSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::analyte::{AnalyteId, AnalyteResult};

/// The capability to answer whether an analyte's correction is final
pub trait ResolutionLedger {
    /// The corrected result for `id`, if it has been resolved
    fn resolved(&self, id: &AnalyteId) -> Option<&AnalyteResult>;

    /// Whether `id` was excluded from the correction run
    fn is_explicitly_removed(&self, id: &AnalyteId) -> bool;

    fn is_resolved(&self, id: &AnalyteId) -> bool {
        self.resolved(id).is_some()
    }

    /// Whether `id` no longer blocks the correction of analytes it overlaps
    fn is_settled(&self, id: &AnalyteId) -> bool {
        self.is_resolved(id) || self.is_explicitly_removed(id)
    }
}

/// An in-memory [`ResolutionLedger`]
#[derive(Debug, Default, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CorrectionLedger {
    corrected: HashMap<AnalyteId, AnalyteResult>,
    removed: HashSet<AnalyteId>,
}

impl CorrectionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_removed(removed: impl IntoIterator<Item = AnalyteId>) -> Self {
        Self {
            corrected: HashMap::new(),
            removed: removed.into_iter().collect(),
        }
    }

    /// Record the final result of an analyte, returning the result it replaced
    pub fn resolve(&mut self, result: AnalyteResult) -> Option<AnalyteResult> {
        self.corrected.insert(result.id.clone(), result)
    }

    pub fn remove(&mut self, id: AnalyteId) -> bool {
        self.removed.insert(id)
    }

    pub fn len(&self) -> usize {
        self.corrected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corrected.is_empty()
    }

    pub fn into_corrected(self) -> HashMap<AnalyteId, AnalyteResult> {
        self.corrected
    }
}

impl ResolutionLedger for CorrectionLedger {
    fn resolved(&self, id: &AnalyteId) -> Option<&AnalyteResult> {
        self.corrected.get(id)
    }

    fn is_explicitly_removed(&self, id: &AnalyteId) -> bool {
        self.removed.contains(id)
    }
}

impl ResolutionLedger for HashMap<AnalyteId, AnalyteResult> {
    fn resolved(&self, id: &AnalyteId) -> Option<&AnalyteResult> {
        self.get(id)
    }

    fn is_explicitly_removed(&self, _id: &AnalyteId) -> bool {
        false
    }
}
