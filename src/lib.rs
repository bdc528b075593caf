//! `mzoverlap` is a library for detecting and correcting overlapping isotopic
//! envelopes of co-eluting analytes in LC-MS quantitation.
//!
//! When two analytes elute together and differ in mass by about one neutron, the
//! heavier isotopes of one land on the peaks of the other, inflating its apparent
//! abundance. Given the detected peaks of each analyte and the theoretical
//! isotope distribution of its formula, this crate finds where the envelopes
//! intersect in the retention time by m/z plane and subtracts the expected share
//! of the overlapping analyte from each affected peak.
//!
//! The geometric test is performed by [`OverlapSpace`], and the per-analyte
//! bookkeeping and subtraction by [`OverlapRegistry`]. For a whole run, the
//! [`IsotopicOverlapCorrector`] orders the corrections so that each analyte is
//! corrected only after the analytes that overlap it.
//!
//! # Usage
//! ```
//! use mzoverlap::prelude::*;
//! use mzoverlap::{
//!     AnalyteResult, IsotopeDistribution, IsotopePeak, IsotopicOverlapCorrector,
//!     OverlapConfig, ProximitySearch, RectangularRegion, C13_NEUTRON_SHIFT,
//! };
//!
//! let ladder = |id: &str, mz: f64, areas: &[f64]| {
//!     let isotopes = areas
//!         .iter()
//!         .enumerate()
//!         .map(|(i, area)| {
//!             let shape = RectangularRegion::symmetric(10.0, 12.0, mz + i as f64 * C13_NEUTRON_SHIFT, 0.01);
//!             vec![IsotopePeak::new(*area, 1, shape)]
//!         })
//!         .collect();
//!     AnalyteResult::new(id, isotopes)
//! };
//!
//! let config = OverlapConfig::default();
//! let mut corrector = IsotopicOverlapCorrector::new(config.clone());
//! let distribution = IsotopeDistribution::new(vec![1.0, 0.5, 0.25]).unwrap();
//! corrector.add_analyte(ladder("PC 34:1", 760.585, &[1000.0, 500.0]), distribution.clone()).unwrap();
//! corrector.add_analyte(ladder("PC 34:0", 760.585 + C13_NEUTRON_SHIFT, &[800.0, 350.0]), distribution).unwrap();
//!
//! let outcome = corrector.correct(&ProximitySearch::from_config(&config, 0.05)).unwrap();
//! let corrected = outcome.get(&"PC 34:0".into()).unwrap();
//! // Both of PC 34:0's isotopes overlap PC 34:1's heavier isotopes
//! assert!((corrected.isotopes[0][0].area - 300.0).abs() < 1e-6);
//! assert!((corrected.isotopes[1][0].area - 100.0).abs() < 1e-6);
//! ```
pub mod analyte;
pub mod candidates;
pub mod correction;
pub mod geometry;
pub mod ledger;
pub mod overlap;
pub mod peak;
pub mod prelude;

#[cfg(test)]
mod test_data;

pub use crate::analyte::{AnalyteId, AnalyteResult, DistributionError, IsotopeDistribution};
pub use crate::candidates::{CandidateSource, ProximitySearch};
pub use crate::correction::{
    CorrectionError, CorrectionOutcome, CyclePolicy, IsotopicOverlapCorrector,
};
pub use crate::ledger::{CorrectionLedger, ResolutionLedger};
pub use crate::overlap::{
    OverlapConfig, OverlapHit, OverlapRegistry, OverlapSpace, C13_NEUTRON_SHIFT,
};
pub use crate::peak::{EllipticalRegion, IsotopePeak, PeakGeometry, PeakShape, RectangularRegion};
