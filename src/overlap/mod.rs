//! Detect and correct overlapping isotopic envelopes.
//!
//! An [`OverlapSpace`] describes the footprint of one analyte's isotopic envelope
//! in the retention time by m/z plane, generalized from its monoisotopic peaks by
//! shifting them `i * neutron_mass / z` for each isotope `i`. It is then tested
//! against the detected peaks of a second, *base*, analyte, recording which of the
//! base's peaks it intersects.
//!
//! An [`OverlapRegistry`] collects every [`OverlapSpace`] which intersects one base
//! analyte and, once all of those analytes have themselves been corrected, subtracts
//! their expected isotopic contribution from the base analyte's peak areas.
//!
//! ```rust
//! use mzoverlap::prelude::*;
//! use mzoverlap::{AnalyteResult, IsotopeDistribution, IsotopePeak, RectangularRegion};
//! use mzoverlap::overlap::{OverlapConfig, OverlapSpace, OverlapRegistry, C13_NEUTRON_SHIFT};
//!
//! let peak = |area: f64, mz: f64| {
//!     IsotopePeak::new(area, 1, RectangularRegion::symmetric(10.0, 12.0, mz, 0.01))
//! };
//! let base = AnalyteResult::new(
//!     "PC 34:0",
//!     vec![vec![peak(1000.0, 762.6)], vec![peak(400.0, 762.6 + C13_NEUTRON_SHIFT)]],
//! );
//! // A co-eluting species one mass unit lighter
//! let other = AnalyteResult::new("PC 34:1", vec![vec![peak(500.0, 762.6 - C13_NEUTRON_SHIFT)]]);
//! let distribution = IsotopeDistribution::new(vec![1.0, 0.45, 0.12]).unwrap();
//!
//! let config = OverlapConfig::default();
//! let mut space = OverlapSpace::new(&other, &distribution, 3, config.clone());
//! assert!(space.determine_overlapping_parts(&base));
//!
//! let mut registry = OverlapRegistry::new(base.id.clone());
//! registry.add_overlap_location(space);
//! let corrected = registry.make_isotopic_correction(base.clone());
//! assert!((corrected.isotopes[0][0].area - 775.0).abs() < 1e-6);
//! ```
mod registry;
mod space;
mod table;

pub use registry::OverlapRegistry;
pub use space::OverlapSpace;
pub use table::{OverlapHit, PeakIsotopeTable};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::correction::CyclePolicy;

/// The mass difference between <sup>13</sup>C and <sup>12</sup>C, the spacing
/// between isotopic peaks of organic molecules.
pub const C13_NEUTRON_SHIFT: f64 = 1.003_354_837_8;

/// Parameters controlling overlap detection and the correction run
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OverlapConfig {
    /// The m/z spacing of consecutive isotopes of a singly charged ion
    pub neutron_mass: f64,
    /// When a base peak intersects several isotopes of an overlapping analyte,
    /// keep only the isotope covering the largest fraction of its m/z window
    pub use_most_overlapping_isotope_only: bool,
    /// The number of isotopes to project from each overlapping analyte
    pub max_isotopes: usize,
    /// What to do when analytes depend on one-another circularly
    pub cycle_policy: CyclePolicy,
}

impl Default for OverlapConfig {
    fn default() -> Self {
        Self {
            neutron_mass: C13_NEUTRON_SHIFT,
            use_most_overlapping_isotope_only: false,
            max_isotopes: 3,
            cycle_policy: CyclePolicy::default(),
        }
    }
}

impl OverlapConfig {
    /// The m/z spacing of consecutive isotopes of a singly charged ion
    pub fn neutron_mass(mut self, neutron_mass: f64) -> Self {
        self.neutron_mass = neutron_mass;
        self
    }

    /// Keep only the most overlapping isotope for each base peak
    pub fn use_most_overlapping_isotope_only(mut self, value: bool) -> Self {
        self.use_most_overlapping_isotope_only = value;
        self
    }

    pub fn max_isotopes(mut self, max_isotopes: usize) -> Self {
        self.max_isotopes = max_isotopes;
        self
    }

    pub fn cycle_policy(mut self, cycle_policy: CyclePolicy) -> Self {
        self.cycle_policy = cycle_policy;
        self
    }
}
