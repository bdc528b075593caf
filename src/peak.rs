//! Chromatographic peak footprints in the retention time by m/z plane.
//!
//! A detected peak is described either by a rectangle, bounded by the
//! chromatographic valleys in time and a bandwidth around its m/z centroid, or by
//! an ellipse fit to the peak's 3D profile. Both are exposed through the
//! [`PeakGeometry`] trait so that overlap detection never needs to know which
//! representation it is looking at.
use std::fmt;

use mzpeaks::coordinate::SimpleInterval;
use mzpeaks::{CoordinateLike, IntensityMeasurement, Time, MZ};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The capability to describe a peak's extent in time and m/z
pub trait PeakGeometry {
    /// The retention time interval the peak occupies
    fn time_window(&self) -> SimpleInterval<f64>;

    /// The m/z interval the peak occupies
    fn mz_window(&self) -> SimpleInterval<f64>;

    /// The retention time of the peak's most intense point
    fn apex_time(&self) -> f64;

    /// The four numbers which define this shape, used for approximate
    /// equality tests between two footprints of the same representation.
    fn shape_parameters(&self) -> [f64; 4];
}

/// A peak bounded by its chromatographic valleys and an asymmetric m/z band
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RectangularRegion {
    /// The lower valley of the elution profile
    pub time_start: f64,
    /// The upper valley of the elution profile
    pub time_end: f64,
    pub apex_time: f64,
    pub mz_center: f64,
    /// The distance from `mz_center` to the lower m/z bound
    pub mz_lower_bandwidth: f64,
    /// The distance from `mz_center` to the upper m/z bound
    pub mz_upper_bandwidth: f64,
}

impl RectangularRegion {
    pub fn new(
        time_start: f64,
        time_end: f64,
        apex_time: f64,
        mz_center: f64,
        mz_lower_bandwidth: f64,
        mz_upper_bandwidth: f64,
    ) -> Self {
        Self {
            time_start,
            time_end,
            apex_time,
            mz_center,
            mz_lower_bandwidth,
            mz_upper_bandwidth,
        }
    }

    /// A region with a symmetric m/z band whose apex lies halfway between the valleys
    pub fn symmetric(time_start: f64, time_end: f64, mz_center: f64, mz_bandwidth: f64) -> Self {
        Self::new(
            time_start,
            time_end,
            (time_start + time_end) / 2.0,
            mz_center,
            mz_bandwidth,
            mz_bandwidth,
        )
    }
}

impl PeakGeometry for RectangularRegion {
    fn time_window(&self) -> SimpleInterval<f64> {
        SimpleInterval::new(self.time_start, self.time_end)
    }

    fn mz_window(&self) -> SimpleInterval<f64> {
        SimpleInterval::new(
            self.mz_center - self.mz_lower_bandwidth,
            self.mz_center + self.mz_upper_bandwidth,
        )
    }

    fn apex_time(&self) -> f64 {
        self.apex_time
    }

    fn shape_parameters(&self) -> [f64; 4] {
        let mz = self.mz_window();
        [self.time_start, self.time_end, mz.start, mz.end]
    }
}

/// A peak described by an ellipse in the time by m/z plane
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EllipticalRegion {
    pub time_center: f64,
    pub time_half_width: f64,
    pub mz_center: f64,
    pub mz_half_width: f64,
}

impl EllipticalRegion {
    pub fn new(time_center: f64, time_half_width: f64, mz_center: f64, mz_half_width: f64) -> Self {
        Self {
            time_center,
            time_half_width,
            mz_center,
            mz_half_width,
        }
    }
}

impl PeakGeometry for EllipticalRegion {
    fn time_window(&self) -> SimpleInterval<f64> {
        SimpleInterval::new(
            self.time_center - self.time_half_width,
            self.time_center + self.time_half_width,
        )
    }

    fn mz_window(&self) -> SimpleInterval<f64> {
        SimpleInterval::new(
            self.mz_center - self.mz_half_width,
            self.mz_center + self.mz_half_width,
        )
    }

    fn apex_time(&self) -> f64 {
        self.time_center
    }

    fn shape_parameters(&self) -> [f64; 4] {
        [
            self.time_center,
            self.mz_center,
            self.time_half_width,
            self.mz_half_width,
        ]
    }
}

/// The footprint model of a peak
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PeakShape {
    Rectangular(RectangularRegion),
    Elliptical(EllipticalRegion),
}

impl PeakShape {
    pub fn is_elliptical(&self) -> bool {
        matches!(self, Self::Elliptical(_))
    }

    /// Whether `other` uses the same footprint model as `self`
    pub fn same_representation(&self, other: &Self) -> bool {
        self.is_elliptical() == other.is_elliptical()
    }

    pub fn mz_center(&self) -> f64 {
        match self {
            Self::Rectangular(r) => r.mz_center,
            Self::Elliptical(e) => e.mz_center,
        }
    }
}

impl PeakGeometry for PeakShape {
    fn time_window(&self) -> SimpleInterval<f64> {
        match self {
            Self::Rectangular(r) => r.time_window(),
            Self::Elliptical(e) => e.time_window(),
        }
    }

    fn mz_window(&self) -> SimpleInterval<f64> {
        match self {
            Self::Rectangular(r) => r.mz_window(),
            Self::Elliptical(e) => e.mz_window(),
        }
    }

    fn apex_time(&self) -> f64 {
        match self {
            Self::Rectangular(r) => r.apex_time(),
            Self::Elliptical(e) => e.apex_time(),
        }
    }

    fn shape_parameters(&self) -> [f64; 4] {
        match self {
            Self::Rectangular(r) => r.shape_parameters(),
            Self::Elliptical(e) => e.shape_parameters(),
        }
    }
}

impl From<RectangularRegion> for PeakShape {
    fn from(value: RectangularRegion) -> Self {
        Self::Rectangular(value)
    }
}

impl From<EllipticalRegion> for PeakShape {
    fn from(value: EllipticalRegion) -> Self {
        Self::Elliptical(value)
    }
}

/// One detected chromatographic peak of one isotope of an analyte.
///
/// Only [`IsotopePeak::area`] is rewritten during correction.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IsotopePeak {
    /// The integrated area of the peak
    pub area: f64,
    pub charge: i32,
    pub shape: PeakShape,
}

impl IsotopePeak {
    pub fn new(area: f64, charge: i32, shape: impl Into<PeakShape>) -> Self {
        Self {
            area,
            charge,
            shape: shape.into(),
        }
    }

    /// The magnitude of the charge, treating a missing charge as singly charged
    pub fn abs_charge(&self) -> f64 {
        self.charge.unsigned_abs().max(1) as f64
    }
}

impl PeakGeometry for IsotopePeak {
    #[inline]
    fn time_window(&self) -> SimpleInterval<f64> {
        self.shape.time_window()
    }

    #[inline]
    fn mz_window(&self) -> SimpleInterval<f64> {
        self.shape.mz_window()
    }

    #[inline]
    fn apex_time(&self) -> f64 {
        self.shape.apex_time()
    }

    #[inline]
    fn shape_parameters(&self) -> [f64; 4] {
        self.shape.shape_parameters()
    }
}

impl CoordinateLike<MZ> for IsotopePeak {
    fn coordinate(&self) -> f64 {
        self.shape.mz_center()
    }
}

impl CoordinateLike<Time> for IsotopePeak {
    fn coordinate(&self) -> f64 {
        self.shape.apex_time()
    }
}

impl IntensityMeasurement for IsotopePeak {
    #[inline]
    fn intensity(&self) -> f32 {
        self.area as f32
    }
}

impl fmt::Display for IsotopePeak {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let time = self.time_window();
        let mz = self.mz_window();
        write!(
            f,
            "IsotopePeak({}, {}, [{}, {}], [{}, {}])",
            self.area, self.charge, time.start, time.end, mz.start, mz.end
        )
    }
}
