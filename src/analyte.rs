//! Per-analyte quantitation results and theoretical isotope distributions.
use std::borrow::Borrow;
use std::fmt;

use mzpeaks::coordinate::SimpleInterval;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::peak::{IsotopePeak, PeakGeometry};

/// Identifies one analyte, a lipid species and adduct at a retention time
#[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct AnalyteId(String);

impl AnalyteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnalyteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AnalyteId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AnalyteId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for AnalyteId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// All the ways an isotope distribution can be malformed
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DistributionError {
    #[error("The isotope distribution is empty")]
    Empty,
    #[error("The monoisotopic abundance must be positive, got {0}")]
    NonPositiveReference(f64),
    #[error("Isotope {index} has a negative abundance {value}")]
    NegativeAbundance { index: usize, value: f64 },
}

/// The expected relative abundance of each isotope of an analyte, derived from
/// its chemical formula.
///
/// `abundances[0]` is the normalizing reference and is always positive.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IsotopeDistribution {
    abundances: Vec<f64>,
    /// Whether the isotopes run towards lower m/z
    negative: bool,
}

impl IsotopeDistribution {
    pub fn new(abundances: Vec<f64>) -> Result<Self, DistributionError> {
        Self::validate(&abundances)?;
        Ok(Self {
            abundances,
            negative: false,
        })
    }

    /// Create a distribution whose isotopes are spaced towards lower m/z
    pub fn negative(abundances: Vec<f64>) -> Result<Self, DistributionError> {
        let mut this = Self::new(abundances)?;
        this.negative = true;
        Ok(this)
    }

    fn validate(abundances: &[f64]) -> Result<(), DistributionError> {
        match abundances.first() {
            None => return Err(DistributionError::Empty),
            Some(reference) if !(*reference > 0.0) => {
                return Err(DistributionError::NonPositiveReference(*reference))
            }
            Some(_) => {}
        }
        if let Some((index, value)) = abundances
            .iter()
            .enumerate()
            .find(|(_, v)| !(**v >= 0.0))
        {
            return Err(DistributionError::NegativeAbundance {
                index,
                value: *value,
            });
        }
        Ok(())
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn len(&self) -> usize {
        self.abundances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abundances.is_empty()
    }

    pub fn get(&self, isotope: usize) -> Option<f64> {
        self.abundances.get(isotope).copied()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.abundances
    }

    /// The abundance of `isotope` relative to the monoisotopic peak, if the
    /// distribution is long enough to say.
    pub fn ratio_to_reference(&self, isotope: usize) -> Option<f64> {
        self.get(isotope).map(|v| v / self.abundances[0])
    }
}

/// The quantitation result for one analyte: a contiguous, zero-based sequence of
/// isotopes, each holding the peaks ("probes") detected for it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnalyteResult {
    pub id: AnalyteId,
    pub isotopes: Vec<Vec<IsotopePeak>>,
    /// The sum of all peak areas across all isotopes
    pub area: f64,
}

impl AnalyteResult {
    pub fn new(id: impl Into<AnalyteId>, isotopes: Vec<Vec<IsotopePeak>>) -> Self {
        let mut this = Self {
            id: id.into(),
            isotopes,
            area: 0.0,
        };
        this.update_area();
        this
    }

    /// Recompute [`AnalyteResult::area`] from the peaks
    pub fn update_area(&mut self) -> f64 {
        self.area = self.isotopes.iter().flatten().map(|p| p.area).sum();
        self.area
    }

    pub fn isotope_count(&self) -> usize {
        self.isotopes.len()
    }

    pub fn peaks(&self, isotope: usize) -> &[IsotopePeak] {
        self.isotopes
            .get(isotope)
            .map(|v| v.as_slice())
            .unwrap_or_default()
    }

    pub fn iter_peaks(&self) -> impl Iterator<Item = &IsotopePeak> {
        self.isotopes.iter().flatten()
    }

    /// The charge of the first monoisotopic peak, if there is one
    pub fn charge(&self) -> Option<i32> {
        self.peaks(0).first().map(|p| p.charge)
    }

    /// The area-weighted m/z of the monoisotopic peaks
    pub fn monoisotopic_mz(&self) -> Option<f64> {
        let peaks = self.peaks(0);
        if peaks.is_empty() {
            return None;
        }
        let total: f64 = peaks.iter().map(|p| p.area).sum();
        if total > 0.0 {
            Some(peaks.iter().map(|p| p.shape.mz_center() * p.area).sum::<f64>() / total)
        } else {
            Some(peaks.iter().map(|p| p.shape.mz_center()).sum::<f64>() / peaks.len() as f64)
        }
    }

    /// The retention time interval spanned by every peak of every isotope
    pub fn time_span(&self) -> Option<SimpleInterval<f64>> {
        self.iter_peaks().map(|p| p.time_window()).fold(None, |acc, iv| {
            Some(match acc {
                None => iv,
                Some(span) => {
                    SimpleInterval::new(span.start.min(iv.start), span.end.max(iv.end))
                }
            })
        })
    }
}
