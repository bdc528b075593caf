use crate::analyte::{AnalyteResult, IsotopeDistribution};
use crate::overlap::C13_NEUTRON_SHIFT;
use crate::peak::{IsotopePeak, RectangularRegion};

pub const MZ_BANDWIDTH: f64 = 0.01;

/// A peak eluting between 10 and 12 minutes
pub fn rect(area: f64, mz: f64, charge: i32) -> IsotopePeak {
    rect_at(area, mz, charge, 10.0, 12.0)
}

pub fn rect_at(area: f64, mz: f64, charge: i32, start: f64, end: f64) -> IsotopePeak {
    IsotopePeak::new(
        area,
        charge,
        RectangularRegion::symmetric(start, end, mz, MZ_BANDWIDTH),
    )
}

/// An analyte with one peak per isotope, each spaced one neutron apart
pub fn ladder(id: &str, mz: f64, charge: i32, areas: &[f64]) -> AnalyteResult {
    let step = C13_NEUTRON_SHIFT / charge.unsigned_abs().max(1) as f64;
    let isotopes = areas
        .iter()
        .enumerate()
        .map(|(i, area)| vec![rect(*area, mz + i as f64 * step, charge)])
        .collect();
    AnalyteResult::new(id, isotopes)
}

pub fn distribution(abundances: &[f64]) -> IsotopeDistribution {
    IsotopeDistribution::new(abundances.to_vec()).unwrap()
}

pub fn assert_close(observed: f64, expected: f64) {
    assert!(
        (observed - expected).abs() < 1e-6,
        "{observed} != {expected}"
    );
}
