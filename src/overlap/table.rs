//! Helper types for addressing cells by peak and isotope index

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Names one cell of a [`PeakIsotopeTable`], one peak of one isotope.
///
/// Displayed as `peak_isotope`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OverlapHit {
    pub peak: usize,
    pub isotope: usize,
}

impl OverlapHit {
    pub fn new(peak: usize, isotope: usize) -> Self {
        Self { peak, isotope }
    }
}

impl std::fmt::Display for OverlapHit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.peak, self.isotope)
    }
}

/// A dense two dimensional table with one row per peak and one column per
/// isotope, stored row-major in a single allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakIsotopeTable<T> {
    cells: Vec<T>,
    n_peaks: usize,
    n_isotopes: usize,
}

impl<T> Default for PeakIsotopeTable<T> {
    fn default() -> Self {
        Self::from_cells(Vec::new(), 0, 0)
    }
}

impl<T: Clone + Default> PeakIsotopeTable<T> {
    pub fn new(n_peaks: usize, n_isotopes: usize) -> Self {
        Self {
            cells: vec![T::default(); n_peaks * n_isotopes],
            n_peaks,
            n_isotopes,
        }
    }

    /// Discard the contents and re-size the table, filling it with `T::default()`
    pub fn reset(&mut self, n_peaks: usize, n_isotopes: usize) {
        self.cells.clear();
        self.cells.resize(n_peaks * n_isotopes, T::default());
        self.n_peaks = n_peaks;
        self.n_isotopes = n_isotopes;
    }
}

impl<T> PeakIsotopeTable<T> {
    /// Wrap row-major `cells`, which must hold `n_peaks * n_isotopes` entries
    pub fn from_cells(cells: Vec<T>, n_peaks: usize, n_isotopes: usize) -> Self {
        debug_assert_eq!(cells.len(), n_peaks * n_isotopes);
        Self {
            cells,
            n_peaks,
            n_isotopes,
        }
    }

    #[inline]
    fn offset(&self, peak: usize, isotope: usize) -> Option<usize> {
        if peak < self.n_peaks && isotope < self.n_isotopes {
            Some(peak * self.n_isotopes + isotope)
        } else {
            None
        }
    }

    pub fn n_peaks(&self) -> usize {
        self.n_peaks
    }

    pub fn n_isotopes(&self) -> usize {
        self.n_isotopes
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, peak: usize, isotope: usize) -> Option<&T> {
        self.offset(peak, isotope).map(|i| &self.cells[i])
    }

    pub fn get_mut(&mut self, peak: usize, isotope: usize) -> Option<&mut T> {
        self.offset(peak, isotope).map(|i| &mut self.cells[i])
    }

    /// Iterate over every cell along with its coordinates
    pub fn iter(&self) -> impl Iterator<Item = (OverlapHit, &T)> {
        let n_isotopes = self.n_isotopes;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, v)| (OverlapHit::new(i / n_isotopes, i % n_isotopes), v))
    }

    /// Iterate over the cells of one peak, ordered by isotope
    pub fn row(&self, peak: usize) -> &[T] {
        if peak < self.n_peaks {
            &self.cells[peak * self.n_isotopes..(peak + 1) * self.n_isotopes]
        } else {
            &[]
        }
    }
}
