//! One dimensional interval arithmetic shared by the overlap machinery.
use mzpeaks::coordinate::SimpleInterval;
use num_traits::Float;

/// The tolerance used when deciding whether two footprints describe the same peak
pub const SAME_PEAK_TOLERANCE: f64 = 0.01;

/// Test whether the interval `[start1, end1]` intersects `[start2, end2]`.
///
/// Touching end points do not count as an intersection. The comparison is
/// asymmetric: the first interval may share its start with the
/// second, but a zero-width second interval sitting on the first interval's
/// start is only caught when the arguments are swapped.
#[inline]
pub fn is_within_range<T: Float>(start1: T, end1: T, start2: T, end2: T) -> bool {
    (start1 >= start2 && start1 < end2) || (start1 < start2 && end1 > start2)
}

/// [`is_within_range`] over two [`SimpleInterval`]s
#[inline]
pub fn intervals_overlap(query: &SimpleInterval<f64>, reference: &SimpleInterval<f64>) -> bool {
    is_within_range(query.start, query.end, reference.start, reference.end)
}

/// The length of the intersection of two intervals, zero when they are disjoint
pub fn intersection_width<T: Float>(a: &SimpleInterval<T>, b: &SimpleInterval<T>) -> T {
    let start = a.start.max(b.start);
    let end = a.end.min(b.end);
    if end > start {
        end - start
    } else {
        T::zero()
    }
}

/// The fraction of `reference` covered by `query`.
///
/// A degenerate `reference` is covered completely if `query` contains it.
pub fn overlap_fraction(query: &SimpleInterval<f64>, reference: &SimpleInterval<f64>) -> f64 {
    let width = reference.end - reference.start;
    if width <= 0.0 {
        if query.start <= reference.start && reference.start <= query.end {
            return 1.0;
        }
        return 0.0;
    }
    intersection_width(query, reference) / width
}

/// Translate an interval by `offset`
#[inline]
pub fn shift_interval(interval: &SimpleInterval<f64>, offset: f64) -> SimpleInterval<f64> {
    SimpleInterval::new(interval.start + offset, interval.end + offset)
}

/// Test whether `value` lies within the closed interval
#[inline]
pub fn contains_closed(interval: &SimpleInterval<f64>, value: f64) -> bool {
    interval.start <= value && value <= interval.end
}

/// Check if `y` is within `rtol` of `x` relative to the magnitude of `x`
pub fn is_relatively_close<T: Float>(x: T, y: T, rtol: T) -> bool {
    (x - y).abs() <= rtol * x.abs()
}

/// Compare two parameter vectors element-wise with [`is_relatively_close`]
pub fn parameters_close(a: &[f64; 4], b: &[f64; 4], rtol: f64) -> bool {
    a.iter()
        .zip(b.iter())
        .all(|(x, y)| is_relatively_close(*x, *y, rtol))
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 2.0, 1.0, 3.0, true)]
    #[case(1.0, 3.0, 0.0, 2.0, true)]
    #[case(0.0, 5.0, 1.0, 2.0, true)]
    #[case(1.0, 2.0, 0.0, 5.0, true)]
    #[case(1.0, 2.0, 1.0, 2.0, true)]
    #[case(0.0, 1.0, 1.0, 2.0, false)]
    #[case(1.0, 2.0, 0.0, 1.0, false)]
    #[case(0.0, 1.0, 2.0, 3.0, false)]
    #[case(2.0, 3.0, 0.0, 1.0, false)]
    fn test_is_within_range(
        #[case] start1: f64,
        #[case] end1: f64,
        #[case] start2: f64,
        #[case] end2: f64,
        #[case] expected: bool,
    ) {
        assert_eq!(is_within_range(start1, end1, start2, end2), expected);
    }

    #[test]
    fn test_degenerate_tie_break() {
        // A zero-width second interval on the shared start is missed ...
        assert!(!is_within_range(1.0, 3.0, 1.0, 1.0));
        // ... but found when it is passed first
        assert!(is_within_range(1.0, 1.0, 1.0, 3.0));
    }

    #[test]
    fn test_overlap_fraction() {
        let reference = SimpleInterval::new(10.0, 12.0);
        assert!((overlap_fraction(&SimpleInterval::new(11.0, 15.0), &reference) - 0.5).abs() < 1e-12);
        assert!((overlap_fraction(&SimpleInterval::new(0.0, 50.0), &reference) - 1.0).abs() < 1e-12);
        assert_eq!(overlap_fraction(&SimpleInterval::new(12.0, 15.0), &reference), 0.0);
        assert_eq!(
            overlap_fraction(&SimpleInterval::new(0.0, 50.0), &SimpleInterval::new(3.0, 3.0)),
            1.0
        );
    }

    #[test]
    fn test_relative_closeness() {
        assert!(is_relatively_close(100.0, 100.9, SAME_PEAK_TOLERANCE));
        assert!(!is_relatively_close(100.0, 101.1, SAME_PEAK_TOLERANCE));
        assert!(is_relatively_close(0.0, 0.0, SAME_PEAK_TOLERANCE));
        assert!(parameters_close(
            &[1.0, 2.0, 3.0, 4.0],
            &[1.001, 2.0, 3.0, 4.02],
            SAME_PEAK_TOLERANCE
        ));
        assert!(!parameters_close(
            &[1.0, 2.0, 3.0, 4.0],
            &[1.0, 2.0, 3.0, 4.5],
            SAME_PEAK_TOLERANCE
        ));
    }

    #[test]
    fn test_shift() {
        let iv = shift_interval(&SimpleInterval::new(700.0, 700.02), 1.5);
        assert!((iv.start - 701.5).abs() < 1e-9);
        assert!((iv.end - 701.52).abs() < 1e-9);
        assert!(contains_closed(&iv, 701.5));
        assert!(!contains_closed(&iv, 701.53));
    }
}
