//! Comparator-driven binary search over sorted slices
//!
//! The slice must already be sorted under the comparator. This is not checked: an unsorted
//! slice yields an arbitrary (but in-bounds) answer.
//!
//! When several elements compare equal to the target, any one of their indices may be
//! returned.

use std::cmp::Ordering;

/// Search `sequence` for `target` using a three-way comparator
///
/// `compare(target, element)` returns how the target orders relative to the element.
///
/// # Returns
/// `Ok(index)` of a matching element, or `Err(insertion_point)` where `target` would have to
/// be inserted to keep the slice sorted.
pub fn search_by<T, Q, F>(sequence: &[T], target: &Q, mut compare: F) -> Result<usize, usize>
where
    Q: ?Sized,
    F: FnMut(&Q, &T) -> Ordering,
{
    let mut low = 0;
    let mut high = sequence.len();

    while low < high {
        let mid = low + (high - low) / 2;
        match compare(target, &sequence[mid]) {
            Ordering::Greater => low = mid + 1,
            Ordering::Less => high = mid,
            Ordering::Equal => return Ok(mid),
        }
    }

    Err(low)
}

/// Search `sequence` for `target`, encoding a miss as `-(insertion_point) - 1`
///
/// Non-negative results are indices of a matching element; negative results decode with
/// [`insertion_point`]. An empty slice always yields `-1`.
pub fn search<T, Q, F>(sequence: &[T], target: &Q, compare: F) -> isize
where
    Q: ?Sized,
    F: FnMut(&Q, &T) -> Ordering,
{
    match search_by(sequence, target, compare) {
        Ok(index) => index as isize,
        Err(insertion) => -(insertion as isize) - 1,
    }
}

/// Decode the insertion point from a negative [`search`] result
///
/// Returns `None` when the result is a hit (non-negative).
#[inline]
pub fn insertion_point(result: isize) -> Option<usize> {
    (result < 0).then(|| (-(result + 1)) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(a: &i32, b: &i32) -> Ordering {
        a.cmp(b)
    }

    #[test]
    fn test_empty_sequence() {
        let empty: [i32; 0] = [];
        assert_eq!(search(&empty, &5, numeric), -1);
        assert_eq!(search(&empty, &i32::MIN, numeric), -1);
        assert_eq!(search_by(&empty, &5, numeric), Err(0));
    }

    #[test]
    fn test_found() {
        let seq = [1, 3, 5, 7];
        assert_eq!(search(&seq, &5, numeric), 2);
        assert_eq!(search(&seq, &1, numeric), 0);
        assert_eq!(search(&seq, &7, numeric), 3);
    }

    #[test]
    fn test_not_found_insertion_points() {
        let seq = [1, 3, 5, 7];
        assert_eq!(search(&seq, &4, numeric), -3);
        assert_eq!(insertion_point(-3), Some(2));
        assert_eq!(search(&seq, &0, numeric), -1);
        assert_eq!(search(&seq, &8, numeric), -5);
        assert_eq!(insertion_point(search(&seq, &8, numeric)), Some(4));
    }

    #[test]
    fn test_insertion_point_of_hit() {
        assert_eq!(insertion_point(0), None);
        assert_eq!(insertion_point(7), None);
        assert_eq!(insertion_point(-1), Some(0));
    }

    #[test]
    fn test_duplicates_return_some_equal_element() {
        let seq = [1, 2, 2, 2, 2, 3];
        let index = search(&seq, &2, numeric);
        assert!(index >= 0);
        assert_eq!(seq[index as usize], 2);
    }

    #[test]
    fn test_every_insertion_point_matches_partition() {
        let seq: Vec<i32> = (0..50).map(|i| i * 2).collect();
        for target in -1..101 {
            let result = search_by(&seq, &target, numeric);
            let expected = seq.partition_point(|&x| x < target);
            match result {
                Ok(index) => assert_eq!(seq[index], target),
                Err(insertion) => assert_eq!(insertion, expected),
            }
        }
    }

    #[test]
    fn test_heterogeneous_target() {
        // Search records by a key without building a probe record
        let records = [(10, "a"), (20, "b"), (30, "c")];
        let result = search(&records, &20, |key: &i32, rec| key.cmp(&rec.0));
        assert_eq!(result, 1);
    }

    #[test]
    fn test_float_comparator() {
        let seq = [0.5, 1.5, 2.5];
        let result = search(&seq, &2.0, |a: &f64, b: &f64| a.total_cmp(b));
        assert_eq!(result, -3);
    }
}
