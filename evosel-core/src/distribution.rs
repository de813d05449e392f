//! Probability vector transforms and cumulative index resolution.
//!
//! Selection works on a cumulative distribution: entry `i` holds the total
//! probability of slots `0..=i`. A uniform draw `v` selects the first slot
//! whose cumulative value reaches `v`.

/// Slices up to this length are resolved with a linear scan; longer ones
/// with binary search.
pub const DEFAULT_SERIAL_INDEX_THRESHOLD: usize = 35;

/// In-place prefix sum: `values[i]` becomes `values[0] + ... + values[i]`.
pub fn incremental(values: &mut [f64]) -> &mut [f64] {
    for i in 1..values.len() {
        values[i] += values[i - 1];
    }
    values
}

/// Index of the first slot of `cumulative` whose value reaches `v`.
///
/// Returns `None` when `v` exceeds the last cumulative value (or is NaN, or
/// the slice is empty). Uses a linear scan for slices of at most `threshold`
/// entries and binary search otherwise; both return the same index.
pub fn index_of(cumulative: &[f64], v: f64, threshold: usize) -> Option<usize> {
    if cumulative.len() <= threshold {
        index_of_serial(cumulative, v)
    } else {
        index_of_binary(cumulative, v)
    }
}

/// Linear left-to-right scan.
pub fn index_of_serial(cumulative: &[f64], v: f64) -> Option<usize> {
    cumulative.iter().position(|&c| c >= v)
}

/// Binary search over `[imin, imax)`.
pub fn index_of_binary(cumulative: &[f64], v: f64) -> Option<usize> {
    let mut imin = 0;
    let mut imax = cumulative.len();

    while imin < imax {
        let imid = imin + (imax - imin) / 2;
        if cumulative[imid] >= v {
            if imid == 0 || cumulative[imid - 1] < v {
                return Some(imid);
            }
            // A lower slot also reaches `v` (zero-probability run).
            imax = imid;
        } else {
            imin = imid + 1;
        }
    }

    None
}

/// Permutation that stably sorts `values` ascending.
///
/// `result[k]` is the index of the k-th smallest value; equal values keep
/// their original relative order.
pub fn sort_indexes(values: &[f64]) -> Vec<usize> {
    let mut indexes: Vec<usize> = (0..values.len()).collect();
    indexes.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    indexes
}

/// Rank inversion: the slot holding the k-th smallest value receives the
/// k-th largest value.
///
/// The multiset of values is preserved, so a vector that sums to one still
/// does. Mass moves from the originally likely slots to the unlikely ones,
/// which turns maximizing probabilities into minimizing ones.
///
/// Inverting twice restores the input only when all values are distinct.
/// Ties are ranked by slot, so `[0.1, 0.1, 0.2, 0.6]` comes back as
/// `[0.1, 0.1, 0.6, 0.2]`.
pub fn invert(values: &[f64]) -> Vec<f64> {
    let indexes = sort_indexes(values);
    let n = values.len();

    let mut result = vec![0.0; n];
    for (rank, &index) in indexes.iter().enumerate() {
        result[indexes[n - 1 - rank]] = values[index];
    }
    result
}
