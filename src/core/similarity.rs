//! Shared similarity primitives used by every detection engine.
//!
//! All functions here are pure and total: empty inputs map to a defined
//! value instead of an error, and no intermediate result can divide by zero.

use std::collections::BTreeSet;
use std::hash::Hash;

use ahash::AHashMap;

/// Multiset Jaccard similarity over two element bags.
///
/// For each distinct element the minimum of the two counts contributes to
/// the intersection and the maximum to the union. Two empty bags compare
/// as identical (`1.0`).
pub fn bag_jaccard<T: Hash + Eq>(elements_a: &[T], elements_b: &[T]) -> f64 {
    if elements_a.is_empty() && elements_b.is_empty() {
        return 1.0;
    }

    let frequencies_a = frequencies(elements_a);
    let frequencies_b = frequencies(elements_b);

    let mut intersection = 0usize;
    let mut union = 0usize;

    for (key, count_a) in &frequencies_a {
        let count_b = frequencies_b.get(key).copied().unwrap_or(0);
        intersection += count_a.min(&count_b);
        union += *count_a.max(&count_b);
    }

    for (key, count_b) in &frequencies_b {
        if !frequencies_a.contains_key(key) {
            union += count_b;
        }
    }

    intersection as f64 / union as f64
}

/// Plain set Jaccard similarity. Two empty sets compare as identical.
pub fn set_jaccard<T: Ord>(set_a: &BTreeSet<T>, set_b: &BTreeSet<T>) -> f64 {
    if set_a.is_empty() && set_b.is_empty() {
        return 1.0;
    }

    let intersection = set_a.intersection(set_b).count();
    let union = set_a.union(set_b).count();

    intersection as f64 / union as f64
}

/// Length of the longest common subsequence of two slices.
///
/// Standard dynamic program with two alternating one-row buffers; the full
/// matrix is never materialized.
pub fn lcs_length<T: PartialEq>(sequence_a: &[T], sequence_b: &[T]) -> usize {
    let length_a = sequence_a.len();
    let length_b = sequence_b.len();

    if length_a == 0 || length_b == 0 {
        return 0;
    }

    let mut previous = vec![0usize; length_b + 1];
    let mut current = vec![0usize; length_b + 1];

    for index_a in 1..=length_a {
        for index_b in 1..=length_b {
            if sequence_a[index_a - 1] == sequence_b[index_b - 1] {
                current[index_b] = previous[index_b - 1] + 1;
            } else {
                current[index_b] = previous[index_b].max(current[index_b - 1]);
            }
        }

        std::mem::swap(&mut previous, &mut current);
        current.fill(0);
    }

    previous[length_b]
}

/// Normalized LCS similarity: `2·LCS / (|A| + |B|)`.
///
/// Two empty sequences compare as identical (`1.0`).
pub fn lcs_similarity<T: PartialEq>(sequence_a: &[T], sequence_b: &[T]) -> f64 {
    if sequence_a.is_empty() && sequence_b.is_empty() {
        return 1.0;
    }

    let lcs = lcs_length(sequence_a, sequence_b);
    (2 * lcs) as f64 / (sequence_a.len() + sequence_b.len()) as f64
}

fn frequencies<T: Hash + Eq>(elements: &[T]) -> AHashMap<&T, usize> {
    let mut result = AHashMap::with_capacity(elements.len());

    for element in elements {
        *result.entry(element).or_insert(0) += 1;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn bag_jaccard_identity() {
        let elements = vec!["a", "b", "b", "c"];
        assert_relative_eq!(bag_jaccard(&elements, &elements), 1.0);
    }

    #[test]
    fn bag_jaccard_counts_multiplicity() {
        let bag_a = vec!["x", "x", "y"];
        let bag_b = vec!["x", "y", "y"];

        // intersection: min(2,1) + min(1,2) = 2; union: max(2,1) + max(1,2) = 4
        assert_relative_eq!(bag_jaccard(&bag_a, &bag_b), 0.5);
    }

    #[test]
    fn bag_jaccard_empty_inputs() {
        let empty: Vec<&str> = Vec::new();
        let full = vec!["a"];

        assert_relative_eq!(bag_jaccard(&empty, &empty), 1.0);
        assert_relative_eq!(bag_jaccard(&empty, &full), 0.0);
    }

    #[test]
    fn set_jaccard_empty_and_disjoint() {
        let empty: BTreeSet<&str> = BTreeSet::new();
        let left: BTreeSet<&str> = ["a", "b"].into_iter().collect();
        let right: BTreeSet<&str> = ["c"].into_iter().collect();

        assert_relative_eq!(set_jaccard(&empty, &empty), 1.0);
        assert_relative_eq!(set_jaccard(&left, &right), 0.0);
        assert_relative_eq!(set_jaccard(&left, &left), 1.0);
    }

    #[test]
    fn lcs_length_basic() {
        let a = vec![1, 2, 3, 4, 5];
        let b = vec![2, 4, 5, 7];

        assert_eq!(lcs_length(&a, &b), 3);
        assert_eq!(lcs_length(&a, &[]), 0);
    }

    #[test]
    fn lcs_similarity_identity_and_empty() {
        let a = vec!["if", "return", "for"];
        let empty: Vec<&str> = Vec::new();

        assert_relative_eq!(lcs_similarity(&a, &a), 1.0);
        assert_relative_eq!(lcs_similarity(&empty, &empty), 1.0);
        assert_relative_eq!(lcs_similarity(&a, &empty), 0.0);
    }

    proptest! {
        #[test]
        fn bag_jaccard_is_symmetric(a in prop::collection::vec(0u8..8, 0..24),
                                    b in prop::collection::vec(0u8..8, 0..24)) {
            let forward = bag_jaccard(&a, &b);
            let backward = bag_jaccard(&b, &a);
            prop_assert!((forward - backward).abs() < 1e-12);
        }

        #[test]
        fn bag_jaccard_self_is_one(a in prop::collection::vec(0u8..8, 1..24)) {
            prop_assert!((bag_jaccard(&a, &a) - 1.0).abs() < 1e-12);
        }

        #[test]
        fn lcs_similarity_bounded(a in prop::collection::vec(0u8..6, 0..16),
                                  b in prop::collection::vec(0u8..6, 0..16)) {
            let similarity = lcs_similarity(&a, &b);
            prop_assert!((0.0..=1.0).contains(&similarity));
        }
    }
}
