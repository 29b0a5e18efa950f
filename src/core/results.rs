//! Clone group model and analysis result assembly.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::lang::tokens::Token;

/// The four clone abstraction levels, in increasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CloneType {
    /// Identical token runs
    Type1,
    /// Parameterized (renamed) token runs
    Type2,
    /// Structurally similar blocks with insertions/deletions
    Type3,
    /// Semantically similar blocks differing in surface form
    Type4,
}

impl CloneType {
    /// All clone types in ascending order.
    pub const ALL: [CloneType; 4] = [
        CloneType::Type1,
        CloneType::Type2,
        CloneType::Type3,
        CloneType::Type4,
    ];

    /// Numeric rank (1–4) used in reports, baselines, and configuration.
    pub fn rank(self) -> u8 {
        match self {
            CloneType::Type1 => 1,
            CloneType::Type2 => 2,
            CloneType::Type3 => 3,
            CloneType::Type4 => 4,
        }
    }

    /// Parse a numeric rank back into a clone type.
    pub fn from_rank(rank: u8) -> Option<Self> {
        match rank {
            1 => Some(CloneType::Type1),
            2 => Some(CloneType::Type2),
            3 => Some(CloneType::Type3),
            4 => Some(CloneType::Type4),
            _ => None,
        }
    }
}

/// One occurrence of a clone in a source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CloneFragment {
    pub file: String,
    pub start_line: usize,
    pub end_line: usize,
    pub start_column: usize,
    pub end_column: usize,
}

/// A detected clone: two or more fragments plus classification metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct CloneGroup {
    pub clone_type: CloneType,
    pub token_count: usize,
    pub line_count: usize,
    /// Percentage in `[0, 100]`; exactly `100.0` for Types 1–2.
    pub similarity: f64,
    pub fragments: Vec<CloneFragment>,
}

impl CloneGroup {
    /// True for the gap-tolerant clone types (3 and 4).
    pub fn is_structural(&self) -> bool {
        matches!(self.clone_type, CloneType::Type3 | CloneType::Type4)
    }

    /// True when every fragment lives in the same file.
    pub fn is_same_file(&self) -> bool {
        let Some(first) = self.fragments.first() else {
            return false;
        };

        self.fragments
            .iter()
            .all(|fragment| fragment.file == first.file)
    }
}

/// Build a fragment covering `tokens[start_index..=end_index]`.
///
/// The end column points one past the last token's text so editors can
/// highlight the full span.
pub fn fragment_from_tokens(
    file: &str,
    tokens: &[Token],
    start_index: usize,
    end_index: usize,
) -> CloneFragment {
    let first = &tokens[start_index];
    let last = &tokens[end_index];

    CloneFragment {
        file: file.to_string(),
        start_line: first.location.line,
        end_line: last.location.line,
        start_column: first.location.column,
        end_column: last.location.column + last.text.chars().count(),
    }
}

/// Line span of a fragment pair: the longer of the two fragments.
pub fn pair_line_count(fragment_a: &CloneFragment, fragment_b: &CloneFragment) -> usize {
    let lines_a = fragment_a.end_line - fragment_a.start_line + 1;
    let lines_b = fragment_b.end_line - fragment_b.start_line + 1;
    lines_a.max(lines_b)
}

/// Round a `[0, 1]` similarity into a one-decimal percentage.
pub fn percent_similarity(similarity: f64) -> f64 {
    (similarity * 1000.0).round() / 10.0
}

/// Drop groups whose fragments are all contained within an earlier group.
///
/// Keep-first semantics: a group survives unless every one of its fragments
/// lies inside the corresponding fragment of an already-kept group.
pub fn dedupe_subsumed(groups: Vec<CloneGroup>) -> Vec<CloneGroup> {
    let mut unique: Vec<CloneGroup> = Vec::with_capacity(groups.len());

    for group in groups {
        let subsumed = unique.iter().any(|existing| is_subsumed(&group, existing));

        if !subsumed {
            unique.push(group);
        }
    }

    unique
}

fn is_subsumed(group: &CloneGroup, other: &CloneGroup) -> bool {
    group
        .fragments
        .iter()
        .zip(other.fragments.iter())
        .all(|(fragment, container)| {
            fragment.file == container.file
                && fragment.start_line >= container.start_line
                && fragment.end_line <= container.end_line
        })
}

/// Duplication percentage rounded to one decimal; `0.0` for an empty corpus.
pub fn duplication_percentage(duplicated_tokens: usize, total_tokens: usize) -> f64 {
    if total_tokens == 0 {
        return 0.0;
    }

    let raw = (duplicated_tokens as f64 / total_tokens as f64) * 100.0;
    (raw * 10.0).round() / 10.0
}

/// What the detection pipeline hands back to the caller.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub clone_groups: Vec<CloneGroup>,
    pub total_tokens: usize,
}

/// Full analysis outcome consumed by the reporters and exit-code logic.
#[derive(Debug, Clone)]
pub struct AnalysisResults {
    pub clone_groups: Vec<CloneGroup>,
    pub files_analyzed: usize,
    pub execution_time: Duration,
    pub total_tokens: usize,
    pub minimum_token_count: usize,
    pub minimum_line_count: usize,
}

impl AnalysisResults {
    /// Clone groups in deterministic report order: type ascending, token
    /// count descending, then first fragment path and line.
    pub fn sorted_clone_groups(&self) -> Vec<CloneGroup> {
        let mut sorted = self.clone_groups.clone();

        sorted.sort_by(|lhs, rhs| {
            lhs.clone_type
                .cmp(&rhs.clone_type)
                .then_with(|| rhs.token_count.cmp(&lhs.token_count))
                .then_with(|| {
                    let lhs_first = lhs.fragments.first();
                    let rhs_first = rhs.fragments.first();

                    match (lhs_first, rhs_first) {
                        (Some(a), Some(b)) => a
                            .file
                            .cmp(&b.file)
                            .then_with(|| a.start_line.cmp(&b.start_line)),
                        _ => std::cmp::Ordering::Equal,
                    }
                })
        });

        sorted
    }

    /// Sum of `token_count` over all groups.
    pub fn duplicated_tokens(&self) -> usize {
        self.clone_groups
            .iter()
            .map(|group| group.token_count)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(file: &str, start_line: usize, end_line: usize) -> CloneFragment {
        CloneFragment {
            file: file.to_string(),
            start_line,
            end_line,
            start_column: 1,
            end_column: 10,
        }
    }

    fn group(clone_type: CloneType, token_count: usize, spans: &[(&str, usize, usize)]) -> CloneGroup {
        CloneGroup {
            clone_type,
            token_count,
            line_count: 5,
            similarity: 100.0,
            fragments: spans
                .iter()
                .map(|(file, start, end)| fragment(file, *start, *end))
                .collect(),
        }
    }

    #[test]
    fn same_file_detection() {
        let same = group(CloneType::Type1, 50, &[("a.swift", 1, 5), ("a.swift", 10, 14)]);
        let cross = group(CloneType::Type1, 50, &[("a.swift", 1, 5), ("b.swift", 1, 5)]);

        assert!(same.is_same_file());
        assert!(!cross.is_same_file());
        assert!(!same.is_structural());
    }

    #[test]
    fn dedupe_drops_contained_groups() {
        let outer = group(CloneType::Type3, 80, &[("a.swift", 1, 20), ("b.swift", 1, 20)]);
        let inner = group(CloneType::Type3, 40, &[("a.swift", 5, 10), ("b.swift", 5, 10)]);

        let deduped = dedupe_subsumed(vec![outer.clone(), inner]);

        assert_eq!(deduped, vec![outer]);
    }

    #[test]
    fn dedupe_keeps_overlapping_but_not_contained() {
        let first = group(CloneType::Type3, 80, &[("a.swift", 1, 10), ("b.swift", 1, 10)]);
        let second = group(CloneType::Type3, 80, &[("a.swift", 5, 15), ("b.swift", 5, 15)]);

        assert_eq!(dedupe_subsumed(vec![first, second]).len(), 2);
    }

    #[test]
    fn sorted_groups_are_deterministic() {
        let results = AnalysisResults {
            clone_groups: vec![
                group(CloneType::Type2, 30, &[("b.swift", 1, 5), ("c.swift", 1, 5)]),
                group(CloneType::Type1, 30, &[("a.swift", 9, 13), ("b.swift", 9, 13)]),
                group(CloneType::Type1, 60, &[("z.swift", 1, 5), ("a.swift", 1, 5)]),
            ],
            files_analyzed: 3,
            execution_time: Duration::from_millis(10),
            total_tokens: 300,
            minimum_token_count: 50,
            minimum_line_count: 5,
        };

        let sorted = results.sorted_clone_groups();

        assert_eq!(sorted[0].token_count, 60);
        assert_eq!(sorted[1].clone_type, CloneType::Type1);
        assert_eq!(sorted[2].clone_type, CloneType::Type2);
    }

    #[test]
    fn duplication_percentage_rounds_to_one_decimal() {
        assert_eq!(duplication_percentage(1, 3), 33.3);
        assert_eq!(duplication_percentage(0, 0), 0.0);
        assert_eq!(duplication_percentage(300, 300), 100.0);
    }

    #[test]
    fn percent_similarity_rounding() {
        assert_eq!(percent_similarity(0.7256), 72.6);
        assert_eq!(percent_similarity(1.0), 100.0);
    }

    #[test]
    fn clone_type_rank_round_trip() {
        for clone_type in CloneType::ALL {
            assert_eq!(CloneType::from_rank(clone_type.rank()), Some(clone_type));
        }

        assert_eq!(CloneType::from_rank(0), None);
        assert_eq!(CloneType::from_rank(5), None);
    }
}
