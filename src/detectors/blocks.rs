//! Block extraction: maps body line-ranges onto token index ranges.

use ahash::AHashMap;

use crate::core::results::{
    fragment_from_tokens, pair_line_count, percent_similarity, CloneGroup, CloneType,
};
use crate::lang::structure;
use crate::lang::tokens::{FileTokens, Token};

/// A contiguous token range corresponding to one executable body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub file: String,
    pub start_line: usize,
    pub end_line: usize,
    pub start_token_index: usize,
    pub end_token_index: usize,
}

impl CodeBlock {
    pub fn token_count(&self) -> usize {
        self.end_token_index - self.start_token_index + 1
    }
}

/// A block plus the index of its owning file in the analysis batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedBlock {
    pub block: CodeBlock,
    pub file_index: usize,
}

/// A candidate pair of blocks under comparison.
#[derive(Debug, Clone)]
pub struct IndexedBlockPair<'a> {
    pub block_a: &'a IndexedBlock,
    pub block_b: &'a IndexedBlock,
}

/// Extract every body block of at least `minimum_token_count` tokens across
/// the batch.
pub fn extract_valid_blocks(files: &[FileTokens], minimum_token_count: usize) -> Vec<IndexedBlock> {
    let mut all_blocks = Vec::new();

    for (file_index, file_tokens) in files.iter().enumerate() {
        let ranges = structure::body_ranges(&file_tokens.normalized_tokens);

        for (start_line, end_line) in ranges {
            let Some(block) = map_to_token_range(
                start_line,
                end_line,
                &file_tokens.file,
                &file_tokens.normalized_tokens,
            ) else {
                continue;
            };

            if block.token_count() >= minimum_token_count {
                all_blocks.push(IndexedBlock { block, file_index });
            }
        }
    }

    all_blocks
}

// First and last token whose line falls inside the range; `None` when the
// range covers no tokens.
fn map_to_token_range(
    start_line: usize,
    end_line: usize,
    file: &str,
    tokens: &[Token],
) -> Option<CodeBlock> {
    let mut start_index = None;
    let mut end_index = None;

    for (index, token) in tokens.iter().enumerate() {
        if token.location.line > end_line {
            break;
        }

        if token.location.line < start_line {
            continue;
        }

        if start_index.is_none() {
            start_index = Some(index);
        }

        end_index = Some(index);
    }

    Some(CodeBlock {
        file: file.to_string(),
        start_line,
        end_line,
        start_token_index: start_index?,
        end_token_index: end_index?,
    })
}

/// Token-frequency fingerprint of a block, for cheap candidate pruning.
#[derive(Debug, Clone)]
pub struct BlockFingerprint {
    token_frequencies: AHashMap<String, usize>,
}

impl BlockFingerprint {
    pub fn new(tokens: &[Token], start_index: usize, end_index: usize) -> Self {
        let mut frequencies = AHashMap::new();

        for token in &tokens[start_index..=end_index] {
            *frequencies.entry(token.text.clone()).or_insert(0) += 1;
        }

        Self {
            token_frequencies: frequencies,
        }
    }

    /// Multiset Jaccard over the two frequency bags.
    pub fn jaccard_similarity(&self, other: &Self) -> f64 {
        let mut intersection = 0usize;
        let mut union = 0usize;

        for (key, count_a) in &self.token_frequencies {
            let count_b = other.token_frequencies.get(key).copied().unwrap_or(0);
            intersection += count_a.min(&count_b);
            union += *count_a.max(&count_b);
        }

        for (key, count_b) in &other.token_frequencies {
            if !self.token_frequencies.contains_key(key) {
                union += count_b;
            }
        }

        if union == 0 {
            return 0.0;
        }

        intersection as f64 / union as f64
    }
}

/// Build a clone group for a block pair, or `None` below the line minimum.
pub fn build_block_group(
    clone_type: CloneType,
    pair: &IndexedBlockPair<'_>,
    files: &[FileTokens],
    similarity: f64,
    minimum_line_count: usize,
) -> Option<CloneGroup> {
    let fragment_a = block_fragment(pair.block_a, files);
    let fragment_b = block_fragment(pair.block_b, files);

    let line_count = pair_line_count(&fragment_a, &fragment_b);

    if line_count < minimum_line_count {
        return None;
    }

    let token_count = pair
        .block_a
        .block
        .token_count()
        .max(pair.block_b.block.token_count());

    Some(CloneGroup {
        clone_type,
        token_count,
        line_count,
        similarity: percent_similarity(similarity),
        fragments: vec![fragment_a, fragment_b],
    })
}

fn block_fragment(indexed: &IndexedBlock, files: &[FileTokens]) -> crate::core::results::CloneFragment {
    fragment_from_tokens(
        &indexed.block.file,
        &files[indexed.file_index].tokens,
        indexed.block.start_token_index,
        indexed.block.end_token_index,
    )
}

/// Normalized-token slice of a block.
pub fn block_token_slice<'a>(indexed: &IndexedBlock, files: &'a [FileTokens]) -> &'a [Token] {
    &files[indexed.file_index].normalized_tokens
        [indexed.block.start_token_index..=indexed.block.end_token_index]
}

/// Fingerprint every block and keep the index pairs whose bag-Jaccard
/// reaches `threshold`. This is the cheap pruning step in front of tiling.
pub fn fingerprint_candidate_pairs(
    blocks: &[IndexedBlock],
    files: &[FileTokens],
    threshold: f64,
) -> Vec<(usize, usize)> {
    let fingerprints: Vec<BlockFingerprint> = blocks
        .iter()
        .map(|indexed| {
            BlockFingerprint::new(
                &files[indexed.file_index].normalized_tokens,
                indexed.block.start_token_index,
                indexed.block.end_token_index,
            )
        })
        .collect();

    let mut candidates = Vec::new();

    for first in 0..blocks.len() {
        for second in (first + 1)..blocks.len() {
            if fingerprints[first].jaccard_similarity(&fingerprints[second]) >= threshold {
                candidates.push((first, second));
            }
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::normalize::TokenNormalizer;
    use crate::lang::registry::tokenize_source;

    fn file_tokens(file: &str, source: &str) -> FileTokens {
        let tokens = tokenize_source(source, file);
        let normalized = TokenNormalizer::new().normalize(&tokens);
        FileTokens::new(file, source, tokens, normalized)
    }

    #[test]
    fn blocks_below_the_token_minimum_are_dropped() {
        let files = vec![file_tokens(
            "a.swift",
            "func tiny() {\n    let x = 1\n}\n",
        )];

        assert!(extract_valid_blocks(&files, 50).is_empty());
        assert_eq!(extract_valid_blocks(&files, 3).len(), 1);
    }

    #[test]
    fn block_token_indices_cover_the_body_lines() {
        let source = "func alpha() {\n    let x = 1\n    let y = 2\n}\n";
        let files = vec![file_tokens("a.swift", source)];

        let blocks = extract_valid_blocks(&files, 3);
        assert_eq!(blocks.len(), 1);

        let block = &blocks[0].block;
        assert_eq!(block.start_line, 1);
        assert_eq!(block.end_line, 4);

        let slice = block_token_slice(&blocks[0], &files);
        assert!(slice.iter().any(|token| token.text == "let"));
    }

    #[test]
    fn fingerprint_similarity_matches_bag_jaccard() {
        let tokens = tokenize_source("let a = 1 ; let b = 2", "a.swift");
        let normalized = TokenNormalizer::new().normalize(&tokens);

        let full = BlockFingerprint::new(&normalized, 0, normalized.len() - 1);
        let half = BlockFingerprint::new(&normalized, 0, 3);

        assert!((full.jaccard_similarity(&full) - 1.0).abs() < 1e-9);
        let partial = full.jaccard_similarity(&half);
        assert!(partial > 0.0 && partial < 1.0);
        assert!((full.jaccard_similarity(&half) - half.jaccard_similarity(&full)).abs() < 1e-12);
    }
}
