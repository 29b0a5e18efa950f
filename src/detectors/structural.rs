//! Structural near-miss clone detection (Type 3).
//!
//! Blocks are fingerprinted and cheaply pruned by bag-Jaccard before the
//! quadratic tiling step runs on the survivors.

use tracing::debug;

use crate::core::results::{dedupe_subsumed, CloneGroup, CloneType};
use crate::detectors::blocks::{
    build_block_group, block_token_slice, extract_valid_blocks, fingerprint_candidate_pairs,
    IndexedBlockPair,
};
use crate::detectors::tiling::GreedyStringTiler;
use crate::lang::tokens::FileTokens;

/// Fingerprint-pruned greedy-tiling detector for Type-3 clones.
#[derive(Debug, Clone, Copy)]
pub struct StructuralCloneDetector {
    similarity_threshold: f64,
    minimum_tile_size: usize,
    minimum_token_count: usize,
    minimum_line_count: usize,
    candidate_filter_threshold: f64,
}

impl StructuralCloneDetector {
    pub fn new(
        similarity_threshold: f64,
        minimum_tile_size: usize,
        minimum_token_count: usize,
        minimum_line_count: usize,
        candidate_filter_threshold: f64,
    ) -> Self {
        Self {
            similarity_threshold,
            minimum_tile_size,
            minimum_token_count,
            minimum_line_count,
            candidate_filter_threshold,
        }
    }

    pub fn detect(&self, files: &[FileTokens]) -> Vec<CloneGroup> {
        let blocks = extract_valid_blocks(files, self.minimum_token_count);
        let candidates =
            fingerprint_candidate_pairs(&blocks, files, self.candidate_filter_threshold / 100.0);

        debug!(
            blocks = blocks.len(),
            candidates = candidates.len(),
            "structural candidate filtering done"
        );

        let tiler = GreedyStringTiler::new(self.minimum_tile_size);
        let threshold = self.similarity_threshold / 100.0;
        let mut clones = Vec::new();

        for (first, second) in candidates {
            let slice_a = block_token_slice(&blocks[first], files);
            let slice_b = block_token_slice(&blocks[second], files);
            let similarity = tiler.similarity(slice_a, slice_b);

            if similarity < threshold {
                continue;
            }

            let pair = IndexedBlockPair {
                block_a: &blocks[first],
                block_b: &blocks[second],
            };

            if let Some(group) = build_block_group(
                CloneType::Type3,
                &pair,
                files,
                similarity,
                self.minimum_line_count,
            ) {
                clones.push(group);
            }
        }

        dedupe_subsumed(clones)
    }
}
