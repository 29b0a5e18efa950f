//! Semantic clone detection (Type 4).
//!
//! Blocks that differ in surface form but implement the same control and
//! data flow are matched by combining behavior-signature similarity with
//! abstract-semantic-graph similarity.

pub mod graph;
pub mod signature;

use tracing::debug;

use crate::core::results::{dedupe_subsumed, CloneGroup, CloneType};
use crate::detectors::blocks::{build_block_group, extract_valid_blocks, IndexedBlock, IndexedBlockPair};
use crate::lang::structure;
use crate::lang::tokens::FileTokens;

use self::graph::{build_graph, graph_similarity, AbstractSemanticGraph};
use self::signature::{extract_signature, signature_similarity, BehaviorSignature};

// Pairs whose control-flow shapes differ in length beyond this ratio are
// skipped before any similarity is computed.
const CONTROL_FLOW_LENGTH_RATIO_CUTOFF: f64 = 0.3;

const GRAPH_WEIGHT: f64 = 0.6;
const BEHAVIOR_WEIGHT: f64 = 0.4;

struct SignedBlock {
    indexed: IndexedBlock,
    signature: BehaviorSignature,
    graph: AbstractSemanticGraph,
}

/// Behavior-signature plus semantic-graph detector for Type-4 clones.
#[derive(Debug, Clone, Copy)]
pub struct SemanticCloneDetector {
    semantic_similarity_threshold: f64,
    minimum_token_count: usize,
    minimum_line_count: usize,
}

impl SemanticCloneDetector {
    pub fn new(
        semantic_similarity_threshold: f64,
        minimum_token_count: usize,
        minimum_line_count: usize,
    ) -> Self {
        Self {
            semantic_similarity_threshold,
            minimum_token_count,
            minimum_line_count,
        }
    }

    pub fn detect(&self, files: &[FileTokens]) -> Vec<CloneGroup> {
        let signed_blocks = self.build_signed_blocks(files);
        let threshold = self.semantic_similarity_threshold / 100.0;
        let mut clones = Vec::new();

        let mut compared = 0usize;

        for first in 0..signed_blocks.len() {
            for second in (first + 1)..signed_blocks.len() {
                let block_a = &signed_blocks[first];
                let block_b = &signed_blocks[second];

                if !passes_pre_filter(&block_a.signature, &block_b.signature) {
                    continue;
                }

                compared += 1;

                let behavior = signature_similarity(&block_a.signature, &block_b.signature);
                let graph = graph_similarity(&block_a.graph, &block_b.graph);
                let combined = GRAPH_WEIGHT * graph + BEHAVIOR_WEIGHT * behavior;

                if combined < threshold {
                    continue;
                }

                let pair = IndexedBlockPair {
                    block_a: &block_a.indexed,
                    block_b: &block_b.indexed,
                };

                if let Some(group) = build_block_group(
                    CloneType::Type4,
                    &pair,
                    files,
                    combined,
                    self.minimum_line_count,
                ) {
                    clones.push(group);
                }
            }
        }

        debug!(
            blocks = signed_blocks.len(),
            compared, "semantic comparison done"
        );

        dedupe_subsumed(clones)
    }

    fn build_signed_blocks(&self, files: &[FileTokens]) -> Vec<SignedBlock> {
        extract_valid_blocks(files, self.minimum_token_count)
            .into_iter()
            .map(|indexed| {
                let events = structure::events(
                    &files[indexed.file_index].tokens,
                    indexed.block.start_line,
                    indexed.block.end_line,
                );

                SignedBlock {
                    signature: extract_signature(&events),
                    graph: build_graph(&events),
                    indexed,
                }
            })
            .collect()
    }
}

fn passes_pre_filter(signature_a: &BehaviorSignature, signature_b: &BehaviorSignature) -> bool {
    let length_a = signature_a.control_flow_shape.len();
    let length_b = signature_b.control_flow_shape.len();

    if length_a == 0 && length_b == 0 {
        return true;
    }

    let ratio = length_a.min(length_b) as f64 / length_a.max(length_b) as f64;
    ratio >= CONTROL_FLOW_LENGTH_RATIO_CUTOFF
}
