//! Greedy String Tiling over normalized token sequences.
//!
//! Each pass finds the longest contiguous matching run between unmarked
//! positions and marks every run that ties for longest; passes repeat until
//! no run of at least the minimum tile size remains.

use crate::lang::tokens::Token;

#[derive(Debug, Clone, Copy)]
struct TileMatch {
    start_a: usize,
    start_b: usize,
    length: usize,
}

#[derive(Debug)]
struct TilingState {
    marked_a: Vec<bool>,
    marked_b: Vec<bool>,
    total_covered: usize,
}

impl TilingState {
    fn new(size_a: usize, size_b: usize) -> Self {
        Self {
            marked_a: vec![false; size_a],
            marked_b: vec![false; size_b],
            total_covered: 0,
        }
    }
}

/// Tiling-based similarity between two token sequences.
#[derive(Debug, Clone, Copy)]
pub struct GreedyStringTiler {
    minimum_tile_size: usize,
}

impl GreedyStringTiler {
    pub fn new(minimum_tile_size: usize) -> Self {
        Self { minimum_tile_size }
    }

    /// `2·covered / (|A| + |B|)` after tiling; `0.0` when both are empty.
    pub fn similarity(&self, tokens_a: &[Token], tokens_b: &[Token]) -> f64 {
        let total_tokens = tokens_a.len() + tokens_b.len();

        if total_tokens == 0 {
            return 0.0;
        }

        let mut state = TilingState::new(tokens_a.len(), tokens_b.len());
        self.compute_tiles(tokens_a, tokens_b, &mut state);

        (2.0 * state.total_covered as f64) / total_tokens as f64
    }

    fn compute_tiles(&self, tokens_a: &[Token], tokens_b: &[Token], state: &mut TilingState) {
        loop {
            let matches = self.find_longest_matches(tokens_a, tokens_b, state);

            if !apply_matches(&matches, state) {
                break;
            }
        }
    }

    // All runs tying for the longest length this pass, at minimum tile size
    // or longer.
    fn find_longest_matches(
        &self,
        tokens_a: &[Token],
        tokens_b: &[Token],
        state: &TilingState,
    ) -> Vec<TileMatch> {
        let mut longest = self.minimum_tile_size;
        let mut matches: Vec<TileMatch> = Vec::new();

        for index_a in 0..tokens_a.len() {
            if state.marked_a[index_a] {
                continue;
            }

            for index_b in 0..tokens_b.len() {
                if state.marked_b[index_b] {
                    continue;
                }

                let length = match_length(tokens_a, tokens_b, index_a, index_b, state);

                if length > longest {
                    longest = length;
                    matches = vec![TileMatch {
                        start_a: index_a,
                        start_b: index_b,
                        length,
                    }];
                } else if length == longest {
                    matches.push(TileMatch {
                        start_a: index_a,
                        start_b: index_b,
                        length,
                    });
                }
            }
        }

        matches
    }
}

fn apply_matches(matches: &[TileMatch], state: &mut TilingState) -> bool {
    let mut applied = false;

    for tile in matches {
        if !can_apply(tile, state) {
            continue;
        }

        for offset in 0..tile.length {
            state.marked_a[tile.start_a + offset] = true;
            state.marked_b[tile.start_b + offset] = true;
        }

        state.total_covered += tile.length;
        applied = true;
    }

    applied
}

fn match_length(
    tokens_a: &[Token],
    tokens_b: &[Token],
    start_a: usize,
    start_b: usize,
    state: &TilingState,
) -> usize {
    let mut length = 0;
    let mut position_a = start_a;
    let mut position_b = start_b;

    while position_a < tokens_a.len()
        && position_b < tokens_b.len()
        && !state.marked_a[position_a]
        && !state.marked_b[position_b]
        && tokens_a[position_a].text == tokens_b[position_b].text
    {
        length += 1;
        position_a += 1;
        position_b += 1;
    }

    length
}

// Ties marked earlier in the same pass may have claimed these positions.
fn can_apply(tile: &TileMatch, state: &TilingState) -> bool {
    (0..tile.length)
        .all(|offset| !state.marked_a[tile.start_a + offset] && !state.marked_b[tile.start_b + offset])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::tokens::{SourceLocation, TokenKind};
    use approx::assert_relative_eq;

    fn tokens_from(words: &[&str]) -> Vec<Token> {
        words
            .iter()
            .enumerate()
            .map(|(index, word)| {
                Token::new(
                    TokenKind::Identifier,
                    *word,
                    SourceLocation::new("test.swift", 1, index + 1),
                )
            })
            .collect()
    }

    #[test]
    fn identical_sequences_are_fully_covered() {
        let tokens = tokens_from(&["a", "b", "c", "d", "e", "f"]);
        let tiler = GreedyStringTiler::new(5);

        assert_relative_eq!(tiler.similarity(&tokens, &tokens), 1.0);
    }

    #[test]
    fn disjoint_sequences_share_nothing() {
        let left = tokens_from(&["a", "b", "c", "d", "e"]);
        let right = tokens_from(&["v", "w", "x", "y", "z"]);
        let tiler = GreedyStringTiler::new(2);

        assert_relative_eq!(tiler.similarity(&left, &right), 0.0);
    }

    #[test]
    fn runs_below_tile_size_do_not_count() {
        let left = tokens_from(&["a", "b", "x", "c", "d"]);
        let right = tokens_from(&["a", "b", "y", "c", "d"]);
        let tiler = GreedyStringTiler::new(3);

        // only runs of length 2 exist
        assert_relative_eq!(tiler.similarity(&left, &right), 0.0);
    }

    #[test]
    fn insertions_reduce_but_keep_similarity() {
        let left = tokens_from(&["a", "b", "c", "d", "e", "f", "g", "h"]);
        let right = tokens_from(&["a", "b", "c", "d", "x", "e", "f", "g", "h"]);
        let tiler = GreedyStringTiler::new(3);

        // two tiles of 4 cover everything except the insertion
        let similarity = tiler.similarity(&left, &right);
        assert_relative_eq!(similarity, 16.0 / 17.0);
    }

    #[test]
    fn similarity_is_symmetric() {
        let left = tokens_from(&["a", "b", "c", "p", "q", "d", "e", "f"]);
        let right = tokens_from(&["a", "b", "c", "d", "e", "f", "r"]);
        let tiler = GreedyStringTiler::new(3);

        assert_relative_eq!(
            tiler.similarity(&left, &right),
            tiler.similarity(&right, &left)
        );
    }

    #[test]
    fn empty_sequences_have_zero_similarity() {
        let tokens = tokens_from(&[]);
        let tiler = GreedyStringTiler::new(5);

        assert_relative_eq!(tiler.similarity(&tokens, &tokens), 0.0);
    }
}
