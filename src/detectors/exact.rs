//! Exact and near-exact clone detection (Types 1 and 2).
//!
//! A polynomial rolling hash proposes candidate windows, candidates are
//! verified token-by-token (collisions are never trusted), verified pairs
//! are grown to their maximal matching region, and the raw token text of
//! the grown region decides between Type 1 (identical) and Type 2
//! (renamed-only).

use ahash::AHashMap;

use crate::core::results::{
    fragment_from_tokens, pair_line_count, CloneGroup, CloneType,
};
use crate::detectors::rolling_hash::RollingHash;
use crate::lang::tokens::{FileTokens, Token};

/// Window start position within the analysis batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TokenPosition {
    file_index: usize,
    offset: usize,
}

#[derive(Debug, Clone, Copy)]
struct ClonePair {
    position_a: TokenPosition,
    position_b: TokenPosition,
    token_count: usize,
}

#[derive(Debug, Clone, Copy)]
struct ClassifiedPair {
    clone_type: CloneType,
    position_a: TokenPosition,
    position_b: TokenPosition,
    token_count: usize,
}

/// Rolling-hash based detector for Type-1/Type-2 clones.
#[derive(Debug, Clone, Copy)]
pub struct ExactCloneDetector {
    minimum_token_count: usize,
    minimum_line_count: usize,
    rolling_hash: RollingHash,
}

impl ExactCloneDetector {
    pub fn new(minimum_token_count: usize, minimum_line_count: usize) -> Self {
        Self {
            minimum_token_count,
            minimum_line_count,
            rolling_hash: RollingHash::new(),
        }
    }

    pub fn detect(&self, files: &[FileTokens]) -> Vec<CloneGroup> {
        let candidates = self.find_candidates(files);
        let verified = self.verify_candidates(&candidates, files);
        let expanded = self.expand_regions(&verified, files);
        let classified = self.classify_pairs(&expanded, files);
        let deduplicated = self.deduplicate_pairs(&classified);

        deduplicated
            .iter()
            .map(|pair| self.build_group(pair, files))
            .filter(|group| group.line_count >= self.minimum_line_count)
            .collect()
    }

    // Hash every window of `minimum_token_count` normalized tokens; keep
    // buckets with more than one occurrence, in ascending hash order so
    // the later keep-first dedup is deterministic.
    fn find_candidates(&self, files: &[FileTokens]) -> Vec<(u64, Vec<TokenPosition>)> {
        let mut table: AHashMap<u64, Vec<TokenPosition>> = AHashMap::new();
        let window = self.minimum_token_count;
        let highest_power = self.rolling_hash.power(window);

        for (file_index, file_tokens) in files.iter().enumerate() {
            let tokens = &file_tokens.normalized_tokens;

            if tokens.len() < window {
                continue;
            }

            let mut current = self.rolling_hash.hash(tokens, 0, window);
            table
                .entry(current)
                .or_default()
                .push(TokenPosition { file_index, offset: 0 });

            for offset in 1..=(tokens.len() - window) {
                current = self.rolling_hash.rolling_update(
                    current,
                    &tokens[offset - 1],
                    &tokens[offset + window - 1],
                    highest_power,
                );

                table
                    .entry(current)
                    .or_default()
                    .push(TokenPosition { file_index, offset });
            }
        }

        let mut buckets: Vec<(u64, Vec<TokenPosition>)> = table
            .into_iter()
            .filter(|(_, positions)| positions.len() > 1)
            .collect();
        buckets.sort_by_key(|(hash, _)| *hash);
        buckets
    }

    fn verify_candidates(
        &self,
        candidates: &[(u64, Vec<TokenPosition>)],
        files: &[FileTokens],
    ) -> Vec<ClonePair> {
        let mut pairs = Vec::new();

        for (_, positions) in candidates {
            for first in 0..positions.len() {
                for second in (first + 1)..positions.len() {
                    let position_a = positions[first];
                    let position_b = positions[second];

                    if self.is_self_overlap(position_a, position_b) {
                        continue;
                    }

                    let tokens_a = &files[position_a.file_index].normalized_tokens;
                    let tokens_b = &files[position_b.file_index].normalized_tokens;

                    if tokens_match(
                        tokens_a,
                        position_a.offset,
                        tokens_b,
                        position_b.offset,
                        self.minimum_token_count,
                    ) {
                        pairs.push(ClonePair {
                            position_a,
                            position_b,
                            token_count: self.minimum_token_count,
                        });
                    }
                }
            }
        }

        pairs
    }

    // Grow each verified pair in both directions while the normalized text
    // keeps matching; the result is the maximal matching region.
    fn expand_regions(&self, pairs: &[ClonePair], files: &[FileTokens]) -> Vec<ClonePair> {
        pairs
            .iter()
            .map(|pair| {
                let tokens_a = &files[pair.position_a.file_index].normalized_tokens;
                let tokens_b = &files[pair.position_b.file_index].normalized_tokens;

                let mut start_a = pair.position_a.offset;
                let mut start_b = pair.position_b.offset;
                let mut end_a = start_a + pair.token_count;
                let mut end_b = start_b + pair.token_count;

                while start_a > 0
                    && start_b > 0
                    && tokens_a[start_a - 1].text == tokens_b[start_b - 1].text
                {
                    start_a -= 1;
                    start_b -= 1;
                }

                while end_a < tokens_a.len()
                    && end_b < tokens_b.len()
                    && tokens_a[end_a].text == tokens_b[end_b].text
                {
                    end_a += 1;
                    end_b += 1;
                }

                ClonePair {
                    position_a: TokenPosition {
                        file_index: pair.position_a.file_index,
                        offset: start_a,
                    },
                    position_b: TokenPosition {
                        file_index: pair.position_b.file_index,
                        offset: start_b,
                    },
                    token_count: end_a - start_a,
                }
            })
            .collect()
    }

    // Raw-text equality over the expanded region decides the clone type.
    fn classify_pairs(&self, pairs: &[ClonePair], files: &[FileTokens]) -> Vec<ClassifiedPair> {
        pairs
            .iter()
            .map(|pair| {
                let raw_a = &files[pair.position_a.file_index].tokens;
                let raw_b = &files[pair.position_b.file_index].tokens;

                let exact = tokens_match(
                    raw_a,
                    pair.position_a.offset,
                    raw_b,
                    pair.position_b.offset,
                    pair.token_count,
                );

                ClassifiedPair {
                    clone_type: if exact { CloneType::Type1 } else { CloneType::Type2 },
                    position_a: pair.position_a,
                    position_b: pair.position_b,
                    token_count: pair.token_count,
                }
            })
            .collect()
    }

    // Keep-first dedup over token ranges: a new pair is dropped when it
    // contains, or is contained by, an already-kept pair on both sides.
    fn deduplicate_pairs(&self, pairs: &[ClassifiedPair]) -> Vec<ClassifiedPair> {
        let mut unique: Vec<ClassifiedPair> = Vec::new();

        for pair in pairs {
            let duplicate = unique
                .iter()
                .any(|existing| is_subsumed(pair, existing) || is_subsumed(existing, pair));

            if !duplicate {
                unique.push(*pair);
            }
        }

        unique
    }

    fn is_self_overlap(&self, position_a: TokenPosition, position_b: TokenPosition) -> bool {
        if position_a.file_index != position_b.file_index {
            return false;
        }

        position_a.offset.abs_diff(position_b.offset) < self.minimum_token_count
    }

    fn build_group(&self, pair: &ClassifiedPair, files: &[FileTokens]) -> CloneGroup {
        let file_a = &files[pair.position_a.file_index];
        let file_b = &files[pair.position_b.file_index];

        let fragment_a = fragment_from_tokens(
            &file_a.file,
            &file_a.tokens,
            pair.position_a.offset,
            pair.position_a.offset + pair.token_count - 1,
        );
        let fragment_b = fragment_from_tokens(
            &file_b.file,
            &file_b.tokens,
            pair.position_b.offset,
            pair.position_b.offset + pair.token_count - 1,
        );

        let line_count = pair_line_count(&fragment_a, &fragment_b);

        CloneGroup {
            clone_type: pair.clone_type,
            token_count: pair.token_count,
            line_count,
            similarity: 100.0,
            fragments: vec![fragment_a, fragment_b],
        }
    }
}

fn tokens_match(
    tokens_a: &[Token],
    offset_a: usize,
    tokens_b: &[Token],
    offset_b: usize,
    count: usize,
) -> bool {
    (0..count).all(|index| tokens_a[offset_a + index].text == tokens_b[offset_b + index].text)
}

fn is_subsumed(pair: &ClassifiedPair, other: &ClassifiedPair) -> bool {
    let pair_end_a = pair.position_a.offset + pair.token_count;
    let pair_end_b = pair.position_b.offset + pair.token_count;
    let other_end_a = other.position_a.offset + other.token_count;
    let other_end_b = other.position_b.offset + other.token_count;

    let a_subsumed = pair.position_a.file_index == other.position_a.file_index
        && pair.position_a.offset >= other.position_a.offset
        && pair_end_a <= other_end_a;

    let b_subsumed = pair.position_b.file_index == other.position_b.file_index
        && pair.position_b.offset >= other.position_b.offset
        && pair_end_b <= other_end_b;

    a_subsumed && b_subsumed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::normalize::TokenNormalizer;
    use crate::lang::tokens::{SourceLocation, TokenKind};

    fn file_tokens(file: &str, tokens: Vec<Token>) -> FileTokens {
        let normalized = TokenNormalizer::new().normalize(&tokens);
        FileTokens::new(file, "", tokens, normalized)
    }

    fn statement_tokens(file: &str, name: &str, value: &str, second: &str) -> Vec<Token> {
        // `let <name> = <value> ; var <second>` — six tokens on one line
        let words: [(&str, TokenKind); 6] = [
            ("let", TokenKind::Keyword),
            (name, TokenKind::Identifier),
            ("=", TokenKind::Operator),
            (value, TokenKind::IntegerLiteral),
            (";", TokenKind::Punctuation),
            ("var", TokenKind::Keyword),
        ];

        words
            .iter()
            .enumerate()
            .map(|(index, (text, kind))| {
                Token::new(*kind, *text, SourceLocation::new(file, 1, index * 4 + 1))
            })
            .chain(std::iter::once(Token::new(
                TokenKind::Identifier,
                second,
                SourceLocation::new(file, 1, 25),
            )))
            .collect()
    }

    #[test]
    fn identical_files_form_a_type1_group() {
        let files = vec![
            file_tokens("a.swift", statement_tokens("a.swift", "x", "1", "y")),
            file_tokens("b.swift", statement_tokens("b.swift", "x", "1", "y")),
        ];

        let detector = ExactCloneDetector::new(3, 1);
        let groups = detector.detect(&files);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].clone_type, CloneType::Type1);
        assert_eq!(groups[0].token_count, 7);
        assert_eq!(groups[0].similarity, 100.0);
        assert_eq!(groups[0].fragments.len(), 2);
    }

    #[test]
    fn renamed_files_form_a_type2_group() {
        let files = vec![
            file_tokens("a.swift", statement_tokens("a.swift", "x", "1", "y")),
            file_tokens("b.swift", statement_tokens("b.swift", "count", "9", "total")),
        ];

        let detector = ExactCloneDetector::new(3, 1);
        let groups = detector.detect(&files);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].clone_type, CloneType::Type2);
        assert_eq!(groups[0].similarity, 100.0);
    }

    #[test]
    fn short_streams_produce_nothing() {
        let files = vec![
            file_tokens("a.swift", statement_tokens("a.swift", "x", "1", "y")),
            file_tokens("b.swift", statement_tokens("b.swift", "x", "1", "y")),
        ];

        let detector = ExactCloneDetector::new(50, 1);
        assert!(detector.detect(&files).is_empty());
    }

    #[test]
    fn self_overlapping_windows_are_skipped() {
        // One file with a repeating token; overlapping windows inside the
        // repetition must not pair with themselves.
        let tokens: Vec<Token> = (0..8)
            .map(|index| {
                Token::new(
                    TokenKind::Keyword,
                    "let",
                    SourceLocation::new("a.swift", 1, index + 1),
                )
            })
            .collect();
        let files = vec![file_tokens("a.swift", tokens)];

        let detector = ExactCloneDetector::new(4, 1);
        let groups = detector.detect(&files);

        // offsets 0 and 4 are exactly one window apart and expand to the
        // same maximal region, leaving a single group at most
        assert!(groups.len() <= 1);
    }

    #[test]
    fn detection_is_idempotent() {
        let files = vec![
            file_tokens("a.swift", statement_tokens("a.swift", "x", "1", "y")),
            file_tokens("b.swift", statement_tokens("b.swift", "x", "1", "y")),
        ];

        let detector = ExactCloneDetector::new(3, 1);
        let first = detector.detect(&files);
        let second = detector.detect(&files);

        assert_eq!(first, second);
    }
}
