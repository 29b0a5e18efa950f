//! Polynomial rolling hash over a sliding token window.
//!
//! Collisions are possible and expected; the exact-match engine verifies
//! every candidate by token text, so the hash only has to be cheap to roll.

use crate::lang::tokens::Token;

const BASE: u64 = 31;
const MODULUS: u64 = 1_000_000_007;

/// Rolling hash with O(1) per-shift updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct RollingHash;

impl RollingHash {
    pub fn new() -> Self {
        Self
    }

    /// Hash `count` tokens starting at `offset`, computed from scratch.
    pub fn hash(&self, tokens: &[Token], offset: usize, count: usize) -> u64 {
        let mut result: u64 = 0;

        for token in &tokens[offset..offset + count] {
            result = (result.wrapping_mul(BASE).wrapping_add(self.token_hash(token))) % MODULUS;
        }

        result
    }

    /// Shift the window one token to the right.
    ///
    /// `highest_power` must be `power(window_size)` for the window the hash
    /// was computed over.
    pub fn rolling_update(
        &self,
        hash: u64,
        removing: &Token,
        adding: &Token,
        highest_power: u64,
    ) -> u64 {
        let mut result = hash;
        let remove_value = (self.token_hash(removing).wrapping_mul(highest_power)) % MODULUS;

        if result >= remove_value {
            result -= remove_value;
        } else {
            result = MODULUS - (remove_value - result);
        }

        (result.wrapping_mul(BASE).wrapping_add(self.token_hash(adding))) % MODULUS
    }

    /// `BASE^(window_size - 1) mod MODULUS`, the scale of the oldest token.
    pub fn power(&self, window_size: usize) -> u64 {
        let mut result: u64 = 1;

        for _ in 0..window_size.saturating_sub(1) {
            result = result.wrapping_mul(BASE) % MODULUS;
        }

        result
    }

    // djb2 over the token text, reduced into the hash field.
    fn token_hash(&self, token: &Token) -> u64 {
        let mut result: u64 = 5381;

        for byte in token.text.bytes() {
            result = (result << 5).wrapping_add(result).wrapping_add(u64::from(byte));
        }

        result % MODULUS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::tokens::{SourceLocation, TokenKind};
    use proptest::prelude::*;

    fn token(text: &str) -> Token {
        Token::new(
            TokenKind::Identifier,
            text,
            SourceLocation::new("test.swift", 1, 1),
        )
    }

    fn tokens_from(words: &[&str]) -> Vec<Token> {
        words.iter().map(|word| token(word)).collect()
    }

    #[test]
    fn identical_windows_hash_equal() {
        let hasher = RollingHash::new();
        let tokens = tokens_from(&["let", "x", "=", "let", "x", "="]);

        assert_eq!(hasher.hash(&tokens, 0, 3), hasher.hash(&tokens, 3, 3));
    }

    #[test]
    fn different_windows_hash_differently() {
        let hasher = RollingHash::new();
        let tokens = tokens_from(&["let", "x", "=", "var", "y", "+"]);

        assert_ne!(hasher.hash(&tokens, 0, 3), hasher.hash(&tokens, 3, 3));
    }

    #[test]
    fn rolling_update_matches_recomputation() {
        let hasher = RollingHash::new();
        let tokens = tokens_from(&["a", "b", "c", "d", "e", "f", "g"]);
        let window = 3;
        let highest_power = hasher.power(window);

        let mut rolled = hasher.hash(&tokens, 0, window);

        for offset in 1..=(tokens.len() - window) {
            rolled = hasher.rolling_update(
                rolled,
                &tokens[offset - 1],
                &tokens[offset + window - 1],
                highest_power,
            );

            assert_eq!(rolled, hasher.hash(&tokens, offset, window));
        }
    }

    proptest! {
        #[test]
        fn rolling_pass_agrees_with_direct_hash(
            words in prop::collection::vec("[a-z]{1,6}", 4..32),
            window in 2usize..4,
        ) {
            prop_assume!(words.len() > window);

            let hasher = RollingHash::new();
            let tokens: Vec<Token> = words.iter().map(|word| token(word)).collect();
            let highest_power = hasher.power(window);
            let mut rolled = hasher.hash(&tokens, 0, window);

            for offset in 1..=(tokens.len() - window) {
                rolled = hasher.rolling_update(
                    rolled,
                    &tokens[offset - 1],
                    &tokens[offset + window - 1],
                    highest_power,
                );

                prop_assert_eq!(rolled, hasher.hash(&tokens, offset, window));
            }
        }
    }
}
