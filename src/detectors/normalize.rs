//! Token normalization and cross-language unification.
//!
//! Normalization reduces the token vocabulary to placeholders so that
//! renamed clones hash identically. Unification runs before normalization
//! and only in cross-language mode: it remaps known C-family surface syntax
//! (message sends, property access, collection type names) onto the common
//! vocabulary so the same idiom lexes to the same token run in both
//! languages.

use std::collections::HashMap;

use ahash::AHashSet;
use once_cell::sync::Lazy;

use crate::lang::tokens::{Token, TokenKind};

/// Maps raw tokens onto the reduced detection vocabulary.
///
/// Identifiers, type names, and literals become placeholders; keywords,
/// operators, and punctuation pass through. Kind and location are kept so
/// the normalized stream stays positionally aligned with the raw stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenNormalizer;

impl TokenNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, tokens: &[Token]) -> Vec<Token> {
        tokens
            .iter()
            .map(|token| match placeholder(token.kind) {
                Some(text) => Token::new(token.kind, text, token.location.clone()),
                None => token.clone(),
            })
            .collect()
    }
}

fn placeholder(kind: TokenKind) -> Option<&'static str> {
    match kind {
        TokenKind::Identifier => Some("$ID"),
        TokenKind::TypeName => Some("$TYPE"),
        TokenKind::IntegerLiteral | TokenKind::FloatingLiteral => Some("$NUM"),
        TokenKind::StringLiteral => Some("$STR"),
        TokenKind::Keyword | TokenKind::Operator | TokenKind::Punctuation => None,
    }
}

static COLLECTION_TYPES: Lazy<AHashSet<&'static str>> = Lazy::new(|| {
    [
        "Array",
        "NSArray",
        "NSMutableArray",
        "Dictionary",
        "NSDictionary",
        "NSMutableDictionary",
        "Set",
        "NSSet",
        "NSMutableSet",
        "NSOrderedSet",
        "NSMutableOrderedSet",
    ]
    .into_iter()
    .collect()
});

static TYPE_MAPPINGS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("NSString", "String"),
        ("NSMutableString", "String"),
        ("NSInteger", "Int"),
        ("NSUInteger", "Int"),
        ("CGFloat", "Int"),
        ("NSObject", "AnyObject"),
        ("BOOL", "Bool"),
        ("id", "AnyObject"),
    ]
    .into_iter()
    .collect()
});

static KEYWORD_MAPPINGS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("YES", "true"),
        ("NO", "false"),
        ("@interface", "class"),
        ("@implementation", "class"),
        ("@property", "var"),
    ]
    .into_iter()
    .collect()
});

/// Rewrites C-family/Objective-C token streams onto the unified vocabulary.
///
/// Runs in a single left-to-right pass with no backtracking; every rewrite
/// consumes a fixed number of input tokens and the scan resumes right after.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnifiedTokenMapper;

impl UnifiedTokenMapper {
    pub fn new() -> Self {
        Self
    }

    pub fn map(&self, tokens: &[Token]) -> Vec<Token> {
        let type_mapped: Vec<Token> = tokens.iter().map(map_token).collect();
        normalize_patterns(&type_mapped)
    }
}

fn map_token(token: &Token) -> Token {
    match mapping(token) {
        Some((kind, text)) => Token::new(kind, text, token.location.clone()),
        None => token.clone(),
    }
}

fn mapping(token: &Token) -> Option<(TokenKind, &'static str)> {
    match token.kind {
        TokenKind::TypeName => {
            if COLLECTION_TYPES.contains(token.text.as_str()) {
                return Some((TokenKind::Identifier, "$COLLECTION_TYPE"));
            }

            TYPE_MAPPINGS
                .get(token.text.as_str())
                .map(|text| (TokenKind::TypeName, *text))
        }

        TokenKind::Keyword => KEYWORD_MAPPINGS
            .get(token.text.as_str())
            .map(|text| (TokenKind::Keyword, *text)),

        _ => None,
    }
}

fn normalize_patterns(tokens: &[Token]) -> Vec<Token> {
    let mut result = Vec::with_capacity(tokens.len());
    let mut index = 0;

    while index < tokens.len() {
        if let Some(consumed) = try_message_send(tokens, index, &mut result) {
            index += consumed;
            continue;
        }

        if let Some(consumed) = try_function_call(tokens, index, &mut result) {
            index += consumed;
            continue;
        }

        if let Some(consumed) = try_property_access(tokens, index, &mut result) {
            index += consumed;
            continue;
        }

        result.push(tokens[index].clone());
        index += 1;
    }

    result
}

fn is_punctuation(token: &Token, text: &str) -> bool {
    token.kind == TokenKind::Punctuation && token.text == text
}

// `[ receiver selector: arg ... ]` collapses to `$CALL` plus the argument
// tokens; `[ receiver property ]` collapses to `$ACCESS`.
fn try_message_send(tokens: &[Token], index: usize, result: &mut Vec<Token>) -> Option<usize> {
    if index + 3 >= tokens.len()
        || !is_punctuation(&tokens[index], "[")
        || tokens[index + 1].kind != TokenKind::Identifier
        || tokens[index + 2].kind != TokenKind::Identifier
    {
        return None;
    }

    let location = tokens[index].location.clone();
    let (has_colon, closing_index) = scan_bracketed_region(tokens, index + 3);

    if has_colon {
        let closing = closing_index?;

        result.push(Token::new(TokenKind::Identifier, "$CALL", location));

        for token in &tokens[index + 3..closing] {
            if !is_punctuation(token, ":") && !is_punctuation(token, "]") {
                result.push(token.clone());
            }
        }

        return Some(closing - index + 1);
    }

    if !is_punctuation(&tokens[index + 3], "]") {
        return None;
    }

    result.push(Token::new(TokenKind::Identifier, "$ACCESS", location));
    Some(4)
}

fn scan_bracketed_region(tokens: &[Token], start: usize) -> (bool, Option<usize>) {
    let mut depth = 1;
    let mut index = start;
    let mut found_colon = false;

    while index < tokens.len() && depth > 0 {
        let token = &tokens[index];

        if is_punctuation(token, "[") {
            depth += 1;
        } else if is_punctuation(token, "]") {
            depth -= 1;

            if depth == 0 {
                return (found_colon, Some(index));
            }
        } else if depth == 1 && is_punctuation(token, ":") {
            found_colon = true;
        }

        index += 1;
    }

    (found_colon, None)
}

// `name(` collapses the name to `$CALL`; the parenthesis stays.
fn try_function_call(tokens: &[Token], index: usize, result: &mut Vec<Token>) -> Option<usize> {
    if index + 1 >= tokens.len()
        || tokens[index].kind != TokenKind::Identifier
        || tokens[index].text == "$COLLECTION_TYPE"
        || !is_punctuation(&tokens[index + 1], "(")
    {
        return None;
    }

    result.push(Token::new(
        TokenKind::Identifier,
        "$CALL",
        tokens[index].location.clone(),
    ));
    result.push(tokens[index + 1].clone());
    Some(2)
}

// `a.b` with no trailing `(` collapses to `$ACCESS`.
fn try_property_access(tokens: &[Token], index: usize, result: &mut Vec<Token>) -> Option<usize> {
    if index + 2 >= tokens.len()
        || tokens[index].kind != TokenKind::Identifier
        || !is_punctuation(&tokens[index + 1], ".")
        || tokens[index + 2].kind != TokenKind::Identifier
    {
        return None;
    }

    let followed_by_paren = index + 3 < tokens.len() && is_punctuation(&tokens[index + 3], "(");

    if followed_by_paren {
        return None;
    }

    result.push(Token::new(
        TokenKind::Identifier,
        "$ACCESS",
        tokens[index].location.clone(),
    ));
    Some(3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::tokens::SourceLocation;

    fn token(kind: TokenKind, text: &str) -> Token {
        Token::new(kind, text, SourceLocation::new("test.m", 1, 1))
    }

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|token| token.text.as_str()).collect()
    }

    #[test]
    fn normalizer_reduces_vocabulary() {
        let tokens = vec![
            token(TokenKind::Keyword, "let"),
            token(TokenKind::Identifier, "total"),
            token(TokenKind::Operator, "="),
            token(TokenKind::IntegerLiteral, "42"),
            token(TokenKind::StringLiteral, "hi"),
            token(TokenKind::TypeName, "Int"),
        ];

        let normalized = TokenNormalizer::new().normalize(&tokens);

        assert_eq!(
            texts(&normalized),
            vec!["let", "$ID", "=", "$NUM", "$STR", "$TYPE"]
        );
        assert_eq!(normalized.len(), tokens.len());
        assert_eq!(normalized[1].kind, TokenKind::Identifier);
        assert_eq!(normalized[1].location, tokens[1].location);
    }

    #[test]
    fn mapper_remaps_known_types_and_keywords() {
        let tokens = vec![
            token(TokenKind::TypeName, "NSString"),
            token(TokenKind::Keyword, "YES"),
            token(TokenKind::TypeName, "NSArray"),
        ];

        let mapped = UnifiedTokenMapper::new().map(&tokens);

        assert_eq!(texts(&mapped), vec!["String", "true", "$COLLECTION_TYPE"]);
        assert_eq!(mapped[2].kind, TokenKind::Identifier);
    }

    #[test]
    fn message_send_with_arguments_becomes_call() {
        // [formatter stringFromNumber: value]
        let tokens = vec![
            token(TokenKind::Punctuation, "["),
            token(TokenKind::Identifier, "formatter"),
            token(TokenKind::Identifier, "stringFromNumber"),
            token(TokenKind::Punctuation, ":"),
            token(TokenKind::Identifier, "value"),
            token(TokenKind::Punctuation, "]"),
        ];

        let mapped = UnifiedTokenMapper::new().map(&tokens);

        assert_eq!(texts(&mapped), vec!["$CALL", "value"]);
    }

    #[test]
    fn message_send_without_colon_becomes_access() {
        // [user name]
        let tokens = vec![
            token(TokenKind::Punctuation, "["),
            token(TokenKind::Identifier, "user"),
            token(TokenKind::Identifier, "name"),
            token(TokenKind::Punctuation, "]"),
        ];

        let mapped = UnifiedTokenMapper::new().map(&tokens);

        assert_eq!(texts(&mapped), vec!["$ACCESS"]);
    }

    #[test]
    fn call_expression_collapses_name_only() {
        let tokens = vec![
            token(TokenKind::Identifier, "compute"),
            token(TokenKind::Punctuation, "("),
            token(TokenKind::Identifier, "x"),
            token(TokenKind::Punctuation, ")"),
        ];

        let mapped = UnifiedTokenMapper::new().map(&tokens);

        assert_eq!(texts(&mapped), vec!["$CALL", "(", "x", ")"]);
    }

    #[test]
    fn property_chain_collapses_unless_called() {
        let access = vec![
            token(TokenKind::Identifier, "user"),
            token(TokenKind::Punctuation, "."),
            token(TokenKind::Identifier, "name"),
            token(TokenKind::Punctuation, ";"),
        ];
        let call = vec![
            token(TokenKind::Identifier, "user"),
            token(TokenKind::Punctuation, "."),
            token(TokenKind::Identifier, "reload"),
            token(TokenKind::Punctuation, "("),
        ];

        let mapper = UnifiedTokenMapper::new();

        assert_eq!(texts(&mapper.map(&access)), vec!["$ACCESS", ";"]);
        // method call keeps the member and rewrites it as a call instead
        assert_eq!(texts(&mapper.map(&call)), vec!["user", ".", "$CALL", "("]);
    }
}
