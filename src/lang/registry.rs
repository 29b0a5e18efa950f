//! Language registry: maps source paths onto lexers.

use std::path::Path;

use crate::lang::c_family::CFamilyLexer;
use crate::lang::swift::SwiftLexer;
use crate::lang::tokens::Token;

/// A per-language lexer.
///
/// Implementations must be deterministic and total: unparsable input yields
/// a best-effort token list, never an error.
pub trait Lexer: Send + Sync {
    fn tokenize(&self, source: &str, file: &str) -> Vec<Token>;
}

static SWIFT_LEXER: SwiftLexer = SwiftLexer;
static C_FAMILY_LEXER: CFamilyLexer = CFamilyLexer;

/// Pick the lexer for a file path by extension.
///
/// Everything that is not Swift lexes through the C-family scanner, which
/// degrades gracefully on unknown syntax.
pub fn lexer_for_path(path: &str) -> &'static dyn Lexer {
    let extension = Path::new(path)
        .extension()
        .and_then(|extension| extension.to_str())
        .unwrap_or_default();

    if extension == "swift" {
        &SWIFT_LEXER
    } else {
        &C_FAMILY_LEXER
    }
}

/// Tokenize a source text with the lexer its path selects.
pub fn tokenize_source(source: &str, file: &str) -> Vec<Token> {
    lexer_for_path(file).tokenize(source, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::tokens::TokenKind;

    #[test]
    fn swift_paths_use_the_swift_lexer() {
        let tokens = tokenize_source("guard let x = y else { return }", "a.swift");
        assert_eq!(tokens[0].kind, TokenKind::Keyword);
        assert_eq!(tokens[0].text, "guard");
    }

    #[test]
    fn objc_paths_use_the_c_family_lexer() {
        let tokens = tokenize_source("@interface Foo\n@end", "a.m");
        assert_eq!(tokens[0].text, "@interface");
        assert_eq!(tokens[0].kind, TokenKind::Keyword);
    }
}
