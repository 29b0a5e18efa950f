//! Lexer for Swift sources.
//!
//! Swift has no grammar parser here; the same scanner machinery as the
//! C-family lexer runs with Swift vocabulary, and type names fall out of the
//! known-name table plus the uppercase-initial convention.

use ahash::AHashSet;
use once_cell::sync::Lazy;

use crate::lang::registry::Lexer;
use crate::lang::scanner::{Scanner, Vocabulary};
use crate::lang::tokens::Token;

static SWIFT_KEYWORDS: Lazy<AHashSet<&'static str>> = Lazy::new(|| {
    [
        "as",
        "associatedtype",
        "async",
        "await",
        "break",
        "case",
        "catch",
        "class",
        "continue",
        "convenience",
        "default",
        "defer",
        "deinit",
        "do",
        "else",
        "enum",
        "extension",
        "fallthrough",
        "false",
        "fileprivate",
        "final",
        "for",
        "func",
        "guard",
        "if",
        "import",
        "in",
        "indirect",
        "infix",
        "init",
        "inout",
        "internal",
        "is",
        "lazy",
        "let",
        "mutating",
        "nil",
        "nonmutating",
        "open",
        "operator",
        "override",
        "postfix",
        "precedencegroup",
        "prefix",
        "private",
        "protocol",
        "public",
        "repeat",
        "required",
        "rethrows",
        "return",
        "self",
        "Self",
        "some",
        "static",
        "struct",
        "subscript",
        "super",
        "switch",
        "throw",
        "throws",
        "true",
        "try",
        "typealias",
        "unowned",
        "var",
        "weak",
        "where",
        "while",
    ]
    .into_iter()
    .collect()
});

static KNOWN_TYPE_NAMES: Lazy<AHashSet<&'static str>> = Lazy::new(|| {
    [
        "String",
        "Int",
        "Int8",
        "Int16",
        "Int32",
        "Int64",
        "UInt",
        "Double",
        "Float",
        "Bool",
        "Character",
        "Array",
        "Dictionary",
        "Set",
        "Optional",
        "Any",
        "AnyObject",
        "Error",
        "Void",
        "Result",
    ]
    .into_iter()
    .collect()
});

static TWO_CHAR_OPERATORS: Lazy<AHashSet<&'static str>> = Lazy::new(|| {
    [
        "==", "!=", "<=", ">=", "&&", "||", "+=", "-=", "*=", "/=", "->", "<<", ">>",
    ]
    .into_iter()
    .collect()
});

static VOCABULARY: Lazy<Vocabulary> = Lazy::new(|| Vocabulary {
    keywords: &SWIFT_KEYWORDS,
    known_types: &KNOWN_TYPE_NAMES,
    at_keywords: None,
    two_char_operators: &TWO_CHAR_OPERATORS,
    skip_preprocessor: false,
    dollar_identifiers: true,
    char_literals: false,
});

/// Scanner-based lexer for `.swift` sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwiftLexer;

impl Lexer for SwiftLexer {
    fn tokenize(&self, source: &str, file: &str) -> Vec<Token> {
        Scanner::new(source, file, &VOCABULARY).tokenize()
    }
}
