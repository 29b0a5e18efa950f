//! Lexer for C and Objective-C sources.

use ahash::AHashSet;
use once_cell::sync::Lazy;

use crate::lang::registry::Lexer;
use crate::lang::scanner::{Scanner, Vocabulary};
use crate::lang::tokens::Token;

static C_KEYWORDS: Lazy<AHashSet<&'static str>> = Lazy::new(|| {
    [
        "if", "else", "for", "while", "switch", "case", "return", "break", "continue", "do",
        "typedef", "struct", "enum", "union", "void", "int", "float", "double", "char", "long",
        "short", "unsigned", "signed", "const", "static", "extern", "sizeof", "goto", "default",
        "volatile", "register", "auto", "inline", "true", "false",
        // Objective-C additions
        "nil", "YES", "NO", "self", "super",
    ]
    .into_iter()
    .collect()
});

static OBJC_AT_KEYWORDS: Lazy<AHashSet<&'static str>> = Lazy::new(|| {
    [
        "@interface",
        "@implementation",
        "@property",
        "@synthesize",
        "@end",
        "@protocol",
        "@selector",
        "@class",
        "@optional",
        "@required",
        "@dynamic",
        "@encode",
        "@synchronized",
        "@autoreleasepool",
        "@try",
        "@catch",
        "@finally",
        "@throw",
    ]
    .into_iter()
    .collect()
});

static KNOWN_TYPE_NAMES: Lazy<AHashSet<&'static str>> = Lazy::new(|| {
    [
        "NSArray",
        "NSMutableArray",
        "NSString",
        "NSMutableString",
        "NSDictionary",
        "NSMutableDictionary",
        "NSNumber",
        "NSObject",
        "NSInteger",
        "NSUInteger",
        "CGFloat",
        "BOOL",
        "id",
        "NSSet",
        "NSMutableSet",
        "NSData",
        "NSMutableData",
        "NSError",
        "NSURL",
        "NSDate",
        "NSValue",
        "NSNull",
    ]
    .into_iter()
    .collect()
});

static TWO_CHAR_OPERATORS: Lazy<AHashSet<&'static str>> = Lazy::new(|| {
    [
        "==", "!=", "<=", ">=", "&&", "||", "++", "--", "+=", "-=", "*=", "/=", "->", "<<", ">>",
    ]
    .into_iter()
    .collect()
});

static VOCABULARY: Lazy<Vocabulary> = Lazy::new(|| Vocabulary {
    keywords: &C_KEYWORDS,
    known_types: &KNOWN_TYPE_NAMES,
    at_keywords: Some(&OBJC_AT_KEYWORDS),
    two_char_operators: &TWO_CHAR_OPERATORS,
    skip_preprocessor: true,
    dollar_identifiers: false,
    char_literals: true,
});

/// Scanner-based lexer for `.c`/`.h`/`.m`/`.mm`/`.cpp` sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct CFamilyLexer;

impl Lexer for CFamilyLexer {
    fn tokenize(&self, source: &str, file: &str) -> Vec<Token> {
        Scanner::new(source, file, &VOCABULARY).tokenize()
    }
}
