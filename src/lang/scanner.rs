//! Shared character-level scanner behind both lexers.
//!
//! The scanner is total: any input produces a best-effort token stream and
//! unrecognized characters are skipped. Language differences live entirely
//! in the [`Vocabulary`] each lexer supplies.

use ahash::AHashSet;

use crate::lang::tokens::{SourceLocation, Token, TokenKind};

/// Language-specific tables and switches for the scanner.
pub struct Vocabulary {
    pub keywords: &'static AHashSet<&'static str>,
    pub known_types: &'static AHashSet<&'static str>,
    /// `@word` tokens recognized as keywords (Objective-C); `None` emits a
    /// bare `@` punctuation token instead.
    pub at_keywords: Option<&'static AHashSet<&'static str>>,
    pub two_char_operators: &'static AHashSet<&'static str>,
    /// Skip `#...` lines (C preprocessor).
    pub skip_preprocessor: bool,
    /// Allow `$` to start identifiers (`$0` closure shorthands).
    pub dollar_identifiers: bool,
    /// Single-quoted character literals lex as integer literals.
    pub char_literals: bool,
}

const OPERATOR_START: &[char] = &[
    '+', '-', '*', '/', '%', '=', '!', '<', '>', '&', '|', '^', '~',
];

const PUNCTUATION: &[char] = &['{', '}', '(', ')', '[', ']', ';', ',', '.', ':', '?'];

pub struct Scanner<'a> {
    chars: Vec<char>,
    file: &'a str,
    vocabulary: &'a Vocabulary,
    index: usize,
    line: usize,
    column: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &str, file: &'a str, vocabulary: &'a Vocabulary) -> Self {
        Self {
            chars: source.chars().collect(),
            file,
            vocabulary,
            index: 0,
            line: 1,
            column: 1,
        }
    }

    /// Drain the scanner into a token stream.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        while let Some(token) = self.next_token() {
            tokens.push(token);
        }

        tokens
    }

    fn next_token(&mut self) -> Option<Token> {
        loop {
            self.skip_whitespace_and_comments();

            let char = *self.chars.get(self.index)?;

            if char == '#' && self.vocabulary.skip_preprocessor {
                self.skip_to_line_end();
                continue;
            }

            if char == '@' {
                return Some(self.scan_at_keyword_or_string());
            }

            if char == '"' {
                return Some(self.scan_string(None));
            }

            if char == '\'' && self.vocabulary.char_literals {
                return Some(self.scan_char_literal());
            }

            if char == '`' {
                // backtick-quoted identifier: strip the quotes
                self.advance();
                continue;
            }

            if char.is_alphabetic()
                || char == '_'
                || (char == '$' && self.vocabulary.dollar_identifiers)
            {
                return Some(self.scan_identifier_or_keyword());
            }

            if char.is_ascii_digit() {
                return Some(self.scan_number());
            }

            if OPERATOR_START.contains(&char) {
                return Some(self.scan_operator());
            }

            if PUNCTUATION.contains(&char) {
                return Some(self.scan_punctuation());
            }

            self.advance();
        }
    }

    fn advance(&mut self) {
        if self.chars[self.index] == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        self.index += 1;
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.index + offset).copied()
    }

    fn at_end(&self) -> bool {
        self.index >= self.chars.len()
    }

    fn make_token(&self, kind: TokenKind, text: String, line: usize, column: usize) -> Token {
        Token::new(kind, text, SourceLocation::new(self.file, line, column))
    }
}

impl Scanner<'_> {
    fn skip_whitespace_and_comments(&mut self) {
        while !self.at_end() {
            let char = self.chars[self.index];

            if char.is_whitespace() {
                self.advance();
                continue;
            }

            if char == '/' {
                match self.peek(1) {
                    Some('/') => {
                        self.skip_to_line_end();
                        continue;
                    }
                    Some('*') => {
                        self.skip_block_comment();
                        continue;
                    }
                    _ => {}
                }
            }

            break;
        }
    }

    fn skip_to_line_end(&mut self) {
        while !self.at_end() && self.chars[self.index] != '\n' {
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) {
        self.advance();
        self.advance();

        while !self.at_end() {
            if self.chars[self.index] == '*' && self.peek(1) == Some('/') {
                self.advance();
                self.advance();
                return;
            }

            self.advance();
        }
    }
}

impl Scanner<'_> {
    fn scan_at_keyword_or_string(&mut self) -> Token {
        let start_line = self.line;
        let start_column = self.column;

        self.advance();

        if self.at_end() {
            return self.make_token(TokenKind::Punctuation, "@".into(), start_line, start_column);
        }

        if self.chars[self.index] == '"' {
            return self.scan_string(Some((start_line, start_column)));
        }

        if !self.chars[self.index].is_alphabetic() {
            return self.make_token(TokenKind::Punctuation, "@".into(), start_line, start_column);
        }

        let mut text = String::from("@");

        while !self.at_end() && is_word_char(self.chars[self.index]) {
            text.push(self.chars[self.index]);
            self.advance();
        }

        if let Some(at_keywords) = self.vocabulary.at_keywords {
            if at_keywords.contains(text.as_str()) {
                return self.make_token(TokenKind::Keyword, text, start_line, start_column);
            }
        }

        self.make_token(TokenKind::Punctuation, "@".into(), start_line, start_column)
    }

    fn scan_string(&mut self, start: Option<(usize, usize)>) -> Token {
        let (start_line, start_column) = start.unwrap_or((self.line, self.column));

        self.advance();

        let mut text = String::new();

        while !self.at_end() && self.chars[self.index] != '"' {
            if self.chars[self.index] == '\\' {
                self.advance();

                if !self.at_end() {
                    self.advance();
                }

                continue;
            }

            text.push(self.chars[self.index]);
            self.advance();
        }

        if !self.at_end() {
            self.advance();
        }

        self.make_token(TokenKind::StringLiteral, text, start_line, start_column)
    }

    fn scan_char_literal(&mut self) -> Token {
        let start_line = self.line;
        let start_column = self.column;

        self.advance();

        let mut text = String::new();

        while !self.at_end() && self.chars[self.index] != '\'' {
            if self.chars[self.index] == '\\' {
                self.advance();

                if !self.at_end() {
                    text.push(self.chars[self.index]);
                    self.advance();
                }

                continue;
            }

            text.push(self.chars[self.index]);
            self.advance();
        }

        if !self.at_end() {
            self.advance();
        }

        self.make_token(TokenKind::IntegerLiteral, text, start_line, start_column)
    }

    fn scan_identifier_or_keyword(&mut self) -> Token {
        let start_line = self.line;
        let start_column = self.column;
        let mut text = String::new();

        if self.chars[self.index] == '$' {
            text.push('$');
            self.advance();
        }

        while !self.at_end() && is_word_char(self.chars[self.index]) {
            text.push(self.chars[self.index]);
            self.advance();
        }

        let kind = self.classify_word(&text);
        self.make_token(kind, text, start_line, start_column)
    }

    fn classify_word(&self, text: &str) -> TokenKind {
        if self.vocabulary.keywords.contains(text) {
            return TokenKind::Keyword;
        }

        if self.vocabulary.known_types.contains(text) {
            return TokenKind::TypeName;
        }

        if text.chars().next().is_some_and(|first| first.is_uppercase()) {
            return TokenKind::TypeName;
        }

        TokenKind::Identifier
    }

    fn scan_number(&mut self) -> Token {
        let start_line = self.line;
        let start_column = self.column;
        let mut text = String::new();
        let mut is_float = false;

        if self.chars[self.index] == '0' && matches!(self.peek(1), Some('x') | Some('X')) {
            text.push(self.chars[self.index]);
            self.advance();
            text.push(self.chars[self.index]);
            self.advance();

            while !self.at_end() && self.chars[self.index].is_ascii_hexdigit() {
                text.push(self.chars[self.index]);
                self.advance();
            }

            return self.make_token(TokenKind::IntegerLiteral, text, start_line, start_column);
        }

        while !self.at_end() && self.chars[self.index].is_ascii_digit() {
            text.push(self.chars[self.index]);
            self.advance();
        }

        if !self.at_end()
            && self.chars[self.index] == '.'
            && self.peek(1).is_some_and(|next| next.is_ascii_digit())
        {
            is_float = true;
            text.push('.');
            self.advance();

            while !self.at_end() && self.chars[self.index].is_ascii_digit() {
                text.push(self.chars[self.index]);
                self.advance();
            }
        }

        if !self.at_end() && matches!(self.chars[self.index], 'e' | 'E') {
            is_float = true;
            text.push(self.chars[self.index]);
            self.advance();

            if !self.at_end() && matches!(self.chars[self.index], '+' | '-') {
                text.push(self.chars[self.index]);
                self.advance();
            }

            while !self.at_end() && self.chars[self.index].is_ascii_digit() {
                text.push(self.chars[self.index]);
                self.advance();
            }
        }

        self.skip_numeric_suffix();

        let kind = if is_float {
            TokenKind::FloatingLiteral
        } else {
            TokenKind::IntegerLiteral
        };

        self.make_token(kind, text, start_line, start_column)
    }

    fn skip_numeric_suffix(&mut self) {
        while !self.at_end() && matches!(self.chars[self.index], 'f' | 'F' | 'l' | 'L' | 'u' | 'U') {
            self.advance();
        }
    }

    fn scan_operator(&mut self) -> Token {
        let start_line = self.line;
        let start_column = self.column;
        let char = self.chars[self.index];

        if let Some(next) = self.peek(1) {
            let two_char: String = [char, next].iter().collect();

            if self.vocabulary.two_char_operators.contains(two_char.as_str()) {
                self.advance();
                self.advance();
                return self.make_token(TokenKind::Operator, two_char, start_line, start_column);
            }
        }

        self.advance();
        self.make_token(TokenKind::Operator, char.to_string(), start_line, start_column)
    }

    fn scan_punctuation(&mut self) -> Token {
        let start_line = self.line;
        let start_column = self.column;
        let char = self.chars[self.index];
        self.advance();
        self.make_token(TokenKind::Punctuation, char.to_string(), start_line, start_column)
    }
}

fn is_word_char(char: char) -> bool {
    char.is_alphanumeric() || char == '_'
}
