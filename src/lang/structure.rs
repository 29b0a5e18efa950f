//! Structural front end: body ranges and syntactic event streams.
//!
//! The detection engines never see language syntax directly. This module
//! walks a token stream and produces two feeds: the line ranges of
//! executable bodies (functions, initializers, accessors, closures) for
//! block extraction, and an ordered stream of tagged [`SyntacticEvent`]s
//! for the semantic engine. Engines pattern-match on event tags only.

use crate::lang::tokens::{Token, TokenKind};

/// Control-flow construct kinds, in the order they appear in a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlFlowKind {
    If,
    Guard,
    Switch,
    ForLoop,
    WhileLoop,
    RepeatLoop,
    DoCatch,
    Return,
    Throw,
    Break,
    Continue,
}

/// One tagged syntactic event in document order.
#[derive(Debug, Clone, PartialEq)]
pub enum SyntacticEvent {
    /// A control-flow construct. The flags refine conditionals: whether the
    /// condition contains an optional binding, whether it starts with a
    /// negation, and whether the governed body exits via return/throw.
    ControlFlow {
        kind: ControlFlowKind,
        has_optional_binding: bool,
        negated_condition: bool,
        body_exits: bool,
    },
    /// A function or method call with its callee name.
    Call { callee: String },
    /// A `let`/`var` binding; `literal_initializer` is set when the
    /// initializer is exactly one literal.
    Binding {
        name: String,
        literal_initializer: bool,
    },
    /// A reference to a name in expression position.
    Reference { name: String },
    /// A declared parameter with its annotated type, if one is named.
    Parameter {
        name: String,
        type_name: Option<String>,
    },
    /// A type name in annotation position.
    TypeAnnotation { name: String },
    /// A literal occurrence; `part_of_binding` marks literals inside a
    /// binding initializer.
    Literal { part_of_binding: bool },
}

fn is_punct(token: &Token, text: &str) -> bool {
    token.kind == TokenKind::Punctuation && token.text == text
}

fn is_keyword(token: &Token, text: &str) -> bool {
    token.kind == TokenKind::Keyword && token.text == text
}

/// Index of the matching `}` for the `{` at `open`.
fn match_braces(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;

    for (index, token) in tokens.iter().enumerate().skip(open) {
        if is_punct(token, "{") {
            depth += 1;
        } else if is_punct(token, "}") {
            depth -= 1;

            if depth == 0 {
                return Some(index);
            }
        }
    }

    None
}

fn match_parens(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;

    for (index, token) in tokens.iter().enumerate().skip(open) {
        if is_punct(token, "(") {
            depth += 1;
        } else if is_punct(token, ")") {
            depth -= 1;

            if depth == 0 {
                return Some(index);
            }
        }
    }

    None
}

// Find the `{` that opens a declaration body, scanning past the signature.
// Gives up at a statement boundary or the next declaration keyword.
fn find_body_open(tokens: &[Token], from: usize) -> Option<usize> {
    let mut depth = 0usize;

    for (index, token) in tokens.iter().enumerate().skip(from) {
        if is_punct(token, "(") || is_punct(token, "[") {
            depth += 1;
        } else if is_punct(token, ")") || is_punct(token, "]") {
            depth = depth.saturating_sub(1);
        } else if depth == 0 {
            if is_punct(token, "{") {
                return Some(index);
            }

            if is_punct(token, ";") || is_punct(token, "}") {
                return None;
            }

            if token.kind == TokenKind::Keyword
                && matches!(
                    token.text.as_str(),
                    "func" | "init" | "var" | "let" | "struct" | "class" | "enum" | "protocol"
                )
            {
                return None;
            }
        }
    }

    None
}

// A `{` opens a closure body when a plausible signature (`x in`,
// `(a, b) in`) precedes the `in` keyword right after it.
fn is_closure_head(tokens: &[Token], open: usize) -> bool {
    const SIGNATURE_SCAN_LIMIT: usize = 32;

    for token in tokens.iter().skip(open + 1).take(SIGNATURE_SCAN_LIMIT) {
        if is_keyword(token, "in") {
            return true;
        }

        let allowed = matches!(token.kind, TokenKind::Identifier | TokenKind::TypeName)
            || (token.kind == TokenKind::Punctuation
                && matches!(token.text.as_str(), "(" | ")" | "," | ":" | "[" | "]" | "?"))
            || (token.kind == TokenKind::Operator && token.text == "->");

        if !allowed {
            return false;
        }
    }

    false
}

const ACCESSOR_NAMES: &[&str] = &["get", "set", "willSet", "didSet"];

/// Line ranges of executable bodies, brace to matching brace.
///
/// Covers `func`/`init` bodies, property accessors, C-style functions at
/// file scope, and closures with an explicit signature.
pub fn body_ranges(tokens: &[Token]) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut depth = 0usize;

    for index in 0..tokens.len() {
        let token = &tokens[index];

        if is_punct(token, "{") {
            if is_closure_head(tokens, index) {
                if let Some(close) = match_braces(tokens, index) {
                    ranges.push((token.location.line, tokens[close].location.line));
                }
            } else if depth == 0 && index > 0 && is_punct(&tokens[index - 1], ")") {
                // C-style function definition at file scope
                if let Some(close) = match_braces(tokens, index) {
                    ranges.push((token.location.line, tokens[close].location.line));
                }
            }

            depth += 1;
        } else if is_punct(token, "}") {
            depth = depth.saturating_sub(1);
        } else if is_keyword(token, "func") || is_keyword(token, "init") {
            if let Some(open) = find_body_open(tokens, index + 1) {
                if let Some(close) = match_braces(tokens, open) {
                    ranges.push((tokens[open].location.line, tokens[close].location.line));
                }
            }
        } else if token.kind == TokenKind::Identifier
            && ACCESSOR_NAMES.contains(&token.text.as_str())
            && tokens.get(index + 1).is_some_and(|next| is_punct(next, "{"))
        {
            if let Some(close) = match_braces(tokens, index + 1) {
                ranges.push((tokens[index + 1].location.line, tokens[close].location.line));
            }
        }
    }

    ranges.sort_unstable();
    ranges.dedup();
    ranges
}

/// Extract the event stream for tokens whose line falls in
/// `[start_line, end_line]`.
pub fn events(tokens: &[Token], start_line: usize, end_line: usize) -> Vec<SyntacticEvent> {
    EventWalker::new(tokens, start_line, end_line).run()
}

struct EventWalker<'a> {
    tokens: &'a [Token],
    start_line: usize,
    end_line: usize,
    claimed: Vec<bool>,
    literal_in_binding: Vec<bool>,
    events: Vec<SyntacticEvent>,
}

impl<'a> EventWalker<'a> {
    fn new(tokens: &'a [Token], start_line: usize, end_line: usize) -> Self {
        Self {
            tokens,
            start_line,
            end_line,
            claimed: vec![false; tokens.len()],
            literal_in_binding: vec![false; tokens.len()],
            events: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<SyntacticEvent> {
        for index in 0..self.tokens.len() {
            if self.claimed[index] {
                continue;
            }

            let token = &self.tokens[index];

            match token.kind {
                TokenKind::Keyword => self.handle_keyword(index),
                TokenKind::Identifier => self.handle_identifier(index),
                TokenKind::TypeName => self.handle_type_name(index),
                TokenKind::IntegerLiteral
                | TokenKind::FloatingLiteral
                | TokenKind::StringLiteral => {
                    if self.in_range(index) {
                        self.events.push(SyntacticEvent::Literal {
                            part_of_binding: self.literal_in_binding[index],
                        });
                    }
                }
                TokenKind::Operator | TokenKind::Punctuation => {}
            }
        }

        self.events
    }

    fn in_range(&self, index: usize) -> bool {
        let line = self.tokens[index].location.line;
        line >= self.start_line && line <= self.end_line
    }

    fn handle_keyword(&mut self, index: usize) {
        let text = self.tokens[index].text.clone();

        match text.as_str() {
            "if" => self.handle_if(index),
            "guard" => self.handle_guard(index),
            "switch" => self.emit_simple(index, ControlFlowKind::Switch),
            "for" => {
                // the loop variable is a pattern, not a reference
                if self
                    .tokens
                    .get(index + 1)
                    .is_some_and(|next| next.kind == TokenKind::Identifier)
                {
                    self.claimed[index + 1] = true;
                }

                self.emit_simple(index, ControlFlowKind::ForLoop);
            }
            "while" => self.emit_simple(index, ControlFlowKind::WhileLoop),
            "repeat" => self.emit_simple(index, ControlFlowKind::RepeatLoop),
            "do" => self.emit_simple(index, ControlFlowKind::DoCatch),
            "return" => self.emit_simple(index, ControlFlowKind::Return),
            "throw" => self.emit_simple(index, ControlFlowKind::Throw),
            "break" => self.emit_simple(index, ControlFlowKind::Break),
            "continue" => self.emit_simple(index, ControlFlowKind::Continue),
            "let" | "var" => self.handle_binding(index),
            "true" | "false" => {
                if self.in_range(index) {
                    self.events.push(SyntacticEvent::Literal {
                        part_of_binding: self.literal_in_binding[index],
                    });
                }
            }
            "func" | "init" => self.handle_function_head(index),
            _ => {}
        }
    }

    fn emit_simple(&mut self, index: usize, kind: ControlFlowKind) {
        if self.in_range(index) {
            self.events.push(SyntacticEvent::ControlFlow {
                kind,
                has_optional_binding: false,
                negated_condition: false,
                body_exits: false,
            });
        }
    }

    fn handle_if(&mut self, index: usize) {
        let body_open = self.find_condition_end(index + 1);
        let condition_end = body_open.unwrap_or(self.tokens.len());
        let has_optional_binding = self.claim_condition_bindings(index + 1, condition_end);
        let negated_condition = self.condition_is_negated(index + 1, condition_end);
        let body_exits = body_open.is_some_and(|open| self.block_contains_exit(open));

        if self.in_range(index) {
            self.events.push(SyntacticEvent::ControlFlow {
                kind: ControlFlowKind::If,
                has_optional_binding,
                negated_condition,
                body_exits,
            });
        }
    }

    fn handle_guard(&mut self, index: usize) {
        let else_index = self.find_guard_else(index + 1);
        let condition_end = else_index.unwrap_or(self.tokens.len());
        let has_optional_binding = self.claim_condition_bindings(index + 1, condition_end);

        let body_open = else_index.and_then(|else_idx| {
            self.tokens
                .get(else_idx + 1)
                .filter(|token| is_punct(token, "{"))
                .map(|_| else_idx + 1)
        });
        let body_exits = body_open.is_some_and(|open| self.block_contains_exit(open));

        if self.in_range(index) {
            self.events.push(SyntacticEvent::ControlFlow {
                kind: ControlFlowKind::Guard,
                has_optional_binding,
                negated_condition: false,
                body_exits,
            });
        }
    }

    // The `{` that ends an `if` condition, at bracket depth zero. Closure
    // braces inside call arguments sit at paren depth > 0 and are skipped.
    fn find_condition_end(&self, from: usize) -> Option<usize> {
        let mut depth = 0usize;

        for (index, token) in self.tokens.iter().enumerate().skip(from) {
            if is_punct(token, "(") || is_punct(token, "[") {
                depth += 1;
            } else if is_punct(token, ")") || is_punct(token, "]") {
                depth = depth.saturating_sub(1);
            } else if depth == 0 {
                if is_punct(token, "{") {
                    return Some(index);
                }

                if is_punct(token, ";") || is_punct(token, "}") {
                    return None;
                }
            }
        }

        None
    }

    fn find_guard_else(&self, from: usize) -> Option<usize> {
        let mut depth = 0usize;

        for (index, token) in self.tokens.iter().enumerate().skip(from) {
            if is_punct(token, "(") || is_punct(token, "[") || is_punct(token, "{") {
                depth += 1;
            } else if is_punct(token, ")") || is_punct(token, "]") || is_punct(token, "}") {
                depth = depth.saturating_sub(1);
            } else if depth == 0 {
                if is_keyword(token, "else") {
                    return Some(index);
                }

                if is_punct(token, ";") {
                    return None;
                }
            }
        }

        None
    }

    // Optional bindings in a condition are patterns, not statements: claim
    // the `let`/`var` and the bound name so no Binding event fires for them.
    fn claim_condition_bindings(&mut self, from: usize, to: usize) -> bool {
        let mut found = false;

        for index in from..to.min(self.tokens.len()) {
            let token = &self.tokens[index];

            if is_keyword(token, "let") || is_keyword(token, "var") {
                found = true;
                self.claimed[index] = true;

                if self
                    .tokens
                    .get(index + 1)
                    .is_some_and(|next| next.kind == TokenKind::Identifier)
                {
                    self.claimed[index + 1] = true;
                }
            }
        }

        found
    }

    fn condition_is_negated(&self, from: usize, to: usize) -> bool {
        self.tokens[from..to.min(self.tokens.len())]
            .iter()
            .find(|token| !is_punct(token, "("))
            .is_some_and(|token| token.kind == TokenKind::Operator && token.text.starts_with('!'))
    }

    // Does the block starting at `open` contain a top-level return/throw?
    fn block_contains_exit(&self, open: usize) -> bool {
        let mut depth = 0usize;

        for token in &self.tokens[open..] {
            if is_punct(token, "{") {
                depth += 1;
            } else if is_punct(token, "}") {
                depth -= 1;

                if depth == 0 {
                    break;
                }
            } else if depth == 1 && (is_keyword(token, "return") || is_keyword(token, "throw")) {
                return true;
            }
        }

        false
    }

    fn handle_binding(&mut self, index: usize) {
        let Some(name_token) = self.tokens.get(index + 1) else {
            return;
        };

        if name_token.kind != TokenKind::Identifier {
            return;
        }

        let name_index = index + 1;
        self.claimed[name_index] = true;

        let equals = self.find_initializer_equals(name_index + 1);
        let mut literal_initializer = false;

        if let Some(equals) = equals {
            let line = self.tokens[equals].location.line;
            let mut span = Vec::new();
            let mut cursor = equals + 1;

            while cursor < self.tokens.len() {
                let token = &self.tokens[cursor];

                if token.location.line != line || is_punct(token, ";") || is_punct(token, "}") {
                    break;
                }

                span.push(cursor);
                cursor += 1;
            }

            for &literal_index in &span {
                if self.is_literal_token(literal_index) {
                    self.literal_in_binding[literal_index] = true;
                }
            }

            literal_initializer = span.len() == 1 && self.is_literal_token(span[0]);
        }

        if self.in_range(name_index) {
            self.events.push(SyntacticEvent::Binding {
                name: self.tokens[name_index].text.clone(),
                literal_initializer,
            });
        }
    }

    // The `=` of a binding's initializer, before the statement ends.
    fn find_initializer_equals(&self, from: usize) -> Option<usize> {
        for (index, token) in self.tokens.iter().enumerate().skip(from) {
            if token.kind == TokenKind::Operator && token.text == "=" {
                return Some(index);
            }

            if token.kind == TokenKind::Keyword
                || is_punct(token, ";")
                || is_punct(token, "{")
                || is_punct(token, "}")
            {
                return None;
            }
        }

        None
    }

    fn is_literal_token(&self, index: usize) -> bool {
        let token = &self.tokens[index];

        matches!(
            token.kind,
            TokenKind::IntegerLiteral | TokenKind::FloatingLiteral | TokenKind::StringLiteral
        ) || (token.kind == TokenKind::Keyword && matches!(token.text.as_str(), "true" | "false"))
    }

    fn handle_function_head(&mut self, index: usize) {
        // skip the function name (or `?` after init) to the parameter list
        let mut cursor = index + 1;

        while cursor < self.tokens.len() && cursor - index < 6 {
            let token = &self.tokens[cursor];

            if is_punct(token, "(") {
                break;
            }

            if is_punct(token, "{") || is_punct(token, ";") {
                return;
            }

            cursor += 1;
        }

        let Some(open) = self
            .tokens
            .get(cursor)
            .filter(|token| is_punct(token, "("))
            .map(|_| cursor)
        else {
            return;
        };

        let Some(close) = match_parens(self.tokens, open) else {
            return;
        };

        // the declared name is not an expression; keep it out of the stream
        for name_index in index + 1..open {
            self.claimed[name_index] = true;
        }

        let mut segment_start = open + 1;
        let mut depth = 0usize;

        for index in open + 1..=close {
            let token = &self.tokens[index];

            if is_punct(token, "(") || is_punct(token, "[") {
                depth += 1;
            } else if is_punct(token, ")") || is_punct(token, "]") {
                if index == close {
                    self.emit_parameter(segment_start, index);
                    break;
                }

                depth = depth.saturating_sub(1);
            } else if depth == 0 && is_punct(token, ",") {
                self.emit_parameter(segment_start, index);
                segment_start = index + 1;
            }
        }
    }

    // One parameter segment: `[label] name: Type`.
    fn emit_parameter(&mut self, from: usize, to: usize) {
        let mut name_index = None;
        let mut cursor = from;

        while cursor < to && self.tokens[cursor].kind == TokenKind::Identifier {
            name_index = Some(cursor);
            cursor += 1;
        }

        let Some(name_index) = name_index else {
            return;
        };

        if !self.tokens.get(cursor).is_some_and(|token| is_punct(token, ":")) {
            return;
        }

        let type_index = (cursor + 1..to).find(|&index| self.tokens[index].kind == TokenKind::TypeName);

        for index in from..cursor {
            self.claimed[index] = true;
        }

        if let Some(type_index) = type_index {
            self.claimed[type_index] = true;
        }

        if self.in_range(name_index) {
            self.events.push(SyntacticEvent::Parameter {
                name: self.tokens[name_index].text.clone(),
                type_name: type_index.map(|index| self.tokens[index].text.clone()),
            });
        }
    }

    fn handle_identifier(&mut self, index: usize) {
        let token = &self.tokens[index];
        let preceded_by_dot = index > 0 && is_punct(&self.tokens[index - 1], ".");
        let followed_by_paren = self
            .tokens
            .get(index + 1)
            .is_some_and(|next| is_punct(next, "("));
        let followed_by_brace = self
            .tokens
            .get(index + 1)
            .is_some_and(|next| is_punct(next, "{"));

        if followed_by_brace && ACCESSOR_NAMES.contains(&token.text.as_str()) && !preceded_by_dot {
            return;
        }

        if followed_by_paren {
            if self.in_range(index) {
                self.events.push(SyntacticEvent::Call {
                    callee: token.text.clone(),
                });

                if !preceded_by_dot {
                    self.events.push(SyntacticEvent::Reference {
                        name: token.text.clone(),
                    });
                }
            }

            return;
        }

        if preceded_by_dot {
            // a trailing-closure call like `.forEach { … }`; bare member
            // access produces no event
            if followed_by_brace && self.in_range(index) {
                self.events.push(SyntacticEvent::Call {
                    callee: token.text.clone(),
                });
            }

            return;
        }

        if self.in_range(index) {
            self.events.push(SyntacticEvent::Reference {
                name: token.text.clone(),
            });
        }
    }

    fn handle_type_name(&mut self, index: usize) {
        let followed_by_paren = self
            .tokens
            .get(index + 1)
            .is_some_and(|next| is_punct(next, "("));

        if !self.in_range(index) {
            return;
        }

        if followed_by_paren {
            self.events.push(SyntacticEvent::Call {
                callee: self.tokens[index].text.clone(),
            });
        } else {
            self.events.push(SyntacticEvent::TypeAnnotation {
                name: self.tokens[index].text.clone(),
            });
        }
    }
}
