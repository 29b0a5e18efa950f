//! Inline suppression comments.
//!
//! A comment carrying the suppression tag silences the next block (brace
//! balanced) or, when no block follows, the next line. Tokens on suppressed
//! lines are removed before detection runs.

use ahash::AHashSet;

/// Scans sources for the inline suppression tag.
#[derive(Debug, Clone)]
pub struct SuppressionScanner {
    tag: String,
}

impl SuppressionScanner {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    /// The 1-based line numbers suppressed in `source`.
    pub fn suppressed_lines(&self, source: &str) -> AHashSet<usize> {
        let lines: Vec<&str> = source.split('\n').collect();
        let mut suppressed = AHashSet::new();
        let mut line_number = 1;

        while line_number <= lines.len() {
            let trimmed = lines[line_number - 1].trim_start();

            if !self.contains_suppression_tag(trimmed) {
                line_number += 1;
                continue;
            }

            line_number += 1;
            let range = find_suppressed_range(line_number, &lines);

            for suppressed_line in range.clone() {
                suppressed.insert(suppressed_line);
            }

            line_number = range.end;
        }

        suppressed
    }

    fn contains_suppression_tag(&self, line: &str) -> bool {
        for prefix in ["//", "/*"] {
            if let Some(comment) = line.strip_prefix(prefix) {
                return comment.trim_start().starts_with(&self.tag);
            }
        }

        false
    }
}

// The suppressed span beginning at `start_line`: a brace-balanced block if
// the next content line opens one, otherwise that single line.
fn find_suppressed_range(start_line: usize, lines: &[&str]) -> std::ops::Range<usize> {
    if start_line > lines.len() {
        return start_line..start_line + 1;
    }

    let first_content_line = find_next_content_line(start_line, lines);

    if first_content_line > lines.len() {
        return start_line..start_line + 1;
    }

    if !lines[first_content_line - 1].contains('{') {
        return first_content_line..first_content_line + 1;
    }

    find_block_end(first_content_line, lines)
}

fn find_next_content_line(start_line: usize, lines: &[&str]) -> usize {
    let mut line = start_line;

    while line <= lines.len() {
        if !lines[line - 1].trim().is_empty() {
            return line;
        }

        line += 1;
    }

    line
}

fn find_block_end(start_line: usize, lines: &[&str]) -> std::ops::Range<usize> {
    let mut depth = 0i32;
    let mut line = start_line;

    while line <= lines.len() {
        for char in lines[line - 1].chars() {
            if char == '{' {
                depth += 1;
            } else if char == '}' {
                depth -= 1;

                if depth == 0 {
                    return start_line..line + 1;
                }
            }
        }

        line += 1;
    }

    start_line..line
}
