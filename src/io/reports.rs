//! Report generation: text, JSON, HTML, and editor diagnostics.

use std::fs;

use chrono::Utc;
use handlebars::Handlebars;
use serde::Serialize;
use serde_json::json;

use crate::core::results::{duplication_percentage, AnalysisResults, CloneFragment, CloneGroup};

/// Renders an [`AnalysisResults`] into one output format.
pub trait Reporter {
    fn report(&self, results: &AnalysisResults) -> String;
}

/// Human-readable plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextReporter;

impl Reporter for TextReporter {
    fn report(&self, results: &AnalysisResults) -> String {
        let clones = results.sorted_clone_groups();
        let seconds = results.execution_time.as_secs_f64();

        if clones.is_empty() {
            return format!(
                "No clones detected in {} files ({seconds:.2}s)",
                results.files_analyzed
            );
        }

        let mut lines = vec![format!(
            "Found {} clone(s) in {} files ({seconds:.2}s)",
            clones.len(),
            results.files_analyzed
        )];

        for (index, clone) in clones.iter().enumerate() {
            lines.push(String::new());
            lines.push(format!(
                "Clone {} (Type-{}, {} tokens, {} lines):",
                index + 1,
                clone.clone_type.rank(),
                clone.token_count,
                clone.line_count
            ));

            for fragment in &clone.fragments {
                lines.push(format!(
                    "  {}:{}-{}",
                    fragment.file, fragment.start_line, fragment.end_line
                ));
            }
        }

        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonFragment {
    end_column: usize,
    end_line: usize,
    file: String,
    preview: String,
    start_column: usize,
    start_line: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonClone {
    fragments: Vec<JsonFragment>,
    id: String,
    line_count: usize,
    similarity: f64,
    token_count: usize,
    #[serde(rename = "type")]
    clone_type: u8,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonConfiguration {
    minimum_line_count: usize,
    minimum_token_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonMetadata {
    configuration: JsonConfiguration,
    execution_time_ms: u128,
    files_analyzed: usize,
    timestamp: String,
    total_tokens: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonByType {
    type1: usize,
    type2: usize,
    type3: usize,
    type4: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSummary {
    by_type: JsonByType,
    duplicated_lines: usize,
    duplicated_tokens: usize,
    duplication_percentage: f64,
    total_clones: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport {
    clones: Vec<JsonClone>,
    metadata: JsonMetadata,
    summary: JsonSummary,
    version: String,
}

/// Machine-readable JSON with previews and summary statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReporter;

impl Reporter for JsonReporter {
    fn report(&self, results: &AnalysisResults) -> String {
        let clones = results.sorted_clone_groups();
        let report = build_json_report(&clones, results);

        serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
    }
}

fn build_json_report(clones: &[CloneGroup], results: &AnalysisResults) -> JsonReport {
    let json_clones = clones
        .iter()
        .enumerate()
        .map(|(index, clone)| JsonClone {
            fragments: clone
                .fragments
                .iter()
                .map(|fragment| JsonFragment {
                    end_column: fragment.end_column,
                    end_line: fragment.end_line,
                    file: fragment.file.clone(),
                    preview: read_preview(fragment),
                    start_column: fragment.start_column,
                    start_line: fragment.start_line,
                })
                .collect(),
            id: format!("clone-{:03}", index + 1),
            line_count: clone.line_count,
            similarity: clone.similarity,
            token_count: clone.token_count,
            clone_type: clone.clone_type.rank(),
        })
        .collect();

    JsonReport {
        clones: json_clones,
        metadata: JsonMetadata {
            configuration: JsonConfiguration {
                minimum_line_count: results.minimum_line_count,
                minimum_token_count: results.minimum_token_count,
            },
            execution_time_ms: results.execution_time.as_millis(),
            files_analyzed: results.files_analyzed,
            timestamp: Utc::now().to_rfc3339(),
            total_tokens: results.total_tokens,
        },
        summary: build_summary(clones, results.total_tokens),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

fn read_preview(fragment: &CloneFragment) -> String {
    let Ok(content) = fs::read_to_string(&fragment.file) else {
        return String::new();
    };

    let lines: Vec<&str> = content.split('\n').collect();
    let start_index = fragment.start_line.saturating_sub(1);
    let end_index = fragment.end_line.saturating_sub(1).min(lines.len().saturating_sub(1));

    let Some(first_line) = lines.get(start_index) else {
        return String::new();
    };

    let first_line = first_line.trim();

    if start_index == end_index {
        return first_line.to_string();
    }

    format!("{first_line} ... }}")
}

fn build_summary(clones: &[CloneGroup], total_tokens: usize) -> JsonSummary {
    let mut by_type = JsonByType {
        type1: 0,
        type2: 0,
        type3: 0,
        type4: 0,
    };

    for clone in clones {
        match clone.clone_type.rank() {
            1 => by_type.type1 += 1,
            2 => by_type.type2 += 1,
            3 => by_type.type3 += 1,
            _ => by_type.type4 += 1,
        }
    }

    let duplicated_tokens = clones.iter().map(|clone| clone.token_count).sum();

    JsonSummary {
        by_type,
        duplicated_lines: clones.iter().map(|clone| clone.line_count).sum(),
        duplicated_tokens,
        duplication_percentage: duplication_percentage(duplicated_tokens, total_tokens),
        total_clones: clones.len(),
    }
}

const HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>tvilling Report</title>
    <style>
body {
    font-family: -apple-system, sans-serif;
    margin: 40px;
    background: #f5f5f7;
    color: #1d1d1f;
}
.summary {
    background: #fff;
    padding: 24px;
    border-radius: 12px;
    margin-bottom: 24px;
    box-shadow: 0 1px 3px rgba(0,0,0,0.1);
}
.summary h1 { margin: 0 0 8px 0; font-size: 24px; }
.summary p { margin: 0; color: #6e6e73; }
.clone {
    background: #fff;
    padding: 20px;
    border-radius: 12px;
    margin-bottom: 16px;
    box-shadow: 0 1px 3px rgba(0,0,0,0.1);
}
.clone-header {
    display: flex;
    align-items: center;
    gap: 12px;
    margin-bottom: 12px;
}
.clone-number { font-weight: 600; font-size: 16px; }
.badge {
    padding: 2px 10px;
    border-radius: 6px;
    font-size: 13px;
    font-weight: 500;
    color: #fff;
}
.type-1 { background: #34c759; }
.type-2 { background: #007aff; }
.type-3 { background: #ff9500; }
.type-4 { background: #ff3b30; }
.meta { color: #6e6e73; font-size: 14px; }
.fragments { list-style: none; padding: 0; margin: 0; }
.fragments li {
    padding: 6px 12px;
    font-family: 'SF Mono', Menlo, monospace;
    font-size: 13px;
    color: #1d1d1f;
    background: #f5f5f7;
    border-radius: 6px;
    margin-bottom: 4px;
}
.no-clones {
    text-align: center;
    padding: 48px;
    color: #6e6e73;
    font-size: 18px;
}
    </style>
</head>
<body>
    <div class="summary">
        <h1>tvilling Report</h1>
        <p>{{clone_count}} clone(s) found in {{files_analyzed}} files ({{execution_time}}s)</p>
    </div>
{{#if clones}}
{{#each clones}}
    <div class="clone">
        <div class="clone-header">
            <span class="clone-number">Clone {{number}}</span>
            <span class="badge type-{{type}}">Type-{{type}}</span>
            <span class="meta">{{token_count}} tokens, {{line_count}} lines, {{similarity}}% similar</span>
        </div>
        <ul class="fragments">
{{#each fragments}}
            <li>{{file}}:{{start_line}}-{{end_line}}</li>
{{/each}}
        </ul>
    </div>
{{/each}}
{{else}}
    <div class="no-clones">No clones detected.</div>
{{/if}}
</body>
</html>
"#;

/// Standalone HTML report rendered through a built-in template.
#[derive(Debug)]
pub struct HtmlReporter {
    handlebars: Handlebars<'static>,
}

impl Default for HtmlReporter {
    fn default() -> Self {
        let mut handlebars = Handlebars::new();

        handlebars
            .register_template_string("report", HTML_TEMPLATE)
            .expect("built-in HTML template is valid");

        Self { handlebars }
    }
}

impl HtmlReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Reporter for HtmlReporter {
    fn report(&self, results: &AnalysisResults) -> String {
        let clones = results.sorted_clone_groups();

        let clone_values: Vec<serde_json::Value> = clones
            .iter()
            .enumerate()
            .map(|(index, clone)| {
                json!({
                    "number": index + 1,
                    "type": clone.clone_type.rank(),
                    "token_count": clone.token_count,
                    "line_count": clone.line_count,
                    "similarity": clone.similarity,
                    "fragments": clone.fragments.iter().map(|fragment| {
                        json!({
                            "file": fragment.file,
                            "start_line": fragment.start_line,
                            "end_line": fragment.end_line,
                        })
                    }).collect::<Vec<_>>(),
                })
            })
            .collect();

        let context = json!({
            "clone_count": clones.len(),
            "files_analyzed": results.files_analyzed,
            "execution_time": format!("{:.2}", results.execution_time.as_secs_f64()),
            "clones": clone_values,
        });

        self.handlebars
            .render("report", &context)
            .unwrap_or_else(|_| String::new())
    }
}

/// One `file:line:col: warning:` line per fragment, for editor integration.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagnosticReporter;

impl Reporter for DiagnosticReporter {
    fn report(&self, results: &AnalysisResults) -> String {
        let clones = results.sorted_clone_groups();
        let mut lines = Vec::new();

        for clone in &clones {
            for (index, fragment) in clone.fragments.iter().enumerate() {
                let others = clone
                    .fragments
                    .iter()
                    .enumerate()
                    .filter(|(other_index, _)| *other_index != index)
                    .map(|(_, other)| format!("{}:{}", file_name(&other.file), other.start_line))
                    .collect::<Vec<String>>()
                    .join(", ");

                lines.push(format!(
                    "{}:{}:{}: warning: Clone detected (Type-{}, {} tokens, {} lines) \u{2014} also in {}",
                    fragment.file,
                    fragment.start_line,
                    fragment.start_column,
                    clone.clone_type.rank(),
                    clone.token_count,
                    clone.line_count,
                    others
                ));
            }
        }

        lines.join("\n")
    }
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::results::CloneType;
    use std::time::Duration;

    fn sample_results() -> AnalysisResults {
        let fragment = |file: &str| CloneFragment {
            file: file.to_string(),
            start_line: 3,
            end_line: 9,
            start_column: 1,
            end_column: 12,
        };

        AnalysisResults {
            clone_groups: vec![CloneGroup {
                clone_type: CloneType::Type2,
                token_count: 60,
                line_count: 7,
                similarity: 100.0,
                fragments: vec![fragment("src/a.swift"), fragment("src/b.swift")],
            }],
            files_analyzed: 4,
            execution_time: Duration::from_millis(1500),
            total_tokens: 600,
            minimum_token_count: 50,
            minimum_line_count: 5,
        }
    }

    #[test]
    fn text_report_lists_fragments() {
        let output = TextReporter.report(&sample_results());

        assert!(output.starts_with("Found 1 clone(s) in 4 files (1.50s)"));
        assert!(output.contains("Clone 1 (Type-2, 60 tokens, 7 lines):"));
        assert!(output.contains("  src/a.swift:3-9"));
        assert!(output.contains("  src/b.swift:3-9"));
    }

    #[test]
    fn text_report_handles_empty_results() {
        let mut results = sample_results();
        results.clone_groups.clear();

        let output = TextReporter.report(&results);
        assert_eq!(output, "No clones detected in 4 files (1.50s)");
    }

    #[test]
    fn json_report_has_summary_and_ids() {
        let output = JsonReporter.report(&sample_results());
        let value: serde_json::Value = serde_json::from_str(&output).expect("valid json");

        assert_eq!(value["clones"][0]["id"], "clone-001");
        assert_eq!(value["clones"][0]["type"], 2);
        assert_eq!(value["summary"]["totalClones"], 1);
        assert_eq!(value["summary"]["byType"]["type2"], 1);
        assert_eq!(value["summary"]["duplicatedTokens"], 60);
        assert_eq!(value["summary"]["duplicationPercentage"], 10.0);
        assert_eq!(value["metadata"]["filesAnalyzed"], 4);
    }

    #[test]
    fn html_report_renders_badges_and_fragments() {
        let output = HtmlReporter::new().report(&sample_results());

        assert!(output.contains("<!DOCTYPE html>"));
        assert!(output.contains("badge type-2"));
        assert!(output.contains("src/a.swift:3-9"));
    }

    #[test]
    fn html_report_renders_the_empty_state() {
        let mut results = sample_results();
        results.clone_groups.clear();

        let output = HtmlReporter::new().report(&results);
        assert!(output.contains("No clones detected."));
    }

    #[test]
    fn diagnostic_report_emits_one_line_per_fragment() {
        let output = DiagnosticReporter.report(&sample_results());
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("src/a.swift:3:1: warning: Clone detected (Type-2"));
        assert!(lines[0].contains("also in b.swift:3"));
        assert!(lines[1].starts_with("src/b.swift:3:1: warning:"));
    }
}
