//! End-to-end detection scenarios through the full pipeline.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use tvilling::core::config::AnalysisConfig;
use tvilling::core::results::{CloneType, PipelineResult};
use tvilling::AnalysisPipeline;

fn write_file(directory: &Path, name: &str, contents: &str) -> String {
    let path = directory.join(name);
    fs::write(&path, contents).expect("write source file");
    path.to_string_lossy().into_owned()
}

fn config(directory: &TempDir, minimum_token_count: usize, minimum_line_count: usize) -> AnalysisConfig {
    AnalysisConfig {
        minimum_token_count,
        minimum_line_count,
        cache_directory: directory.path().join("cache"),
        ..AnalysisConfig::default()
    }
}

async fn analyze(config: &AnalysisConfig, files: &[String]) -> PipelineResult {
    AnalysisPipeline::new(config)
        .analyze(files)
        .await
        .expect("analysis succeeds")
}

#[tokio::test]
async fn identical_files_produce_one_type1_group() {
    let directory = TempDir::new().expect("tempdir");
    let files = vec![
        write_file(directory.path(), "a.swift", "let x = 1\nvar y\n"),
        write_file(directory.path(), "b.swift", "let x = 1\nvar y\n"),
    ];

    let result = analyze(&config(&directory, 3, 1), &files).await;

    let type1: Vec<_> = result
        .clone_groups
        .iter()
        .filter(|group| group.clone_type == CloneType::Type1)
        .collect();

    assert_eq!(type1.len(), 1);
    assert_eq!(type1[0].token_count, 6);
    assert_eq!(type1[0].similarity, 100.0);
    assert_eq!(type1[0].fragments.len(), 2);
}

#[tokio::test]
async fn renamed_files_produce_one_type2_group() {
    let directory = TempDir::new().expect("tempdir");
    let files = vec![
        write_file(directory.path(), "a.swift", "let x = 1\nvar y\n"),
        write_file(directory.path(), "b.swift", "let count = 9\nvar total\n"),
    ];

    let result = analyze(&config(&directory, 3, 1), &files).await;

    let type2: Vec<_> = result
        .clone_groups
        .iter()
        .filter(|group| group.clone_type == CloneType::Type2)
        .collect();

    assert_eq!(type2.len(), 1);
    assert_eq!(type2[0].similarity, 100.0);
}

#[tokio::test]
async fn guard_and_negated_if_blocks_produce_a_type4_group() {
    let directory = TempDir::new().expect("tempdir");

    let guard_source = "func validate(input: Int) {\n    guard ready else {\n        return\n    }\n    process(input)\n}\n";
    let negated_source = "func check(amount: Int) {\n    if !finished {\n        return\n    }\n    consume(amount)\n}\n";

    let files = vec![
        write_file(directory.path(), "guard.swift", guard_source),
        write_file(directory.path(), "negated.swift", negated_source),
    ];

    let mut analysis_config = config(&directory, 10, 2);
    analysis_config.thresholds.type4_similarity = 60;

    let result = analyze(&analysis_config, &files).await;

    assert!(result
        .clone_groups
        .iter()
        .any(|group| group.clone_type == CloneType::Type4));
}

#[tokio::test]
async fn blocks_below_the_token_minimum_never_appear() {
    let directory = TempDir::new().expect("tempdir");

    // identical, but far below a 50-token minimum
    let source = "func tiny() {\n    let x = 1\n}\n";
    let files = vec![
        write_file(directory.path(), "a.swift", source),
        write_file(directory.path(), "b.swift", source),
    ];

    let result = analyze(&config(&directory, 50, 2), &files).await;

    assert!(result.clone_groups.is_empty());
}

#[tokio::test]
async fn shuffled_input_produces_identical_results() {
    let directory = TempDir::new().expect("tempdir");

    let shared = "func load() {\n    let path = locate()\n    let data = read(path)\n    store(data)\n}\n";
    let other = "func render() {\n    draw()\n}\n";

    let file_a = write_file(directory.path(), "a.swift", shared);
    let file_b = write_file(directory.path(), "b.swift", shared);
    let file_c = write_file(directory.path(), "c.swift", other);

    let analysis_config = config(&directory, 5, 2);

    let forward = analyze(
        &analysis_config,
        &[file_a.clone(), file_b.clone(), file_c.clone()],
    )
    .await;
    let shuffled = analyze(&analysis_config, &[file_c, file_a, file_b]).await;

    assert_eq!(forward.clone_groups, shuffled.clone_groups);
    assert_eq!(forward.total_tokens, shuffled.total_tokens);
}

#[tokio::test]
async fn repeated_runs_are_idempotent() {
    let directory = TempDir::new().expect("tempdir");

    let shared = "func load() {\n    let path = locate()\n    let data = read(path)\n    store(data)\n}\n";
    let files = vec![
        write_file(directory.path(), "a.swift", shared),
        write_file(directory.path(), "b.swift", shared),
    ];

    let analysis_config = config(&directory, 5, 2);

    let first = analyze(&analysis_config, &files).await;
    let second = analyze(&analysis_config, &files).await;

    assert_eq!(first.clone_groups, second.clone_groups);
}

#[tokio::test]
async fn similarity_is_always_a_percentage() {
    let directory = TempDir::new().expect("tempdir");

    let left = "func load() {\n    let path = locate()\n    let data = read(path)\n    let parsed = parse(data)\n    store(parsed)\n}\n";
    let right = "func fetch() {\n    let path = locate()\n    let data = read(path)\n    log(data)\n    let parsed = parse(data)\n    store(parsed)\n}\n";

    let files = vec![
        write_file(directory.path(), "a.swift", left),
        write_file(directory.path(), "b.swift", right),
    ];

    let result = analyze(&config(&directory, 5, 2), &files).await;

    assert!(!result.clone_groups.is_empty());

    for group in &result.clone_groups {
        assert!(group.similarity >= 0.0 && group.similarity <= 100.0);

        if matches!(group.clone_type, CloneType::Type1 | CloneType::Type2) {
            assert_eq!(group.similarity, 100.0);
        }

        assert!(group.fragments.len() >= 2);
        assert_eq!(
            group.line_count,
            group
                .fragments
                .iter()
                .map(|fragment| fragment.end_line - fragment.start_line + 1)
                .max()
                .expect("at least one fragment")
        );
    }
}

#[tokio::test]
async fn cross_language_mode_pairs_swift_and_objc_idioms() {
    let directory = TempDir::new().expect("tempdir");

    // the same property-access-and-call sequence in both surface syntaxes
    let swift_source = "let title = user.name\nvalidate(title)\nlet next = user.name\nvalidate(next)\n";
    let objc_source = "NSString *title = [user name];\nvalidate(title);\nNSString *next = [user name];\nvalidate(next);\n";

    let files = vec![
        write_file(directory.path(), "a.swift", swift_source),
        write_file(directory.path(), "b.m", objc_source),
    ];

    let mut analysis_config = config(&directory, 4, 1);
    analysis_config.cross_language_enabled = true;

    let result = analyze(&analysis_config, &files).await;

    assert!(result
        .clone_groups
        .iter()
        .any(|group| matches!(group.clone_type, CloneType::Type1 | CloneType::Type2)));
}
