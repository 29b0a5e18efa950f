//! Analysis pipeline: parallel tokenization, deterministic ordering, and
//! detector dispatch.
//!
//! Files tokenize concurrently (one task each); the joined results are
//! sorted by path before any engine runs, so detection output is identical
//! across runs regardless of task completion order or cache timing. The
//! engines themselves are single-threaded.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::core::config::{AnalysisConfig, DetectionThresholds};
use crate::core::errors::{Result, TvillingError};
use crate::core::results::{CloneGroup, CloneType, PipelineResult};
use crate::detectors::exact::ExactCloneDetector;
use crate::detectors::normalize::{TokenNormalizer, UnifiedTokenMapper};
use crate::detectors::semantic::SemanticCloneDetector;
use crate::detectors::structural::StructuralCloneDetector;
use crate::io::cache::{hash_bytes, CacheEntry, TokenCache};
use crate::io::suppression::SuppressionScanner;
use crate::lang::registry;
use crate::lang::tokens::FileTokens;

/// One clone-detection engine behind a common dispatch surface.
pub trait DetectionAlgorithm: Send + Sync {
    /// The clone types this engine can produce.
    fn supported_clone_types(&self) -> &'static [CloneType];

    /// Run detection over the complete, sorted file set.
    fn detect(&self, files: &[FileTokens]) -> Vec<CloneGroup>;
}

impl DetectionAlgorithm for ExactCloneDetector {
    fn supported_clone_types(&self) -> &'static [CloneType] {
        &[CloneType::Type1, CloneType::Type2]
    }

    fn detect(&self, files: &[FileTokens]) -> Vec<CloneGroup> {
        ExactCloneDetector::detect(self, files)
    }
}

impl DetectionAlgorithm for StructuralCloneDetector {
    fn supported_clone_types(&self) -> &'static [CloneType] {
        &[CloneType::Type3]
    }

    fn detect(&self, files: &[FileTokens]) -> Vec<CloneGroup> {
        StructuralCloneDetector::detect(self, files)
    }
}

impl DetectionAlgorithm for SemanticCloneDetector {
    fn supported_clone_types(&self) -> &'static [CloneType] {
        &[CloneType::Type4]
    }

    fn detect(&self, files: &[FileTokens]) -> Vec<CloneGroup> {
        SemanticCloneDetector::detect(self, files)
    }
}

/// Orchestrates cache, tokenization, and the enabled detection engines.
pub struct AnalysisPipeline {
    minimum_token_count: usize,
    minimum_line_count: usize,
    cache_directory: PathBuf,
    cross_language_enabled: bool,
    thresholds: DetectionThresholds,
    suppression_tag: String,
    enabled_clone_types: BTreeSet<CloneType>,
}

impl AnalysisPipeline {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            minimum_token_count: config.minimum_token_count,
            minimum_line_count: config.minimum_line_count,
            cache_directory: config.cache_directory.clone(),
            cross_language_enabled: config.cross_language_enabled,
            thresholds: config.thresholds,
            suppression_tag: config.suppression_tag.clone(),
            enabled_clone_types: config.enabled_clone_types.clone(),
        }
    }

    /// Analyze a closed file set and return all detected clone groups.
    pub async fn analyze(&self, files: &[String]) -> Result<PipelineResult> {
        let cache = Arc::new(TokenCache::new());
        cache.load(&self.cache_directory);

        let started = Instant::now();
        let file_tokens = self.tokenize_files(files, Arc::clone(&cache)).await?;

        cache.save(&self.cache_directory);

        debug!(
            files = file_tokens.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "tokenization complete"
        );

        let total_tokens = file_tokens
            .iter()
            .map(|file| file.tokens.len())
            .sum();

        let mut clone_groups = Vec::new();

        for detector in self.build_detectors() {
            let enabled = detector
                .supported_clone_types()
                .iter()
                .any(|clone_type| self.enabled_clone_types.contains(clone_type));

            if !enabled {
                continue;
            }

            let started = Instant::now();
            let detected = detector.detect(&file_tokens);

            info!(
                engine = ?detector.supported_clone_types(),
                groups = detected.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "detection engine finished"
            );

            clone_groups.extend(
                detected
                    .into_iter()
                    .filter(|group| self.enabled_clone_types.contains(&group.clone_type)),
            );
        }

        Ok(PipelineResult {
            clone_groups,
            total_tokens,
        })
    }

    fn build_detectors(&self) -> Vec<Box<dyn DetectionAlgorithm>> {
        vec![
            Box::new(ExactCloneDetector::new(
                self.minimum_token_count,
                self.minimum_line_count,
            )),
            Box::new(StructuralCloneDetector::new(
                f64::from(self.thresholds.type3_similarity),
                self.thresholds.type3_tile_size,
                self.minimum_token_count,
                self.minimum_line_count,
                f64::from(self.thresholds.type3_candidate_threshold),
            )),
            Box::new(SemanticCloneDetector::new(
                f64::from(self.thresholds.type4_similarity),
                self.minimum_token_count,
                self.minimum_line_count,
            )),
        ]
    }

    // One task per file; results re-sorted by path after the join so task
    // completion order never leaks into detection.
    async fn tokenize_files(
        &self,
        files: &[String],
        cache: Arc<TokenCache>,
    ) -> Result<Vec<FileTokens>> {
        let mut join_set = JoinSet::new();

        for file in files {
            let file = file.clone();
            let cache = Arc::clone(&cache);
            let cross_language = self.cross_language_enabled;
            let suppression_tag = self.suppression_tag.clone();

            join_set.spawn(async move {
                tokenize_file(file, cache, cross_language, suppression_tag).await
            });
        }

        let mut results = Vec::with_capacity(files.len());

        while let Some(joined) = join_set.join_next().await {
            let file_tokens = joined
                .map_err(|error| TvillingError::internal(format!("tokenization task failed: {error}")))??;
            results.push(file_tokens);
        }

        results.sort_by(|lhs, rhs| lhs.file.cmp(&rhs.file));
        Ok(results)
    }
}

async fn tokenize_file(
    path: String,
    cache: Arc<TokenCache>,
    cross_language: bool,
    suppression_tag: String,
) -> Result<FileTokens> {
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|error| TvillingError::io(format!("reading {path}"), error))?;

    let content_hash = hash_bytes(&bytes);
    let source = String::from_utf8_lossy(&bytes).into_owned();

    if let Some(cached) = cache.lookup(&path, &content_hash) {
        debug!(file = %path, "cache hit");
        return Ok(FileTokens::new(
            path,
            source,
            cached.tokens,
            cached.normalized_tokens,
        ));
    }

    let raw_tokens = registry::tokenize_source(&source, &path);

    let mapped_tokens = if cross_language {
        UnifiedTokenMapper::new().map(&raw_tokens)
    } else {
        raw_tokens
    };

    let suppressed_lines = SuppressionScanner::new(suppression_tag).suppressed_lines(&source);

    let tokens = if suppressed_lines.is_empty() {
        mapped_tokens
    } else {
        mapped_tokens
            .into_iter()
            .filter(|token| !suppressed_lines.contains(&token.location.line))
            .collect()
    };

    let normalized_tokens = TokenNormalizer::new().normalize(&tokens);

    cache.store(
        path.clone(),
        CacheEntry {
            content_hash,
            tokens: tokens.clone(),
            normalized_tokens: normalized_tokens.clone(),
        },
    );

    Ok(FileTokens::new(path, source, tokens, normalized_tokens))
}
