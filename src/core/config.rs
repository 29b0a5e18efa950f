//! Analysis configuration: thresholds, toggles, and YAML file loading.

use std::collections::BTreeSet;
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, TvillingError};
use crate::core::results::CloneType;

/// Output format for the reporters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
    Html,
    Diagnostic,
}

/// What to do with the baseline file, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineMode {
    None,
    Generate,
    Update,
    Compare,
}

/// Thresholds for the structural and semantic engines, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionThresholds {
    pub type3_similarity: u32,
    pub type3_tile_size: usize,
    pub type3_candidate_threshold: u32,
    pub type4_similarity: u32,
}

impl Default for DetectionThresholds {
    fn default() -> Self {
        Self {
            type3_similarity: 70,
            type3_tile_size: 5,
            type3_candidate_threshold: 30,
            type4_similarity: 80,
        }
    }
}

/// Full analysis configuration after CLI and file merging.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub paths: Vec<String>,
    pub minimum_token_count: usize,
    pub minimum_line_count: usize,
    pub output_format: OutputFormat,
    pub output_file: Option<PathBuf>,
    pub baseline_mode: BaselineMode,
    pub baseline_file: PathBuf,
    pub max_duplication: Option<f64>,
    pub thresholds: DetectionThresholds,
    pub cross_language_enabled: bool,
    pub exclude_patterns: Vec<String>,
    pub suppression_tag: String,
    pub enabled_clone_types: BTreeSet<CloneType>,
    pub ignore_same_file: bool,
    pub ignore_structural: bool,
    pub cache_directory: PathBuf,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            minimum_token_count: 50,
            minimum_line_count: 5,
            output_format: OutputFormat::Text,
            output_file: None,
            baseline_mode: BaselineMode::None,
            baseline_file: PathBuf::from(".tvilling-baseline.json"),
            max_duplication: None,
            thresholds: DetectionThresholds::default(),
            cross_language_enabled: false,
            exclude_patterns: Vec::new(),
            suppression_tag: "tvilling:ignore".to_string(),
            enabled_clone_types: CloneType::ALL.into_iter().collect(),
            ignore_same_file: false,
            ignore_structural: false,
            cache_directory: PathBuf::from(".tvilling-cache"),
        }
    }
}

impl AnalysisConfig {
    /// Check every threshold range before analysis runs; engines assume
    /// validated input.
    pub fn validate(&self) -> Result<()> {
        if self.paths.is_empty() {
            return Err(TvillingError::config_field("no paths specified", "paths"));
        }

        validate_range(
            "minimum_token_count",
            self.minimum_token_count,
            10..=500,
        )?;
        validate_range("minimum_line_count", self.minimum_line_count, 2..=100)?;
        validate_range(
            "type3_similarity",
            self.thresholds.type3_similarity as usize,
            50..=100,
        )?;
        validate_range(
            "type3_tile_size",
            self.thresholds.type3_tile_size,
            2..=20,
        )?;
        validate_range(
            "type3_candidate_threshold",
            self.thresholds.type3_candidate_threshold as usize,
            10..=80,
        )?;
        validate_range(
            "type4_similarity",
            self.thresholds.type4_similarity as usize,
            60..=100,
        )?;

        if let Some(max_duplication) = self.max_duplication {
            if !(0.0..=100.0).contains(&max_duplication) {
                return Err(TvillingError::config_field(
                    format!("max_duplication {max_duplication} is outside 0-100"),
                    "max_duplication",
                ));
            }
        }

        Ok(())
    }
}

fn validate_range(name: &str, value: usize, range: RangeInclusive<usize>) -> Result<()> {
    if range.contains(&value) {
        return Ok(());
    }

    Err(TvillingError::config_field(
        format!(
            "{name} {value} is outside {}-{}",
            range.start(),
            range.end()
        ),
        name,
    ))
}

/// Configuration file contents; every field optional so the CLI can win.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct YamlConfig {
    pub paths: Option<Vec<String>>,
    pub minimum_token_count: Option<usize>,
    pub minimum_line_count: Option<usize>,
    pub output_format: Option<String>,
    pub max_duplication: Option<f64>,
    pub type3_similarity: Option<u32>,
    pub type3_tile_size: Option<usize>,
    pub type3_candidate_threshold: Option<u32>,
    pub type4_similarity: Option<u32>,
    pub cross_language_enabled: Option<bool>,
    pub exclude: Option<Vec<String>>,
    pub inline_suppression_tag: Option<String>,
    pub enabled_clone_types: Option<Vec<u8>>,
    pub ignore_same_file: Option<bool>,
    pub ignore_structural: Option<bool>,
}

impl YamlConfig {
    /// Load a configuration file; the file must exist and parse.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .map_err(|error| TvillingError::io(format!("reading config {}", path.display()), error))?;

        serde_yaml::from_str(&data).map_err(|error| {
            TvillingError::config(format!("invalid config {}: {error}", path.display()))
        })
    }

    /// Load a configuration file if present; absence yields `None`.
    pub fn load_if_exists(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        Self::load(path).map(Some)
    }

    /// Resolve the enabled clone types, rejecting unknown numbers.
    pub fn clone_types(&self) -> Result<Option<BTreeSet<CloneType>>> {
        let Some(ranks) = &self.enabled_clone_types else {
            return Ok(None);
        };

        let mut types = BTreeSet::new();

        for &rank in ranks {
            let clone_type = CloneType::from_rank(rank).ok_or_else(|| {
                TvillingError::config_field(
                    format!("unknown clone type {rank}"),
                    "enabledCloneTypes",
                )
            })?;
            types.insert(clone_type);
        }

        Ok(Some(types))
    }
}

/// Starter configuration written by `--init`.
pub const STARTER_CONFIG: &str = "\
paths:
  - Sources/
minimumTokenCount: 50
minimumLineCount: 5
outputFormat: text
type3Similarity: 70
type4Similarity: 80
exclude: []
ignoreSameFile: true
ignoreStructural: true
enabledCloneTypes:
  - 1
  - 2
  - 3
  - 4
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configuration_fails_only_on_paths() {
        let mut config = AnalysisConfig::default();
        assert!(config.validate().is_err());

        config.paths.push("Sources/".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn out_of_range_thresholds_are_rejected() {
        let mut config = AnalysisConfig {
            paths: vec!["Sources/".into()],
            ..AnalysisConfig::default()
        };

        config.minimum_token_count = 5;
        assert!(config.validate().is_err());

        config.minimum_token_count = 50;
        config.thresholds.type4_similarity = 40;
        assert!(config.validate().is_err());

        config.thresholds.type4_similarity = 80;
        config.max_duplication = Some(120.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn yaml_round_trip_with_camel_case_keys() {
        let yaml = "minimumTokenCount: 30\ntype3Similarity: 75\nenabledCloneTypes: [1, 2]\n";
        let config: YamlConfig = serde_yaml::from_str(yaml).expect("parse");

        assert_eq!(config.minimum_token_count, Some(30));
        assert_eq!(config.type3_similarity, Some(75));

        let types = config.clone_types().expect("valid").expect("present");
        assert_eq!(types.len(), 2);
        assert!(types.contains(&CloneType::Type1));
    }

    #[test]
    fn unknown_clone_types_are_rejected() {
        let config = YamlConfig {
            enabled_clone_types: Some(vec![1, 9]),
            ..YamlConfig::default()
        };

        assert!(config.clone_types().is_err());
    }

    #[test]
    fn unknown_yaml_keys_are_rejected() {
        let result: std::result::Result<YamlConfig, _> = serde_yaml::from_str("unknownKey: 1\n");
        assert!(result.is_err());
    }

    #[test]
    fn starter_config_parses() {
        let config: YamlConfig = serde_yaml::from_str(STARTER_CONFIG).expect("starter parses");

        assert_eq!(config.minimum_token_count, Some(50));
        assert_eq!(config.paths.as_deref(), Some(&["Sources/".to_string()][..]));
        assert_eq!(config.clone_types().expect("valid").map(|t| t.len()), Some(4));
    }
}
