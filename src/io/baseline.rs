//! Baseline persistence: remember accepted clones, report only new ones.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, TvillingError};
use crate::core::results::CloneGroup;

/// Identity of one fragment inside a baseline entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FragmentFingerprint {
    pub file: String,
    pub start_line: usize,
    pub end_line: usize,
}

/// One accepted clone group, reduced to its stable identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BaselineEntry {
    pub clone_type: u8,
    pub token_count: usize,
    pub line_count: usize,
    pub fragment_fingerprints: Vec<FragmentFingerprint>,
}

/// JSON-backed baseline store.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaselineStore;

impl BaselineStore {
    pub fn new() -> Self {
        Self
    }

    /// Load a baseline; a missing file is an empty baseline.
    pub fn load(&self, path: &Path) -> Result<BTreeSet<BaselineEntry>> {
        if !path.exists() {
            return Ok(BTreeSet::new());
        }

        let data = fs::read(path)
            .map_err(|error| TvillingError::io(format!("reading baseline {}", path.display()), error))?;

        let entries: Vec<BaselineEntry> = serde_json::from_slice(&data)
            .map_err(|error| TvillingError::serialization("parsing baseline", error))?;

        Ok(entries.into_iter().collect())
    }

    /// Save a baseline, sorted for stable diffs.
    pub fn save(&self, entries: &BTreeSet<BaselineEntry>, path: &Path) -> Result<()> {
        let mut sorted: Vec<&BaselineEntry> = entries.iter().collect();

        sorted.sort_by(|lhs, rhs| {
            lhs.clone_type
                .cmp(&rhs.clone_type)
                .then_with(|| rhs.token_count.cmp(&lhs.token_count))
                .then_with(|| {
                    let lhs_file = lhs.fragment_fingerprints.first().map(|f| f.file.as_str());
                    let rhs_file = rhs.fragment_fingerprints.first().map(|f| f.file.as_str());
                    lhs_file.cmp(&rhs_file)
                })
        });

        let data = serde_json::to_vec_pretty(&sorted)
            .map_err(|error| TvillingError::serialization("encoding baseline", error))?;

        fs::write(path, data)
            .map_err(|error| TvillingError::io(format!("writing baseline {}", path.display()), error))
    }

    /// Entries for the clone groups of one run.
    pub fn entries_from_clone_groups(&self, groups: &[CloneGroup]) -> BTreeSet<BaselineEntry> {
        groups.iter().map(entry_from_clone_group).collect()
    }

    /// The clone groups not covered by the baseline.
    pub fn filter_new_clones(
        &self,
        groups: &[CloneGroup],
        baseline: &BTreeSet<BaselineEntry>,
    ) -> Vec<CloneGroup> {
        groups
            .iter()
            .filter(|group| !baseline.contains(&entry_from_clone_group(group)))
            .cloned()
            .collect()
    }
}

fn entry_from_clone_group(group: &CloneGroup) -> BaselineEntry {
    BaselineEntry {
        clone_type: group.clone_type.rank(),
        token_count: group.token_count,
        line_count: group.line_count,
        fragment_fingerprints: group
            .fragments
            .iter()
            .map(|fragment| FragmentFingerprint {
                file: fragment.file.clone(),
                start_line: fragment.start_line,
                end_line: fragment.end_line,
            })
            .collect(),
    }
}
