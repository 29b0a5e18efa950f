//! Source file discovery with directory and glob exclusions.

use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::debug;
use walkdir::WalkDir;

use crate::core::errors::{Result, TvillingError};

const EXCLUDED_DIRECTORY_NAMES: &[&str] = &[
    ".build",
    ".git",
    "DerivedData",
    "Pods",
    "Carthage",
    "SourcePackages",
];

const SWIFT_EXTENSIONS: &[&str] = &["swift"];
const C_FAMILY_EXTENSIONS: &[&str] = &["m", "mm", "h", "c", "cpp"];

/// Recursive discovery of analyzable source files.
pub struct SourceFileDiscovery {
    cross_language_enabled: bool,
    /// Patterns with a `/` match the full path.
    path_globs: GlobSet,
    /// Patterns without a `/` match the file name only.
    basename_globs: GlobSet,
}

impl SourceFileDiscovery {
    pub fn new(cross_language_enabled: bool, exclude_patterns: &[String]) -> Result<Self> {
        let mut path_builder = GlobSetBuilder::new();
        let mut basename_builder = GlobSetBuilder::new();

        for pattern in exclude_patterns {
            let glob = Glob::new(pattern).map_err(|error| {
                TvillingError::config_field(
                    format!("invalid exclude pattern '{pattern}': {error}"),
                    "exclude",
                )
            })?;

            if pattern.contains('/') {
                path_builder.add(glob);
            } else {
                basename_builder.add(glob);
            }
        }

        Ok(Self {
            cross_language_enabled,
            path_globs: path_builder.build().map_err(|error| {
                TvillingError::config_field(error.to_string(), "exclude")
            })?,
            basename_globs: basename_builder.build().map_err(|error| {
                TvillingError::config_field(error.to_string(), "exclude")
            })?,
        })
    }

    /// All matching files under `paths`, sorted. A named path that does not
    /// exist is an error; everything else is filtered silently.
    pub fn find_source_files(&self, paths: &[String]) -> Result<Vec<String>> {
        let mut results = Vec::new();

        for path in paths {
            let resolved = Path::new(path);

            if !resolved.exists() {
                return Err(TvillingError::discovery("path does not exist", path.clone()));
            }

            if resolved.is_dir() {
                self.collect_directory(resolved, &mut results);
            } else if self.is_valid_source_file(resolved) && !self.is_excluded(resolved) {
                results.push(resolved.to_string_lossy().into_owned());
            }
        }

        results.sort();
        results.dedup();

        debug!(files = results.len(), "source discovery complete");
        Ok(results)
    }

    fn collect_directory(&self, directory: &Path, results: &mut Vec<String>) {
        let walker = WalkDir::new(directory)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                let name = entry.file_name().to_string_lossy();

                if entry.file_type().is_dir() {
                    if name.starts_with('.') && entry.depth() > 0 {
                        return false;
                    }

                    if EXCLUDED_DIRECTORY_NAMES.contains(&name.as_ref()) {
                        return false;
                    }
                }

                true
            });

        for entry in walker.flatten() {
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();

            if self.is_valid_source_file(path) && !self.is_excluded(path) {
                results.push(path.to_string_lossy().into_owned());
            }
        }
    }

    fn is_excluded(&self, path: &Path) -> bool {
        if self.path_globs.is_match(path) {
            return true;
        }

        path.file_name()
            .is_some_and(|name| self.basename_globs.is_match(Path::new(name)))
    }

    fn is_valid_source_file(&self, path: &Path) -> bool {
        let Some(extension) = path.extension().and_then(|extension| extension.to_str()) else {
            return false;
        };

        if SWIFT_EXTENSIONS.contains(&extension) {
            return true;
        }

        self.cross_language_enabled && C_FAMILY_EXTENSIONS.contains(&extension)
    }
}
