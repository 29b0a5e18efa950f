//! Content-addressed tokenization cache.
//!
//! Entries are keyed by file path and validated by a SHA-256 content hash;
//! a hash mismatch is a miss, not an error. Persistence is best-effort in
//! both directions: a missing or corrupt cache file loads as empty, and a
//! failed save is logged and ignored. Caching is an optimization, never
//! required for correctness.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::lang::tokens::Token;

const CACHE_FILE_NAME: &str = "cache.json";

/// One cached tokenization, valid while the content hash still matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub content_hash: String,
    pub tokens: Vec<Token>,
    pub normalized_tokens: Vec<Token>,
}

/// Exclusive-access token cache shared across tokenization tasks.
///
/// Each task mutates only its own file's key, so lock contention is brief;
/// the map itself is the single owner of all entries.
#[derive(Debug, Default)]
pub struct TokenCache {
    entries: RwLock<BTreeMap<String, CacheEntry>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The entry for `file`, only if its stored hash matches `content_hash`.
    pub fn lookup(&self, file: &str, content_hash: &str) -> Option<CacheEntry> {
        let entries = self.entries.read().ok()?;

        entries
            .get(file)
            .filter(|entry| entry.content_hash == content_hash)
            .cloned()
    }

    /// Insert or overwrite the entry for `file`.
    pub fn store(&self, file: String, entry: CacheEntry) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(file, entry);
        }
    }

    /// Load the cache file from `directory`; absence and corruption both
    /// yield an empty cache.
    pub fn load(&self, directory: &Path) {
        let path = directory.join(CACHE_FILE_NAME);

        let Ok(data) = fs::read(&path) else {
            debug!(path = %path.display(), "no cache file, starting cold");
            return;
        };

        match serde_json::from_slice::<BTreeMap<String, CacheEntry>>(&data) {
            Ok(decoded) => {
                debug!(entries = decoded.len(), "token cache loaded");

                if let Ok(mut entries) = self.entries.write() {
                    *entries = decoded;
                }
            }
            Err(error) => {
                warn!(%error, "cache file unreadable, starting cold");
            }
        }
    }

    /// Persist the whole map under `directory`, creating it if needed.
    /// Write failures are swallowed.
    pub fn save(&self, directory: &Path) {
        if let Err(error) = fs::create_dir_all(directory) {
            warn!(%error, "could not create cache directory");
            return;
        }

        let Ok(entries) = self.entries.read() else {
            return;
        };

        let Ok(data) = serde_json::to_vec(&*entries) else {
            return;
        };

        let path = directory.join(CACHE_FILE_NAME);

        if let Err(error) = fs::write(&path, data) {
            warn!(%error, path = %path.display(), "cache save failed");
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }
}

/// SHA-256 of a byte slice as lowercase hex.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);

    let digest = hasher.finalize();
    let mut result = String::with_capacity(digest.len() * 2);

    for byte in digest {
        result.push_str(&format!("{byte:02x}"));
    }

    result
}
