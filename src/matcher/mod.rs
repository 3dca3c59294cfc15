//! Matcher wrapper: drives `GM_EXECUTABLE`, the external graph-isomorphism
//! comparator, and memoizes its verdicts for the lifetime of the process
//! (§4.6 — "this implementation memoizes matcher verdicts by a canonical-form
//! cache key per process lifetime").
//!
//! The matcher's exit status *is* its answer (zero iff equivalent, §6
//! Glossary) — a non-zero exit is a negative match, not a process failure.
//! Only a failure to start the executable is fatal.

use std::path::{Path, PathBuf};
use std::process::Command;

use dashmap::DashMap;
use sha2::{Digest, Sha256};

use crate::error::{PladsError, Result};

/// Unordered pair of content hashes, used as the memoization key so that
/// `equivalent(a, b)` and `equivalent(b, a)` share one cache entry.
type CacheKey = (String, String);

pub struct Matcher {
    executable: PathBuf,
    cache: DashMap<CacheKey, bool>,
}

impl Matcher {
    pub fn new(executable: PathBuf) -> Self {
        Matcher {
            executable,
            cache: DashMap::new(),
        }
    }

    /// Report whether `a` and `b` are equivalent under the matcher's
    /// semantics, consulting (and populating) the memoization cache first.
    pub fn equivalent(&self, a: &Path, b: &Path) -> Result<bool> {
        let key = Self::cache_key(a, b)?;
        if let Some(verdict) = self.cache.get(&key) {
            return Ok(*verdict);
        }

        let program = self.executable.display().to_string();
        let status = Command::new(&self.executable)
            .arg(a)
            .arg(b)
            .status()
            .map_err(|source| PladsError::ProcessSpawnFailed { program, source })?;

        let verdict = status.success();
        self.cache.insert(key, verdict);
        Ok(verdict)
    }

    fn cache_key(a: &Path, b: &Path) -> Result<CacheKey> {
        let ha = Self::hash_file(a)?;
        let hb = Self::hash_file(b)?;
        Ok(if ha <= hb { (ha, hb) } else { (hb, ha) })
    }

    fn hash_file(path: &Path) -> Result<String> {
        let bytes = std::fs::read(path)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }
}
