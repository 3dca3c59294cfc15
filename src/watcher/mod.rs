//! Partition directory watcher (C1).
//!
//! Deliberately poll-based, not event-driven: `claim_oldest` is called on a
//! timer by the window controller, which sleeps `TIME_BETWEEN_FILE_CHECK`
//! seconds between empty polls (§4.1, §4.9 S1). See DESIGN.md for why this
//! means the teacher's `notify`/`notify-debouncer-full` dependencies were
//! dropped rather than reused here.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{PladsError, Result};

/// Scan `dir` and return the name of the oldest (smallest last-modified
/// timestamp) regular file, skipping `.`/`..` and any other directory
/// entries. Ties are broken by first-encountered order, matching the
/// original's directory-scan iteration order.
pub fn claim_oldest(dir: &Path) -> Result<Option<String>> {
    let mut oldest: Option<(SystemTime, String)> = None;

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = match entry.file_name().into_string() {
            Ok(n) => n,
            Err(_) => continue,
        };
        let modified = entry.metadata()?.modified()?;

        match &oldest {
            Some((best_time, _)) if modified >= *best_time => {}
            _ => oldest = Some((modified, name)),
        }
    }

    Ok(oldest.map(|(_, name)| name))
}

/// Atomically move `name` from `src_dir` to `dst_dir` via rename. Any
/// failure (cross-filesystem rename, missing source, permission error) is
/// fatal for the partition that owns this file (§3 Lifecycle, §4.1).
pub fn move_file(name: &str, src_dir: &Path, dst_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dst_dir)?;
    let src = src_dir.join(name);
    let dst = dst_dir.join(name);
    std::fs::rename(&src, &dst).map_err(|source| PladsError::MoveFailed {
        name: name.to_string(),
        src: src.clone(),
        dst: dst.clone(),
        source,
    })?;
    Ok(dst)
}
