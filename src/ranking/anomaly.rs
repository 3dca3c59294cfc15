//! Anomaly ranker (C7): aggregates matching anomalous instances across the
//! active window and selects the most anomalous (lowest-scoring) group
//! (§4.7).
//!
//! Unlike the normative ranker, matching here is *permissive*: every other
//! `(partition, rank)` pair in the window that the matcher reports as
//! equivalent contributes its score, not just the first match per
//! partition. The most-anomalous set is rebuilt from scratch on every call
//! — it is not a running accumulation across sweeps (§9 Open Questions).

use std::path::{Path, PathBuf};

use crate::error::{PladsError, Result};
use crate::matcher::Matcher;

const TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone)]
pub struct AnomalyFile {
    pub partition: u64,
    pub rank: u64,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RankedAnomaly {
    pub partition: u64,
    pub rank: u64,
    pub path: PathBuf,
    pub score: f64,
}

#[derive(Debug, Clone)]
pub struct AnomalyRanking {
    pub min_score: f64,
    pub most_anomalous: Vec<RankedAnomaly>,
}

/// Read the leading `% <score>` line of an `anom_<p>_<k>` file (§6).
fn read_leading_score(path: &Path) -> Result<f64> {
    let text = std::fs::read_to_string(path)?;
    let first_line = text
        .lines()
        .next()
        .ok_or_else(|| PladsError::ArtifactMissing(path.to_path_buf()))?;
    first_line
        .trim_start_matches('%')
        .trim()
        .parse::<f64>()
        .map_err(|_| PladsError::ArtifactMissing(path.to_path_buf()))
}

/// Rank every file in `files` (already restricted to the active window by
/// the caller), aggregating matching instances' scores and returning the
/// set whose aggregated score ties the minimum within [`TOLERANCE`].
/// Returns `None` when `files` is empty — "no anomalous substructures to
/// report" is not an error (§7).
pub fn rank(files: &[AnomalyFile], matcher: &Matcher) -> Result<Option<AnomalyRanking>> {
    if files.is_empty() {
        return Ok(None);
    }

    let base_scores: Vec<f64> = files
        .iter()
        .map(|f| read_leading_score(&f.path))
        .collect::<Result<_>>()?;

    let mut aggregated = base_scores.clone();
    for i in 0..files.len() {
        for j in 0..files.len() {
            if i == j {
                continue;
            }
            if matcher.equivalent(&files[i].path, &files[j].path)? {
                aggregated[i] += base_scores[j];
            }
        }
    }

    let min_score = aggregated
        .iter()
        .cloned()
        .fold(f64::INFINITY, f64::min);

    let most_anomalous = files
        .iter()
        .zip(aggregated.iter())
        .filter(|(_, &score)| (score - min_score).abs() <= TOLERANCE)
        .map(|(f, &score)| RankedAnomaly {
            partition: f.partition,
            rank: f.rank,
            path: f.path.clone(),
            score,
        })
        .collect();

    Ok(Some(AnomalyRanking {
        min_score,
        most_anomalous,
    }))
}
