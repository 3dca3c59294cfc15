//! Normative ranker (C6): elects the globally best normative pattern across
//! the active window (§4.6).
//!
//! Per-partition matching is *strict*: for a given candidate, every other
//! partition in the window contributes at most once, via the first rank
//! that matches under the matcher — a deliberate asymmetry with the anomaly
//! ranker (§9 Open Questions), which accumulates every match.

use std::path::{Path, PathBuf};

use crate::error::{PladsError, Result};
use crate::matcher::Matcher;

#[derive(Debug, Clone)]
pub struct RankedNormative {
    pub partition: u64,
    pub rank: u64,
    pub path: PathBuf,
    pub score: u64,
}

#[derive(Debug, Clone)]
pub struct NormativeRanking {
    pub elected: RankedNormative,
    pub ranked: Vec<RankedNormative>,
}

struct Candidate {
    partition: u64,
    rank: u64,
    path: PathBuf,
    size: u64,
    instances: u64,
}

/// Parse a `norm_<p>_<r>` file's two header lines: `% <source graph path>`
/// then `% <size> <numInstances>` (§6).
fn parse_header(path: &Path) -> Result<(u64, u64)> {
    let text = std::fs::read_to_string(path)?;
    let mut lines = text.lines();
    let _source = lines.next();
    let stats_line = lines.next().ok_or_else(|| PladsError::ArtifactMissing(path.to_path_buf()))?;
    let stats = stats_line.trim_start_matches('%').trim();
    let mut parts = stats.split_whitespace();
    let size = parts
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| PladsError::ArtifactMissing(path.to_path_buf()))?;
    let instances = parts
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| PladsError::ArtifactMissing(path.to_path_buf()))?;
    Ok((size, instances))
}

/// Write `norm_p*_r*`'s body (everything after its two header lines) to
/// `bestSub.g` at `elected_output_path` (§4.6 step 3).
fn write_best_sub(source_path: &Path, elected_output_path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(source_path)?;
    let body: String = text
        .lines()
        .skip(2)
        .map(|line| format!("{line}\n"))
        .collect();
    std::fs::write(elected_output_path, body)?;
    Ok(())
}

/// Rank every `norm_<p>_<r>` file present for `window` (an ascending slice
/// of partition ordinals), `1..=num_normative` ranks each, folding in every
/// other partition's first matching rank. Returns `None` if no normative
/// file exists anywhere in the window (nothing to elect). On `Some`, writes
/// the elected pattern's body to `elected_output_path`.
pub fn rank(
    window: &[u64],
    num_normative: usize,
    holding_dir: &Path,
    matcher: &Matcher,
    elected_output_path: &Path,
) -> Result<Option<NormativeRanking>> {
    let mut candidates = Vec::new();
    for &partition in window {
        for rank in 1..=num_normative as u64 {
            let path = holding_dir.join(format!("norm_{partition}_{rank}"));
            if !path.exists() {
                continue;
            }
            let (size, instances) = parse_header(&path)?;
            candidates.push(Candidate {
                partition,
                rank,
                path,
                size,
                instances,
            });
        }
    }

    if candidates.is_empty() {
        return Ok(None);
    }

    let mut ranked = Vec::with_capacity(candidates.len());
    for candidate in &candidates {
        let mut score = candidate.size * candidate.instances;

        for &other_partition in window {
            if other_partition == candidate.partition {
                continue;
            }
            for other_rank in 1..=num_normative as u64 {
                let other_path = holding_dir.join(format!("norm_{other_partition}_{other_rank}"));
                if !other_path.exists() {
                    continue;
                }
                if matcher.equivalent(&candidate.path, &other_path)? {
                    let (other_size, other_instances) = parse_header(&other_path)?;
                    score += other_size * other_instances;
                    break; // first matching rank per other partition wins
                }
            }
        }

        ranked.push(RankedNormative {
            partition: candidate.partition,
            rank: candidate.rank,
            path: candidate.path.clone(),
            score,
        });
    }

    // Scan order is already ascending (partition, rank); replacing only on
    // a strictly greater score keeps the first-encountered winner on ties.
    let mut elected = ranked[0].clone();
    for candidate in &ranked[1..] {
        if candidate.score > elected.score {
            elected = candidate.clone();
        }
    }

    write_best_sub(&elected.path, elected_output_path)?;

    Ok(Some(NormativeRanking { elected, ranked }))
}
