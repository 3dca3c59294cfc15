//! Miner driver (C5): builds the external miner invocations for normative
//! discovery and anomaly mining, and collects the fixed artifact contract
//! (§4.5, §6) each mode produces. The driver never interprets pattern
//! content — only whether the expected files exist.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::PladsConfig;
use crate::error::{PladsError, Result};

/// One partition's normative-discovery job: mine up to `num_normative`
/// ranked patterns from `graph_file`.
#[derive(Debug, Clone)]
pub struct NormativeJob {
    pub partition: u64,
    pub graph_file: PathBuf,
}

/// Build the `GBAD_EXECUTABLE` invocation for normative discovery. Output
/// files (`norm_<p>_1 .. norm_<p>_M`) are written by the miner into
/// `work_dir`; the driver only checks for their presence afterward.
pub fn build_normative_command(config: &PladsConfig, job: &NormativeJob, work_dir: &Path) -> Command {
    let mut cmd = Command::new(&config.gbad_executable);
    cmd.arg("--mode").arg("normative");
    cmd.arg("--partition").arg(job.partition.to_string());
    cmd.arg("--graph").arg(&job.graph_file);
    cmd.arg("--num-normative").arg(config.num_normative_patterns.to_string());
    cmd.arg("--out-dir").arg(work_dir);
    cmd
}

/// Paths the miner is expected to have written, in rank order. Missing
/// ranks are simply absent from the returned list — a partitioned scan by
/// the ranker, not a fatal condition (§7).
pub fn collect_normative_outputs(work_dir: &Path, partition: u64, num_normative: usize) -> Vec<PathBuf> {
    (1..=num_normative)
        .map(|rank| work_dir.join(format!("norm_{partition}_{rank}")))
        .filter(|path| path.exists())
        .collect()
}

/// One partition's anomaly-mining job: score `graph_file`'s deviation from
/// `normative_file` (the pattern elected at `normative_rank`).
#[derive(Debug, Clone)]
pub struct AnomalyJob {
    pub partition: u64,
    pub normative_rank: usize,
    pub normative_file: PathBuf,
    pub graph_file: PathBuf,
}

/// Build the `GBAD_EXECUTABLE` invocation for anomaly mining, forwarding the
/// configured algorithm tag, threshold, and free-form parameter pairs
/// verbatim (§6).
pub fn build_anomaly_command(config: &PladsConfig, job: &AnomalyJob, work_dir: &Path) -> Command {
    let mut cmd = Command::new(&config.gbad_executable);
    cmd.arg("--mode").arg("anomaly");
    cmd.arg("--partition").arg(job.partition.to_string());
    cmd.arg("--rank").arg(job.normative_rank.to_string());
    cmd.arg("--normative").arg(&job.normative_file);
    cmd.arg("--graph").arg(&job.graph_file);
    cmd.arg("--algorithm").arg(&config.miner_algorithm);
    cmd.arg("--threshold").arg(config.miner_threshold.to_string());
    cmd.arg("--num-normative").arg(config.num_normative_patterns.to_string());
    for (param, value) in &config.miner_params {
        cmd.arg(format!("--{param}")).arg(value);
    }
    if let Some(bare) = &config.miner_bare_param {
        cmd.arg(bare);
    }
    cmd.arg("--out-dir").arg(work_dir);
    cmd
}

/// An `anom_<p>_<k>` / `anomInst_<p>_<k>` pair as produced by anomaly mining.
#[derive(Debug, Clone)]
pub struct AnomalyOutput {
    pub rank: u64,
    pub anom_path: PathBuf,
    pub anom_inst_path: PathBuf,
}

/// List every `anom_<partition>_<k>` file in `work_dir` that has a matching
/// `anomInst_<partition>_<k>` sibling, sorted by `k`. Listing by prefix
/// rather than probing a contiguous `k = 1..K` range, per the explicit
/// redesign flag in SPEC_FULL.md §9 — a gap in the sequence no longer stops
/// the scan early.
pub fn collect_anomaly_outputs(work_dir: &Path, partition: u64) -> Result<Vec<AnomalyOutput>> {
    let prefix = format!("anom_{partition}_");
    let mut outputs = Vec::new();

    let entries = match std::fs::read_dir(work_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(outputs),
        Err(e) => return Err(e.into()),
    };

    for entry in entries {
        let entry = entry?;
        let name = match entry.file_name().into_string() {
            Ok(n) => n,
            Err(_) => continue,
        };
        // Skip the `anomInst_` sibling form; only index on the `anom_` file.
        if !name.starts_with(&prefix) || name.starts_with("anomInst_") {
            continue;
        }
        let Some(rank) = name[prefix.len()..].parse::<u64>().ok() else {
            continue;
        };
        let anom_path = work_dir.join(&name);
        let anom_inst_path = work_dir.join(format!("anomInst_{partition}_{rank}"));
        if anom_inst_path.exists() {
            outputs.push(AnomalyOutput {
                rank,
                anom_path,
                anom_inst_path,
            });
        }
    }

    outputs.sort_by_key(|o| o.rank);
    Ok(outputs)
}

/// Read the single-line anomaly count the miner leaves in `numanom.txt`
/// after an anomaly-mining run. Its absence is treated as a missing
/// artifact, not a silently-zero count — the miner's contract requires it
/// whenever anomaly mining ran (§6).
pub fn read_numanom(work_dir: &Path) -> Result<u64> {
    let path = work_dir.join("numanom.txt");
    let text = std::fs::read_to_string(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PladsError::ArtifactMissing(path.clone())
        } else {
            PladsError::Io(e)
        }
    })?;
    text.trim()
        .parse::<u64>()
        .map_err(|_| PladsError::ArtifactMissing(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn test_config() -> PladsConfig {
        PladsConfig {
            graph_input_files_dir: PathBuf::from("/tmp/intake"),
            files_being_processed_dir: PathBuf::from("/tmp/processing"),
            processed_input_files_dir: PathBuf::from("/tmp/processed"),
            initial_files_for_anom_detection_dir: PathBuf::from("/tmp/anom_staging"),
            best_normative_pattern_dir: PathBuf::from("/tmp/best"),
            anomalous_substructure_files_dir: PathBuf::from("/tmp/anom"),
            norm_substructure_files_dir: PathBuf::from("/tmp/norm"),
            output_files_dir: PathBuf::from("/tmp/output"),
            anomalous_output_files_dir: PathBuf::from("/tmp/anom_output"),
            num_partitions: 2,
            num_normative_patterns: 2,
            time_between_file_check: 5,
            change_detection_approach: crate::config::ChangeDetectionApproach::Always,
            threshold_for_num_exceeded_metrics: 4,
            gbad_executable: PathBuf::from("/usr/local/bin/gbad"),
            gm_executable: PathBuf::from("/usr/local/bin/gm"),
            metric_executables: HashMap::new(),
            miner_algorithm: "sub".to_string(),
            miner_threshold: 0.1,
            miner_params: vec![("beam".to_string(), "4".to_string())],
            miner_bare_param: Some("--compress".to_string()),
        }
    }

    #[test]
    fn normative_command_carries_expected_flags() {
        let config = test_config();
        let job = NormativeJob {
            partition: 3,
            graph_file: PathBuf::from("/tmp/intake/p3.g"),
        };
        let cmd = build_normative_command(&config, &job, Path::new("/tmp/work"));
        let rendered = format!("{cmd:?}");
        assert!(rendered.contains("normative"));
        assert!(rendered.contains("p3.g"));
        assert!(rendered.contains('2')); // num_normative_patterns
    }

    #[test]
    fn anomaly_command_forwards_params_and_bare_param() {
        let config = test_config();
        let job = AnomalyJob {
            partition: 1,
            normative_rank: 1,
            normative_file: PathBuf::from("/tmp/best/bestSub.g"),
            graph_file: PathBuf::from("/tmp/intake/p1.g"),
        };
        let cmd = build_anomaly_command(&config, &job, Path::new("/tmp/work"));
        let rendered = format!("{cmd:?}");
        assert!(rendered.contains("--beam"));
        assert!(rendered.contains("--compress"));
        assert!(rendered.contains("sub"));
    }

    #[test]
    fn collect_normative_outputs_skips_missing_ranks() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("norm_1_1"), "% src\n% 3 1\n").unwrap();
        // rank 2 never produced
        let outputs = collect_normative_outputs(dir.path(), 1, 2);
        assert_eq!(outputs, vec![dir.path().join("norm_1_1")]);
    }

    #[test]
    fn collect_anomaly_outputs_requires_both_files_in_a_pair() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("anom_2_1"), "% 0.25\n").unwrap();
        std::fs::write(dir.path().join("anomInst_2_1"), "annotated\n").unwrap();
        // rank 2 has only the anom file, no anomInst sibling -> excluded
        std::fs::write(dir.path().join("anom_2_2"), "% 0.5\n").unwrap();

        let outputs = collect_anomaly_outputs(dir.path(), 2).unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].rank, 1);
    }

    #[test]
    fn collect_anomaly_outputs_on_missing_dir_is_empty() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("gone");
        let outputs = collect_anomaly_outputs(&missing, 1).unwrap();
        assert!(outputs.is_empty());
    }

    #[test]
    fn numanom_reads_the_single_integer_line() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("numanom.txt"), "3\n").unwrap();
        assert_eq!(read_numanom(dir.path()).unwrap(), 3);
    }

    #[test]
    fn missing_numanom_is_a_missing_artifact_error() {
        let dir = tempdir().unwrap();
        let err = read_numanom(dir.path()).unwrap_err();
        assert!(matches!(err, PladsError::ArtifactMissing(_)));
    }
}
