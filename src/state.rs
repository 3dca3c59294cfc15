//! Window-state bookkeeping shared by the controller (C9): partition
//! ordinals, the live window bounds, and the directory layout derived from
//! [`PladsConfig`] (§3 Data Model, §5).

use std::path::PathBuf;

use crate::config::PladsConfig;

/// The contiguous range of partition ordinals currently kept live. Width is
/// `current - oldest + 1`, bounded to `num_partitions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub oldest: u64,
    pub current: u64,
}

impl Window {
    pub fn bootstrap(num_partitions: usize) -> Self {
        Window {
            oldest: 1,
            current: num_partitions as u64,
        }
    }

    /// Every ordinal currently in `[oldest, current]`, ascending.
    pub fn ordinals(&self) -> Vec<u64> {
        (self.oldest..=self.current).collect()
    }

    pub fn width(&self) -> u64 {
        self.current - self.oldest + 1
    }

    /// Slide the window forward by one partition: a new partition enters,
    /// the oldest one retires (§4.9 S1).
    pub fn advance(&mut self) -> u64 {
        let retiring = self.oldest;
        self.oldest += 1;
        self.current += 1;
        retiring
    }
}

/// Resolved working directories the controller moves files through, all
/// derived from [`PladsConfig`] (§5 Shared resources).
#[derive(Debug, Clone)]
pub struct Layout {
    pub intake: PathBuf,
    pub processing: PathBuf,
    pub processed: PathBuf,
    pub anomaly_staging: PathBuf,
    pub normative_holding: PathBuf,
    pub best_pattern_dir: PathBuf,
    pub anomalous_output_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Layout {
    pub fn from_config(config: &PladsConfig) -> Self {
        Layout {
            intake: config.graph_input_files_dir.clone(),
            processing: config.files_being_processed_dir.clone(),
            processed: config.processed_input_files_dir.clone(),
            anomaly_staging: config.initial_files_for_anom_detection_dir.clone(),
            normative_holding: config.norm_substructure_files_dir.clone(),
            best_pattern_dir: config.best_normative_pattern_dir.clone(),
            anomalous_output_dir: config.anomalous_output_files_dir.clone(),
            output_dir: config.output_files_dir.clone(),
        }
    }

    pub fn best_sub_path(&self) -> PathBuf {
        self.output_dir.join("bestSub.g")
    }

    pub fn archived_best_sub_path(&self, partition: u64) -> PathBuf {
        self.best_pattern_dir.join(format!("bestSub_{partition}.g"))
    }
}

/// Remove every artifact belonging to a retiring partition from the holding
/// areas: `norm_<p>_*`, `anom_<p>_*`, `anomInst_<p>_*` (§4.9 S1, §8).
pub fn purge_retired_partition(layout: &Layout, retired: u64) -> crate::error::Result<()> {
    purge_prefixed(&layout.normative_holding, &format!("norm_{retired}_"))?;
    purge_prefixed(&layout.anomaly_staging, &format!("anom_{retired}_"))?;
    purge_prefixed(&layout.anomaly_staging, &format!("anomInst_{retired}_"))?;
    Ok(())
}

fn purge_prefixed(dir: &std::path::Path, prefix: &str) -> crate::error::Result<()> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    for entry in entries {
        let entry = entry?;
        if let Ok(name) = entry.file_name().into_string() {
            if name.starts_with(prefix) {
                std::fs::remove_file(entry.path())?;
            }
        }
    }
    Ok(())
}
