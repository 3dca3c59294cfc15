//! Configuration loading for `plads.cfg`
//!
//! Whitespace-delimited `KEY VALUE` pairs, `//`-prefixed lines are comments,
//! blank lines are ignored. See SPEC_FULL.md §6 and §4.10.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{PladsError, Result};
use crate::metrics::Metric;

/// Change-detection mode, selected by `CHANGE_DETECTION_APPROACH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeDetectionApproach {
    /// Mode 0 (and any unrecognized value): always rediscover.
    Always,
    /// Modes 1..7: gate on a single metric, identified by its 1-based index
    /// into `Metric::ALL`.
    SingleMetric(usize),
    /// Mode 9: gate on a vote across all seven metrics.
    AllMetrics,
}

/// Fully parsed and validated `plads.cfg`.
#[derive(Debug, Clone)]
pub struct PladsConfig {
    pub graph_input_files_dir: PathBuf,
    pub files_being_processed_dir: PathBuf,
    pub processed_input_files_dir: PathBuf,
    pub initial_files_for_anom_detection_dir: PathBuf,
    pub best_normative_pattern_dir: PathBuf,
    pub anomalous_substructure_files_dir: PathBuf,
    pub norm_substructure_files_dir: PathBuf,
    pub output_files_dir: PathBuf,
    pub anomalous_output_files_dir: PathBuf,

    pub num_partitions: usize,
    pub num_normative_patterns: usize,
    pub time_between_file_check: u64,
    pub change_detection_approach: ChangeDetectionApproach,
    pub threshold_for_num_exceeded_metrics: usize,

    pub gbad_executable: PathBuf,
    pub gm_executable: PathBuf,
    pub metric_executables: HashMap<String, PathBuf>,

    /// Miner algorithm tag, e.g. "sub" / "anomaly" discriminator forwarded
    /// verbatim to the miner CLI.
    pub miner_algorithm: String,
    pub miner_threshold: f64,
    /// Up to four free-form `(param, value)` pairs passed through to the
    /// miner, plus one bare parameter (see §6).
    pub miner_params: Vec<(String, String)>,
    pub miner_bare_param: Option<String>,
}

const REQUIRED_PATH_KEYS: &[&str] = &[
    "GRAPH_INPUT_FILES_DIR",
    "FILES_BEING_PROCESSED_DIR",
    "PROCESSED_INPUT_FILES_DIR",
    "INITIAL_FILES_FOR_ANOM_DETECTION_DIR",
    "BEST_NORMATIVE_PATTERN_DIR",
    "ANOMALOUS_SUBSTRUCTURE_FILES_DIR",
    "NORM_SUBSTRUCTURE_FILES_DIR",
    "OUTPUT_FILES_DIR",
    "ANOMALOUS_OUTPUT_FILES_DIR",
];

const REQUIRED_INT_KEYS: &[&str] = &[
    "NUM_PARTITIONS",
    "NUM_NORMATIVE_PATTERNS",
    "TIME_BETWEEN_FILE_CHECK",
    "CHANGE_DETECTION_APPROACH",
    "THRESHOLD_FOR_NUM_EXCEEDED_METRICS",
];

const METRIC_KEYS: &[&str] = &[
    "CONNECTED_EXECUTABLE",
    "DENSITY_EXECUTABLE",
    "CLUSTER_EXECUTABLE",
    "EIGEN_EXECUTABLE",
    "COMMUNITY_EXECUTABLE",
    "TRIANGLE_EXECUTABLE",
    "ENTROPY_EXECUTABLE",
];

/// Tokenize one `plads.cfg` into a raw key/value map, stripping `//`
/// comments and blank lines. Does not validate required keys — that
/// happens in [`PladsConfig::load`].
fn tokenize(text: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for raw_line in text.lines() {
        let line = match raw_line.find("//") {
            Some(idx) => &raw_line[..idx],
            None => raw_line,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut parts = line.splitn(2, char::is_whitespace);
        let key = match parts.next() {
            Some(k) if !k.is_empty() => k,
            _ => continue,
        };
        let value = parts.next().unwrap_or("").trim();
        map.insert(key.to_string(), value.to_string());
    }
    map
}

fn require_str(map: &HashMap<String, String>, key: &str) -> Result<String> {
    map.get(key)
        .filter(|v| !v.is_empty())
        .cloned()
        .ok_or_else(|| PladsError::ConfigKeyMissing {
            key: key.to_string(),
        })
}

fn require_path(map: &HashMap<String, String>, key: &str) -> Result<PathBuf> {
    require_str(map, key).map(PathBuf::from)
}

fn require_usize(map: &HashMap<String, String>, key: &str) -> Result<usize> {
    let raw = require_str(map, key)?;
    raw.parse::<usize>()
        .map_err(|e| PladsError::ConfigValueInvalid {
            key: key.to_string(),
            value: raw,
            reason: e.to_string(),
        })
}

fn parse_approach(raw: &str) -> ChangeDetectionApproach {
    match raw.parse::<i64>() {
        Ok(0) => ChangeDetectionApproach::Always,
        Ok(9) => ChangeDetectionApproach::AllMetrics,
        Ok(n) if (1..=7).contains(&n) => ChangeDetectionApproach::SingleMetric(n as usize),
        // "Any other value: behave as 0" (§4.8), which also covers unparsable values.
        _ => ChangeDetectionApproach::Always,
    }
}

impl PladsConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PladsError::ConfigMissing(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    fn parse(text: &str) -> Result<Self> {
        let map = tokenize(text);

        for key in REQUIRED_PATH_KEYS {
            require_path(&map, key)?;
        }
        for key in REQUIRED_INT_KEYS {
            if *key != "CHANGE_DETECTION_APPROACH" {
                require_usize(&map, key)?;
            } else {
                require_str(&map, key)?;
            }
        }

        let mut metric_executables = HashMap::new();
        for key in METRIC_KEYS {
            if let Some(v) = map.get(*key).filter(|v| !v.is_empty()) {
                metric_executables.insert((*key).to_string(), PathBuf::from(v));
            }
        }

        let mut miner_params = Vec::new();
        for i in 1..=4 {
            let pkey = format!("MINER_PARAM_{i}");
            let vkey = format!("MINER_VALUE_{i}");
            if let (Some(p), Some(v)) = (map.get(&pkey), map.get(&vkey)) {
                if !p.is_empty() {
                    miner_params.push((p.clone(), v.clone()));
                }
            }
        }

        Ok(PladsConfig {
            graph_input_files_dir: require_path(&map, "GRAPH_INPUT_FILES_DIR")?,
            files_being_processed_dir: require_path(&map, "FILES_BEING_PROCESSED_DIR")?,
            processed_input_files_dir: require_path(&map, "PROCESSED_INPUT_FILES_DIR")?,
            initial_files_for_anom_detection_dir: require_path(
                &map,
                "INITIAL_FILES_FOR_ANOM_DETECTION_DIR",
            )?,
            best_normative_pattern_dir: require_path(&map, "BEST_NORMATIVE_PATTERN_DIR")?,
            anomalous_substructure_files_dir: require_path(
                &map,
                "ANOMALOUS_SUBSTRUCTURE_FILES_DIR",
            )?,
            norm_substructure_files_dir: require_path(&map, "NORM_SUBSTRUCTURE_FILES_DIR")?,
            output_files_dir: require_path(&map, "OUTPUT_FILES_DIR")?,
            anomalous_output_files_dir: require_path(&map, "ANOMALOUS_OUTPUT_FILES_DIR")?,

            num_partitions: require_usize(&map, "NUM_PARTITIONS")?,
            num_normative_patterns: require_usize(&map, "NUM_NORMATIVE_PATTERNS")?,
            time_between_file_check: require_usize(&map, "TIME_BETWEEN_FILE_CHECK")? as u64,
            change_detection_approach: parse_approach(&require_str(
                &map,
                "CHANGE_DETECTION_APPROACH",
            )?),
            threshold_for_num_exceeded_metrics: require_usize(
                &map,
                "THRESHOLD_FOR_NUM_EXCEEDED_METRICS",
            )?,

            gbad_executable: require_path(&map, "GBAD_EXECUTABLE")?,
            gm_executable: require_path(&map, "GM_EXECUTABLE")?,
            metric_executables,

            miner_algorithm: map.get("MINER_ALGORITHM").cloned().unwrap_or_default(),
            miner_threshold: map
                .get("MINER_THRESHOLD")
                .and_then(|v| v.parse::<f64>().ok())
                .unwrap_or(0.0),
            miner_params,
            miner_bare_param: map.get("MINER_BARE_PARAM").cloned(),
        })
    }

    /// Ensure every staging directory named in the config exists, creating
    /// it if necessary. Called once at startup.
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [
            &self.graph_input_files_dir,
            &self.files_being_processed_dir,
            &self.processed_input_files_dir,
            &self.initial_files_for_anom_detection_dir,
            &self.best_normative_pattern_dir,
            &self.anomalous_substructure_files_dir,
            &self.norm_substructure_files_dir,
            &self.output_files_dir,
            &self.anomalous_output_files_dir,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Look up the configured executable for `metric`, keyed by its
    /// `<METRIC>_EXECUTABLE` config entry (§6).
    pub fn executable_for(&self, metric: Metric) -> Option<&Path> {
        let key = format!("{}_EXECUTABLE", metric.id().to_uppercase());
        self.metric_executables.get(&key).map(PathBuf::as_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_cfg() -> String {
        r#"
            // PLADS configuration
            GRAPH_INPUT_FILES_DIR   /tmp/plads/intake
            FILES_BEING_PROCESSED_DIR /tmp/plads/processing
            PROCESSED_INPUT_FILES_DIR /tmp/plads/processed
            INITIAL_FILES_FOR_ANOM_DETECTION_DIR /tmp/plads/anom_staging
            BEST_NORMATIVE_PATTERN_DIR /tmp/plads/best
            ANOMALOUS_SUBSTRUCTURE_FILES_DIR /tmp/plads/anom
            NORM_SUBSTRUCTURE_FILES_DIR /tmp/plads/norm
            OUTPUT_FILES_DIR /tmp/plads/output
            ANOMALOUS_OUTPUT_FILES_DIR /tmp/plads/anom_output

            NUM_PARTITIONS 2
            NUM_NORMATIVE_PATTERNS 1
            TIME_BETWEEN_FILE_CHECK 5
            CHANGE_DETECTION_APPROACH 0
            THRESHOLD_FOR_NUM_EXCEEDED_METRICS 4

            GBAD_EXECUTABLE /usr/local/bin/gbad
            GM_EXECUTABLE /usr/local/bin/gm
        "#
        .to_string()
    }

    #[test]
    fn parses_required_keys() {
        let cfg = PladsConfig::parse(&sample_cfg()).unwrap();
        assert_eq!(cfg.num_partitions, 2);
        assert_eq!(cfg.num_normative_patterns, 1);
        assert_eq!(cfg.change_detection_approach, ChangeDetectionApproach::Always);
    }

    #[test]
    fn missing_key_is_an_error() {
        let text = sample_cfg().replace("NUM_PARTITIONS 2", "// NUM_PARTITIONS 2");
        let err = PladsConfig::parse(&text).unwrap_err();
        assert!(matches!(err, PladsError::ConfigKeyMissing { .. }));
    }

    #[test]
    fn unparsable_int_is_an_error() {
        let text = sample_cfg().replace("NUM_PARTITIONS 2", "NUM_PARTITIONS two");
        let err = PladsConfig::parse(&text).unwrap_err();
        assert!(matches!(err, PladsError::ConfigValueInvalid { .. }));
    }

    #[test]
    fn single_metric_approach_parses_index() {
        let text = sample_cfg().replace(
            "CHANGE_DETECTION_APPROACH 0",
            "CHANGE_DETECTION_APPROACH 3",
        );
        let cfg = PladsConfig::parse(&text).unwrap();
        assert_eq!(
            cfg.change_detection_approach,
            ChangeDetectionApproach::SingleMetric(3)
        );
    }

    #[test]
    fn unknown_approach_falls_back_to_always() {
        let text = sample_cfg().replace(
            "CHANGE_DETECTION_APPROACH 0",
            "CHANGE_DETECTION_APPROACH 42",
        );
        let cfg = PladsConfig::parse(&text).unwrap();
        assert_eq!(cfg.change_detection_approach, ChangeDetectionApproach::Always);
    }

    #[test]
    fn comment_only_lines_are_ignored() {
        let map = tokenize("// a comment\n   \nKEY value // trailing\n");
        assert_eq!(map.get("KEY"), Some(&"value".to_string()));
    }
}
