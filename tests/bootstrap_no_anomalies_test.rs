//! End-to-end scenario 1 from SPEC_FULL.md §8: a two-partition window with
//! identical graphs bootstraps to a single elected normative pattern and
//! zero anomalies. The miner and matcher are stand-in shell scripts so the
//! test never depends on the real external substructure miner.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

fn write_executable(path: &Path, script: &str) {
    std::fs::write(path, script).unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(path, perms).unwrap();
    }
}

/// A `GBAD_EXECUTABLE` stand-in: for `--mode normative` it writes a fixed
/// `norm_<p>_1` (size 7, 1 instance, matching SPEC_FULL.md §8 scenario 1);
/// for `--mode anomaly` it reports zero anomalies via `numanom.txt`.
const MINER_SCRIPT: &str = r#"#!/bin/sh
set -e
MODE=""
PARTITION=""
OUTDIR=""
while [ $# -gt 0 ]; do
  case "$1" in
    --mode) MODE="$2"; shift 2 ;;
    --partition) PARTITION="$2"; shift 2 ;;
    --out-dir) OUTDIR="$2"; shift 2 ;;
    --graph) GRAPH="$2"; shift 2 ;;
    *) shift ;;
  esac
done

if [ "$MODE" = "normative" ]; then
  OUT="$OUTDIR/norm_${PARTITION}_1"
  printf '%% %s\n' "$GRAPH" > "$OUT"
  printf '%% 7 1\n' >> "$OUT"
  printf 'v 1 a\nv 2 b\nv 3 c\nv 4 d\nu 1 2 rel\nu 2 3 rel\nu 3 4 rel\n' >> "$OUT"
elif [ "$MODE" = "anomaly" ]; then
  echo 0 > "$OUTDIR/numanom.txt"
fi
"#;

/// A `GM_EXECUTABLE` stand-in that always reports equivalence (exit 0),
/// matching scenario 1's identical partitions.
const MATCHER_SCRIPT: &str = "#!/bin/sh\nexit 0\n";

fn sample_graph() -> &'static str {
    "v 1 a\nv 2 b\nv 3 c\nv 4 d\nu 1 2 rel\nu 2 3 rel\nu 3 4 rel\n"
}

fn write_config(root: &Path) -> PathBuf {
    let cfg_path = root.join("plads.cfg");
    let cfg = format!(
        "GRAPH_INPUT_FILES_DIR {intake}\n\
         FILES_BEING_PROCESSED_DIR {processing}\n\
         PROCESSED_INPUT_FILES_DIR {processed}\n\
         INITIAL_FILES_FOR_ANOM_DETECTION_DIR {anom_staging}\n\
         BEST_NORMATIVE_PATTERN_DIR {best}\n\
         ANOMALOUS_SUBSTRUCTURE_FILES_DIR {anom}\n\
         NORM_SUBSTRUCTURE_FILES_DIR {norm}\n\
         OUTPUT_FILES_DIR {output}\n\
         ANOMALOUS_OUTPUT_FILES_DIR {anom_output}\n\
         NUM_PARTITIONS 2\n\
         NUM_NORMATIVE_PATTERNS 1\n\
         TIME_BETWEEN_FILE_CHECK 1\n\
         CHANGE_DETECTION_APPROACH 0\n\
         THRESHOLD_FOR_NUM_EXCEEDED_METRICS 4\n\
         GBAD_EXECUTABLE {gbad}\n\
         GM_EXECUTABLE {gm}\n",
        intake = root.join("intake").display(),
        processing = root.join("processing").display(),
        processed = root.join("processed").display(),
        anom_staging = root.join("anom_staging").display(),
        best = root.join("best").display(),
        anom = root.join("anom").display(),
        norm = root.join("norm").display(),
        output = root.join("output").display(),
        anom_output = root.join("anom_output").display(),
        gbad = root.join("gbad.sh").display(),
        gm = root.join("gm.sh").display(),
    );
    std::fs::write(&cfg_path, cfg).unwrap();
    cfg_path
}

#[test]
fn bootstrap_elects_the_shared_pattern_and_reports_no_anomalies() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    std::fs::create_dir_all(root.join("intake")).unwrap();
    write_executable(&root.join("gbad.sh"), MINER_SCRIPT);
    write_executable(&root.join("gm.sh"), MATCHER_SCRIPT);

    std::fs::write(root.join("intake/p1.g"), sample_graph()).unwrap();
    std::fs::write(root.join("intake/p2.g"), sample_graph()).unwrap();

    let cfg_path = write_config(root);

    let mut cmd = Command::cargo_bin("plads").unwrap();
    cmd.current_dir(root)
        .arg("--config")
        .arg(&cfg_path)
        .arg("--once")
        .arg("--workers")
        .arg("2");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("No anomalous substructures to report."));

    assert!(root.join("output/bestSub.g").exists());
    let best_sub = std::fs::read_to_string(root.join("output/bestSub.g")).unwrap();
    assert_eq!(best_sub, "v 1 a\nv 2 b\nv 3 c\nv 4 d\nu 1 2 rel\nu 2 3 rel\nu 3 4 rel\n");

    assert!(!root.join("intake/p1.g").exists());
    assert!(!root.join("intake/p2.g").exists());
}
