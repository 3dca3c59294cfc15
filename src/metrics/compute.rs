//! Drives the external metric-calculator scripts (§4.2) and applies the
//! load-bearing scaling before a value is handed to [`crate::metrics::MetricSeries`].

use std::path::Path;
use std::process::Command;

use thiserror::Error;

use crate::graph::GraphReader;
use crate::metrics::Metric;

#[derive(Debug, Error)]
pub enum MetricComputeError {
    #[error("metric '{0}' has no configured executable")]
    NoExecutable(&'static str),
    #[error("failed to start metric script '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("metric script '{program}' exited with status {status}")]
    NonZeroExit { program: String, status: i32 },
    #[error("metric script produced no readable value: {0}")]
    UnreadableOutput(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Compute one metric's scaled value for `graph_path`, using `id` as the
/// collision-free key for temp files (§4.2). `density` is computed directly
/// from the counts without shelling out; every other metric invokes its
/// configured external script with `(vertices_file, edges_file, output_file)`
/// (entropy instead receives a CSV edge file) and reads a single float back
/// from `output_file`.
///
/// Temp files are always cleaned up before returning, including on error
/// paths where the script produced partial output.
pub fn compute_metric(
    metric: Metric,
    graph_path: &Path,
    work_dir: &Path,
    id: u64,
    executable: Option<&Path>,
) -> Result<f64, MetricComputeError> {
    if metric == Metric::Density {
        let (counts, vpath, epath) = GraphReader::read(graph_path, work_dir, id)?;
        let _ = std::fs::remove_file(&vpath);
        let _ = std::fs::remove_file(&epath);
        return Ok(metric.scale(counts.density()));
    }

    let executable = executable.ok_or(MetricComputeError::NoExecutable(metric.id()))?;
    let output_path = work_dir.join(format!("{}_{id}.txt", metric.id()));

    let result = if metric == Metric::Entropy {
        let (_, vpath, epath, csv_path) =
            GraphReader::read_with_csv_edges(graph_path, work_dir, id)?;
        let outcome = run_metric_script(executable, &csv_path, &output_path);
        let _ = std::fs::remove_file(&vpath);
        let _ = std::fs::remove_file(&epath);
        let _ = std::fs::remove_file(&csv_path);
        outcome
    } else {
        let (_, vpath, epath) = GraphReader::read(graph_path, work_dir, id)?;
        let outcome = run_metric_script_vertices_edges(executable, &vpath, &epath, &output_path);
        let _ = std::fs::remove_file(&vpath);
        let _ = std::fs::remove_file(&epath);
        outcome
    };

    let raw = result?;
    let _ = std::fs::remove_file(&output_path);
    Ok(metric.scale(raw))
}

fn run_metric_script_vertices_edges(
    executable: &Path,
    vertices_path: &Path,
    edges_path: &Path,
    output_path: &Path,
) -> Result<f64, MetricComputeError> {
    run_metric_script_with_args(executable, &[vertices_path, edges_path], output_path)
}

fn run_metric_script(
    executable: &Path,
    input_path: &Path,
    output_path: &Path,
) -> Result<f64, MetricComputeError> {
    run_metric_script_with_args(executable, &[input_path], output_path)
}

fn run_metric_script_with_args(
    executable: &Path,
    inputs: &[&Path],
    output_path: &Path,
) -> Result<f64, MetricComputeError> {
    let program = executable.display().to_string();
    let status = Command::new(executable)
        .args(inputs)
        .arg(output_path)
        .status()
        .map_err(|source| MetricComputeError::SpawnFailed {
            program: program.clone(),
            source,
        })?;

    if !status.success() {
        return Err(MetricComputeError::NonZeroExit {
            program,
            status: status.code().unwrap_or(-1),
        });
    }

    let text = std::fs::read_to_string(output_path)
        .map_err(|_| MetricComputeError::UnreadableOutput(output_path.display().to_string()))?;
    text.trim()
        .parse::<f64>()
        .map_err(|_| MetricComputeError::UnreadableOutput(output_path.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn density_needs_no_executable() {
        let dir = tempdir().unwrap();
        let graph = dir.path().join("g.txt");
        std::fs::write(&graph, "v 1 a\nv 2 b\nu 1 2 rel\n").unwrap();
        let value = compute_metric(Metric::Density, &graph, dir.path(), 1, None).unwrap();
        assert!((value - (1.0 / 4.0)).abs() < 1e-12);
    }

    #[test]
    fn non_density_metric_without_executable_is_an_error() {
        let dir = tempdir().unwrap();
        let graph = dir.path().join("g.txt");
        std::fs::write(&graph, "v 1 a\n").unwrap();
        let err = compute_metric(Metric::Cluster, &graph, dir.path(), 1, None).unwrap_err();
        assert!(matches!(err, MetricComputeError::NoExecutable("cluster")));
    }

    #[test]
    fn cleans_up_temp_files_after_running_a_script() {
        let dir = tempdir().unwrap();
        let graph = dir.path().join("g.txt");
        std::fs::write(&graph, "v 1 a\nv 2 b\nu 1 2 rel\n").unwrap();

        // A tiny shell script standing in for an external metric calculator:
        // it reads vertices/edges paths and an output path, writes a constant.
        let script_path = dir.path().join("fake_metric.sh");
        std::fs::write(
            &script_path,
            "#!/bin/sh\necho 0.42 > \"$3\"\n",
        )
        .unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&script_path).unwrap().permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&script_path, perms).unwrap();
        }

        let value =
            compute_metric(Metric::Cluster, &graph, dir.path(), 5, Some(&script_path)).unwrap();
        assert!((value - 0.42).abs() < 1e-9);
        assert!(!dir.path().join("vertices_5.txt").exists());
        assert!(!dir.path().join("edges_5.txt").exists());
        assert!(!dir.path().join("cluster_5.txt").exists());
    }

    #[test]
    fn connected_is_scaled_by_1000() {
        let dir = tempdir().unwrap();
        let graph = dir.path().join("g.txt");
        std::fs::write(&graph, "v 1 a\nv 2 b\nu 1 2 rel\n").unwrap();
        let script_path = dir.path().join("fake_connected.sh");
        std::fs::write(&script_path, "#!/bin/sh\necho 0.5 > \"$3\"\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&script_path).unwrap().permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&script_path, perms).unwrap();
        }
        let value =
            compute_metric(Metric::Connected, &graph, dir.path(), 6, Some(&script_path)).unwrap();
        assert!((value - 500.0).abs() < 1e-9);
    }
}
