//! Window controller (C9): the outer state machine driving PLADS end to end
//! (§4.9). [`WindowController::run_pass`] performs the one-time bootstrap
//! (S0) on its first call, then one S1→S7 cycle per subsequent call.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, info_span};

use crate::config::PladsConfig;
use crate::decider::{should_rediscover, MetricSample};
use crate::error::{PladsError, Result};
use crate::matcher::Matcher;
use crate::metrics::{compute_metric, Metric, MetricSeries};
use crate::miner::{
    build_anomaly_command, build_normative_command, collect_anomaly_outputs,
    collect_normative_outputs, read_numanom, AnomalyJob, NormativeJob,
};
use crate::ranking::{rank_anomalies, rank_normative, AnomalyFile, NormativeRanking};
use crate::report;
use crate::state::{purge_retired_partition, Layout, Window};
use crate::watcher;
use crate::workers::{WorkerJob, WorkerPool};

pub struct WindowController {
    config: PladsConfig,
    layout: Layout,
    matcher: Matcher,
    workers: WorkerPool,
    series: HashMap<Metric, MetricSeries>,
    window: Option<Window>,
    graph_files: HashMap<u64, PathBuf>,
    last_archived_partition: Option<u64>,
    last_elected_rank: Option<usize>,
}

impl WindowController {
    pub fn new(config: PladsConfig, worker_override: Option<usize>) -> Result<Self> {
        config.ensure_directories()?;
        let layout = Layout::from_config(&config);
        std::fs::create_dir_all(&layout.output_dir)?;

        let matcher = Matcher::new(config.gm_executable.clone());
        let worker_count = worker_override.unwrap_or_else(|| config.num_partitions.max(1));
        let workers = WorkerPool::new(worker_count);

        let mut series = HashMap::new();
        for metric in Metric::ALL {
            series.insert(
                metric,
                MetricSeries::load(&layout.output_dir, metric, config.num_partitions)?,
            );
        }

        Ok(WindowController {
            config,
            layout,
            matcher,
            workers,
            series,
            window: None,
            graph_files: HashMap::new(),
            last_archived_partition: None,
            last_elected_rank: None,
        })
    }

    pub fn window(&self) -> Option<Window> {
        self.window
    }

    /// The configured poll interval between empty S1 intake checks.
    pub fn retry_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.config.time_between_file_check)
    }

    /// Run one pass. `Ok(true)` means work happened (bootstrap, or a full
    /// S1..S7 cycle); `Ok(false)` means S1 found no new intake file — the
    /// caller should sleep `TIME_BETWEEN_FILE_CHECK` seconds and retry.
    pub fn run_pass(&mut self) -> Result<bool> {
        if self.window.is_none() {
            let _span = info_span!("bootstrap").entered();
            self.bootstrap()?;
            return Ok(true);
        }
        let _span = info_span!("window_cycle").entered();
        self.step()
    }

    fn enabled_metrics(&self) -> Vec<Metric> {
        Metric::ALL
            .into_iter()
            .filter(|m| *m == Metric::Density || self.config.executable_for(*m).is_some())
            .collect()
    }

    fn work_dir_for(&self, partition: u64) -> PathBuf {
        self.layout.processing.join(format!("work_{partition}"))
    }

    fn claim_blocking(&self, dir: &std::path::Path) -> Result<String> {
        loop {
            if let Some(name) = watcher::claim_oldest(dir)? {
                return Ok(name);
            }
            std::thread::sleep(std::time::Duration::from_secs(
                self.config.time_between_file_check,
            ));
        }
    }

    fn measure_partition(
        &self,
        partition: u64,
        graph_path: &std::path::Path,
        work_dir: &std::path::Path,
    ) -> Result<HashMap<Metric, f64>> {
        let mut values = HashMap::new();
        for metric in self.enabled_metrics() {
            let executable = self.config.executable_for(metric);
            let value = compute_metric(metric, graph_path, work_dir, partition, executable)?;
            values.insert(metric, value);
        }
        Ok(values)
    }

    fn append_metrics(&mut self, partition: u64, values: &HashMap<Metric, f64>) -> Result<()> {
        for (&metric, &value) in values {
            self.series
                .get_mut(&metric)
                .expect("every metric's series is preloaded in `new`")
                .append(partition, value)?;
        }
        Ok(())
    }

    fn record_change_detection_time(&self, elapsed: std::time::Duration) -> Result<()> {
        let path = self.layout.output_dir.join("changeDetectionValue.txt");
        let prior: u128 = std::fs::read_to_string(&path)
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0);
        std::fs::write(&path, (prior + elapsed.as_micros()).to_string())?;
        Ok(())
    }

    fn accumulate_numanom(&self, additional: u64) -> Result<()> {
        let path = self.layout.output_dir.join("numanom.txt");
        let prior: u64 = std::fs::read_to_string(&path)
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0);
        std::fs::write(&path, (prior + additional).to_string())?;
        Ok(())
    }

    fn last_archived_path(&self) -> Option<PathBuf> {
        self.last_archived_partition
            .map(|p| self.layout.archived_best_sub_path(p))
    }

    fn archive_elected(&mut self, partition: u64) -> Result<()> {
        std::fs::copy(self.layout.best_sub_path(), self.layout.archived_best_sub_path(partition))?;
        self.last_archived_partition = Some(partition);
        Ok(())
    }

    fn elect_normative(&self, window: &Window) -> Result<Option<NormativeRanking>> {
        let ordinals = window.ordinals();
        rank_normative(
            &ordinals,
            self.config.num_normative_patterns,
            &self.layout.normative_holding,
            &self.matcher,
            &self.layout.best_sub_path(),
        )
    }

    /// Move `norm_<partition>_<rank>` files out of the per-job work
    /// directory and into the normative holding area (§4.9 S0/S4).
    fn move_normative_outputs(&self, partition: u64) -> Result<()> {
        let work_dir = self.work_dir_for(partition);
        for path in collect_normative_outputs(&work_dir, partition, self.config.num_normative_patterns) {
            let name = path
                .file_name()
                .expect("collected normative path always has a filename")
                .to_string_lossy()
                .to_string();
            watcher::move_file(&name, &work_dir, &self.layout.normative_holding)?;
        }
        Ok(())
    }

    /// Read `numanom.txt` and move `anom_*`/`anomInst_*` pairs out of the
    /// per-job work directory for every partition in `partitions`,
    /// aggregating the cumulative anomaly count serially (§5 Ordering
    /// guarantees: the parent, never workers, performs this read-modify-write).
    fn collect_anomaly_results(&mut self, partitions: &[u64]) -> Result<()> {
        let mut total = 0u64;
        for &partition in partitions {
            let work_dir = self.work_dir_for(partition);
            total += read_numanom(&work_dir)?;
            for output in collect_anomaly_outputs(&work_dir, partition)? {
                let anom_name = output
                    .anom_path
                    .file_name()
                    .expect("anom path always has a filename")
                    .to_string_lossy()
                    .to_string();
                let inst_name = output
                    .anom_inst_path
                    .file_name()
                    .expect("anomInst path always has a filename")
                    .to_string_lossy()
                    .to_string();
                watcher::move_file(&anom_name, &work_dir, &self.layout.anomaly_staging)?;
                watcher::move_file(&inst_name, &work_dir, &self.layout.anomaly_staging)?;
            }
        }
        self.accumulate_numanom(total)
    }

    fn anomaly_files_in_window(&self, window: &Window) -> Result<Vec<AnomalyFile>> {
        let ordinals = window.ordinals();
        let mut files = Vec::new();

        let entries = match std::fs::read_dir(&self.layout.anomaly_staging) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(files),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let entry = entry?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !name.starts_with("anom_") || name.starts_with("anomInst_") {
                continue;
            }
            let rest = &name["anom_".len()..];
            let mut parts = rest.splitn(2, '_');
            let (Some(p_str), Some(k_str)) = (parts.next(), parts.next()) else {
                continue;
            };
            let (Ok(partition), Ok(rank)) = (p_str.parse::<u64>(), k_str.parse::<u64>()) else {
                continue;
            };
            if ordinals.contains(&partition) {
                files.push(AnomalyFile {
                    partition,
                    rank,
                    path: entry.path(),
                });
            }
        }

        Ok(files)
    }

    fn report(&self, normative: &Option<NormativeRanking>) -> Result<()> {
        if let Some(ranking) = normative {
            report::report_normative(ranking);
        }
        let window = self.window.expect("window is set before any report runs");
        let files = self.anomaly_files_in_window(&window)?;
        let ranking = rank_anomalies(&files, &self.matcher)?;
        report::report_anomalies(ranking.as_ref());
        Ok(())
    }

    /// S0 Bootstrap: fill the initial window of `NUM_PARTITIONS` partitions,
    /// mine normative patterns for all of them in parallel, elect the best,
    /// then mine anomalies for all of them against it.
    fn bootstrap(&mut self) -> Result<()> {
        let n = self.config.num_partitions as u64;
        let window = Window::bootstrap(self.config.num_partitions);
        let mut normative_jobs = Vec::new();

        for partition in 1..=n {
            let name = self.claim_blocking(&self.layout.intake)?;
            let moved = watcher::move_file(&name, &self.layout.intake, &self.layout.processing)?;
            self.graph_files.insert(partition, moved.clone());

            let work_dir = self.work_dir_for(partition);
            std::fs::create_dir_all(&work_dir)?;
            let values = self.measure_partition(partition, &moved, &work_dir)?;
            self.append_metrics(partition, &values)?;

            let job = NormativeJob {
                partition,
                graph_file: moved,
            };
            let cmd = build_normative_command(&self.config, &job, &work_dir);
            normative_jobs.push(WorkerJob::new(format!("norm-{partition}"), cmd));

            info!(partition, "bootstrap partition measured and queued for normative mining");
        }

        self.workers.run_all(
            normative_jobs,
            Some(&self.layout.output_dir.join("pids.txt")),
        )?;

        for &partition in &window.ordinals() {
            self.move_normative_outputs(partition)?;
        }

        self.window = Some(window);
        let ranking = self.elect_normative(&window)?;

        if let Some(ranking) = &ranking {
            self.last_elected_rank = Some(ranking.elected.rank as usize);

            let mut anomaly_jobs = Vec::new();
            for &partition in &window.ordinals() {
                let graph_file = self.graph_files[&partition].clone();
                let work_dir = self.work_dir_for(partition);
                let job = AnomalyJob {
                    partition,
                    normative_rank: ranking.elected.rank as usize,
                    normative_file: self.layout.best_sub_path(),
                    graph_file,
                };
                let cmd = build_anomaly_command(&self.config, &job, &work_dir);
                anomaly_jobs.push(WorkerJob::new(format!("anom-{partition}"), cmd));
            }
            self.workers.run_all(anomaly_jobs, None)?;
            self.collect_anomaly_results(&window.ordinals())?;
            self.archive_elected(window.current)?;
        }

        self.report(&ranking)
    }

    /// One S1..S7 cycle. `Ok(false)` if S1 found no new file.
    fn step(&mut self) -> Result<bool> {
        let name = match watcher::claim_oldest(&self.layout.intake)? {
            Some(n) => n,
            None => return Ok(false),
        };

        // S1 Idle -> slide the window.
        let retired = {
            let window = self
                .window
                .as_mut()
                .expect("step is only called after bootstrap sets a window");
            window.advance()
        };
        let window = self.window.expect("window set above");

        purge_retired_partition(&self.layout, retired)?;
        self.graph_files.remove(&retired);

        let new_partition = window.current;
        let moved = watcher::move_file(&name, &self.layout.intake, &self.layout.processing)?;
        self.graph_files.insert(new_partition, moved.clone());

        // S2 Measure.
        let work_dir = self.work_dir_for(new_partition);
        std::fs::create_dir_all(&work_dir)?;

        let measure_start = Instant::now();
        let values = self.measure_partition(new_partition, &moved, &work_dir)?;

        let mut samples = HashMap::new();
        for (&metric, &value) in &values {
            let series = self
                .series
                .get(&metric)
                .expect("every metric's series is preloaded in `new`");
            samples.insert(
                metric,
                MetricSample {
                    value,
                    mean: series.mean(),
                    stddev: series.stddev(),
                },
            );
        }
        for (&metric, &value) in &values {
            self.series.get_mut(&metric).unwrap().roll(new_partition, value)?;
        }
        self.record_change_detection_time(measure_start.elapsed())?;

        // S3 Decide.
        let rediscover_needed = should_rediscover(
            self.config.change_detection_approach,
            self.config.threshold_for_num_exceeded_metrics,
            &samples,
        );

        let ranking_opt = if rediscover_needed {
            info!(partition = new_partition, "change detected, rediscovering normative pattern");
            self.rediscover(new_partition, &window)?
        } else {
            info!(partition = new_partition, "no change detected, skipping rediscovery");
            self.skip_rediscover(new_partition)?;
            None
        };

        self.report(&ranking_opt)?;
        Ok(true)
    }

    /// S4 Rediscover (+ the S5 fallthrough when the elected pattern
    /// changes): mine normative patterns for `partition` only, re-elect
    /// across the full window, and compare against the previously archived
    /// pattern to decide how widely to re-run anomaly mining.
    fn rediscover(&mut self, partition: u64, window: &Window) -> Result<Option<NormativeRanking>> {
        let work_dir = self.work_dir_for(partition);
        let graph_file = self.graph_files[&partition].clone();
        let job = NormativeJob {
            partition,
            graph_file,
        };
        let cmd = build_normative_command(&self.config, &job, &work_dir);
        self.workers
            .run_all(vec![WorkerJob::new(format!("norm-{partition}"), cmd)], None)?;
        self.move_normative_outputs(partition)?;

        let previous_best = self.last_archived_path();
        let ranking = match self.elect_normative(window)? {
            Some(r) => r,
            None => return Ok(None),
        };
        self.last_elected_rank = Some(ranking.elected.rank as usize);

        let pattern_changed = match &previous_best {
            Some(prev) if prev.exists() => {
                !self.matcher.equivalent(prev, &self.layout.best_sub_path())?
            }
            _ => true,
        };

        if pattern_changed {
            let ordinals = window.ordinals();
            let mut jobs = Vec::new();
            for &p in &ordinals {
                let gfile = self.graph_files[&p].clone();
                let wdir = self.work_dir_for(p);
                std::fs::create_dir_all(&wdir)?;
                let ajob = AnomalyJob {
                    partition: p,
                    normative_rank: ranking.elected.rank as usize,
                    normative_file: self.layout.best_sub_path(),
                    graph_file: gfile,
                };
                jobs.push(WorkerJob::new(format!("anom-{p}"), build_anomaly_command(&self.config, &ajob, &wdir)));
            }
            self.workers.run_all(jobs, None)?;
            self.collect_anomaly_results(&ordinals)?;
            self.archive_elected(partition)?;
        } else {
            let archived = previous_best.expect("unchanged pattern implies a prior archive exists");
            let wdir = self.work_dir_for(partition);
            let gfile = self.graph_files[&partition].clone();
            let ajob = AnomalyJob {
                partition,
                normative_rank: ranking.elected.rank as usize,
                normative_file: archived,
                graph_file: gfile,
            };
            self.workers.run_all(
                vec![WorkerJob::new(format!("anom-{partition}"), build_anomaly_command(&self.config, &ajob, &wdir))],
                None,
            )?;
            self.collect_anomaly_results(&[partition])?;
        }

        Ok(Some(ranking))
    }

    /// S6 Skip-rediscover: move the new partition's graph file straight into
    /// the anomaly-mining staging area and mine only it against the
    /// existing archived pattern.
    fn skip_rediscover(&mut self, partition: u64) -> Result<()> {
        let graph_file = self.graph_files[&partition].clone();
        let name = graph_file
            .file_name()
            .expect("graph file path always has a filename")
            .to_string_lossy()
            .to_string();
        let staged = watcher::move_file(&name, &self.layout.processing, &self.layout.anomaly_staging)?;
        self.graph_files.insert(partition, staged.clone());

        let archived = self
            .last_archived_path()
            .ok_or_else(|| PladsError::ArtifactMissing(self.layout.best_sub_path()))?;
        let rank = self.last_elected_rank.unwrap_or(1);

        let work_dir = self.work_dir_for(partition);
        std::fs::create_dir_all(&work_dir)?;
        let job = AnomalyJob {
            partition,
            normative_rank: rank,
            normative_file: archived,
            graph_file: staged,
        };
        let cmd = build_anomaly_command(&self.config, &job, &work_dir);
        self.workers
            .run_all(vec![WorkerJob::new(format!("anom-{partition}"), cmd)], None)?;
        self.collect_anomaly_results(&[partition])
    }
}
