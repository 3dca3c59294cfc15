//! Per-metric series store (C3): an ordered, window-bounded sequence of
//! `(partition, value)` samples backed by a `gp_<metric>.txt` file.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::metrics::Metric;

/// An ordered, window-bounded series of samples for one metric.
///
/// A missing backing file is treated as an empty series (mean=0, stddev=0),
/// per §4.3 — this matters for the first `N` partitions, during which the
/// decider must not be fooled by an artificially tiny stddev into never
/// triggering, or always triggering.
#[derive(Debug, Clone)]
pub struct MetricSeries {
    metric: Metric,
    path: PathBuf,
    window: usize,
    samples: VecDeque<(u64, f64)>,
}

impl MetricSeries {
    /// Load (or initialize empty) the series for `metric` from
    /// `dir/gp_<metric>.txt`, bounded to `window` samples.
    pub fn load(dir: &Path, metric: Metric, window: usize) -> Result<Self> {
        let path = dir.join(format!("gp_{}.txt", metric.id()));
        let mut samples = VecDeque::new();
        if path.exists() {
            let text = std::fs::read_to_string(&path)?;
            for line in text.lines() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let mut parts = line.split_whitespace();
                if let (Some(p), Some(v)) = (parts.next(), parts.next()) {
                    if let (Ok(p), Ok(v)) = (p.parse::<u64>(), v.parse::<f64>()) {
                        samples.push_back((p, v));
                    }
                }
            }
        }
        while samples.len() > window {
            samples.pop_front();
        }
        Ok(MetricSeries { metric, path, window, samples })
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Append `(partition, value)` without evicting — used only for the
    /// initial bootstrap fill (§4.9 S0), where the series has not yet
    /// reached its window width.
    pub fn append(&mut self, partition: u64, value: f64) -> Result<()> {
        self.samples.push_back((partition, value));
        while self.samples.len() > self.window {
            self.samples.pop_front();
        }
        self.persist()
    }

    /// Drop the oldest entry and append the newest, keeping the series at
    /// exactly `window` length (once it has reached that length).
    pub fn roll(&mut self, new_partition: u64, new_value: f64) -> Result<()> {
        if self.samples.len() >= self.window {
            self.samples.pop_front();
        }
        self.samples.push_back((new_partition, new_value));
        self.persist()
    }

    /// Population mean of the current window. `0.0` for an empty series.
    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.samples.iter().map(|(_, v)| v).sum();
        sum / self.samples.len() as f64
    }

    /// Population standard deviation — `√(Σ(xᵢ − μ)² / n)`, *not* the
    /// sample (n-1) form. This is a deliberate, preserved quirk (§9 Open
    /// Questions): do not "correct" it to Bessel's correction.
    pub fn stddev(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let sum_sq: f64 = self.samples.iter().map(|(_, v)| (v - mean).powi(2)).sum();
        (sum_sq / self.samples.len() as f64).sqrt()
    }

    fn persist(&self) -> Result<()> {
        let mut text = String::new();
        for (p, v) in &self.samples {
            text.push_str(&format!("{p} {v}\n"));
        }
        std::fs::write(&self.path, text)?;
        Ok(())
    }
}
