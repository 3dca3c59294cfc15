//! Change-detection decider (C8): given the latest metric values and their
//! rolling statistics, decide whether normative-pattern rediscovery is
//! required (§4.8).

use std::collections::HashMap;

use crate::config::ChangeDetectionApproach;
use crate::metrics::Metric;

/// One metric's freshly-measured value alongside the rolling mean/stddev it
/// is compared against (computed from the series *before* this value rolls
/// in, per §4.3/§4.9 S2-S3 ordering).
#[derive(Debug, Clone, Copy)]
pub struct MetricSample {
    pub value: f64,
    pub mean: f64,
    pub stddev: f64,
}

impl MetricSample {
    /// The one-sided test shared by every mode: a sharp *increase* beyond
    /// one stddev above the mean. A decrease never triggers (§4.8).
    fn exceeds(&self) -> bool {
        (self.value - self.mean) > self.stddev
    }
}

/// `(value - mean) > stddev` iff rediscovery is required, given the
/// configured [`ChangeDetectionApproach`] and this partition's fresh
/// samples (keyed by metric).
pub fn should_rediscover(
    approach: ChangeDetectionApproach,
    threshold_for_num_exceeded: usize,
    samples: &HashMap<Metric, MetricSample>,
) -> bool {
    match approach {
        ChangeDetectionApproach::Always => true,
        ChangeDetectionApproach::SingleMetric(index) => {
            // The original funnels both single-metric and all-metric modes
            // through one "count exceeded >= threshold" branch, by setting
            // the count to an arbitrarily large sentinel for single-metric
            // mode so it always clears any configured threshold. Preserved
            // here explicitly rather than special-cased away.
            let single_metric_sentinel_count = usize::MAX;
            let exceeded = match Metric::from_mode_index(index).and_then(|m| samples.get(&m)) {
                Some(sample) if sample.exceeds() => single_metric_sentinel_count,
                _ => 0,
            };
            exceeded >= threshold_for_num_exceeded
        }
        ChangeDetectionApproach::AllMetrics => {
            let exceeded_count = Metric::ALL
                .iter()
                .filter_map(|m| samples.get(m))
                .filter(|sample| sample.exceeds())
                .count();
            exceeded_count >= threshold_for_num_exceeded
        }
    }
}
