//! Metric identifiers and the metric series store (C3).

mod compute;
mod series;

pub use compute::{compute_metric, MetricComputeError};
pub use series::MetricSeries;

/// The seven graph-property metrics PLADS tracks per partition (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Connected,
    Density,
    Cluster,
    Eigen,
    Community,
    Triangle,
    Entropy,
}

impl Metric {
    /// All seven metrics, in the fixed order used by [`ChangeDetectionApproach::SingleMetric`]
    /// indices (1-based: `ALL[0]` is mode `1`, etc.) and by mode `9`'s vote.
    pub const ALL: [Metric; 7] = [
        Metric::Connected,
        Metric::Density,
        Metric::Cluster,
        Metric::Eigen,
        Metric::Community,
        Metric::Triangle,
        Metric::Entropy,
    ];

    /// Identifier used for series filenames (`gp_<metric>.txt`) and as the
    /// key into `plads.cfg`'s per-metric executable table.
    pub fn id(&self) -> &'static str {
        match self {
            Metric::Connected => "connected",
            Metric::Density => "density",
            Metric::Cluster => "cluster",
            Metric::Eigen => "eigen",
            Metric::Community => "community",
            Metric::Triangle => "triangle",
            Metric::Entropy => "entropy",
        }
    }

    /// 1-based index matching `CHANGE_DETECTION_APPROACH` single-metric
    /// mode values (modes `1..7`).
    pub fn from_mode_index(index: usize) -> Option<Metric> {
        Metric::ALL.get(index.checked_sub(1)?).copied()
    }

    /// Scaling factor applied before the value is stored in its series.
    /// Connectedness ×1000, entropy ×100, all others unscaled — this is
    /// load-bearing: mean/stddev comparisons happen in the scaled domain
    /// (§4.2, §9 Open Questions).
    pub fn scale(&self, raw: f64) -> f64 {
        match self {
            Metric::Connected => raw * 1000.0,
            Metric::Entropy => raw * 100.0,
            _ => raw,
        }
    }
}
