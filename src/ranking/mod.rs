//! Cross-partition ranking (C6, C7): folds every miner output file
//! currently held for the active window into a single elected normative
//! pattern, and a single most-anomalous set.

pub mod anomaly;
pub mod normative;

pub use anomaly::{rank as rank_anomalies, AnomalyFile, AnomalyRanking, RankedAnomaly};
pub use normative::{rank as rank_normative, NormativeRanking, RankedNormative};
