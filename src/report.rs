//! Reporting (§4.9 S7): prints the elected normative pattern and the
//! most-anomalous set at the end of every pass.

use tracing::info;

use crate::ranking::{AnomalyRanking, NormativeRanking};

pub fn report_normative(ranking: &NormativeRanking) {
    info!(
        partition = ranking.elected.partition,
        rank = ranking.elected.rank,
        score = ranking.elected.score,
        "elected normative pattern"
    );
}

/// Print the most-anomalous set, or the fixed "no anomalies" message the
/// distilled spec requires verbatim when nothing was found (§9 scenario 1).
pub fn report_anomalies(ranking: Option<&AnomalyRanking>) {
    match ranking {
        None => println!("No anomalous substructures to report."),
        Some(ranking) if ranking.most_anomalous.is_empty() => {
            println!("No anomalous substructures to report.");
        }
        Some(ranking) => {
            println!(
                "Most anomalous substructure(s) (score = {:.6}):",
                ranking.min_score
            );
            for item in &ranking.most_anomalous {
                println!("  partition {} rank {}", item.partition, item.rank);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::RankedAnomaly;
    use std::path::PathBuf;

    #[test]
    fn empty_ranking_reports_no_anomalies() {
        let ranking = AnomalyRanking {
            min_score: 0.5,
            most_anomalous: vec![],
        };
        report_anomalies(Some(&ranking));
    }

    #[test]
    fn populated_ranking_does_not_panic() {
        let ranking = AnomalyRanking {
            min_score: 0.5,
            most_anomalous: vec![RankedAnomaly {
                partition: 1,
                rank: 1,
                path: PathBuf::from("anom_1_1"),
                score: 0.5,
            }],
        };
        report_anomalies(Some(&ranking));
    }
}
