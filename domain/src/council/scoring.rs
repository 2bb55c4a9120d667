//! Consensus scoring over a council's critique matrix
//!
//! Pure arithmetic: per-response means, a winner, and the run-level
//! average. No I/O, no session state.

use super::entities::{Consensus, Critique};
use super::panel::Panel;
use std::collections::HashMap;

/// Neutral score assigned when no cross-critique is possible
/// (single surviving participant). Keeps the confidence scale comparable
/// across runs instead of producing NaN.
pub const NEUTRAL_SCORE: f64 = 5.0;

/// Compute consensus from the critique matrix.
///
/// Every label on the panel receives a mean of the scores critics gave it;
/// the winner is the label with the highest mean, ties broken by label
/// order so the outcome is deterministic. Labels nobody scored (only
/// possible in a single-participant run) fall back to [`NEUTRAL_SCORE`].
pub fn score_consensus(panel: &Panel, critiques: &[Critique]) -> Consensus {
    let mut per_response_score: HashMap<String, f64> = HashMap::new();

    for label in panel.labels() {
        let scores: Vec<f64> = critiques
            .iter()
            .filter(|c| c.target_label == label)
            .map(|c| c.score as f64)
            .collect();

        let mean = if scores.is_empty() {
            NEUTRAL_SCORE
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };
        per_response_score.insert(label, mean);
    }

    // Highest mean wins; on a tie the earliest label keeps the win
    let mut winning_label = String::new();
    let mut best = f64::NEG_INFINITY;
    for label in panel.labels() {
        let score = per_response_score[&label];
        if score > best {
            best = score;
            winning_label = label;
        }
    }

    let average_score = if per_response_score.is_empty() {
        NEUTRAL_SCORE
    } else {
        per_response_score.values().sum::<f64>() / per_response_score.len() as f64
    };

    Consensus {
        per_response_score,
        average_score,
        winning_label,
    }
}
