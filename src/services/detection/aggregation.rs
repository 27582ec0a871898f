// Aggregation Logic
// Folds an ordered evidence list into a single probability

use crate::models::{Evidence, Vote};

use super::calibration::DOMINANCE_THRESHOLD;

const NEUTRAL_SCORE: f64 = 0.5;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum AggregationRule {
    /// Plain weighted mean of the votes.
    WeightedMean,
    /// Weighted mean, unless some vote reaches `threshold`; then the highest such vote wins.
    Dominance { threshold: f64 },
}

impl AggregationRule {
    pub const fn image() -> Self {
        Self::Dominance {
            threshold: DOMINANCE_THRESHOLD,
        }
    }
}

/// Weighted mean of `votes`, or `None` when there is no positive weight.
pub fn weighted_mean(votes: &[Vote]) -> Option<f64> {
    let total: f64 = votes.iter().map(|v| v.weight).sum();
    if votes.is_empty() || total <= 0.0 {
        return None;
    }
    Some(votes.iter().map(|v| v.score * v.weight).sum::<f64>() / total)
}

/// Fold the votes carried by `evidence` under `rule`. No votes means 0.5.
pub fn aggregate(evidence: &[Evidence], rule: AggregationRule) -> f64 {
    let votes: Vec<Vote> = evidence
        .iter()
        .filter_map(|e| e.vote)
        .map(|v| Vote::new(v.score.clamp(0.0, 1.0), v.weight))
        .collect();
    fold_votes(&votes, rule)
}

pub fn fold_votes(votes: &[Vote], rule: AggregationRule) -> f64 {
    let Some(mean) = weighted_mean(votes) else {
        return NEUTRAL_SCORE;
    };

    let score = match rule {
        AggregationRule::WeightedMean => mean,
        AggregationRule::Dominance { threshold } => votes
            .iter()
            .map(|v| v.score)
            .filter(|&s| s >= threshold)
            .fold(None, |best: Option<f64>, s| Some(best.map_or(s, |b| b.max(s))))
            .unwrap_or(mean),
    };
    score.clamp(0.0, 1.0)
}
