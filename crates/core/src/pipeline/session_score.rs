use crate::scoring::domain::facial_score::round_to_tenth;

/// Outcome of scoring a capture session.
///
/// `NoFrames` is distinct from an average of zero: a session whose source
/// produced nothing must not be confused with one whose frames all scored
/// 0.0.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionScore {
    /// Mean of per-frame scores, rounded to one decimal.
    Average { score: f64, frames: usize },
    /// The source produced no frames before termination.
    NoFrames,
}

impl SessionScore {
    /// Builds the session outcome from per-frame scores in capture order.
    pub fn from_scores(scores: &[f64]) -> Self {
        if scores.is_empty() {
            return SessionScore::NoFrames;
        }
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        SessionScore::Average {
            score: round_to_tenth(mean),
            frames: scores.len(),
        }
    }

    /// Reported score; 0.0 when no frames were captured.
    pub fn score(&self) -> f64 {
        match self {
            SessionScore::Average { score, .. } => *score,
            SessionScore::NoFrames => 0.0,
        }
    }
}
