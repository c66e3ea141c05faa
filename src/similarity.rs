//! Outcome of comparing two pieces of evidence.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// Result of a single comparison: either a hard rejection or a non-negative
/// contribution to the match chance.
///
/// A rejection means the two records must never be proposed as duplicates.
/// It orders below every score so that taking the maximum over several
/// comparisons prefers any real score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Similarity {
    Reject,
    Score(f64),
}

impl Similarity {
    pub const NEUTRAL: Similarity = Similarity::Score(0.0);

    pub fn is_reject(&self) -> bool {
        matches!(self, Similarity::Reject)
    }

    pub fn score(&self) -> Option<f64> {
        match self {
            Similarity::Reject => None,
            Similarity::Score(value) => Some(*value),
        }
    }

    /// Numeric form used by the CSV interchange and logs: rejects are `-1`.
    pub fn as_f64(&self) -> f64 {
        self.score().unwrap_or(-1.0)
    }

    pub fn max(self, other: Similarity) -> Similarity {
        match (self, other) {
            (Similarity::Reject, other) | (other, Similarity::Reject) => other,
            (Similarity::Score(a), Similarity::Score(b)) => Similarity::Score(a.max(b)),
        }
    }

    /// Credit summed over token pairs, capped at 1. No credit at all rejects.
    pub(crate) fn from_sum(value: f64) -> Similarity {
        if value == 0.0 {
            Similarity::Reject
        } else {
            Similarity::Score(value.min(1.0))
        }
    }
}

impl Add for Similarity {
    type Output = Similarity;

    fn add(self, rhs: Similarity) -> Similarity {
        match (self, rhs) {
            (Similarity::Score(a), Similarity::Score(b)) => Similarity::Score(a + b),
            _ => Similarity::Reject,
        }
    }
}

impl fmt::Display for Similarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Similarity::Reject => f.write_str("reject"),
            Similarity::Score(value) => write!(f, "{value:.2}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_prefers_scores_over_reject() {
        assert_eq!(
            Similarity::Reject.max(Similarity::Score(0.0)),
            Similarity::Score(0.0)
        );
        assert_eq!(
            Similarity::Score(0.5).max(Similarity::Reject),
            Similarity::Score(0.5)
        );
        assert_eq!(
            Similarity::Score(0.5).max(Similarity::Score(1.0)),
            Similarity::Score(1.0)
        );
        assert!(Similarity::Reject.max(Similarity::Reject).is_reject());
    }

    #[test]
    fn test_add_propagates_reject() {
        assert_eq!(
            Similarity::Score(1.0) + Similarity::Score(0.25),
            Similarity::Score(1.25)
        );
        assert!((Similarity::Score(1.0) + Similarity::Reject).is_reject());
    }

    #[test]
    fn test_from_sum_caps_and_rejects_zero() {
        assert_eq!(Similarity::from_sum(1.75), Similarity::Score(1.0));
        assert_eq!(Similarity::from_sum(0.25), Similarity::Score(0.25));
        assert!(Similarity::from_sum(0.0).is_reject());
    }
}
