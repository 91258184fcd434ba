use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a single-shot jackpot prediction.
///
/// `Failed` is its own variant so callers match on it before reading a
/// probability; a genuine "no jackpot" prediction is `Predicted { label: 0, .. }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PredictionResult {
    Predicted {
        label: u8,
        probability: f64,
        advice: BetAdvice,
    },
    Failed {
        message: String,
    },
}

impl PredictionResult {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn probability(&self) -> Option<f64> {
        match self {
            Self::Predicted { probability, .. } => Some(*probability),
            Self::Failed { .. } => None,
        }
    }
}

impl fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Predicted { label, probability, advice } => {
                let outcome = if *label == 1 { "JACKPOT" } else { "no jackpot" };
                write!(
                    f,
                    "Prediction: {} | jackpot probability {:.2}% | {}",
                    outcome,
                    probability * 100.0,
                    advice.describe(*probability)
                )
            }
            Self::Failed { message } => write!(f, "Prediction failed: {}", message),
        }
    }
}

/// Operator-facing betting suggestion for one prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetAdvice {
    Bet,
    Observe,
}

impl BetAdvice {
    /// Bet only when the probability strictly clears the threshold
    pub fn from_probability(probability: f64, threshold: f64) -> Self {
        if probability > threshold {
            BetAdvice::Bet
        } else {
            BetAdvice::Observe
        }
    }

    pub fn describe(&self, probability: f64) -> String {
        match self {
            BetAdvice::Bet => format!("suggest betting (confidence {:.1}%)", probability * 100.0),
            BetAdvice::Observe => format!("suggest observing (confidence {:.1}%)", probability * 100.0),
        }
    }
}
