use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::FeatureVector;
use crate::error::{PredictorError, PredictorResult};

/// Probability at or above which a prediction is labelled as a jackpot.
/// Independent of the simulator's betting threshold.
pub const LABEL_THRESHOLD: f64 = 0.5;

/// Binary jackpot classifier seen by the prediction and replay paths
#[cfg_attr(test, mockall::automock)]
pub trait Classifier {
    /// Probability in [0, 1] that the session ends in a jackpot
    fn predict_probability(&self, features: &FeatureVector) -> f64;

    fn predict_label(&self, features: &FeatureVector) -> u8 {
        u8::from(self.predict_probability(features) >= LABEL_THRESHOLD)
    }
}

/// Training report after model fit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub samples: usize,
    pub train_samples: usize,
    pub test_samples: usize,
    /// Accuracy on the held-out split
    pub accuracy: f64,
    pub jackpots_in_data: usize,
    pub misses_in_data: usize,
}

/// Hyper-parameters for the gradient-descent fit
#[derive(Debug, Clone)]
pub struct TrainingParams {
    pub min_samples: usize,
    pub test_fraction: f64,
    pub seed: u64,
    pub max_iterations: usize,
    pub learning_rate: f64,
    pub l2_penalty: f64,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            min_samples: 10,
            test_fraction: 0.2,
            seed: 42,
            max_iterations: 1000,
            learning_rate: 0.1,
            l2_penalty: 0.01,
        }
    }
}

/// Logistic regression coefficients plus the normalization they were fit with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelWeights {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub feature_means: Vec<f64>,
    pub feature_stds: Vec<f64>,
}

/// Trained jackpot classifier (logistic regression on the four session features)
#[derive(Debug, Clone, PartialEq)]
pub struct JackpotModel {
    weights: ModelWeights,
}

impl JackpotModel {
    pub fn from_weights(weights: ModelWeights) -> PredictorResult<Self> {
        let n = FeatureVector::NUM_FEATURES;
        if weights.coefficients.len() != n
            || weights.feature_means.len() != n
            || weights.feature_stds.len() != n
        {
            return Err(PredictorError::InvalidParameter(format!(
                "model weights must cover exactly {} features",
                n
            )));
        }
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &ModelWeights {
        &self.weights
    }

    /// Fit a model on labelled rows, holding out a shuffled test split for
    /// the accuracy estimate
    pub fn train(
        data: &[(FeatureVector, bool)],
        params: &TrainingParams,
    ) -> PredictorResult<(Self, TrainingReport)> {
        let n = data.len();
        if n < params.min_samples.max(2) {
            return Err(PredictorError::DataUnavailable(format!(
                "not enough training samples: {} < {}",
                n,
                params.min_samples.max(2)
            )));
        }

        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(params.seed);
        indices.shuffle(&mut rng);

        let test_count = ((n as f64 * params.test_fraction).round() as usize).clamp(1, n - 1);
        let (test_idx, train_idx) = indices.split_at(test_count);

        let (train_x, train_y) = to_matrix(data, train_idx);
        let (test_x, test_y) = to_matrix(data, test_idx);

        // Feature means and stds from the training split only
        let means = train_x
            .mean_axis(Axis(0))
            .ok_or_else(|| PredictorError::DataUnavailable("empty training split".to_string()))?;
        let stds = train_x.std_axis(Axis(0), 0.0);

        let normalized = normalize(&train_x, &means, &stds);
        let (coefficients, intercept) = fit_logistic_regression(&normalized, &train_y, params);

        let model = Self {
            weights: ModelWeights {
                coefficients,
                intercept,
                feature_means: means.to_vec(),
                feature_stds: stds.to_vec(),
            },
        };

        let mut correct = 0;
        for (i, row) in test_x.rows().into_iter().enumerate() {
            let prob = model.probability_of(row.iter().copied());
            let predicted = prob >= LABEL_THRESHOLD;
            let actual = test_y[i] >= 0.5;
            if predicted == actual {
                correct += 1;
            }
        }
        let accuracy = correct as f64 / test_count as f64;

        let jackpots = data.iter().filter(|(_, label)| *label).count();
        info!(
            "Jackpot model trained: {} samples ({} train / {} test), {:.1}% holdout accuracy, {} jackpots",
            n,
            train_idx.len(),
            test_count,
            accuracy * 100.0,
            jackpots
        );

        Ok((
            model,
            TrainingReport {
                samples: n,
                train_samples: train_idx.len(),
                test_samples: test_count,
                accuracy,
                jackpots_in_data: jackpots,
                misses_in_data: n - jackpots,
            },
        ))
    }

    fn probability_of(&self, values: impl Iterator<Item = f64>) -> f64 {
        let w = &self.weights;
        let mut z = w.intercept;
        for (j, value) in values.enumerate() {
            let std = w.feature_stds[j];
            let normalized = if std > 1e-10 {
                (value - w.feature_means[j]) / std
            } else {
                0.0
            };
            z += w.coefficients[j] * normalized;
        }
        sigmoid(z)
    }
}

impl Classifier for JackpotModel {
    fn predict_probability(&self, features: &FeatureVector) -> f64 {
        let prob = self.probability_of(features.to_array().into_iter());
        debug!("Jackpot probability {:.4} for {:?}", prob, features);
        prob
    }
}

fn to_matrix(data: &[(FeatureVector, bool)], rows: &[usize]) -> (Array2<f64>, Vec<f64>) {
    let mut features = Array2::<f64>::zeros((rows.len(), FeatureVector::NUM_FEATURES));
    let mut labels = Vec::with_capacity(rows.len());
    for (i, &row) in rows.iter().enumerate() {
        let (feat, label) = &data[row];
        for (j, value) in feat.to_array().into_iter().enumerate() {
            features[[i, j]] = value;
        }
        labels.push(if *label { 1.0 } else { 0.0 });
    }
    (features, labels)
}

/// Z-score each column; constant columns collapse to zero
fn normalize(features: &Array2<f64>, means: &Array1<f64>, stds: &Array1<f64>) -> Array2<f64> {
    let mut normalized = features.clone();
    for j in 0..features.ncols() {
        let std = stds[j];
        for i in 0..features.nrows() {
            normalized[[i, j]] = if std > 1e-10 {
                (features[[i, j]] - means[j]) / std
            } else {
                0.0
            };
        }
    }
    normalized
}

/// Batch gradient descent with L2 regularization
fn fit_logistic_regression(
    features: &Array2<f64>,
    labels: &[f64],
    params: &TrainingParams,
) -> (Vec<f64>, f64) {
    let n = features.nrows();
    let num_features = features.ncols();

    let mut coefficients = vec![0.0; num_features];
    let mut intercept = 0.0;

    for _iter in 0..params.max_iterations {
        let mut grad_coef = vec![0.0; num_features];
        let mut grad_intercept = 0.0;

        for i in 0..n {
            let mut z = intercept;
            for j in 0..num_features {
                z += coefficients[j] * features[[i, j]];
            }
            let error = sigmoid(z) - labels[i];

            grad_intercept += error;
            for j in 0..num_features {
                grad_coef[j] += error * features[[i, j]];
            }
        }

        intercept -= params.learning_rate * grad_intercept / n as f64;
        for j in 0..num_features {
            coefficients[j] -=
                params.learning_rate * (grad_coef[j] / n as f64 + params.l2_penalty * coefficients[j]);
        }
    }

    (coefficients, intercept)
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
