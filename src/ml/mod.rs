pub mod features;
pub mod journal;
pub mod model;
pub mod persistence;
pub mod predict;

pub use features::{FeatureVector, RawRecord};
pub use journal::{PredictionEntry, PredictionLog};
pub use model::{Classifier, JackpotModel, TrainingParams, TrainingReport};
pub use persistence::{ModelArtifact, ModelStore};
pub use predict::{predict_jackpot, train_from_store};

#[cfg(test)]
pub use model::MockClassifier;
