use tracing::{info, warn};

use super::features::{training_set, FeatureVector, RawRecord};
use super::journal::{PredictionEntry, PredictionLog};
use super::model::{Classifier, JackpotModel, TrainingParams, TrainingReport};
use super::persistence::{ModelArtifact, ModelStore};
use crate::error::PredictorResult;
use crate::store::RecordStore;
use crate::types::{BetAdvice, PredictionResult};

/// Offline training path: record table → features → fit → artifact
pub fn train_from_store(
    records: &RecordStore,
    models: &ModelStore,
    params: &TrainingParams,
) -> PredictorResult<(TrainingReport, ModelArtifact)> {
    let rows = records.read_all()?;
    let data = training_set(&rows);
    let (model, report) = JackpotModel::train(&data, params)?;
    let artifact = models.save(&model, &report)?;
    Ok((report, artifact))
}

/// Score one feature vector with an already loaded classifier
pub fn predict_with<C: Classifier + ?Sized>(
    classifier: &C,
    features: &FeatureVector,
    decision_threshold: f64,
) -> PredictionResult {
    let probability = classifier.predict_probability(features);
    PredictionResult::Predicted {
        label: classifier.predict_label(features),
        probability,
        advice: BetAdvice::from_probability(probability, decision_threshold),
    }
}

/// Single-shot prediction from raw operator input. Failures come back as
/// `PredictionResult::Failed` with a readable message. Successful
/// predictions are appended to `log` when one is given; a log write failure
/// does not fail the prediction.
pub fn predict_jackpot(
    models: &ModelStore,
    raw: &RawRecord,
    decision_threshold: f64,
    log: Option<&PredictionLog>,
) -> PredictionResult {
    let features = match FeatureVector::from_raw(raw) {
        Ok(features) => features,
        Err(e) => {
            warn!("Rejected prediction input: {}", e);
            return PredictionResult::failed(e.to_string());
        }
    };

    let model = match models.load() {
        Ok(model) => model,
        Err(e) => {
            warn!("Prediction unavailable: {}", e);
            return PredictionResult::failed(e.to_string());
        }
    };

    let result = predict_with(&model, &features, decision_threshold);
    info!("{}", result);

    if let (Some(log), Some(entry)) = (log, PredictionEntry::new(&features, &result)) {
        if let Err(e) = log.append(&entry) {
            warn!("Could not log prediction to {}: {}", log.path().display(), e);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::MockClassifier;
    use crate::types::SessionRecord;
    use tempfile::TempDir;

    fn raw(plays: &str, free: &str, small: &str) -> RawRecord {
        [("play_count", plays), ("free_game_triggered", free), ("small_hit", small)]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_predict_with_mocked_classifier() {
        let mut classifier = MockClassifier::new();
        classifier.expect_predict_probability().returning(|_| 0.82);
        classifier.expect_predict_label().returning(|_| 1);

        let features = FeatureVector::from_record(&SessionRecord::new("d", 80, true, false, false));
        let result = predict_with(&classifier, &features, 0.7);
        assert_eq!(
            result,
            PredictionResult::Predicted { label: 1, probability: 0.82, advice: BetAdvice::Bet }
        );
    }

    #[test]
    fn test_untrained_prediction_fails_softly() {
        let dir = TempDir::new().unwrap();
        let models = ModelStore::new(dir.path().join("model/jackpot_model.json"));
        let result = predict_jackpot(&models, &raw("50", "1", "0"), 0.7, None);
        assert!(result.is_failure());
        match result {
            PredictionResult::Failed { message } => assert!(message.contains("not trained")),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_bad_input_fails_before_model_load() {
        let dir = TempDir::new().unwrap();
        let models = ModelStore::new(dir.path().join("model/jackpot_model.json"));
        match predict_jackpot(&models, &raw("fifty", "1", "0"), 0.7, None) {
            PredictionResult::Failed { message } => assert!(message.contains("play_count")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_train_then_predict() {
        let dir = TempDir::new().unwrap();
        let records = RecordStore::new(dir.path().join("data/history.csv"));
        let models = ModelStore::new(dir.path().join("model/jackpot_model.json"));

        let rows: Vec<SessionRecord> = (0..30u32)
            .map(|i| SessionRecord::new(format!("2024-01-{:02}", i + 1), 30 + i * 2, i % 2 == 0, i % 5 == 0, i % 2 == 0 && i > 15))
            .collect();
        records.rewrite_all(&rows).unwrap();

        let (report, artifact) = train_from_store(&records, &models, &TrainingParams::default()).unwrap();
        assert_eq!(report.samples, 30);
        assert_eq!(artifact.metrics.test_samples, 6);

        let log = PredictionLog::new(dir.path().join("data/daily_training_log.csv"));
        let result = predict_jackpot(&models, &raw("90", "1", "1"), 0.7, Some(&log));
        let probability = result.probability().unwrap();
        assert!((0.0..=1.0).contains(&probability));

        let entries = log.read_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].play_count, 90);
        assert_eq!(entries[0].burst_index, 64.5);
        assert!((entries[0].probability - probability).abs() <= 0.00005);
    }

    #[test]
    fn test_failed_prediction_is_not_logged() {
        let dir = TempDir::new().unwrap();
        let models = ModelStore::new(dir.path().join("model/jackpot_model.json"));
        let log = PredictionLog::new(dir.path().join("data/daily_training_log.csv"));
        assert!(predict_jackpot(&models, &raw("50", "1", "0"), 0.7, Some(&log)).is_failure());
        assert!(!log.path().exists());
    }

    #[test]
    fn test_train_without_records() {
        let dir = TempDir::new().unwrap();
        let records = RecordStore::new(dir.path().join("data/history.csv"));
        let models = ModelStore::new(dir.path().join("model/jackpot_model.json"));
        let err = train_from_store(&records, &models, &TrainingParams::default()).unwrap_err();
        assert_eq!(err.kind(), "data_unavailable");
        assert!(!models.exists());
    }
}
