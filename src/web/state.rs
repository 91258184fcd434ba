use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::ml::{ModelStore, PredictionLog};
use crate::store::RecordStore;

/// Shared dashboard state.
///
/// Operator actions take `ops` for their whole duration so two of them never
/// interleave on the record table or the model artifact.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub records: RecordStore,
    pub models: ModelStore,
    pub predictions: PredictionLog,
    pub ops: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let records = RecordStore::new(&config.storage.records_path);
        let models = ModelStore::new(&config.storage.model_path);
        let predictions = PredictionLog::new(&config.storage.prediction_log_path);
        Self {
            config: Arc::new(config),
            records,
            models,
            predictions,
            ops: Arc::new(Mutex::new(())),
        }
    }
}
