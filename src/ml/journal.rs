use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::features::FeatureVector;
use crate::error::PredictorResult;
use crate::types::{BetAdvice, PredictionResult};

/// One logged prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionEntry {
    pub logged_at: String,
    pub play_count: u32,
    pub free_game_triggered: u8,
    pub small_hit: u8,
    pub burst_index: f64,
    /// Rounded to four decimals
    pub probability: f64,
    pub label: u8,
    pub advice: BetAdvice,
}

impl PredictionEntry {
    /// `None` for failed predictions, which are not logged
    pub fn new(features: &FeatureVector, result: &PredictionResult) -> Option<Self> {
        match result {
            PredictionResult::Predicted { label, probability, advice } => Some(Self {
                logged_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
                play_count: features.play_count,
                free_game_triggered: features.free_game_triggered,
                small_hit: features.small_hit,
                burst_index: features.burst_index,
                probability: (probability * 10_000.0).round() / 10_000.0,
                label: *label,
                advice: *advice,
            }),
            PredictionResult::Failed { .. } => None,
        }
    }
}

/// Append-only CSV log of served predictions
#[derive(Debug, Clone)]
pub struct PredictionLog {
    path: PathBuf,
}

impl PredictionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, entry: &PredictionEntry) -> PredictorResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(entry)?;
        writer.flush()?;

        debug!("Logged prediction to {}", self.path.display());
        Ok(())
    }

    pub fn read_all(&self) -> PredictorResult<Vec<PredictionEntry>> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        let entries: Vec<PredictionEntry> = reader.deserialize().collect::<Result<_, _>>()?;
        Ok(entries)
    }
}
