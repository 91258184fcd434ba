use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{PredictorError, PredictorResult};
use crate::types::{burst_index, SessionRecord};

/// Raw field mapping, e.g. form input or a scraped row
pub type RawRecord = HashMap<String, String>;

/// Fixed-size feature vector for jackpot prediction.
///
/// The jackpot label is deliberately absent: it is the training target and
/// must never reach the classifier as an input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub play_count: u32,
    pub free_game_triggered: u8,
    pub small_hit: u8,
    pub burst_index: f64,
}

impl FeatureVector {
    pub const NUM_FEATURES: usize = 4;

    pub const NAMES: [&'static str; Self::NUM_FEATURES] =
        ["play_count", "free_game_triggered", "small_hit", "burst_index"];

    pub fn to_array(&self) -> [f64; Self::NUM_FEATURES] {
        [
            self.play_count as f64,
            self.free_game_triggered as f64,
            self.small_hit as f64,
            self.burst_index,
        ]
    }

    pub fn from_record(record: &SessionRecord) -> Self {
        Self {
            play_count: record.play_count,
            free_game_triggered: u8::from(record.free_game_triggered),
            small_hit: u8::from(record.small_hit),
            burst_index: record.burst_index,
        }
    }

    /// Build from a raw mapping. `burst_index` is optional and derived when
    /// absent; every other field is required.
    pub fn from_raw(raw: &RawRecord) -> PredictorResult<Self> {
        let play_count: u32 = parse_field(raw, "play_count")?;
        let free_game_triggered = parse_flag(raw, "free_game_triggered")?;
        let small_hit = parse_flag(raw, "small_hit")?;

        let burst_index = match raw.get("burst_index").map(|s| s.trim()) {
            Some(value) if !value.is_empty() => {
                let parsed: f64 = value
                    .parse()
                    .map_err(|_| PredictorError::schema("burst_index", format!("'{}' is not a number", value)))?;
                if !parsed.is_finite() {
                    return Err(PredictorError::schema("burst_index", "must be finite"));
                }
                parsed
            }
            _ => burst_index(play_count, small_hit == 1, free_game_triggered == 1),
        };

        Ok(Self {
            play_count,
            free_game_triggered,
            small_hit,
            burst_index,
        })
    }
}

impl From<&SessionRecord> for FeatureVector {
    fn from(record: &SessionRecord) -> Self {
        Self::from_record(record)
    }
}

fn parse_field<T: std::str::FromStr>(raw: &RawRecord, field: &str) -> PredictorResult<T> {
    let value = raw
        .get(field)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PredictorError::schema(field, "missing"))?;
    value
        .parse()
        .map_err(|_| PredictorError::schema(field, format!("'{}' is not a valid number", value)))
}

fn parse_flag(raw: &RawRecord, field: &str) -> PredictorResult<u8> {
    let value: u8 = parse_field(raw, field)?;
    if value > 1 {
        return Err(PredictorError::schema(field, format!("expected 0 or 1, got {}", value)));
    }
    Ok(value)
}

/// Training rows: features paired with the jackpot label
pub fn training_set(records: &[SessionRecord]) -> Vec<(FeatureVector, bool)> {
    records
        .iter()
        .map(|r| (FeatureVector::from_record(r), r.jackpot))
        .collect()
}
