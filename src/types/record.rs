use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Weight of each play in the burst index
pub const BURST_PLAY_WEIGHT: f64 = 0.05;
/// Bonus added when a small hit occurred in the session
pub const BURST_SMALL_HIT_BONUS: f64 = 10.0;
/// Bonus added when the free game was triggered in the session
pub const BURST_FREE_GAME_BONUS: f64 = 50.0;

/// Column order of the persisted record table
pub const RECORD_COLUMNS: [&str; 6] = [
    "date",
    "play_count",
    "jackpot",
    "small_hit",
    "free_game_triggered",
    "burst_index",
];

/// Header names used by tables written before the columns were renamed
pub const LEGACY_RECORD_COLUMNS: [&str; 6] = ["日期", "局數", "爆金", "小分", "免費遊戲", "爆發指數"];

/// Position of a header name in [`RECORD_COLUMNS`], accepting the legacy
/// names and a leading byte-order mark
pub fn column_index(header: &str) -> Option<usize> {
    let name = header.trim().trim_start_matches('\u{feff}');
    RECORD_COLUMNS
        .iter()
        .position(|c| *c == name)
        .or_else(|| LEGACY_RECORD_COLUMNS.iter().position(|c| *c == name))
}

/// Derived burst score for a session, rounded to two decimals
pub fn burst_index(play_count: u32, small_hit: bool, free_game_triggered: bool) -> f64 {
    let raw = BURST_PLAY_WEIGHT * play_count as f64
        + if small_hit { BURST_SMALL_HIT_BONUS } else { 0.0 }
        + if free_game_triggered { BURST_FREE_GAME_BONUS } else { 0.0 };
    round2(raw)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One observed play session.
///
/// Field order matches [`RECORD_COLUMNS`] so the struct serializes straight
/// into the persisted table layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(alias = "日期")]
    pub date: String,
    #[serde(alias = "局數")]
    pub play_count: u32,
    #[serde(alias = "爆金", with = "flag")]
    pub jackpot: bool,
    #[serde(alias = "小分", with = "flag")]
    pub small_hit: bool,
    #[serde(alias = "免費遊戲", with = "flag")]
    pub free_game_triggered: bool,
    #[serde(alias = "爆發指數")]
    pub burst_index: f64,
}

impl SessionRecord {
    /// Build a record with the burst index derived from the session fields
    pub fn new(
        date: impl Into<String>,
        play_count: u32,
        free_game_triggered: bool,
        small_hit: bool,
        jackpot: bool,
    ) -> Self {
        Self {
            date: date.into(),
            play_count,
            jackpot,
            small_hit,
            free_game_triggered,
            burst_index: burst_index(play_count, small_hit, free_game_triggered),
        }
    }

    pub fn jackpot_label(&self) -> u8 {
        u8::from(self.jackpot)
    }

    /// Cell values in [`RECORD_COLUMNS`] order, encoded as the table stores them
    pub fn to_row(&self) -> [String; 6] {
        [
            self.date.clone(),
            self.play_count.to_string(),
            u8::from(self.jackpot).to_string(),
            u8::from(self.small_hit).to_string(),
            u8::from(self.free_game_triggered).to_string(),
            format!("{:?}", self.burst_index),
        ]
    }
}

/// 0/1 encoding for boolean columns. Reads also accept `true`/`false`.
mod flag {
    use super::*;

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.trim() {
            "1" | "1.0" | "true" | "True" => Ok(true),
            "0" | "0.0" | "false" | "False" => Ok(false),
            other => Err(serde::de::Error::custom(format!("expected 0 or 1, got '{}'", other))),
        }
    }
}
