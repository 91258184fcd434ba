use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PredictorError, PredictorResult};
use crate::store::RecordStore;
use crate::types::SessionRecord;

/// Number of records shown in the recent-history table
pub const RECENT_RECORDS: usize = 10;

/// Summary of the stored session history
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryOverview {
    pub total_records: usize,
    pub total_jackpots: usize,
    pub jackpot_rate_pct: f64,
    pub free_game_rate_pct: f64,
    pub avg_play_count: f64,
    /// One-line description of the newest record
    pub latest: Option<String>,
    /// Most recent records, newest first
    pub recent: Vec<SessionRecord>,
}

impl HistoryOverview {
    pub fn calculate(records: &[SessionRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let n = records.len();
        let total_jackpots = records.iter().filter(|r| r.jackpot).count();
        let free_games = records.iter().filter(|r| r.free_game_triggered).count();
        let total_plays: u64 = records.iter().map(|r| r.play_count as u64).sum();

        // Stable sort keeps file order among same-day rows; newest day first
        let mut by_date: Vec<&SessionRecord> = records.iter().collect();
        by_date.sort_by(|a, b| a.date.cmp(&b.date));
        let latest = by_date.last().map(|r| {
            format!(
                "Latest date: {}, plays: {}, burst index: {}",
                r.date, r.play_count, r.burst_index
            )
        });
        let recent = by_date
            .iter()
            .rev()
            .take(RECENT_RECORDS)
            .map(|r| (*r).clone())
            .collect();

        Self {
            total_records: n,
            total_jackpots,
            jackpot_rate_pct: total_jackpots as f64 / n as f64 * 100.0,
            free_game_rate_pct: free_games as f64 / n as f64 * 100.0,
            avg_play_count: total_plays as f64 / n as f64,
            latest,
            recent,
        }
    }

    /// Overview of the stored table; a missing or empty table yields an
    /// empty overview rather than an error
    pub fn from_store(store: &RecordStore) -> PredictorResult<Self> {
        match store.read_all() {
            Ok(records) => Ok(Self::calculate(&records)),
            Err(PredictorError::DataUnavailable(reason)) => {
                debug!("History overview with no data: {}", reason);
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    pub fn print(&self) {
        println!("\n{}", "=".repeat(60));
        println!("                    HISTORY OVERVIEW");
        println!("{}", "=".repeat(60));
        println!("Total Records:      {}", self.total_records);
        println!("Total Jackpots:     {}", self.total_jackpots);
        println!("Jackpot Rate:       {:.2}%", self.jackpot_rate_pct);
        println!("Free Game Rate:     {:.2}%", self.free_game_rate_pct);
        println!("Avg Play Count:     {:.1}", self.avg_play_count);
        println!("{}", "-".repeat(60));
        match &self.latest {
            Some(latest) => println!("{}", latest),
            None => println!("No data yet. Run `generate` or `scrape` first."),
        }
        if !self.recent.is_empty() {
            println!("{}", "-".repeat(60));
            println!("{:<12} {:>6} {:>8} {:>6} {:>6} {:>8}", "date", "plays", "jackpot", "small", "free", "burst");
            for r in &self.recent {
                println!(
                    "{:<12} {:>6} {:>8} {:>6} {:>6} {:>8.2}",
                    r.date,
                    r.play_count,
                    u8::from(r.jackpot),
                    u8::from(r.small_hit),
                    u8::from(r.free_game_triggered),
                    r.burst_index
                );
            }
        }
        println!("{}", "=".repeat(60));
    }
}
