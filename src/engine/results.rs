use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decision taken for one replayed session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundDecision {
    StakedAndHit,
    StakedAndMissed,
    Observed,
}

impl RoundDecision {
    pub fn is_staked(&self) -> bool {
        !matches!(self, RoundDecision::Observed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoundDecision::StakedAndHit => "staked-and-hit",
            RoundDecision::StakedAndMissed => "staked-and-missed",
            RoundDecision::Observed => "observed",
        }
    }
}

impl fmt::Display for RoundDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured view of one replay round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundRecord {
    /// 1-based round index
    pub round: usize,
    pub date: String,
    pub probability: f64,
    pub decision: RoundDecision,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
}

impl RoundRecord {
    pub fn delta(&self) -> Decimal {
        self.balance_after - self.balance_before
    }

    /// Human-readable line; the post-round balance is always the last token
    pub fn log_line(&self) -> String {
        format!(
            "Round {} | {} | jackpot probability {:.2}% | {} | balance {}",
            self.round,
            self.date,
            self.probability * 100.0,
            self.decision,
            self.balance_after
        )
    }
}

/// Outcome of a betting replay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub initial_capital: Decimal,
    pub final_balance: Decimal,
    pub bet_unit: Decimal,
    pub hit_count: u64,
    pub requested_rounds: usize,
    pub rounds_played: usize,
    /// hit_count / requested_rounds
    pub hit_rate: f64,
    pub log: Vec<String>,
    pub rounds: Vec<RoundRecord>,
    pub summary: String,
}

impl SimulationReport {
    pub fn net_profit(&self) -> Decimal {
        self.final_balance - self.initial_capital
    }

    pub fn stakes_placed(&self) -> usize {
        self.rounds.iter().filter(|r| r.decision.is_staked()).count()
    }

    /// Pretty print results to console
    pub fn print_summary(&self) {
        println!("\n{}", "=".repeat(60));
        println!("                 BETTING REPLAY RESULTS");
        println!("{}", "=".repeat(60));
        for line in &self.log {
            println!("  {}", line);
        }
        println!("{}", "-".repeat(60));
        println!("Initial Capital:    {}", self.initial_capital);
        println!("Final Balance:      {}", self.final_balance);
        println!("Net Profit:         {}", self.net_profit());
        println!("Bet Unit:           {}", self.bet_unit);
        println!("Rounds:             {} played / {} requested", self.rounds_played, self.requested_rounds);
        println!("Stakes Placed:      {}", self.stakes_placed());
        println!("Hits:               {}", self.hit_count);
        println!("{}", "-".repeat(60));
        println!("{}", self.summary);
        println!("{}", "=".repeat(60));
    }
}

pub fn summary_line(hit_count: u64, requested_rounds: usize, final_balance: Decimal) -> String {
    let hit_rate = if requested_rounds == 0 {
        0.0
    } else {
        hit_count as f64 / requested_rounds as f64
    };
    format!(
        "Hit rate: {:.2}% ({}/{}) | Final balance: {}",
        hit_rate * 100.0,
        hit_count,
        requested_rounds,
        final_balance
    )
}
