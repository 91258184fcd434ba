use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::results::{summary_line, RoundDecision, RoundRecord, SimulationReport};
use crate::error::{PredictorError, PredictorResult};
use crate::ml::{Classifier, FeatureVector, ModelStore};
use crate::store::RecordStore;
use crate::types::SessionRecord;

/// Probability a session must strictly exceed before a stake is placed.
/// Not the classifier's 0.5 labelling threshold.
pub const DECISION_THRESHOLD: f64 = 0.7;
/// A hit returns this many bet units after the stake has been debited
/// (net gain of `PAYOUT_MULTIPLIER - 1` units)
pub const PAYOUT_MULTIPLIER: Decimal = dec!(5);
pub const DEFAULT_ROUNDS: usize = 50;
pub const DEFAULT_BET_UNIT: Decimal = dec!(10);

/// Configuration for a betting replay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub initial_capital: Decimal,
    pub rounds: usize,
    pub bet_unit: Decimal,
    pub decision_threshold: f64,
    pub payout_multiplier: Decimal,
}

impl SimulationConfig {
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            initial_capital,
            rounds: DEFAULT_ROUNDS,
            bet_unit: DEFAULT_BET_UNIT,
            decision_threshold: DECISION_THRESHOLD,
            payout_multiplier: PAYOUT_MULTIPLIER,
        }
    }

    pub fn with_rounds(mut self, rounds: usize) -> Self {
        self.rounds = rounds;
        self
    }

    pub fn with_bet_unit(mut self, bet_unit: Decimal) -> Self {
        self.bet_unit = bet_unit;
        self
    }

    pub fn validate(&self) -> PredictorResult<()> {
        if self.initial_capital <= Decimal::ZERO {
            return Err(PredictorError::InvalidParameter("initial_capital must be > 0".to_string()));
        }
        if self.rounds == 0 {
            return Err(PredictorError::InvalidParameter("rounds must be > 0".to_string()));
        }
        if self.bet_unit <= Decimal::ZERO {
            return Err(PredictorError::InvalidParameter("bet_unit must be > 0".to_string()));
        }
        if !(0.0..=1.0).contains(&self.decision_threshold) {
            return Err(PredictorError::InvalidParameter(
                "decision_threshold must be between 0 and 1".to_string(),
            ));
        }
        if self.payout_multiplier < Decimal::ONE {
            return Err(PredictorError::InvalidParameter("payout_multiplier must be >= 1".to_string()));
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new(dec!(1000))
    }
}

/// Mutable state of one run; never shared or outlives `run`
struct SimulationState {
    balance: Decimal,
    hit_count: u64,
    log: Vec<String>,
    rounds: Vec<RoundRecord>,
}

/// Retrospective replay of historical sessions against a classifier.
///
/// Each session is scored in order; a stake is placed when the jackpot
/// probability clears the decision threshold and the balance covers one bet
/// unit, then settled against the session's recorded outcome.
pub struct BettingSimulator {
    config: SimulationConfig,
}

impl BettingSimulator {
    pub fn new(config: SimulationConfig) -> PredictorResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Replay `min(rounds, records.len())` sessions. Runs to the end even
    /// once the balance can no longer cover a stake.
    pub fn run<C: Classifier + ?Sized>(
        &self,
        records: &[SessionRecord],
        classifier: &C,
    ) -> PredictorResult<SimulationReport> {
        if records.is_empty() {
            return Err(PredictorError::DataUnavailable("no data to simulate".to_string()));
        }

        let cfg = &self.config;
        let rounds_to_play = cfg.rounds.min(records.len());
        if rounds_to_play < cfg.rounds {
            debug!(
                "Requested {} rounds but only {} records available",
                cfg.rounds,
                records.len()
            );
        }

        let mut state = SimulationState {
            balance: cfg.initial_capital,
            hit_count: 0,
            log: Vec::with_capacity(rounds_to_play),
            rounds: Vec::with_capacity(rounds_to_play),
        };

        for (i, record) in records.iter().take(rounds_to_play).enumerate() {
            let features = FeatureVector::from_record(record);
            let probability = classifier.predict_probability(&features);
            let balance_before = state.balance;

            let decision = if probability > cfg.decision_threshold && state.balance >= cfg.bet_unit {
                state.balance -= cfg.bet_unit;
                if record.jackpot {
                    state.balance += cfg.payout_multiplier * cfg.bet_unit;
                    state.hit_count += 1;
                    RoundDecision::StakedAndHit
                } else {
                    RoundDecision::StakedAndMissed
                }
            } else {
                RoundDecision::Observed
            };

            let round = RoundRecord {
                round: i + 1,
                date: record.date.clone(),
                probability,
                decision,
                balance_before,
                balance_after: state.balance,
            };
            let line = round.log_line();
            debug!("{}", line);
            state.log.push(line);
            state.rounds.push(round);
        }

        let hit_rate = state.hit_count as f64 / cfg.rounds as f64;
        let summary = summary_line(state.hit_count, cfg.rounds, state.balance);
        info!("Replay finished: {}", summary);

        Ok(SimulationReport {
            initial_capital: cfg.initial_capital,
            final_balance: state.balance,
            bet_unit: cfg.bet_unit,
            hit_count: state.hit_count,
            requested_rounds: cfg.rounds,
            rounds_played: rounds_to_play,
            hit_rate,
            log: state.log,
            rounds: state.rounds,
            summary,
        })
    }
}

/// Replay the stored history with the persisted model.
///
/// Missing data is reported before the model is looked up; a missing model
/// is reported before any round is played.
pub fn simulate(
    records: &RecordStore,
    models: &ModelStore,
    config: SimulationConfig,
) -> PredictorResult<SimulationReport> {
    let simulator = BettingSimulator::new(config)?;
    let history = records.read_chronological()?;
    if history.is_empty() {
        return Err(PredictorError::DataUnavailable("no data to simulate".to_string()));
    }
    let model = models.load()?;
    simulator.run(&history, &model)
}
