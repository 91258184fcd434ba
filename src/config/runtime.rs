use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::engine::{SimulationConfig, DECISION_THRESHOLD, DEFAULT_BET_UNIT, DEFAULT_ROUNDS, PAYOUT_MULTIPLIER};
use crate::ml::TrainingParams;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageSettings,
    pub simulation: SimulationSettings,
    pub training: TrainingSettings,
    pub scraper: ScraperSettings,
    pub server: ServerSettings,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        // Storage validation
        if self.storage.records_path.trim().is_empty() {
            errors.push("storage.records_path must not be empty".to_string());
        }
        if self.storage.model_path.trim().is_empty() {
            errors.push("storage.model_path must not be empty".to_string());
        }
        if self.storage.prediction_log_path.trim().is_empty() {
            errors.push("storage.prediction_log_path must not be empty".to_string());
        }

        // Simulation validation
        if self.simulation.initial_capital <= Decimal::ZERO {
            errors.push("simulation.initial_capital must be > 0".to_string());
        }
        if self.simulation.rounds == 0 {
            errors.push("simulation.rounds must be > 0".to_string());
        }
        if self.simulation.bet_unit <= Decimal::ZERO {
            errors.push("simulation.bet_unit must be > 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.simulation.decision_threshold) {
            errors.push("simulation.decision_threshold must be between 0 and 1".to_string());
        }
        if self.simulation.payout_multiplier < Decimal::ONE {
            errors.push("simulation.payout_multiplier must be >= 1".to_string());
        }

        // Training validation
        if self.training.min_samples < 2 {
            errors.push("training.min_samples must be >= 2".to_string());
        }
        if self.training.test_fraction <= 0.0 || self.training.test_fraction >= 1.0 {
            errors.push("training.test_fraction must be between 0 and 1 (exclusive)".to_string());
        }
        if self.training.max_iterations == 0 {
            errors.push("training.max_iterations must be > 0".to_string());
        }
        if self.training.learning_rate <= 0.0 {
            errors.push("training.learning_rate must be > 0".to_string());
        }
        if self.training.l2_penalty < 0.0 {
            errors.push("training.l2_penalty must be >= 0".to_string());
        }

        // Scraper validation
        if !self.scraper.url.starts_with("http://") && !self.scraper.url.starts_with("https://") {
            errors.push("scraper.url must be an http(s) URL".to_string());
        }
        if self.scraper.connect_timeout_secs == 0 || self.scraper.request_timeout_secs == 0 {
            errors.push("scraper timeouts must be > 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn simulation_config(&self) -> SimulationConfig {
        SimulationConfig {
            initial_capital: self.simulation.initial_capital,
            rounds: self.simulation.rounds,
            bet_unit: self.simulation.bet_unit,
            decision_threshold: self.simulation.decision_threshold,
            payout_multiplier: self.simulation.payout_multiplier,
        }
    }

    pub fn training_params(&self) -> TrainingParams {
        TrainingParams {
            min_samples: self.training.min_samples,
            test_fraction: self.training.test_fraction,
            seed: self.training.seed,
            max_iterations: self.training.max_iterations,
            learning_rate: self.training.learning_rate,
            l2_penalty: self.training.l2_penalty,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub records_path: String,
    pub model_path: String,
    /// Append-only log of served predictions
    pub prediction_log_path: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            records_path: "data/history.csv".to_string(),
            model_path: "model/jackpot_model.json".to_string(),
            prediction_log_path: "data/daily_training_log.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub initial_capital: Decimal,
    pub rounds: usize,
    pub bet_unit: Decimal,
    pub decision_threshold: f64,
    pub payout_multiplier: Decimal,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            initial_capital: dec!(1000),
            rounds: DEFAULT_ROUNDS,
            bet_unit: DEFAULT_BET_UNIT,
            decision_threshold: DECISION_THRESHOLD,
            payout_multiplier: PAYOUT_MULTIPLIER,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingSettings {
    pub min_samples: usize,
    pub test_fraction: f64,
    pub seed: u64,
    pub max_iterations: usize,
    pub learning_rate: f64,
    pub l2_penalty: f64,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        let params = TrainingParams::default();
        Self {
            min_samples: params.min_samples,
            test_fraction: params.test_fraction,
            seed: params.seed,
            max_iterations: params.max_iterations,
            learning_rate: params.learning_rate,
            l2_penalty: params.l2_penalty,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperSettings {
    pub url: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            url: "https://ww.haoting.info/nickaa".to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: 20,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) jackpot-predictor/0.1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { port: 3000 }
    }
}
