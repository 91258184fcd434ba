mod analytics;
mod config;
mod engine;
mod error;
mod ml;
mod scraper;
mod store;
mod types;
mod web;

use anyhow::{anyhow, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::Decimal;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use analytics::HistoryOverview;
use config::{load_config, write_default_config, AppConfig};
use ml::{predict_jackpot, train_from_store, ModelStore, PredictionLog, RawRecord};
use scraper::{scrape_into_store, HaotingScraper, ReplayPage};
use store::{generate_sessions, synthetic::DEFAULT_SYNTHETIC_SESSIONS, RecordStore};
use types::WinTier;
use web::{start_dashboard_server, AppState};

#[derive(Parser)]
#[command(name = "jackpot-predictor")]
#[command(version)]
#[command(about = "Jackpot prediction and betting replay for slot session history", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize the stored session history
    Overview,
    /// Write synthetic session records
    Generate {
        /// Number of sessions (one per day, ending today)
        #[arg(short = 'n', long, default_value_t = DEFAULT_SYNTHETIC_SESSIONS)]
        count: usize,
        /// RNG seed for reproducible data
        #[arg(short, long)]
        seed: Option<u64>,
        /// Append instead of replacing the table
        #[arg(short, long)]
        append: bool,
    },
    /// Scrape today's sessions from the configured page
    Scrape {
        /// Append instead of replacing the table
        #[arg(short, long)]
        append: bool,
    },
    /// Train the jackpot model on the stored history
    Train,
    /// Predict the jackpot probability for one session
    Predict {
        /// Plays in the session
        #[arg(short, long)]
        plays: u32,
        /// Free game triggered (0 or 1)
        #[arg(short, long)]
        free_game: u8,
        /// Small hit observed (0 or 1)
        #[arg(short, long)]
        small_hit: u8,
        /// Burst index; derived from the other fields when omitted
        #[arg(short, long)]
        burst_index: Option<f64>,
    },
    /// Replay the stored history with the trained model
    Simulate {
        /// Starting balance
        #[arg(short, long)]
        capital: Option<Decimal>,
        /// Rounds to play
        #[arg(short, long)]
        rounds: Option<usize>,
        /// Stake per round
        #[arg(short, long)]
        bet_unit: Option<Decimal>,
    },
    /// Classify a replay URL and the result icons and replay links on its page
    Replay {
        /// Replay or listing page URL
        url: String,
    },
    /// Run the dashboard server
    Serve {
        /// Dashboard port (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Write the default configuration as TOML
    InitConfig {
        /// Output path
        #[arg(short, long, default_value = "config.toml")]
        output: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Commands::InitConfig { output } = &cli.command {
        return write_default_config(output);
    }

    let config = load_config(&cli.config)?;
    let records = RecordStore::new(&config.storage.records_path);
    let models = ModelStore::new(&config.storage.model_path);

    match cli.command {
        Commands::Overview => {
            HistoryOverview::from_store(&records)?.print();
        }
        Commands::Generate { count, seed, append } => {
            run_generate(&records, count, seed, append)?;
        }
        Commands::Scrape { append } => {
            let scraper = HaotingScraper::new(&config.scraper)?;
            let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
            let rows = scrape_into_store(&scraper, &records, &today, append).await?;
            println!("Scraped {} rows into {}", rows, records.path().display());
        }
        Commands::Train => {
            let (report, artifact) = train_from_store(&records, &models, &config.training_params())?;
            println!(
                "Model v{} trained on {} samples: {:.2}% holdout accuracy ({} jackpots / {} misses)",
                artifact.version,
                report.samples,
                report.accuracy * 100.0,
                report.jackpots_in_data,
                report.misses_in_data
            );
        }
        Commands::Predict { plays, free_game, small_hit, burst_index } => {
            let mut raw = RawRecord::new();
            raw.insert("play_count".to_string(), plays.to_string());
            raw.insert("free_game_triggered".to_string(), free_game.to_string());
            raw.insert("small_hit".to_string(), small_hit.to_string());
            if let Some(burst_index) = burst_index {
                raw.insert("burst_index".to_string(), burst_index.to_string());
            }

            let log = PredictionLog::new(&config.storage.prediction_log_path);
            let result = predict_jackpot(&models, &raw, config.simulation.decision_threshold, Some(&log));
            println!("{}", result);
            if result.is_failure() {
                return Err(anyhow!("prediction failed"));
            }
        }
        Commands::Simulate { capital, rounds, bet_unit } => {
            run_simulation(&config, &records, &models, capital, rounds, bet_unit)?;
        }
        Commands::Replay { url } => {
            run_replay(&config, &url).await?;
        }
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.server.port);
            start_dashboard_server(AppState::new(config), port).await?;
        }
        // Written before the config is loaded
        Commands::InitConfig { .. } => {}
    }

    Ok(())
}

fn run_generate(records: &RecordStore, count: usize, seed: Option<u64>, append: bool) -> Result<()> {
    if count == 0 {
        return Err(anyhow!("--count must be > 0"));
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let sessions = generate_sessions(count, Local::now().date_naive(), &mut rng);
    let written = if append {
        records.append_all(&sessions)?
    } else {
        records.rewrite_all(&sessions)?
    };

    let jackpots = sessions.iter().filter(|s| s.jackpot).count();
    info!("Generated {} synthetic sessions ({} jackpots)", written, jackpots);
    println!("Wrote {} sessions to {}", written, records.path().display());
    Ok(())
}

fn run_simulation(
    config: &AppConfig,
    records: &RecordStore,
    models: &ModelStore,
    capital: Option<Decimal>,
    rounds: Option<usize>,
    bet_unit: Option<Decimal>,
) -> Result<()> {
    let mut sim_config = config.simulation_config();
    if let Some(capital) = capital {
        sim_config.initial_capital = capital;
    }
    if let Some(rounds) = rounds {
        sim_config.rounds = rounds;
    }
    if let Some(bet_unit) = bet_unit {
        sim_config.bet_unit = bet_unit;
    }

    info!(
        "Replaying up to {} rounds with {} capital and {} bet unit",
        sim_config.rounds, sim_config.initial_capital, sim_config.bet_unit
    );
    let report = engine::simulate(records, models, sim_config)?;
    report.print_summary();
    Ok(())
}

async fn run_replay(config: &AppConfig, url: &str) -> Result<()> {
    let tier = WinTier::classify(url);
    println!("{} -> {} (level {})", url, tier, tier.level());

    let scraper = HaotingScraper::new(&config.scraper)?;
    match scraper.fetch_replay_page(url).await {
        Ok(page) => print_replay_page(&page),
        Err(e) => warn!("Could not fetch replay page: {}", e),
    }
    Ok(())
}

fn print_replay_page(page: &ReplayPage) {
    if page.icons.is_empty() && page.links.is_empty() {
        println!("No result icons or replay links found on the page");
        return;
    }
    if !page.icons.is_empty() {
        println!("{} result icons:", page.icons.len());
        for (src, tier) in &page.icons {
            println!("  [{:<13}] level {} {}", tier.as_str(), tier.level(), src);
        }
    }
    if !page.links.is_empty() {
        println!("{} replay links:", page.links.len());
        for (link, tier) in &page.links {
            println!("  [{:<13}] level {} {}", tier.as_str(), tier.level(), link);
        }
    }
    println!("Top tier on page: {}", page.top_tier());
}
