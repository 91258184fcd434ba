use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Local;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{error, info};

use super::AppState;
use crate::analytics::HistoryOverview;
use crate::engine::simulate;
use crate::error::PredictorError;
use crate::ml::{predict_jackpot, train_from_store, RawRecord};
use crate::scraper::{scrape_into_store, HaotingScraper};
use crate::store::{generate_sessions, synthetic::DEFAULT_SYNTHETIC_SESSIONS};

/// `PredictorError` rendered as `{ "error": ..., "kind": ... }`
pub struct ApiError(pub PredictorError);

impl From<PredictorError> for ApiError {
    fn from(e: PredictorError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PredictorError::DataUnavailable(_) => StatusCode::NOT_FOUND,
            PredictorError::NotTrained(_) => StatusCode::CONFLICT,
            PredictorError::Schema { .. } | PredictorError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            PredictorError::Transport(_) => StatusCode::BAD_GATEWAY,
            PredictorError::Io(_) | PredictorError::Csv(_) | PredictorError::Json(_) => {
                error!("Dashboard request failed: {}", self.0);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({"error": self.0.to_string(), "kind": self.0.kind()}))).into_response()
    }
}

fn today() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

// === Read endpoints ===

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub model_trained: bool,
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        model_trained: state.models.exists(),
    })
}

pub async fn get_overview(State(state): State<AppState>) -> Result<Json<HistoryOverview>, ApiError> {
    Ok(Json(HistoryOverview::from_store(&state.records)?))
}

pub async fn get_records(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let records = match state.records.read_all() {
        Ok(records) => records,
        Err(PredictorError::DataUnavailable(_)) => Vec::new(),
        Err(e) => return Err(e.into()),
    };
    Ok(Json(json!({"count": records.len(), "records": records})))
}

// === Operator actions ===

pub async fn post_scrape(
    State(state): State<AppState>,
    body: Option<Json<ScrapeRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let append = body.map(|Json(b)| b.append).unwrap_or(false);
    let _guard = state.ops.lock().await;

    let scraper = HaotingScraper::new(&state.config.scraper)?;
    let rows = scrape_into_store(&scraper, &state.records, &today(), append).await?;
    Ok(Json(json!({"status": "ok", "rows": rows, "append": append})))
}

#[derive(Debug, Default, Deserialize)]
pub struct ScrapeRequest {
    #[serde(default)]
    pub append: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    pub count: Option<usize>,
    pub seed: Option<u64>,
    #[serde(default)]
    pub append: bool,
}

pub async fn post_generate(
    State(state): State<AppState>,
    body: Option<Json<GenerateRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    let count = request.count.unwrap_or(DEFAULT_SYNTHETIC_SESSIONS);
    if count == 0 {
        return Err(PredictorError::InvalidParameter("count must be > 0".to_string()).into());
    }

    let _guard = state.ops.lock().await;
    let mut rng = match request.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let records = generate_sessions(count, Local::now().date_naive(), &mut rng);
    let written = if request.append {
        state.records.append_all(&records)?
    } else {
        state.records.rewrite_all(&records)?
    };
    info!("Generated {} synthetic sessions", written);
    Ok(Json(json!({"status": "ok", "rows": written, "append": request.append})))
}

pub async fn post_train(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let _guard = state.ops.lock().await;
    let params = state.config.training_params();
    let (records, models) = (state.records.clone(), state.models.clone());

    let (report, artifact) = tokio::task::spawn_blocking(move || train_from_store(&records, &models, &params))
        .await
        .map_err(|e| PredictorError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))??;

    Ok(Json(json!({
        "status": "ok",
        "version": artifact.version.to_string(),
        "trained_at": artifact.trained_at,
        "report": report,
    })))
}

/// Prediction inputs arrive as loose JSON; numbers and booleans are
/// stringified so the same schema checks apply as on the CLI.
pub fn raw_record_from_json(body: HashMap<String, Value>) -> RawRecord {
    body.into_iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => u8::from(b).to_string(),
                _ => return None,
            };
            Some((key, text))
        })
        .collect()
}

pub async fn post_predict(
    State(state): State<AppState>,
    Json(body): Json<HashMap<String, Value>>,
) -> impl IntoResponse {
    let raw = raw_record_from_json(body);
    let result = predict_jackpot(
        &state.models,
        &raw,
        state.config.simulation.decision_threshold,
        Some(&state.predictions),
    );
    let status = if result.is_failure() { StatusCode::UNPROCESSABLE_ENTITY } else { StatusCode::OK };
    (status, Json(result))
}

#[derive(Debug, Default, Deserialize)]
pub struct SimulateRequest {
    pub capital: Option<Decimal>,
    pub rounds: Option<usize>,
    pub bet_unit: Option<Decimal>,
}

pub async fn post_simulate(
    State(state): State<AppState>,
    body: Option<Json<SimulateRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    let mut config = state.config.simulation_config();
    if let Some(capital) = request.capital {
        config.initial_capital = capital;
    }
    if let Some(rounds) = request.rounds {
        config.rounds = rounds;
    }
    if let Some(bet_unit) = request.bet_unit {
        config.bet_unit = bet_unit;
    }

    let _guard = state.ops.lock().await;
    let (records, models) = (state.records.clone(), state.models.clone());

    let report = tokio::task::spawn_blocking(move || simulate(&records, &models, config))
        .await
        .map_err(|e| PredictorError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))??;
    Ok(Json(report))
}
