use thiserror::Error;

/// Failure kinds surfaced by the prediction and replay pipeline
#[derive(Debug, Error)]
pub enum PredictorError {
    /// No stored records, or the table is empty / missing required columns
    #[error("no data available: {0}")]
    DataUnavailable(String),

    /// No model artifact at the expected location
    #[error("model not trained: no artifact at {0}")]
    NotTrained(String),

    /// A record field is missing or cannot be parsed
    #[error("schema error on field '{field}': {reason}")]
    Schema { field: String, reason: String },

    /// Scrape request failed or timed out
    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PredictorError {
    pub fn schema(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Schema {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Short machine-readable kind, used by the dashboard API
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DataUnavailable(_) => "data_unavailable",
            Self::NotTrained(_) => "not_trained",
            Self::Schema { .. } => "schema",
            Self::Transport(_) => "transport",
            Self::InvalidParameter(_) => "invalid_parameter",
            Self::Io(_) => "io",
            Self::Csv(_) => "csv",
            Self::Json(_) => "json",
        }
    }
}

pub type PredictorResult<T> = std::result::Result<T, PredictorError>;
