use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

use crate::error::{PredictorError, PredictorResult};
use crate::ml::model::{JackpotModel, ModelWeights, TrainingReport};

/// Identifier written into every artifact
pub const MODEL_KIND: &str = "logistic_regression";

/// Semantic version for models
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ModelVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    pub fn initial() -> Self {
        Self::new(1, 0, 0)
    }

    pub fn bump_patch(&self) -> Self {
        Self::new(self.major, self.minor, self.patch + 1)
    }
}

impl FromStr for ModelVersion {
    type Err = PredictorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        let invalid = || PredictorError::InvalidParameter(format!("invalid version format: {}", s));
        if parts.len() != 3 {
            return Err(invalid());
        }

        Ok(Self {
            major: parts[0].parse().map_err(|_| invalid())?,
            minor: parts[1].parse().map_err(|_| invalid())?,
            patch: parts[2].parse().map_err(|_| invalid())?,
        })
    }
}

impl std::fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Model metadata and metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub train_samples: usize,
    pub test_samples: usize,
    pub jackpots_in_data: usize,
}

impl From<&TrainingReport> for ModelMetrics {
    fn from(report: &TrainingReport) -> Self {
        Self {
            accuracy: report.accuracy,
            train_samples: report.train_samples,
            test_samples: report.test_samples,
            jackpots_in_data: report.jackpots_in_data,
        }
    }
}

/// On-disk model artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub kind: String,
    pub version: ModelVersion,
    pub trained_at: DateTime<Utc>,
    pub metrics: ModelMetrics,
    pub weights: ModelWeights,
}

/// Model persistence at a single fixed path
#[derive(Debug, Clone)]
pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the trained classifier. A missing artifact is `NotTrained`.
    pub fn load(&self) -> PredictorResult<JackpotModel> {
        let artifact = self.load_artifact()?;
        JackpotModel::from_weights(artifact.weights)
    }

    pub fn load_artifact(&self) -> PredictorResult<ModelArtifact> {
        if !self.exists() {
            return Err(PredictorError::NotTrained(self.path.display().to_string()));
        }

        let json = std::fs::read_to_string(&self.path)?;
        let artifact: ModelArtifact = serde_json::from_str(&json)?;
        if artifact.kind != MODEL_KIND {
            return Err(PredictorError::InvalidParameter(format!(
                "unsupported model kind '{}' in {}",
                artifact.kind,
                self.path.display()
            )));
        }

        info!(
            "Loaded {} model v{} from {}",
            artifact.kind,
            artifact.version,
            self.path.display()
        );
        Ok(artifact)
    }

    /// Persist a freshly trained model, bumping the patch version of any
    /// artifact it replaces
    pub fn save(&self, model: &JackpotModel, report: &TrainingReport) -> PredictorResult<ModelArtifact> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let artifact = ModelArtifact {
            kind: MODEL_KIND.to_string(),
            version: self.suggest_next_version(),
            trained_at: Utc::now(),
            metrics: ModelMetrics::from(report),
            weights: model.weights().clone(),
        };

        // Write then rename so a reader never sees a half-written artifact
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(&artifact)?)?;
        std::fs::rename(&tmp, &self.path)?;

        info!(
            "Saved {} model v{} to {}",
            artifact.kind,
            artifact.version,
            self.path.display()
        );
        Ok(artifact)
    }

    /// Suggest next version (defaults to patch bump)
    pub fn suggest_next_version(&self) -> ModelVersion {
        if !self.exists() {
            return ModelVersion::initial();
        }
        match self.load_artifact() {
            Ok(current) => current.version.bump_patch(),
            Err(e) => {
                warn!("Existing model artifact unreadable ({}), restarting versioning", e);
                ModelVersion::initial()
            }
        }
    }
}
