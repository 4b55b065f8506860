//! AnomalyModel - owned handle over one fitted isolation forest
//!
//! One instance per model path, passed explicitly to callers.
//! `detect` / `bulk_detect` take the read lock and may overlap;
//! `train` holds the write lock, fits aside, persists, then swaps.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use ndarray::{Array2, ArrayView1, ArrayView2};
use parking_lot::RwLock;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};

use super::forest::{check_finite, IsolationForest};
use super::score::{normalize_scores, Detection};
use super::storage::{self, TrainedModel};
use crate::constants::get_model_path;
use crate::logic::config::ModelConfig;
use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::features::FeatureVector;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Model metrics for status reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub is_trained: bool,
    /// Decision boundary on the raw score
    pub threshold: Option<f64>,
    pub contamination: f64,
    pub n_estimators: usize,
    pub n_features: Option<usize>,
    pub total_samples_trained: usize,
    pub last_training_date: Option<DateTime<Utc>>,
    pub model_id: Option<String>,
}

pub struct AnomalyModel {
    path: PathBuf,
    config: ModelConfig,
    pool: ThreadPool,
    state: RwLock<Option<TrainedModel>>,
}

impl fmt::Debug for AnomalyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnomalyModel")
            .field("path", &self.path)
            .field("config", &self.config)
            .field("trained", &self.is_trained())
            .finish()
    }
}

// ============================================================================
// LIFECYCLE
// ============================================================================

impl AnomalyModel {
    /// [`AnomalyModel::initialize`] at `ANOMALY_MODEL_PATH` or the default data dir
    pub fn initialize_default() -> PipelineResult<Self> {
        Self::initialize(get_model_path())
    }

    /// Load the model at `path`, or allocate an untrained one if nothing is there yet
    pub fn initialize(path: impl Into<PathBuf>) -> PipelineResult<Self> {
        Self::initialize_with_config(path, ModelConfig::from_env())
    }

    /// Like [`AnomalyModel::initialize`]; `config` only applies when no model
    /// exists yet, a persisted model keeps the config it was trained with.
    pub fn initialize_with_config(
        path: impl Into<PathBuf>,
        config: ModelConfig,
    ) -> PipelineResult<Self> {
        let path = path.into();

        let (config, state) = if path.exists() {
            log::info!("Loading existing model from {}", path.display());
            let trained = storage::load_model(&path)?;
            (trained.config.clone(), Some(trained))
        } else {
            log::info!(
                "Creating new Isolation Forest model ({} estimators, contamination {})",
                config.n_estimators,
                config.contamination
            );
            (config, None)
        };

        config
            .validate()
            .map_err(|reason| PipelineError::model_init(&path, reason))?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.n_jobs)
            .build()
            .map_err(|e| PipelineError::model_init(&path, e))?;

        Ok(Self {
            path,
            config,
            pool,
            state: RwLock::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn is_trained(&self) -> bool {
        self.state.read().is_some()
    }

    /// Input dimensionality of the current fit
    pub fn n_features(&self) -> Option<usize> {
        self.state.read().as_ref().map(|t| t.forest.n_features())
    }

    pub fn metrics(&self) -> ModelMetrics {
        let state = self.state.read();
        let trained = state.as_ref();

        ModelMetrics {
            is_trained: trained.is_some(),
            threshold: trained.map(|t| t.forest.offset()),
            contamination: self.config.contamination,
            n_estimators: self.config.n_estimators,
            n_features: trained.map(|t| t.forest.n_features()),
            total_samples_trained: trained.map_or(0, |t| t.n_samples),
            last_training_date: trained.map(|t| t.trained_at),
            model_id: trained.map(|t| t.model_id.clone()),
        }
    }
}

// ============================================================================
// TRAINING
// ============================================================================

impl AnomalyModel {
    /// Fit on `features` (rows = samples) and persist. Replaces any prior fit;
    /// if the write fails the prior fit stays in place.
    pub fn train(&self, features: ArrayView2<'_, f64>) -> PipelineResult<()> {
        let mut state = self.state.write();

        log::info!(
            "Training Isolation Forest model on {} samples x {} features",
            features.nrows(),
            features.ncols()
        );

        let forest = IsolationForest::fit(features, &self.config, &self.pool)?;
        let trained = TrainedModel::new(forest, self.config.clone(), features.nrows());

        if let Err(e) = storage::save_model(&trained, &self.path) {
            log::error!("Failed to persist trained model: {}", e);
            return Err(e);
        }

        log::info!(
            "Model {} trained (threshold {:.6}) and saved to {}",
            trained.model_id,
            trained.forest.offset(),
            self.path.display()
        );
        *state = Some(trained);
        Ok(())
    }

    /// [`AnomalyModel::train`] over extracted vectors; all must have the same length
    pub fn train_vectors(&self, vectors: &[FeatureVector]) -> PipelineResult<()> {
        let matrix = stack_vectors(vectors)?;
        self.train(matrix.view())
    }
}

// ============================================================================
// SCORING
// ============================================================================

impl AnomalyModel {
    /// Score one sample.
    ///
    /// The normalized score is taken against this sample alone, so it is
    /// always 0.0 here; use [`AnomalyModel::bulk_detect`] for a ranking.
    pub fn detect(&self, features: &[f64]) -> PipelineResult<Detection> {
        let state = self.state.read();
        let forest = &state.as_ref().ok_or(PipelineError::ModelNotTrained)?.forest;

        check_width(forest.n_features(), features.len())?;
        let row = ArrayView1::from(features);
        check_finite(row)?;

        let raw_score = forest.score_row(row);
        let anomaly_score = normalize_scores(&[raw_score])[0];

        Ok(Detection {
            is_anomaly: forest.is_outlier(raw_score),
            anomaly_score,
            raw_score,
        })
    }

    pub fn detect_vector(&self, vector: &FeatureVector) -> PipelineResult<Detection> {
        self.detect(vector.as_slice())
    }

    /// Score a batch, normalizing against the batch's own min/max
    pub fn bulk_detect(&self, features: ArrayView2<'_, f64>) -> PipelineResult<Vec<Detection>> {
        let state = self.state.read();
        let forest = &state.as_ref().ok_or(PipelineError::ModelNotTrained)?.forest;

        if features.nrows() == 0 {
            return Ok(Vec::new());
        }
        check_width(forest.n_features(), features.ncols())?;
        for row in features.rows() {
            check_finite(row)?;
        }

        let raw = forest.score_batch(features, &self.pool);
        let normalized = normalize_scores(&raw);

        Ok(raw
            .into_iter()
            .zip(normalized)
            .map(|(raw_score, anomaly_score)| Detection {
                is_anomaly: forest.is_outlier(raw_score),
                anomaly_score,
                raw_score,
            })
            .collect())
    }

    pub fn bulk_detect_vectors(&self, vectors: &[FeatureVector]) -> PipelineResult<Vec<Detection>> {
        let matrix = stack_vectors(vectors)?;
        self.bulk_detect(matrix.view())
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn check_width(expected: usize, actual: usize) -> PipelineResult<()> {
    if expected != actual {
        return Err(PipelineError::FeatureShape { expected, actual });
    }
    Ok(())
}

/// Rows of a matrix; width taken from the first vector
fn stack_vectors(vectors: &[FeatureVector]) -> PipelineResult<Array2<f64>> {
    let width = vectors.first().map_or(0, |v| v.len());
    for vector in vectors {
        check_width(width, vector.len())?;
    }

    Ok(Array2::from_shape_fn((vectors.len(), width), |(i, j)| {
        vectors[i].as_slice()[j]
    }))
}
