use serde::{Deserialize, Serialize};

use crate::constants::{
    get_n_jobs, DEFAULT_CONTAMINATION, DEFAULT_MAX_SAMPLES, DEFAULT_N_ESTIMATORS,
    DEFAULT_N_JOBS, DEFAULT_RANDOM_SEED,
};

/// Isolation forest configuration, persisted alongside the fitted trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Ensemble size
    pub n_estimators: usize,
    /// Expected outlier fraction, sets the decision boundary
    pub contamination: f64,
    /// Rows drawn (without replacement) per tree, capped by the training size
    pub max_samples: usize,
    /// Parallelism hint, 0 = all cores
    pub n_jobs: usize,
    /// Master seed for reproducible training
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_estimators: DEFAULT_N_ESTIMATORS,
            contamination: DEFAULT_CONTAMINATION,
            max_samples: DEFAULT_MAX_SAMPLES,
            n_jobs: DEFAULT_N_JOBS,
            seed: DEFAULT_RANDOM_SEED,
        }
    }
}

impl ModelConfig {
    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        Self {
            n_jobs: get_n_jobs(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.n_estimators == 0 {
            return Err("n_estimators must be positive".to_string());
        }
        if self.max_samples == 0 {
            return Err("max_samples must be positive".to_string());
        }
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(format!(
                "contamination must be in (0, 0.5], got {}",
                self.contamination
            ));
        }
        Ok(())
    }
}
