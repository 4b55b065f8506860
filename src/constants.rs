//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! To change where the model lives or how the forest is built, only edit this file
//! (or set the matching environment variable).

use std::path::PathBuf;

/// Number of isolation trees in the ensemble
pub const DEFAULT_N_ESTIMATORS: usize = 100;

/// Expected fraction of outliers in the training data
pub const DEFAULT_CONTAMINATION: f64 = 0.1;

/// Fixed seed so that training is reproducible
pub const DEFAULT_RANDOM_SEED: u64 = 42;

/// Upper bound on rows drawn for each tree
pub const DEFAULT_MAX_SAMPLES: usize = 256;

/// Parallelism hint, 0 = use every available core
pub const DEFAULT_N_JOBS: usize = 0;

/// Default trailing window for feature extraction (minutes)
pub const DEFAULT_WINDOW_MINUTES: u32 = 5;

/// Model file name inside the data directory
pub const MODEL_FILE_NAME: &str = "isolation_forest.model";

/// App name (data directory name)
pub const APP_NAME: &str = "ai-security";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Default model path: `<data_local_dir>/ai-security/models/isolation_forest.model`
pub fn default_model_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join("models")
        .join(MODEL_FILE_NAME)
}

/// Get model path from environment or use default
pub fn get_model_path() -> PathBuf {
    std::env::var("ANOMALY_MODEL_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_model_path())
}

/// Get parallelism hint from environment or use default
pub fn get_n_jobs() -> usize {
    std::env::var("ANOMALY_N_JOBS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_N_JOBS)
}

/// Get extraction window from environment or use default
pub fn get_window_minutes() -> u32 {
    std::env::var("ANOMALY_WINDOW_MINUTES")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|&m| m > 0)
        .unwrap_or(DEFAULT_WINDOW_MINUTES)
}
