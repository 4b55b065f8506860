//! Model Module - Isolation Forest Scoring Engine
//!
//! Tách model (fit/score/persist) khỏi normalize + feature extraction.
//! `AnomalyModel` là handle duy nhất mà callers cần.

pub mod detector;
pub mod forest;
pub mod score;
pub mod storage;


// Re-export common types
pub use detector::{AnomalyModel, ModelMetrics};
pub use forest::IsolationForest;
pub use score::{normalize_scores, Detection};
pub use storage::{TrainedModel, MODEL_FORMAT_VERSION};
