//! AI Security Anomaly Core
//!
//! Ingestion-to-score pipeline for security telemetry:
//! raw record → normalizer → feature window → isolation forest → score.
//!
//! ```text
//! flow / alert / host-event JSON
//!        │
//!        ▼
//!   normalizer ──► features (per-source window) ──► model (detect / bulk_detect)
//! ```

pub mod constants;
pub mod logic;

pub use logic::config::ModelConfig;
pub use logic::error::{PipelineError, PipelineResult, ValidationIssue};
pub use logic::features::{extract, extract_at, FeatureExtractor, FeatureVector};
pub use logic::model::{AnomalyModel, Detection, ModelMetrics};
pub use logic::normalizer::{normalize, normalize_batch, normalize_str, NormalizedLogRecord};
pub use logic::pipeline::{analyze, analyze_latest, analyze_str, AnomalyReport};
pub use logic::source::SourceKind;

/// Install the `env_logger` backend (default filter `info`, override with `RUST_LOG`).
///
/// Calling it again is a no-op.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_init_logging_is_idempotent() {
        super::init_logging();
        super::init_logging();
        log::info!("logger installed");
    }
}
