//! Pipeline - raw records → normalize → window features → detect
//!
//! Một lần gọi `analyze` = một cửa sổ của một nguồn log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::get_window_minutes;
use crate::logic::error::PipelineResult;
use crate::logic::features::extract_at;
use crate::logic::model::AnomalyModel;
use crate::logic::normalizer::normalize_batch;
use crate::logic::source::SourceKind;

/// Result of scoring one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub is_anomaly: bool,
    pub anomaly_score: f64,
    pub raw_score: f64,
    /// Window end
    pub timestamp: DateTime<Utc>,
    pub source: SourceKind,
    pub features: Vec<f64>,
    pub feature_names: Vec<String>,
    pub window_minutes: u32,
    /// Raw records handed in, before windowing
    pub logs_analyzed: usize,
}

/// Score the window `[now - window_minutes, now]` of `raw_records`.
///
/// Any invalid record fails the whole call; nothing is scored on partial input.
pub fn analyze(
    model: &AnomalyModel,
    kind: SourceKind,
    raw_records: &[Value],
    window_minutes: u32,
    now: DateTime<Utc>,
) -> PipelineResult<AnomalyReport> {
    let records = normalize_batch(kind, raw_records)?;
    let vector = extract_at(kind, &records, window_minutes, now)?;
    let detection = model.detect_vector(&vector)?;

    if detection.is_anomaly {
        log::warn!(
            "Anomaly in {} window ending {} (raw score {:.4})",
            kind,
            now,
            detection.raw_score
        );
    }
    log::debug!("Window features: {}", vector.to_log_entry());

    Ok(AnomalyReport {
        is_anomaly: detection.is_anomaly,
        anomaly_score: detection.anomaly_score,
        raw_score: detection.raw_score,
        timestamp: now,
        source: kind,
        feature_names: vector.feature_names().iter().map(|n| n.to_string()).collect(),
        features: vector.into_values(),
        window_minutes,
        logs_analyzed: raw_records.len(),
    })
}

/// [`analyze`] over the configured window, ending at wall-clock time
pub fn analyze_latest(
    model: &AnomalyModel,
    kind: SourceKind,
    raw_records: &[Value],
) -> PipelineResult<AnomalyReport> {
    analyze(model, kind, raw_records, get_window_minutes(), Utc::now())
}

/// [`analyze`] with the source given as a collaborator tag
pub fn analyze_str(
    model: &AnomalyModel,
    source: &str,
    raw_records: &[Value],
    window_minutes: u32,
    now: DateTime<Utc>,
) -> PipelineResult<AnomalyReport> {
    analyze(model, SourceKind::parse(source)?, raw_records, window_minutes, now)
}
