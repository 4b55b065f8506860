//! Score post-processing: min-max normalization and quantiles.

use serde::{Deserialize, Serialize};

/// Prediction output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Below the model's native decision boundary
    pub is_anomaly: bool,
    /// 0.0 - 1.0, 1.0 = most anomalous within the comparison set
    pub anomaly_score: f64,
    /// Isolation-forest convention: lower = more anomalous
    pub raw_score: f64,
}

/// Min-max rescale raw scores against their own range, inverted so the
/// lowest raw score maps to 1.0.
///
/// A set with no spread (including a single score) maps to all 0.0.
pub fn normalize_scores(raw: &[f64]) -> Vec<f64> {
    let (min, max) = raw
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| (lo.min(s), hi.max(s)));

    let range = max - min;
    if !(range > 0.0) {
        return vec![0.0; raw.len()];
    }

    raw.iter().map(|&s| 1.0 - (s - min) / range).collect()
}

/// Linear-interpolated quantile of an ascending slice, `q` in [0, 1]
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
        }
    }
}
