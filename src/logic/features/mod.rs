//! Features Module - Feature Extraction Engine
//!
//! Tách logic trích xuất features từ normalized records.
//! Mỗi nguồn log có layout cố định (xem `layout.rs`), khớp với số chiều model mong đợi.

pub mod alert;
pub mod flow;
pub mod host;
pub mod layout;
pub mod stats;
pub mod vector;
pub mod window;

#[cfg(test)]
mod tests;

use chrono::{DateTime, Utc};

use crate::logic::error::PipelineResult;
use crate::logic::normalizer::NormalizedLogRecord;
use crate::logic::source::SourceKind;

// Re-export common types
pub use alert::AlertFeatures;
pub use flow::FlowFeatures;
pub use host::{HostEventClass, HostEventFeatures};
pub use layout::{feature_count, feature_names, LayoutInfo, FEATURE_VERSION};
pub use vector::FeatureVector;
pub use window::{Clock, FixedClock, SystemClock, TimeWindow};

/// Extract the fixed-length feature vector for `records` inside `[now - window, now]`.
///
/// An empty input or an empty window yields the zero vector of the right length.
pub fn extract_at(
    kind: SourceKind,
    records: &[NormalizedLogRecord],
    window_minutes: u32,
    now: DateTime<Utc>,
) -> PipelineResult<FeatureVector> {
    // nothing to window, so the window length is never consulted
    if records.is_empty() {
        log::debug!("No {} records to extract from", kind);
        return Ok(FeatureVector::zeros(kind));
    }

    let window = TimeWindow::trailing(now, window_minutes)?;
    let in_window = window.select(kind, records)?;

    log::debug!(
        "Extracting {} features: {}/{} records in [{}, {}]",
        kind,
        in_window.len(),
        records.len(),
        window.start,
        window.end
    );

    if in_window.is_empty() {
        return Ok(FeatureVector::zeros(kind));
    }

    let values = match kind {
        SourceKind::Flow => in_window
            .iter()
            .filter_map(|r| r.as_flow())
            .collect::<FlowFeatures>()
            .values(&window),
        SourceKind::Alert => in_window
            .iter()
            .filter_map(|r| r.as_alert())
            .collect::<AlertFeatures>()
            .values(&window),
        SourceKind::HostEvent => in_window
            .iter()
            .filter_map(|r| r.as_host_event())
            .collect::<HostEventFeatures>()
            .values(&window),
    };

    Ok(FeatureVector::from_parts(kind, values, in_window.len()))
}

/// [`extract_at`] anchored at wall-clock time
pub fn extract(
    kind: SourceKind,
    records: &[NormalizedLogRecord],
    window_minutes: u32,
) -> PipelineResult<FeatureVector> {
    extract_at(kind, records, window_minutes, SystemClock.now())
}

/// Same as [`extract_at`], with the source given as a collaborator tag
pub fn extract_str(
    source: &str,
    records: &[NormalizedLogRecord],
    window_minutes: u32,
    now: DateTime<Utc>,
) -> PipelineResult<FeatureVector> {
    extract_at(SourceKind::parse(source)?, records, window_minutes, now)
}

/// Extractor bound to a clock
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor<C: Clock = SystemClock> {
    clock: C,
}

impl FeatureExtractor<SystemClock> {
    pub fn new() -> Self {
        Self { clock: SystemClock }
    }
}

impl<C: Clock> FeatureExtractor<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn extract(
        &self,
        kind: SourceKind,
        records: &[NormalizedLogRecord],
        window_minutes: u32,
    ) -> PipelineResult<FeatureVector> {
        extract_at(kind, records, window_minutes, self.clock.now())
    }
}
