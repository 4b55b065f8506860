//! Time window selection and the injectable clock.

use chrono::{DateTime, Duration, Utc};

use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::normalizer::NormalizedLogRecord;
use crate::logic::source::SourceKind;

/// Source of "now" for window anchoring
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Pinned instant, for replay and tests
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Trailing window `[now - minutes, now]`, both ends inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub minutes: u32,
}

impl TimeWindow {
    pub fn trailing(now: DateTime<Utc>, minutes: u32) -> PipelineResult<Self> {
        if minutes == 0 {
            return Err(PipelineError::InvalidWindow(minutes));
        }
        Ok(Self {
            start: now - Duration::minutes(i64::from(minutes)),
            end: now,
            minutes,
        })
    }

    pub fn seconds(&self) -> f64 {
        f64::from(self.minutes) * 60.0
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }

    /// Records inside the window; every record must belong to `kind`
    pub fn select<'a>(
        &self,
        kind: SourceKind,
        records: &'a [NormalizedLogRecord],
    ) -> PipelineResult<Vec<&'a NormalizedLogRecord>> {
        if let Some(stray) = records.iter().find(|r| r.kind() != kind) {
            return Err(PipelineError::SourceMismatch {
                expected: kind,
                found: stray.kind(),
            });
        }

        Ok(records.iter().filter(|r| self.contains(r.timestamp())).collect())
    }
}
