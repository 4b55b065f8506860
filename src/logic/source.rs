//! Source Kind - the closed set of telemetry sources
//!
//! Normalizer và extractor đều dispatch trên enum này, nên thêm một nguồn mới
//! là thay đổi exhaustive ở cả hai nơi cùng lúc.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// Network connection summaries (Zeek conn log)
    Flow,
    /// Intrusion-detection events (Suricata eve)
    Alert,
    /// Endpoint instrumentation events (osquery)
    HostEvent,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [SourceKind::Flow, SourceKind::Alert, SourceKind::HostEvent];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Flow => "flow",
            SourceKind::Alert => "alert",
            SourceKind::HostEvent => "host-event",
        }
    }

    /// Parse a collaborator-supplied source tag.
    ///
    /// Accepts the canonical names plus the sensor names the logs come from.
    pub fn parse(tag: &str) -> Result<Self, PipelineError> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "flow" | "zeek" => Ok(SourceKind::Flow),
            "alert" | "suricata" => Ok(SourceKind::Alert),
            "host-event" | "host_event" | "osquery" => Ok(SourceKind::HostEvent),
            _ => Err(PipelineError::UnsupportedSource(tag.to_string())),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceKind::parse(s)
    }
}
