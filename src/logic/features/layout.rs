//! Feature Layout - Centralized Feature Definition
//!
//! **CRITICAL: This file controls the feature schema**
//!
//! ## Rules (NEVER break these):
//! 1. Add feature → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Remove feature → increment FEATURE_VERSION
//!
//! A trained model expects exactly the dimensionality listed here for the
//! source it was trained on.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use crate::logic::source::SourceKind;

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
/// MUST be incremented when any layout below changes
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE LAYOUTS (Authoritative source)
// ============================================================================

pub const FLOW_FEATURES: &[&str] = &[
    "bytes_per_second",      // 0: (orig + resp bytes) / window seconds
    "packets_per_second",    // 1: (orig + resp packets) / window seconds
    "unique_ips",            // 2: distinct IPs on either endpoint
    "connection_duration",   // 3: mean duration
    "bytes_ratio",           // 4: mean orig/resp over records with resp > 0
    "local_network_ratio",   // 5: fraction locally originated
    "error_ratio",           // 6: fraction in a terminal/error conn state
];

pub const ALERT_FEATURES: &[&str] = &[
    "alert_severity_avg",    // 0: mean of present severities
    "unique_signatures",     // 1: distinct signature keys
    "event_frequency",       // 2: events / window seconds
    "high_severity_ratio",   // 3: fraction with severity >= 3
    "source_ip_diversity",   // 4: distinct src IPs / record count
    "protocol_entropy",      // 5: Shannon entropy (bits) of proto
];

pub const HOST_EVENT_FEATURES: &[&str] = &[
    "process_events_frequency",
    "file_events_frequency",
    "network_events_frequency",
    "user_events_frequency",
    "system_events_frequency",
];

pub const FLOW_FEATURE_COUNT: usize = 7;
pub const ALERT_FEATURE_COUNT: usize = 6;
pub const HOST_EVENT_FEATURE_COUNT: usize = 5;

/// Ordered feature names for a source
pub fn feature_names(kind: SourceKind) -> &'static [&'static str] {
    match kind {
        SourceKind::Flow => FLOW_FEATURES,
        SourceKind::Alert => ALERT_FEATURES,
        SourceKind::HostEvent => HOST_EVENT_FEATURES,
    }
}

pub fn feature_count(kind: SourceKind) -> usize {
    match kind {
        SourceKind::Flow => FLOW_FEATURE_COUNT,
        SourceKind::Alert => ALERT_FEATURE_COUNT,
        SourceKind::HostEvent => HOST_EVENT_FEATURE_COUNT,
    }
}

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// CRC32 of version + source + feature names, used to detect layout drift
pub fn layout_hash(kind: SourceKind) -> u32 {
    let mut hasher = Hasher::new();

    hasher.update(&[FEATURE_VERSION]);
    hasher.update(kind.as_str().as_bytes());
    hasher.update(&[0]);

    for name in feature_names(kind) {
        hasher.update(name.as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub source: SourceKind,
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

impl LayoutInfo {
    pub fn current(kind: SourceKind) -> Self {
        Self {
            source: kind,
            version: FEATURE_VERSION,
            hash: layout_hash(kind),
            feature_count: feature_count(kind),
            feature_names: feature_names(kind).iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Get feature index by name (O(n) but features are few)
pub fn feature_index(kind: SourceKind, name: &str) -> Option<usize> {
    feature_names(kind).iter().position(|&n| n == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_counts_match_layouts() {
        for kind in SourceKind::ALL {
            assert_eq!(feature_names(kind).len(), feature_count(kind));
        }
        assert_eq!(feature_count(SourceKind::Flow), 7);
        assert_eq!(feature_count(SourceKind::Alert), 6);
        assert_eq!(feature_count(SourceKind::HostEvent), 5);
    }

    #[test]
    fn test_layout_hashes_distinct_and_stable() {
        let flow = layout_hash(SourceKind::Flow);
        assert_eq!(flow, layout_hash(SourceKind::Flow));
        assert_ne!(flow, layout_hash(SourceKind::Alert));
        assert_ne!(layout_hash(SourceKind::Alert), layout_hash(SourceKind::HostEvent));
    }

    #[test]
    fn test_feature_index() {
        assert_eq!(feature_index(SourceKind::Flow, "bytes_ratio"), Some(4));
        assert_eq!(feature_index(SourceKind::Alert, "protocol_entropy"), Some(5));
        assert_eq!(feature_index(SourceKind::HostEvent, "bytes_ratio"), None);
    }

    #[test]
    fn test_layout_info() {
        let info = LayoutInfo::current(SourceKind::Alert);
        assert_eq!(info.version, FEATURE_VERSION);
        assert_eq!(info.feature_count, 6);
        assert_eq!(info.feature_names[0], "alert_severity_avg");
    }
}
