//! Normalized log schemas
//!
//! Ba schema cố định cho ba nguồn log. Sau normalize, `timestamp` luôn có mặt
//! và luôn là `DateTime<Utc>`.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::logic::source::SourceKind;

// ============================================================================
// FLOW (Zeek conn)
// ============================================================================

/// One network connection summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRecord {
    pub timestamp: DateTime<Utc>,
    pub uid: String,
    pub source_ip: IpAddr,
    pub source_port: u16,
    pub dest_ip: IpAddr,
    pub dest_port: u16,
    pub protocol: String,
    pub service: Option<String>,
    /// Seconds; 0.0 when the sensor did not report it
    pub duration: f64,
    pub orig_bytes: u64,
    pub resp_bytes: u64,
    pub orig_pkts: u64,
    pub resp_pkts: u64,
    pub missed_bytes: u64,
    pub orig_ip_bytes: u64,
    pub resp_ip_bytes: u64,
    pub conn_state: Option<String>,
    pub local_orig: bool,
    pub local_resp: bool,
    pub history: Option<String>,
}

// ============================================================================
// ALERT (Suricata eve)
// ============================================================================

/// Nested `flow` object of an alert; `start`/`end` are resolved independently
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AlertFlow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Remaining counters (pkts_toserver, bytes_toclient, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub src_ip: IpAddr,
    pub src_port: Option<u16>,
    pub dest_ip: IpAddr,
    pub dest_port: Option<u16>,
    pub proto: String,
    pub flow_id: Option<u64>,
    pub in_iface: Option<String>,
    pub event_category: Option<String>,
    pub app_proto: Option<String>,
    pub severity: Option<i64>,
    pub signature: Option<String>,
    pub signature_id: Option<u64>,
    pub alert: Option<Map<String, Value>>,
    pub flow: Option<AlertFlow>,
    pub tcp: Option<Map<String, Value>>,
}

// ============================================================================
// HOST EVENT (osquery)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostEventRecord {
    /// Derived from `calendar_time`, never from `unix_time`
    pub timestamp: DateTime<Utc>,
    pub name: String,
    pub action: String,
    pub columns: Map<String, Value>,
    pub host_identifier: String,
    pub calendar_time: String,
    pub unix_time: i64,
    pub counter: Option<u64>,
    pub decorations: Option<Map<String, Value>>,
}

// ============================================================================
// TAGGED UNION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "kebab-case")]
pub enum NormalizedLogRecord {
    Flow(FlowRecord),
    Alert(AlertRecord),
    HostEvent(HostEventRecord),
}

impl NormalizedLogRecord {
    pub fn kind(&self) -> SourceKind {
        match self {
            NormalizedLogRecord::Flow(_) => SourceKind::Flow,
            NormalizedLogRecord::Alert(_) => SourceKind::Alert,
            NormalizedLogRecord::HostEvent(_) => SourceKind::HostEvent,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            NormalizedLogRecord::Flow(r) => r.timestamp,
            NormalizedLogRecord::Alert(r) => r.timestamp,
            NormalizedLogRecord::HostEvent(r) => r.timestamp,
        }
    }

    pub fn as_flow(&self) -> Option<&FlowRecord> {
        match self {
            NormalizedLogRecord::Flow(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_alert(&self) -> Option<&AlertRecord> {
        match self {
            NormalizedLogRecord::Alert(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_host_event(&self) -> Option<&HostEventRecord> {
        match self {
            NormalizedLogRecord::HostEvent(r) => Some(r),
            _ => None,
        }
    }
}

impl From<FlowRecord> for NormalizedLogRecord {
    fn from(record: FlowRecord) -> Self {
        NormalizedLogRecord::Flow(record)
    }
}

impl From<AlertRecord> for NormalizedLogRecord {
    fn from(record: AlertRecord) -> Self {
        NormalizedLogRecord::Alert(record)
    }
}

impl From<HostEventRecord> for NormalizedLogRecord {
    fn from(record: HostEventRecord) -> Self {
        NormalizedLogRecord::HostEvent(record)
    }
}
