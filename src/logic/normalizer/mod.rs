//! Normalizer Module - Log Validation & Coercion
//!
//! Kiểm tra và ép kiểu raw record (JSON map) về một trong ba schema cố định.
//! Pure transformation: không I/O, không state.

pub mod fields;
pub mod record;
pub mod timestamp;


use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::logic::error::{PipelineError, PipelineResult, ValidationIssue};
use crate::logic::source::SourceKind;
use fields::{describe, Fields};

pub use record::{AlertFlow, AlertRecord, FlowRecord, HostEventRecord, NormalizedLogRecord};

/// Validate and coerce one raw record
pub fn normalize(kind: SourceKind, raw: &Value) -> PipelineResult<NormalizedLogRecord> {
    let fields = Fields::new(kind, raw)?;
    let record = match kind {
        SourceKind::Flow => NormalizedLogRecord::Flow(parse_flow(&fields)?),
        SourceKind::Alert => NormalizedLogRecord::Alert(parse_alert(&fields)?),
        SourceKind::HostEvent => NormalizedLogRecord::HostEvent(parse_host_event(&fields)?),
    };
    Ok(record)
}

/// Same as [`normalize`], with the source given as a collaborator tag
pub fn normalize_str(source: &str, raw: &Value) -> PipelineResult<NormalizedLogRecord> {
    normalize(SourceKind::parse(source)?, raw)
}

/// Normalize a batch, stopping at the first invalid record
pub fn normalize_batch(kind: SourceKind, raw: &[Value]) -> PipelineResult<Vec<NormalizedLogRecord>> {
    raw.iter()
        .enumerate()
        .map(|(index, value)| {
            normalize(kind, value).map_err(|e| {
                log::warn!("Rejected {} record #{}: {}", kind, index, e);
                e
            })
        })
        .collect()
}

// ============================================================================
// FLOW
// ============================================================================

fn parse_flow(f: &Fields<'_>) -> PipelineResult<FlowRecord> {
    let raw_ts = f.required(&["timestamp", "ts"])?;
    let timestamp = match raw_ts {
        Value::Number(n) => n
            .as_f64()
            .and_then(timestamp::from_epoch_seconds)
            .ok_or_else(|| invalid_timestamp(f, "timestamp", &n.to_string()))?,
        // already an instant (ISO-8601 serialized)
        Value::String(s) => resolve_iso(f, "timestamp", s)?,
        other => return Err(f.wrong_type("timestamp", "epoch seconds or ISO-8601 string", other)),
    };

    Ok(FlowRecord {
        timestamp,
        uid: f.required_str(&["uid"])?,
        source_ip: f.required_ip(&["source_ip", "id.orig_h"])?,
        source_port: f.required_port(&["source_port", "id.orig_p"])?,
        dest_ip: f.required_ip(&["dest_ip", "id.resp_h"])?,
        dest_port: f.required_port(&["dest_port", "id.resp_p"])?,
        protocol: f.required_str(&["protocol", "proto"])?,
        service: f.optional_str(&["service"])?,
        duration: f.optional_f64(&["duration"])?.unwrap_or(0.0),
        orig_bytes: f.counter(&["orig_bytes"])?,
        resp_bytes: f.counter(&["resp_bytes"])?,
        orig_pkts: f.counter(&["orig_pkts"])?,
        resp_pkts: f.counter(&["resp_pkts"])?,
        missed_bytes: f.counter(&["missed_bytes"])?,
        orig_ip_bytes: f.counter(&["orig_ip_bytes"])?,
        resp_ip_bytes: f.counter(&["resp_ip_bytes"])?,
        conn_state: f.optional_str(&["conn_state"])?,
        local_orig: f.optional_bool(&["local_orig"])?.unwrap_or(false),
        local_resp: f.optional_bool(&["local_resp"])?.unwrap_or(false),
        history: f.optional_str(&["history"])?,
    })
}

// ============================================================================
// ALERT
// ============================================================================

fn parse_alert(f: &Fields<'_>) -> PipelineResult<AlertRecord> {
    let timestamp = match f.required(&["timestamp"])? {
        Value::String(s) => resolve_iso(f, "timestamp", s)?,
        // non-string instants pass through as epoch seconds
        Value::Number(n) => n
            .as_f64()
            .and_then(timestamp::from_epoch_seconds)
            .ok_or_else(|| invalid_timestamp(f, "timestamp", &n.to_string()))?,
        other => return Err(f.wrong_type("timestamp", "ISO-8601 string or epoch seconds", other)),
    };

    let alert = f.optional_object(&["alert"])?;
    let flow = f
        .optional_object(&["flow"])?
        .map(|obj| parse_alert_flow(f, obj))
        .transpose()?;

    // Suricata nests severity/signature under `alert`; top-level wins when both exist
    let nested = alert.as_ref().map(|obj| Fields::nested(f.kind(), obj));
    let severity = match f.optional_i64(&["severity"])? {
        Some(v) => Some(v),
        None => nested.as_ref().map(|n| n.optional_i64(&["severity"])).transpose()?.flatten(),
    };
    let signature = match f.optional_str(&["signature"])? {
        Some(v) => Some(v),
        None => nested.as_ref().map(|n| n.optional_str(&["signature"])).transpose()?.flatten(),
    };
    let signature_id = match f.optional_u64(&["signature_id"])? {
        Some(v) => Some(v),
        None => nested.as_ref().map(|n| n.optional_u64(&["signature_id"])).transpose()?.flatten(),
    };

    Ok(AlertRecord {
        timestamp,
        event_type: f.required_str(&["event_type"])?,
        src_ip: f.required_ip(&["src_ip"])?,
        src_port: f.optional_port(&["src_port"])?,
        dest_ip: f.required_ip(&["dest_ip"])?,
        dest_port: f.optional_port(&["dest_port"])?,
        proto: f.required_str(&["proto"])?,
        flow_id: f.optional_u64(&["flow_id"])?,
        in_iface: f.optional_str(&["in_iface"])?,
        event_category: f.optional_str(&["event_category"])?,
        app_proto: f.optional_str(&["app_proto"])?,
        severity,
        signature,
        signature_id,
        alert,
        flow,
        tcp: f.optional_object(&["tcp"])?,
    })
}

fn parse_alert_flow(
    f: &Fields<'_>,
    mut obj: serde_json::Map<String, Value>,
) -> PipelineResult<AlertFlow> {
    let mut take_time = |key: &str| -> PipelineResult<Option<DateTime<Utc>>> {
        let field = format!("flow.{}", key);
        match obj.remove(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => resolve_iso(f, &field, &s).map(Some),
            Some(other) => Err(PipelineError::validation(
                f.kind(),
                ValidationIssue::WrongType {
                    field,
                    expected: "ISO-8601 string",
                    found: describe(&other),
                },
            )),
        }
    };

    let start = take_time("start")?;
    let end = take_time("end")?;
    Ok(AlertFlow { start, end, extra: obj })
}

// ============================================================================
// HOST EVENT
// ============================================================================

fn parse_host_event(f: &Fields<'_>) -> PipelineResult<HostEventRecord> {
    let calendar_time = f.required_str(&["calendarTime", "calendar_time"])?;
    let timestamp = timestamp::parse_calendar_time(&calendar_time)
        .ok_or_else(|| invalid_timestamp(f, "calendarTime", &calendar_time))?;

    Ok(HostEventRecord {
        timestamp,
        name: f.required_str(&["name"])?,
        action: f.required_str(&["action"])?,
        columns: f.required_object(&["columns"])?,
        host_identifier: f.required_str(&["hostIdentifier", "host_identifier"])?,
        calendar_time,
        unix_time: f.required_i64(&["unixTime", "unix_time"])?,
        counter: f.optional_u64(&["counter"])?,
        decorations: f.optional_object(&["decorations"])?,
    })
}

// ============================================================================
// HELPERS
// ============================================================================

fn resolve_iso(f: &Fields<'_>, field: &str, value: &str) -> PipelineResult<DateTime<Utc>> {
    timestamp::parse_iso8601(value).ok_or_else(|| invalid_timestamp(f, field, value))
}

fn invalid_timestamp(f: &Fields<'_>, field: &str, value: &str) -> PipelineError {
    PipelineError::validation(
        f.kind(),
        ValidationIssue::InvalidTimestamp {
            field: field.to_string(),
            value: value.to_string(),
        },
    )
}
