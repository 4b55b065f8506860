//! Typed field access over a loosely-typed JSON object.
//!
//! Every accessor takes a list of accepted names (canonical name first, then
//! aliases); errors always report the canonical name.

use std::net::IpAddr;

use serde_json::{Map, Value};

use crate::logic::error::{PipelineError, PipelineResult, ValidationIssue};
use crate::logic::source::SourceKind;

pub(crate) struct Fields<'a> {
    kind: SourceKind,
    map: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    pub fn new(kind: SourceKind, raw: &'a Value) -> PipelineResult<Self> {
        match raw.as_object() {
            Some(map) => Ok(Self { kind, map }),
            None => Err(PipelineError::validation(kind, ValidationIssue::NotAnObject)),
        }
    }

    /// View over a sub-object of the record
    pub fn nested(kind: SourceKind, map: &'a Map<String, Value>) -> Self {
        Self { kind, map }
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// First present, non-null value among `names`
    pub fn lookup(&self, names: &[&str]) -> Option<&'a Value> {
        names
            .iter()
            .filter_map(|name| self.map.get(*name))
            .find(|v| !v.is_null())
    }

    pub fn missing(&self, field: &str) -> PipelineError {
        PipelineError::validation(self.kind, ValidationIssue::MissingField(field.to_string()))
    }

    pub fn wrong_type(&self, field: &str, expected: &'static str, value: &Value) -> PipelineError {
        PipelineError::validation(
            self.kind,
            ValidationIssue::WrongType {
                field: field.to_string(),
                expected,
                found: describe(value),
            },
        )
    }

    pub fn required(&self, names: &[&str]) -> PipelineResult<&'a Value> {
        self.lookup(names).ok_or_else(|| self.missing(names[0]))
    }

    pub fn required_str(&self, names: &[&str]) -> PipelineResult<String> {
        let value = self.required(names)?;
        coerce_string(value).ok_or_else(|| self.wrong_type(names[0], "string", value))
    }

    pub fn optional_str(&self, names: &[&str]) -> PipelineResult<Option<String>> {
        self.lookup(names)
            .map(|v| coerce_string(v).ok_or_else(|| self.wrong_type(names[0], "string", v)))
            .transpose()
    }

    pub fn required_ip(&self, names: &[&str]) -> PipelineResult<IpAddr> {
        let value = self.required(names)?;
        value
            .as_str()
            .and_then(|s| s.trim().parse().ok())
            .ok_or_else(|| self.wrong_type(names[0], "IP address", value))
    }

    pub fn required_port(&self, names: &[&str]) -> PipelineResult<u16> {
        let value = self.required(names)?;
        self.port(names[0], value)
    }

    pub fn optional_port(&self, names: &[&str]) -> PipelineResult<Option<u16>> {
        self.lookup(names).map(|v| self.port(names[0], v)).transpose()
    }

    fn port(&self, field: &str, value: &Value) -> PipelineResult<u16> {
        coerce_u64(value)
            .and_then(|n| u16::try_from(n).ok())
            .ok_or_else(|| self.wrong_type(field, "port number", value))
    }

    pub fn optional_u64(&self, names: &[&str]) -> PipelineResult<Option<u64>> {
        self.lookup(names)
            .map(|v| coerce_u64(v).ok_or_else(|| self.wrong_type(names[0], "unsigned integer", v)))
            .transpose()
    }

    /// Counter fields: absent means 0
    pub fn counter(&self, names: &[&str]) -> PipelineResult<u64> {
        Ok(self.optional_u64(names)?.unwrap_or(0))
    }

    pub fn required_i64(&self, names: &[&str]) -> PipelineResult<i64> {
        let value = self.required(names)?;
        coerce_i64(value).ok_or_else(|| self.wrong_type(names[0], "integer", value))
    }

    pub fn optional_i64(&self, names: &[&str]) -> PipelineResult<Option<i64>> {
        self.lookup(names)
            .map(|v| coerce_i64(v).ok_or_else(|| self.wrong_type(names[0], "integer", v)))
            .transpose()
    }

    pub fn optional_f64(&self, names: &[&str]) -> PipelineResult<Option<f64>> {
        self.lookup(names)
            .map(|v| coerce_f64(v).ok_or_else(|| self.wrong_type(names[0], "number", v)))
            .transpose()
    }

    pub fn optional_bool(&self, names: &[&str]) -> PipelineResult<Option<bool>> {
        self.lookup(names)
            .map(|v| coerce_bool(v).ok_or_else(|| self.wrong_type(names[0], "boolean", v)))
            .transpose()
    }

    pub fn required_object(&self, names: &[&str]) -> PipelineResult<Map<String, Value>> {
        let value = self.required(names)?;
        value
            .as_object()
            .cloned()
            .ok_or_else(|| self.wrong_type(names[0], "object", value))
    }

    pub fn optional_object(&self, names: &[&str]) -> PipelineResult<Option<Map<String, Value>>> {
        self.lookup(names)
            .map(|v| v.as_object().cloned().ok_or_else(|| self.wrong_type(names[0], "object", v)))
            .transpose()
    }
}

// ============================================================================
// COERCION
// ============================================================================

pub(crate) fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn coerce_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(integral_u64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral_u64))
        }
        _ => None,
    }
}

pub(crate) fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral_i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral_i64))
        }
        _ => None,
    }
}

pub(crate) fn coerce_f64(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

pub(crate) fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_u64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "t" | "true" | "1" => Some(true),
            "f" | "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn integral_u64(f: f64) -> Option<u64> {
    (f.is_finite() && f.fract() == 0.0 && f >= 0.0 && f <= u64::MAX as f64).then_some(f as u64)
}

fn integral_i64(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64)
        .then_some(f as i64)
}

/// Short description of a JSON value for error messages
pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {}", b),
        Value::Number(n) => format!("number {}", n),
        Value::String(s) => format!("string {:?}", s),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}
