//! Alert Feature Extraction
//!
//! Trích xuất features từ IDS alerts (Suricata) trong một window.

use std::collections::HashSet;
use std::net::IpAddr;

use super::stats::{entropy, mean, ratio};
use super::window::TimeWindow;
use crate::logic::normalizer::AlertRecord;

/// Severity at or above this counts as high
pub const HIGH_SEVERITY: i64 = 3;

/// Identity used for distinct-signature counting
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SignatureKey {
    Id(u64),
    Name(String),
    /// Record carried neither id nor name; counts as one distinct value
    Absent,
}

impl SignatureKey {
    pub fn of(record: &AlertRecord) -> Self {
        match (record.signature_id, record.signature.as_ref()) {
            (Some(id), _) => SignatureKey::Id(id),
            (None, Some(name)) => SignatureKey::Name(name.clone()),
            (None, None) => SignatureKey::Absent,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AlertFeatures {
    pub severities: Vec<i64>,
    pub signatures: HashSet<SignatureKey>,
    pub source_ips: HashSet<IpAddr>,
    pub protocols: Vec<String>,
    pub total_records: usize,
}

impl AlertFeatures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, record: &AlertRecord) {
        if let Some(severity) = record.severity {
            self.severities.push(severity);
        }
        self.signatures.insert(SignatureKey::of(record));
        self.source_ips.insert(record.src_ip);
        self.protocols.push(record.proto.clone());
        self.total_records += 1;
    }

    /// Mean over records that carried a severity; 0.0 if none did
    pub fn severity_avg(&self) -> f64 {
        mean(self.severities.iter().map(|&s| s as f64))
    }

    pub fn high_severity_ratio(&self) -> f64 {
        let high = self.severities.iter().filter(|&&s| s >= HIGH_SEVERITY).count();
        ratio(high, self.total_records)
    }

    pub fn source_ip_diversity(&self) -> f64 {
        ratio(self.source_ips.len(), self.total_records)
    }

    pub fn protocol_entropy(&self) -> f64 {
        entropy(self.protocols.iter())
    }

    /// Values in `ALERT_FEATURES` order
    pub fn values(&self, window: &TimeWindow) -> Vec<f64> {
        vec![
            self.severity_avg(),
            self.signatures.len() as f64,
            self.total_records as f64 / window.seconds(),
            self.high_severity_ratio(),
            self.source_ip_diversity(),
            self.protocol_entropy(),
        ]
    }
}

impl<'a> FromIterator<&'a AlertRecord> for AlertFeatures {
    fn from_iter<I: IntoIterator<Item = &'a AlertRecord>>(iter: I) -> Self {
        let mut features = AlertFeatures::new();
        for record in iter {
            features.add(record);
        }
        features
    }
}
