//! Flow Feature Extraction
//!
//! Trích xuất features từ network flow records (Zeek conn) trong một window.

use std::collections::HashSet;
use std::net::IpAddr;

use super::stats::ratio;
use super::window::TimeWindow;
use crate::logic::normalizer::FlowRecord;

/// Connection states treated as terminal/error (no clean handshake or reset)
pub const ERROR_STATES: &[&str] = &["S0", "REJ", "RSTO", "RSTOS0", "RSTRH", "SH", "SHR"];

/// Running totals over the flow records of one window
#[derive(Debug, Clone, Default)]
pub struct FlowFeatures {
    pub total_bytes: u64,
    pub total_packets: u64,
    pub unique_ips: HashSet<IpAddr>,
    pub duration_sum: f64,
    pub ratio_sum: f64,
    /// Records with nonzero responder bytes
    pub ratio_samples: usize,
    pub local_count: usize,
    pub error_count: usize,
    pub total_records: usize,
}

impl FlowFeatures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, record: &FlowRecord) {
        self.total_bytes = self
            .total_bytes
            .saturating_add(record.orig_bytes)
            .saturating_add(record.resp_bytes);
        self.total_packets = self
            .total_packets
            .saturating_add(record.orig_pkts)
            .saturating_add(record.resp_pkts);

        self.unique_ips.insert(record.source_ip);
        self.unique_ips.insert(record.dest_ip);

        self.duration_sum += record.duration;

        if record.resp_bytes > 0 {
            // resp_bytes > 0 here, the floor of 1 only guards the division
            self.ratio_sum += record.orig_bytes as f64 / record.resp_bytes.max(1) as f64;
            self.ratio_samples += 1;
        }

        if record.local_orig {
            self.local_count += 1;
        }

        if record
            .conn_state
            .as_deref()
            .is_some_and(|state| ERROR_STATES.contains(&state))
        {
            self.error_count += 1;
        }

        self.total_records += 1;
    }

    pub fn mean_duration(&self) -> f64 {
        if self.total_records == 0 {
            0.0
        } else {
            self.duration_sum / self.total_records as f64
        }
    }

    /// Mean originator/responder byte ratio, 0.0 if no record had responder bytes
    pub fn bytes_ratio(&self) -> f64 {
        if self.ratio_samples == 0 {
            0.0
        } else {
            self.ratio_sum / self.ratio_samples as f64
        }
    }

    pub fn local_ratio(&self) -> f64 {
        ratio(self.local_count, self.total_records)
    }

    pub fn error_ratio(&self) -> f64 {
        ratio(self.error_count, self.total_records)
    }

    /// Values in `FLOW_FEATURES` order
    pub fn values(&self, window: &TimeWindow) -> Vec<f64> {
        let seconds = window.seconds();
        vec![
            self.total_bytes as f64 / seconds,
            self.total_packets as f64 / seconds,
            self.unique_ips.len() as f64,
            self.mean_duration(),
            self.bytes_ratio(),
            self.local_ratio(),
            self.error_ratio(),
        ]
    }
}

impl<'a> FromIterator<&'a FlowRecord> for FlowFeatures {
    fn from_iter<I: IntoIterator<Item = &'a FlowRecord>>(iter: I) -> Self {
        let mut features = FlowFeatures::new();
        for record in iter {
            features.add(record);
        }
        features
    }
}
