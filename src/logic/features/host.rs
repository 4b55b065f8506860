//! Host Event Feature Extraction
//!
//! Phân loại osquery events theo tên rồi tính rate mỗi giây cho từng loại.

use serde::{Deserialize, Serialize};

use super::window::TimeWindow;
use crate::logic::normalizer::HostEventRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostEventClass {
    Process,
    File,
    Network,
    User,
    System,
}

impl HostEventClass {
    /// Layout order, also the bucket index
    pub const ALL: [HostEventClass; 5] = [
        HostEventClass::Process,
        HostEventClass::File,
        HostEventClass::Network,
        HostEventClass::User,
        HostEventClass::System,
    ];

    /// Case-insensitive substring match, first hit in priority order wins
    pub fn classify(name: &str) -> Self {
        let name = name.to_lowercase();
        if name.contains("process") {
            HostEventClass::Process
        } else if name.contains("file") {
            HostEventClass::File
        } else if name.contains("network") {
            HostEventClass::Network
        } else if name.contains("user") {
            HostEventClass::User
        } else {
            HostEventClass::System
        }
    }

    pub fn index(&self) -> usize {
        match self {
            HostEventClass::Process => 0,
            HostEventClass::File => 1,
            HostEventClass::Network => 2,
            HostEventClass::User => 3,
            HostEventClass::System => 4,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HostEventFeatures {
    pub counts: [u64; 5],
}

impl HostEventFeatures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, record: &HostEventRecord) {
        self.counts[HostEventClass::classify(&record.name).index()] += 1;
    }

    pub fn count(&self, class: HostEventClass) -> u64 {
        self.counts[class.index()]
    }

    /// Values in `HOST_EVENT_FEATURES` order
    pub fn values(&self, window: &TimeWindow) -> Vec<f64> {
        let seconds = window.seconds();
        HostEventClass::ALL
            .iter()
            .map(|class| self.count(*class) as f64 / seconds)
            .collect()
    }
}

impl<'a> FromIterator<&'a HostEventRecord> for HostEventFeatures {
    fn from_iter<I: IntoIterator<Item = &'a HostEventRecord>>(iter: I) -> Self {
        let mut features = HostEventFeatures::new();
        for record in iter {
            features.add(record);
        }
        features
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_priority() {
        assert_eq!(HostEventClass::classify("process_network_event"), HostEventClass::Process);
        assert_eq!(HostEventClass::classify("file_events"), HostEventClass::File);
        assert_eq!(HostEventClass::classify("user_network_sockets"), HostEventClass::Network);
        assert_eq!(HostEventClass::classify("logged_in_USERS"), HostEventClass::User);
        assert_eq!(HostEventClass::classify("kernel_modules"), HostEventClass::System);
    }

    #[test]
    fn test_classify_case_insensitive() {
        assert_eq!(HostEventClass::classify("Process_Events"), HostEventClass::Process);
        assert_eq!(HostEventClass::classify("NETWORK_interfaces"), HostEventClass::Network);
    }

    #[test]
    fn test_index_matches_layout_order() {
        for (i, class) in HostEventClass::ALL.iter().enumerate() {
            assert_eq!(class.index(), i);
        }
    }
}
