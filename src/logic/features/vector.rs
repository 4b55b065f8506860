//! Feature Vector - Core data structure for ML input
//!
//! **Versioned feature vector with layout validation**
//!
//! Created once per extraction call and never mutated afterwards; the
//! caller owns it and hands it to the model.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::layout::{feature_count, feature_names, layout_hash, FEATURE_VERSION};
use crate::logic::source::SourceKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    source: SourceKind,
    version: u8,
    layout_hash: u32,
    values: Vec<f64>,
    /// Records that fell inside the window
    records_in_window: usize,
}

impl FeatureVector {
    /// All-zero vector of the correct length (empty window)
    pub fn zeros(source: SourceKind) -> Self {
        Self::from_parts(source, vec![0.0; feature_count(source)], 0)
    }

    /// Caller guarantees `values.len() == feature_count(source)`
    pub(crate) fn from_parts(source: SourceKind, values: Vec<f64>, records_in_window: usize) -> Self {
        debug_assert_eq!(values.len(), feature_count(source));
        Self {
            source,
            version: FEATURE_VERSION,
            layout_hash: layout_hash(source),
            values,
            records_in_window,
        }
    }

    pub fn source(&self) -> SourceKind {
        self.source
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn layout_hash(&self) -> u32 {
        self.layout_hash
    }

    pub fn records_in_window(&self) -> usize {
        self.records_in_window
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn get_by_name(&self, name: &str) -> Option<f64> {
        super::layout::feature_index(self.source, name).and_then(|i| self.get(i))
    }

    pub fn feature_names(&self) -> &'static [&'static str] {
        feature_names(self.source)
    }

    /// Check this vector against the current layout for its source
    pub fn is_compatible(&self) -> bool {
        self.version == FEATURE_VERSION
            && self.layout_hash == layout_hash(self.source)
            && self.values.len() == feature_count(self.source)
    }

    pub fn named_values(&self) -> Vec<(&'static str, f64)> {
        self.feature_names()
            .iter()
            .copied()
            .zip(self.values.iter().copied())
            .collect()
    }

    /// Convert to JSON-serializable format for logging
    pub fn to_log_entry(&self) -> serde_json::Value {
        serde_json::json!({
            "source": self.source,
            "feature_version": self.version,
            "layout_hash": self.layout_hash,
            "records_in_window": self.records_in_window,
            "values": self.values,
            "named_values": self.named_values().into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect::<HashMap<_, _>>(),
        })
    }
}

impl AsRef<[f64]> for FeatureVector {
    fn as_ref(&self) -> &[f64] {
        &self.values
    }
}
