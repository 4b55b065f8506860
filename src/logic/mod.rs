//! Logic Module - Business Logic & Engines
//!
//! Chứa các engines xử lý: Normalizer, Features, Model, Pipeline.
//!
//! ## Architecture
//! - `normalizer/` - raw JSON → typed record (flow, alert, host-event)
//! - `features/` - windowed feature vectors with a fixed layout per source
//! - `model/` - isolation forest fit/score/persist behind `AnomalyModel`
//! - `pipeline` - one call from raw window to scored report

// Shared types
pub mod config;
pub mod error;
pub mod source;

// Engines
pub mod features;
pub mod model;
pub mod normalizer;
pub mod pipeline;
