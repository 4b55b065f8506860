//! Model persistence
//!
//! File layout: one header line, then the JSON body.
//!
//! ```text
//! ONESHIELD-IFOREST v1 sha256=<hex of body>
//! {"model_id": ..., "forest": {...}}
//! ```
//!
//! Writes go to a sibling temp file first and are renamed into place, so a
//! crash mid-write never leaves a half-written model at `path`.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::forest::IsolationForest;
use crate::logic::config::ModelConfig;
use crate::logic::error::{PipelineError, PipelineResult};

pub const MODEL_FORMAT_VERSION: u32 = 1;
const MAGIC: &str = "ONESHIELD-IFOREST";

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Everything needed to score again after a restart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    pub model_id: String,
    pub trained_at: DateTime<Utc>,
    pub n_samples: usize,
    pub config: ModelConfig,
    pub forest: IsolationForest,
}

impl TrainedModel {
    pub fn new(forest: IsolationForest, config: ModelConfig, n_samples: usize) -> Self {
        Self {
            model_id: Uuid::new_v4().to_string(),
            trained_at: Utc::now(),
            n_samples,
            config,
            forest,
        }
    }
}

// ============================================================================
// SAVE
// ============================================================================

/// Save atomically, creating parent directories as needed
pub fn save_model(model: &TrainedModel, path: &Path) -> PipelineResult<()> {
    let persist_err = |source: io::Error| PipelineError::Persistence {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(persist_err)?;
    }

    let body = serde_json::to_vec(model)
        .map_err(|e| persist_err(io::Error::new(io::ErrorKind::InvalidData, e)))?;
    let header = format!(
        "{} v{} sha256={}\n",
        MAGIC,
        MODEL_FORMAT_VERSION,
        hex::encode(Sha256::digest(&body))
    );

    let tmp = temp_path(path).map_err(persist_err)?;
    let written = write_file(&tmp, header.as_bytes(), &body).and_then(|_| fs::rename(&tmp, path));

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(persist_err(e));
    }

    log::debug!("Model {} written to {}", model.model_id, path.display());
    Ok(())
}

fn temp_path(path: &Path) -> io::Result<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "model path has no file name")
    })?;
    Ok(path.with_file_name(format!(
        ".{}.{}.tmp",
        name.to_string_lossy(),
        Uuid::new_v4().simple()
    )))
}

fn write_file(path: &Path, header: &[u8], body: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(header)?;
    file.write_all(body)?;
    file.sync_all()
}

// ============================================================================
// LOAD
// ============================================================================

/// Load and verify; every failure is reported as `ModelInit`
pub fn load_model(path: &Path) -> PipelineResult<TrainedModel> {
    let data = fs::read(path).map_err(|e| PipelineError::model_init(path, e))?;
    let model = decode(&data).map_err(|reason| PipelineError::model_init(path, reason))?;

    log::info!(
        "Loaded model {} ({} trees, {} features, trained {})",
        model.model_id,
        model.forest.n_trees(),
        model.forest.n_features(),
        model.trained_at
    );
    Ok(model)
}

fn decode(data: &[u8]) -> Result<TrainedModel, String> {
    let split = data
        .iter()
        .position(|&b| b == b'\n')
        .ok_or("missing model header")?;
    let (header, body) = (&data[..split], &data[split + 1..]);

    let header = std::str::from_utf8(header).map_err(|_| "model header is not UTF-8")?;
    let expected_checksum = parse_header(header)?;

    let actual_checksum = hex::encode(Sha256::digest(body));
    if actual_checksum != expected_checksum {
        return Err(format!(
            "checksum mismatch: header says {}, body hashes to {}",
            expected_checksum, actual_checksum
        ));
    }

    let model: TrainedModel =
        serde_json::from_slice(body).map_err(|e| format!("corrupt model body: {}", e))?;

    model.config.validate()?;
    if !model.forest.is_well_formed() {
        return Err("model body contains a malformed forest".to_string());
    }

    Ok(model)
}

/// `MAGIC v<version> sha256=<hex>` → hex checksum
fn parse_header(header: &str) -> Result<&str, String> {
    let parts: Vec<&str> = header.split_whitespace().collect();
    let (magic, version, checksum) = match parts.as_slice() {
        &[magic, version, checksum] => (magic, version, checksum),
        _ => return Err(format!("malformed model header: {:?}", header)),
    };

    if magic != MAGIC {
        return Err(format!("not a model file (magic {:?})", magic));
    }

    let version: u32 = version
        .strip_prefix('v')
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| format!("malformed format version {:?}", version))?;
    if version != MODEL_FORMAT_VERSION {
        return Err(format!(
            "unsupported format version {} (expected {})",
            version, MODEL_FORMAT_VERSION
        ));
    }

    checksum
        .strip_prefix("sha256=")
        .ok_or_else(|| format!("malformed checksum field {:?}", checksum))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use tempfile::tempdir;

    fn sample_model() -> TrainedModel {
        let data = Array2::from_shape_fn((40, 2), |(i, j)| (i * (j + 1)) as f64);
        let config = ModelConfig {
            n_estimators: 5,
            ..Default::default()
        };
        let pool = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
        let forest = IsolationForest::fit(data.view(), &config, &pool).unwrap();
        TrainedModel::new(forest, config, 40)
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("model.bin");
        let model = sample_model();

        save_model(&model, &path).unwrap();
        let loaded = load_model(&path).unwrap();

        assert_eq!(loaded.model_id, model.model_id);
        assert_eq!(loaded.config, model.config);
        assert_eq!(loaded.forest.offset(), model.forest.offset());
        assert_eq!(loaded.forest.n_trees(), 5);
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.bin");
        save_model(&sample_model(), &path).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_tampered_body_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.bin");
        save_model(&sample_model(), &path).unwrap();

        let mut data = fs::read(&path).unwrap();
        let last = data.len() - 2;
        data[last] = b' ';
        fs::write(&path, data).unwrap();

        let err = load_model(&path).unwrap_err();
        assert!(err.to_string().contains("checksum mismatch"), "{}", err);
    }

    #[test]
    fn test_garbage_file_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.bin");
        fs::write(&path, b"not a model at all").unwrap();

        assert!(matches!(load_model(&path), Err(PipelineError::ModelInit { .. })));
    }

    #[test]
    fn test_header_checks() {
        assert!(parse_header("ONESHIELD-IFOREST v1 sha256=abc").is_ok());
        assert!(parse_header("ONESHIELD-IFOREST v2 sha256=abc").is_err());
        assert!(parse_header("OTHER v1 sha256=abc").is_err());
        assert!(parse_header("ONESHIELD-IFOREST v1").is_err());
    }
}
