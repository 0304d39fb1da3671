//! Composition Manifest - SHA-256 Over Canonical JSON
//!
//! Records what was drawn where, so a storefront image can be reproduced
//! from the same profile and photo folder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{to_string, Value};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

use crate::compose::{Placement, Role};
use crate::config::LayoutConfig;

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Convert to canonical JSON (sorted keys, no whitespace)
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v: Value = serde_json::to_value(value)?;
    to_string(&sort_value(&v))
}

fn sort_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut sorted: Vec<_> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                sorted
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sort_value(v)))
                    .collect(),
            )
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_value).collect()),
        _ => v.clone(),
    }
}

/// job_hash = sha256(profile : canonical config : image list : engine version)
pub fn compute_job_hash(
    profile: &str,
    config: &LayoutConfig,
    images: &[PathBuf],
    engine_version: &str,
) -> Result<String, serde_json::Error> {
    let combined = format!(
        "{}:{}:{}:{}",
        profile,
        canonical_json(config)?,
        canonical_json(&images)?,
        engine_version
    );
    Ok(sha256_hex(combined.as_bytes()))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositionManifest {
    pub engine_version: String,
    pub profile: String,
    pub created_at: DateTime<Utc>,
    pub config: LayoutConfig,
    pub placements: Vec<Placement>,
    pub truncated: bool,
    pub output: PathBuf,
    pub output_hash: String,
    pub job_hash: String,
}

impl CompositionManifest {
    pub fn hero(&self) -> Option<&Placement> {
        self.placements.iter().find(|p| p.role == Role::Hero)
    }

    pub fn thumbnail_count(&self) -> usize {
        self.placements.iter().filter(|p| p.role == Role::Thumbnail).count()
    }
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
    }
}
