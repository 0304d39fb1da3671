//! Composition Pipeline - Single Entry Point
//!
//! Discovery, validation, composition and encoding, in that order. Every
//! failure is fatal; the output file is only written after the whole
//! canvas has been composed.

use chrono::Utc;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::compose::{place_hero, place_strip, Canvas, ComposeError, Placement, Role};
use crate::config::{ConfigError, LayoutConfig};
use crate::discovery::{self, DiscoveryError};
use crate::imaging::{DecodeError, FileLoader, ImageLoader};
use crate::manifest::{compute_job_hash, sha256_hex, CompositionManifest};
use crate::validation::{ConfigValidator, ValidationResult};
use crate::ENGINE_VERSION;

pub const JPEG_QUALITY: u8 = 95;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Geometry(ComposeError),

    #[error("Output {path} could not be written: {reason}")]
    Encode { path: PathBuf, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ComposeError> for PipelineError {
    fn from(e: ComposeError) -> Self {
        match e {
            ComposeError::Decode(d) => PipelineError::Decode(d),
            other => PipelineError::Geometry(other),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeRequest {
    pub profile: String,
    /// Directory holding exactly one photo folder.
    pub root: PathBuf,
    pub output: PathBuf,
}

/// A finished canvas plus what was drawn on it.
pub struct Composition {
    pub canvas: RgbaImage,
    pub placements: Vec<Placement>,
}

impl Composition {
    pub fn truncated(&self) -> bool {
        self.placements.iter().any(|p| p.role == Role::Marker)
    }
}

/// The composition pipeline - single entry point for a storefront image
pub struct StorefrontPipeline {
    loader: Box<dyn ImageLoader>,
    validator: ConfigValidator,
}

impl StorefrontPipeline {
    pub fn new() -> Self {
        Self::with_loader(Box::new(FileLoader))
    }

    pub fn with_loader(loader: Box<dyn ImageLoader>) -> Self {
        Self {
            loader,
            validator: ConfigValidator::new(),
        }
    }

    pub fn validate_config(&self, config: &LayoutConfig) -> ValidationResult {
        self.validator.validate(config)
    }

    fn ensure_valid(&self, config: &LayoutConfig) -> Result<(), PipelineError> {
        let result = self.validate_config(config);
        if result.valid {
            return Ok(());
        }
        let messages: Vec<_> = result.errors()
            .map(|v| format!("{}: {}", v.rule, v.message))
            .collect();
        Err(ConfigError::Invalid(messages.join("; ")).into())
    }

    /// Hero from `images[0]`, strip from the rest.
    pub fn compose(&self, config: &LayoutConfig, images: &[PathBuf]) -> Result<Composition, PipelineError> {
        self.ensure_valid(config)?;
        let Some((hero, thumbnails)) = images.split_first() else {
            return Err(DiscoveryError::NoImages {
                ending: config.image_ending.clone(),
                dir: PathBuf::new(),
            }
            .into());
        };

        let mut canvas = Canvas::new(config.image_size);
        let mut placements = vec![place_hero(config, self.loader.as_ref(), hero, &mut canvas)?];
        placements.extend(place_strip(config, self.loader.as_ref(), thumbnails, &mut canvas)?);

        Ok(Composition {
            canvas: canvas.into_buffer(),
            placements,
        })
    }

    /// Discover, compose, encode and describe one storefront image.
    pub fn run(&self, config: &LayoutConfig, request: &ComposeRequest) -> Result<CompositionManifest, PipelineError> {
        let config = &config.relative_to(&request.root);
        let images = discovery::find_images(&request.root, &config.image_ending)?;
        log::info!("Found {} images", images.len());

        let job_hash = compute_job_hash(&request.profile, config, &images, ENGINE_VERSION)?;
        let composition = self.compose(config, &images)?;
        let truncated = composition.truncated();

        let bytes = encode_jpeg(&composition.canvas, &request.output)?;
        fs::write(&request.output, &bytes).map_err(|e| PipelineError::Encode {
            path: request.output.clone(),
            reason: e.to_string(),
        })?;
        log::info!("Wrote {}", request.output.display());

        Ok(CompositionManifest {
            engine_version: ENGINE_VERSION.to_string(),
            profile: request.profile.clone(),
            created_at: Utc::now(),
            config: config.clone(),
            placements: composition.placements,
            truncated,
            output: request.output.clone(),
            output_hash: sha256_hex(&bytes),
            job_hash,
        })
    }
}

impl Default for StorefrontPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// JPEG bytes of the canvas; alpha is dropped.
fn encode_jpeg(canvas: &RgbaImage, path: &Path) -> Result<Vec<u8>, PipelineError> {
    let rgb = DynamicImage::ImageRgba8(canvas.clone()).to_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| PipelineError::Encode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    Ok(bytes)
}

/// Write a manifest as pretty JSON.
pub fn write_manifest(manifest: &CompositionManifest, path: &Path) -> Result<(), PipelineError> {
    let json = serde_json::to_string_pretty(manifest)?;
    fs::write(path, json).map_err(|e| PipelineError::Encode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
