//! Storefront Core - Square Product Collage Compositor
//!
//! One hero photo plus a strip of thumbnails on a white square canvas.
//! 1. Photos are trimmed of their near-white background
//! 2. Every image is scaled uniformly to fit its slot and centered on the slack axis
//! 3. Thumbnails that no longer fit are replaced by a single marker image

pub mod config;
pub mod validation;
pub mod geometry;
pub mod imaging;
pub mod compose;
pub mod discovery;
pub mod manifest;
pub mod pipeline;

pub use config::{ConfigError, FlipImages, LayoutConfig, Mode, ProfileRegistry};
pub use validation::{ConfigRule, ConfigValidator, ConfigViolation, ValidationResult, ViolationSeverity};
pub use geometry::{fit, place, Axis, Fit, PlacementRect};
pub use imaging::{FileLoader, ImageLoader};
pub use compose::{place_hero, place_strip, Canvas, ComposeError, Placement, Role};
pub use manifest::{canonical_json, compute_job_hash, CompositionManifest};
pub use pipeline::{ComposeRequest, Composition, PipelineError, StorefrontPipeline};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
