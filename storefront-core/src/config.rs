//! Layout Profiles - One JSON File Per Marketplace

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type ProfileName = String;

const PROFILE_PREFIX: &str = "config_";
const PROFILE_SUFFIX: &str = ".json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config could not be read from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config {path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Config is invalid: {0}")]
    Invalid(String),
}

/// Which canvas edge the hero occupies relative to the thumbnail strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Mode {
    /// Hero on top, strip runs horizontally along the bottom.
    Bottom,
    /// Hero on the left, strip runs vertically. Any mode other than "bottom".
    Top,
}

impl From<String> for Mode {
    fn from(s: String) -> Self {
        if s == "bottom" { Mode::Bottom } else { Mode::Top }
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Bottom => "bottom".to_string(),
            Mode::Top => "top".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FlipImages {
    No,
    Yes,
}

impl From<String> for FlipImages {
    fn from(s: String) -> Self {
        if s == "no" { FlipImages::No } else { FlipImages::Yes }
    }
}

impl From<FlipImages> for String {
    fn from(flip: FlipImages) -> Self {
        match flip {
            FlipImages::No => "no".to_string(),
            FlipImages::Yes => "yes".to_string(),
        }
    }
}

impl FlipImages {
    pub fn enabled(self) -> bool {
        self == FlipImages::Yes
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutConfig {
    pub mode: Mode,
    /// Side length of the square canvas.
    pub image_size: u32,
    #[serde(alias = "white_thresold")]
    pub white_threshold: f64,
    pub main_spacer: u32,
    pub thumbnail_spacer: u32,
    /// Side length of each square thumbnail slot.
    pub thumbnail_size: u32,
    /// Cross-axis offset of the strip.
    pub thumbnail_pos: u32,
    pub dot_scale: f64,
    pub dot_image: PathBuf,
    #[serde(default = "default_image_ending")]
    pub image_ending: String,
    #[serde(default = "default_flip")]
    pub flip_images: FlipImages,
}

fn default_image_ending() -> String { ".jpg".to_string() }
fn default_flip() -> FlipImages { FlipImages::No }

impl LayoutConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Copy with a relative `dot_image` resolved against `root`.
    pub fn relative_to(&self, root: &Path) -> Self {
        Self {
            dot_image: root.join(&self.dot_image),
            ..self.clone()
        }
    }

    /// Hero bounding box `(width, height)`, measured from the canvas origin.
    pub fn hero_box(&self) -> (f64, f64) {
        let short = self.thumbnail_pos as f64 - self.main_spacer as f64;
        match self.mode {
            Mode::Bottom => (self.image_size as f64, short),
            Mode::Top => (short, self.image_size as f64),
        }
    }
}

fn profile_name_of(path: &Path) -> Option<ProfileName> {
    let file_name = path.file_name()?.to_str()?;
    let name = file_name
        .strip_prefix(PROFILE_PREFIX)?
        .strip_suffix(PROFILE_SUFFIX)?;
    if name.is_empty() { None } else { Some(name.to_string()) }
}

/// Profile registry - loads every `config_<name>.json` in a directory
pub struct ProfileRegistry {
    profiles: BTreeMap<ProfileName, LayoutConfig>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self { profiles: BTreeMap::new() }
    }

    pub fn load_from_dir(dir: &Path) -> Result<Self, std::io::Error> {
        let mut registry = Self::new();
        if dir.exists() {
            for entry in fs::read_dir(dir)? {
                let path = entry?.path();
                let Some(name) = profile_name_of(&path) else { continue };
                match LayoutConfig::load(&path) {
                    Ok(config) => registry.register(name, config),
                    Err(e) => log::warn!("Skipping profile {}: {}", path.display(), e),
                }
            }
        }
        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Result<&LayoutConfig, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound(name.to_string()))
    }

    /// Profiles sorted by name.
    pub fn list(&self) -> Vec<(&str, &LayoutConfig)> {
        self.profiles.iter().map(|(k, v)| (k.as_str(), v)).collect()
    }

    pub fn register(&mut self, name: impl Into<ProfileName>, config: LayoutConfig) {
        self.profiles.insert(name.into(), config);
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::new()
    }
}
