//! Config Validation - Rule/Policy Separation
//!
//! Rules produce structured violations.
//! Any error-severity violation rejects the profile.

use serde::{Deserialize, Serialize};
use crate::config::LayoutConfig;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigViolation {
    pub rule: String,
    pub severity: ViolationSeverity,
    pub message: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

impl ConfigViolation {
    fn error(rule: &str, message: &str, expected: String, actual: String) -> Self {
        Self {
            rule: rule.to_string(),
            severity: ViolationSeverity::Error,
            message: message.to_string(),
            expected: Some(expected),
            actual: Some(actual),
        }
    }

    fn warning(rule: &str, message: &str, expected: String, actual: String) -> Self {
        Self {
            severity: ViolationSeverity::Warning,
            ..Self::error(rule, message, expected, actual)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub violations: Vec<ConfigViolation>,
}

impl ValidationResult {
    pub fn has_errors(&self) -> bool {
        self.violations.iter().any(|v| v.severity == ViolationSeverity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ConfigViolation> {
        self.violations.iter().filter(|v| v.severity == ViolationSeverity::Error)
    }
}

/// Config rule trait - produces violations
pub trait ConfigRule {
    fn name(&self) -> &'static str;
    fn validate(&self, config: &LayoutConfig) -> Vec<ConfigViolation>;
}

// --- Concrete Rules ---

pub struct CanvasSizeRule;

impl ConfigRule for CanvasSizeRule {
    fn name(&self) -> &'static str { "canvas_size" }

    fn validate(&self, config: &LayoutConfig) -> Vec<ConfigViolation> {
        if config.image_size == 0 {
            return vec![ConfigViolation::error(
                self.name(),
                "Canvas must not be empty",
                "image_size > 0".to_string(),
                config.image_size.to_string(),
            )];
        }
        vec![]
    }
}

pub struct ThumbnailSlotRule;

impl ConfigRule for ThumbnailSlotRule {
    fn name(&self) -> &'static str { "thumbnail_slot" }

    fn validate(&self, config: &LayoutConfig) -> Vec<ConfigViolation> {
        let mut violations = vec![];

        if config.thumbnail_size == 0 {
            violations.push(ConfigViolation::error(
                self.name(),
                "Thumbnail slot must not be empty",
                "thumbnail_size > 0".to_string(),
                config.thumbnail_size.to_string(),
            ));
        }

        let far_edge = config.thumbnail_pos as u64 + config.thumbnail_size as u64;
        if far_edge > config.image_size as u64 {
            violations.push(ConfigViolation::error(
                self.name(),
                "Thumbnail strip extends past the canvas",
                format!("thumbnail_pos + thumbnail_size <= {}", config.image_size),
                far_edge.to_string(),
            ));
        }

        violations
    }
}

pub struct HeroBoxRule;

impl ConfigRule for HeroBoxRule {
    fn name(&self) -> &'static str { "hero_box" }

    fn validate(&self, config: &LayoutConfig) -> Vec<ConfigViolation> {
        if config.thumbnail_pos <= config.main_spacer {
            return vec![ConfigViolation::error(
                self.name(),
                "No room left for the hero image",
                format!("thumbnail_pos > main_spacer ({})", config.main_spacer),
                config.thumbnail_pos.to_string(),
            )];
        }
        vec![]
    }
}

pub struct DotScaleRule;

impl ConfigRule for DotScaleRule {
    fn name(&self) -> &'static str { "dot_scale" }

    fn validate(&self, config: &LayoutConfig) -> Vec<ConfigViolation> {
        let scale = config.dot_scale;
        if !(scale.is_finite() && scale > 0.0) {
            vec![ConfigViolation::error(
                self.name(),
                "Truncation marker scale must be positive",
                "dot_scale > 0".to_string(),
                scale.to_string(),
            )]
        } else if scale > 1.0 {
            vec![ConfigViolation::warning(
                self.name(),
                "Truncation marker is larger than a thumbnail slot",
                "dot_scale <= 1".to_string(),
                scale.to_string(),
            )]
        } else {
            vec![]
        }
    }
}

pub struct WhiteThresholdRule;

impl ConfigRule for WhiteThresholdRule {
    fn name(&self) -> &'static str { "white_threshold" }

    fn validate(&self, config: &LayoutConfig) -> Vec<ConfigViolation> {
        let t = config.white_threshold;
        if (0.0..=1.0).contains(&t) {
            return vec![];
        }
        vec![ConfigViolation::warning(
            self.name(),
            "Background threshold outside the normalized range",
            "0 <= white_threshold <= 1".to_string(),
            t.to_string(),
        )]
    }
}

/// Validator orchestrates rules
pub struct ConfigValidator {
    rules: Vec<Box<dyn ConfigRule>>,
}

impl ConfigValidator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(CanvasSizeRule),
                Box::new(ThumbnailSlotRule),
                Box::new(HeroBoxRule),
                Box::new(DotScaleRule),
                Box::new(WhiteThresholdRule),
            ],
        }
    }

    pub fn validate(&self, config: &LayoutConfig) -> ValidationResult {
        let violations: Vec<_> = self.rules.iter()
            .flat_map(|rule| rule.validate(config))
            .collect();

        for v in violations.iter().filter(|v| v.severity == ViolationSeverity::Warning) {
            log::warn!("{}: {}", v.rule, v.message);
        }

        let valid = !violations.iter().any(|v| v.severity == ViolationSeverity::Error);
        ValidationResult { valid, violations }
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}
