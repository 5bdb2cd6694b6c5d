//! Completion criteria and engine configuration
//!
//! Two configuration surfaces:
//! - [`Properties`]: the string property bag handed to `is_complete`,
//!   where only `target-sample-size` is recognized
//! - [`QcConfig`]: typed engine settings, loadable from TOML

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Recognized property naming the number of valid responses to collect
pub const TARGET_SAMPLE_SIZE: &str = "target-sample-size";

/// Default classifier significance threshold
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Ordered string property bag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(BTreeMap<String, String>);

impl Properties {
    /// Empty bag
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `key=value` or `key: value` lines
    ///
    /// Blank lines and lines starting with `#` or `!` are skipped. A line
    /// without a separator is a key with an empty value. Later lines win.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with(['#', '!']))
            .map(|line| match line.find(['=', ':']) {
                Some(at) => (line[..at].trim(), line[at + 1..].trim()),
                None => (line, ""),
            })
            .collect()
    }

    /// With a property
    #[inline]
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a property, returning the previous value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Property value
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Number of properties
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the bag is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// When a survey has collected enough valid responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompletionCriteria {
    target_sample_size: Option<u64>,
}

impl CompletionCriteria {
    /// No target: always complete
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a target sample size
    #[inline]
    #[must_use]
    pub fn with_target(mut self, target: u64) -> Self {
        self.target_sample_size = Some(target);
        self
    }

    /// Read the recognized keys from a property bag; others are ignored
    ///
    /// # Errors
    /// `InvalidValue` when `target-sample-size` is not a non-negative integer
    pub fn from_properties(properties: &Properties) -> Result<Self, ConfigurationError> {
        let target_sample_size = properties
            .get(TARGET_SAMPLE_SIZE)
            .map(|value| {
                value
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| ConfigurationError::InvalidValue {
                        key: TARGET_SAMPLE_SIZE.to_string(),
                        value: value.to_string(),
                        reason: e.to_string(),
                    })
            })
            .transpose()?;
        Ok(Self { target_sample_size })
    }

    /// Target sample size, if any
    #[inline]
    #[must_use]
    pub fn target_sample_size(&self) -> Option<u64> {
        self.target_sample_size
    }

    /// Whether `valid_count` responses meet the target
    #[must_use]
    pub fn is_met(&self, valid_count: usize) -> bool {
        self.target_sample_size
            .map_or(true, |target| valid_count as u64 >= target)
    }
}

/// Engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct QcConfig {
    alpha: f64,
    target_sample_size: Option<u64>,
}

impl Default for QcConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            target_sample_size: None,
        }
    }
}

impl QcConfig {
    /// Default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document; unknown keys are ignored
    ///
    /// # Errors
    /// `Toml` for syntax or type errors, `InvalidAlpha` for an out-of-range threshold
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigurationError> {
        let config: Self = toml::from_str(text)?;
        config.validate()
    }

    /// With a significance threshold
    ///
    /// # Errors
    /// `InvalidAlpha` unless `0 < alpha < 1`
    pub fn with_alpha(mut self, alpha: f64) -> Result<Self, ConfigurationError> {
        self.alpha = alpha;
        self.validate()
    }

    /// With a target sample size
    #[inline]
    #[must_use]
    pub fn with_target_sample_size(mut self, target: u64) -> Self {
        self.target_sample_size = Some(target);
        self
    }

    /// Significance threshold
    #[inline]
    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Target sample size, if any
    #[inline]
    #[must_use]
    pub fn target_sample_size(&self) -> Option<u64> {
        self.target_sample_size
    }

    /// Completion criteria implied by this configuration
    #[must_use]
    pub fn criteria(&self) -> CompletionCriteria {
        CompletionCriteria {
            target_sample_size: self.target_sample_size,
        }
    }

    fn validate(self) -> Result<Self, ConfigurationError> {
        if self.alpha > 0.0 && self.alpha < 1.0 {
            Ok(self)
        } else {
            Err(ConfigurationError::InvalidAlpha { value: self.alpha })
        }
    }
}
