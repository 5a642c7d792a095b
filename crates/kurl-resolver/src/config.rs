//! Resolver configuration

use serde::{Deserialize, Serialize};

/// Policy for mountpoint-absolute URLs naming an unknown mount id
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExternalMounts {
    /// Return the URL unchanged for the mount table to resolve
    #[default]
    Defer,
    /// Fail with `UnknownMountId`
    Reject,
}

/// Resolver configuration
///
/// ```toml
/// external-mounts = "reject"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ResolverConfig {
    /// Handling of foreign mount ids
    pub external_mounts: ExternalMounts,
}

impl ResolverConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With external mount policy
    #[inline]
    #[must_use]
    pub fn with_external_mounts(mut self, policy: ExternalMounts) -> Self {
        self.external_mounts = policy;
        self
    }

    /// Parse from TOML
    ///
    /// # Errors
    /// Returns [`ConfigError::Toml`] for malformed input or unknown values
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Malformed TOML
    #[error("invalid resolver configuration: {0}")]
    Toml(#[from] toml::de::Error),
}
