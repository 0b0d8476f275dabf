//! Loader configuration.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! the base layer; a user `config.toml` only needs the keys it overrides.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [fetch]
//! timeout_secs = 30          # Per-request HTTP timeout
//!
//! [metadata]
//! prefix_bytes = 131072      # Leading bytes scanned for EXIF/XMP (128 KiB)
//!
//! [stereo]
//! geometry_source = "right"  # Which half of a stereo pair drives geometry
//!
//! [gallery]
//! default_height = 1.5       # Plane height when a gallery entry gives no size
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::DEFAULT_PREFIX_BYTES;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Loader configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// Network settings for the byte fetcher.
    pub fetch: FetchConfig,
    /// Metadata extraction settings.
    pub metadata: MetadataConfig,
    /// Stereo pair policy.
    pub stereo: StereoConfig,
    /// Presentation sequence settings.
    pub gallery: GalleryConfig,
}

impl LoaderConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "fetch.timeout_secs must be greater than 0".into(),
            ));
        }
        if self.metadata.prefix_bytes == 0 {
            return Err(ConfigError::Validation(
                "metadata.prefix_bytes must be greater than 0".into(),
            ));
        }
        let h = self.gallery.default_height;
        if !h.is_finite() || h <= 0.0 {
            return Err(ConfigError::Validation(
                "gallery.default_height must be a positive number".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    /// Per-request timeout for remote fetches, in seconds.
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetadataConfig {
    /// How many leading bytes of each image the metadata reader sees.
    pub prefix_bytes: usize,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            prefix_bytes: DEFAULT_PREFIX_BYTES,
        }
    }
}

/// Which half of a stereo pair supplies the geometry of the merged result.
///
/// Both halves are validated; only the chosen one is returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StereoGeometrySource {
    Left,
    #[default]
    Right,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StereoConfig {
    pub geometry_source: StereoGeometrySource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Plane height, in scene units, for entries that give neither width nor height.
    pub default_height: f64,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            default_height: 1.5,
        }
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(LoaderConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<LoaderConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: LoaderConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<LoaderConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(dir)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# vr-gal configuration
# ====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Fetching
# ---------------------------------------------------------------------------
[fetch]
# Timeout for each http(s) request, in seconds. Local paths ignore it.
timeout_secs = 30

# ---------------------------------------------------------------------------
# Metadata
# ---------------------------------------------------------------------------
[metadata]
# Leading bytes of each image scanned for EXIF and XMP (GPano) blocks.
# Metadata placed after this prefix is not seen.
prefix_bytes = 131072

# ---------------------------------------------------------------------------
# Stereo pairs
# ---------------------------------------------------------------------------
[stereo]
# Which half's tags decide the geometry of a stereo pair: "left" or "right".
# Both halves are still checked.
geometry_source = "right"

# ---------------------------------------------------------------------------
# Gallery
# ---------------------------------------------------------------------------
[gallery]
# Plane height (scene units) for entries that give neither width nor height.
default_height = 1.5
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = LoaderConfig::default();
        assert_eq!(config.fetch.timeout_secs, 30);
        assert_eq!(config.metadata.prefix_bytes, 128 * 1024);
        assert_eq!(config.stereo.geometry_source, StereoGeometrySource::Right);
        assert_eq!(config.gallery.default_height, 1.5);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[stereo]
geometry_source = "left"
"#;
        let config: LoaderConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.stereo.geometry_source, StereoGeometrySource::Left);
        // Everything else keeps its default
        assert_eq!(config.fetch.timeout_secs, 30);
        assert_eq!(config.gallery.default_height, 1.5);
    }

    #[test]
    fn unknown_keys_rejected() {
        let toml = r#"
[fetch]
timeout = 10
"#;
        let result: Result<LoaderConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_geometry_source_rejected() {
        let toml = r#"
[stereo]
geometry_source = "both"
"#;
        let result: Result<LoaderConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = LoaderConfig::default();
        config.fetch.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_prefix() {
        let mut config = LoaderConfig::default();
        config.metadata.prefix_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_positive_default_height() {
        let mut config = LoaderConfig::default();
        config.gallery.default_height = 0.0;
        assert!(config.validate().is_err());
        config.gallery.default_height = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn merge_toml_overrides_nested_keys_only() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value = toml::from_str("[fetch]\ntimeout_secs = 5").unwrap();
        let merged = merge_toml(base, overlay);
        let config: LoaderConfig = merged.try_into().unwrap();
        assert_eq!(config.fetch.timeout_secs, 5);
        assert_eq!(config.metadata.prefix_bytes, DEFAULT_PREFIX_BYTES);
    }

    #[test]
    fn load_config_without_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config, LoaderConfig::default());
    }

    #[test]
    fn load_config_reads_overrides() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            "[gallery]\ndefault_height = 2.0\n",
        )
        .unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.gallery.default_height, 2.0);
    }

    #[test]
    fn load_config_validates() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "[metadata]\nprefix_bytes = 0\n").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn stock_config_toml_parses_to_defaults() {
        let config: LoaderConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, LoaderConfig::default());
    }
}
