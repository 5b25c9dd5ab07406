//! Run configuration.
//!
//! Settings come from three layers, each overriding the one before:
//!
//! 1. stock defaults ([`ResizeConfig::default`])
//! 2. an optional `img-resize.toml` (or the file passed with `--config`)
//! 3. command-line flags ([`Overrides`])
//!
//! ## Config File
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! sizes = [1400, 1200, 800, 400]   # Target widths in pixels
//! input_dir = "."                  # Directory to scan for images
//! output_dir = "."                 # Root for generated files
//! recursive = false                # Descend into subdirectories
//! container = false                # One output folder per image
//! template = "{s}w:{f}"            # {s} = width, {f} = base name
//! extensions = ["jpeg", "jpg", "png", "webp"]
//! # threads = 4                    # Omit for one worker per CPU core
//! ```
//!
//! Files are sparse; override just the values you want. Unknown keys are
//! rejected to catch typos early. Sizes are de-duplicated and sorted
//! descending after loading, so their order in the file does not matter.

use crate::imaging::supported_input_extensions;
use crate::naming::DEFAULT_TEMPLATE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// File name looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "img-resize.toml";

/// Widths used when none are configured or the given list is invalid.
pub const DEFAULT_SIZES: &[u32] = &[1400, 1200, 800, 400];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Invalid size list {input:?}: {reason}")]
    InvalidSizes { input: String, reason: String },
}

/// Everything a run needs to know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    /// Target widths, descending and unique once normalized.
    pub sizes: Vec<u32>,
    /// Directory scanned for source images.
    pub input_dir: PathBuf,
    /// Root directory for generated files.
    pub output_dir: PathBuf,
    /// Single source file; overrides `input_dir` and `recursive`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// Descend into subdirectories, mirroring them under `output_dir`.
    pub recursive: bool,
    /// Put each image's derivatives in a folder named after the image.
    pub container: bool,
    /// Output name template (`{s}` = width, `{f}` = base name).
    pub template: String,
    /// Accepted source extensions (case-sensitive).
    pub extensions: Vec<String>,
    /// Worker threads. When absent, one per CPU core; larger values are
    /// clamped down to the core count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            sizes: DEFAULT_SIZES.to_vec(),
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            file: None,
            recursive: false,
            container: false,
            template: DEFAULT_TEMPLATE.to_string(),
            extensions: ["jpeg", "jpg", "png", "webp"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
            threads: None,
        }
    }
}

impl ResizeConfig {
    /// Sort sizes descending and drop duplicates.
    pub fn normalize(&mut self) {
        normalize_sizes(&mut self.sizes);
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sizes.is_empty() {
            return Err(ConfigError::Validation("sizes must not be empty".into()));
        }
        if self.sizes.contains(&0) {
            return Err(ConfigError::Validation("sizes must be non-zero".into()));
        }
        if self.threads == Some(0) {
            return Err(ConfigError::Validation(
                "threads must be at least 1 (omit for auto)".into(),
            ));
        }
        if self.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "extensions must not be empty".into(),
            ));
        }
        let decodable = supported_input_extensions();
        if let Some(ext) = self
            .extensions
            .iter()
            .find(|ext| !decodable.contains(&ext.to_ascii_lowercase().as_str()))
        {
            return Err(ConfigError::Validation(format!(
                "extension {ext:?} has no decoder (supported: {})",
                decodable.join(", ")
            )));
        }
        Ok(())
    }

    /// Apply command-line overrides on top of file/default values.
    ///
    /// Boolean flags can only switch features on. An unparsable size list
    /// falls back to [`DEFAULT_SIZES`] with a warning instead of aborting.
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(sizes) = overrides.sizes {
            self.sizes = match parse_sizes(&sizes) {
                Ok(sizes) => sizes,
                Err(e) => {
                    warn!("{e}; using default sizes {DEFAULT_SIZES:?}");
                    DEFAULT_SIZES.to_vec()
                }
            };
        }
        if let Some(dir) = overrides.input_dir {
            self.input_dir = dir;
        }
        if let Some(dir) = overrides.output_dir {
            self.output_dir = dir;
        }
        if let Some(file) = overrides.file {
            self.file = Some(file);
        }
        self.recursive |= overrides.recursive;
        self.container |= overrides.container;
        if let Some(template) = overrides.template {
            self.template = template;
        }
        if let Some(threads) = overrides.threads {
            self.threads = Some(threads);
        }
        self.normalize();
    }
}

/// Values supplied on the command line. `None`/`false` leaves the config as is.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub sizes: Option<String>,
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub file: Option<PathBuf>,
    pub recursive: bool,
    pub container: bool,
    pub template: Option<String>,
    pub threads: Option<usize>,
}

/// Sort descending and remove duplicates in place.
pub fn normalize_sizes(sizes: &mut Vec<u32>) {
    sizes.sort_unstable_by(|a, b| b.cmp(a));
    sizes.dedup();
}

/// Parse a comma-separated width list such as `"1400,800,400"`.
///
/// Whitespace around entries is ignored. The result is normalized.
pub fn parse_sizes(input: &str) -> Result<Vec<u32>, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidSizes {
        input: input.to_string(),
        reason,
    };

    let mut sizes = input
        .split(',')
        .map(|part| {
            let part = part.trim();
            match part.parse::<u32>() {
                Ok(0) => Err(invalid("width 0 is not allowed".into())),
                Ok(n) => Ok(n),
                Err(e) => Err(invalid(format!("{part:?}: {e}"))),
            }
        })
        .collect::<Result<Vec<u32>, ConfigError>>()?;
    normalize_sizes(&mut sizes);
    Ok(sizes)
}

/// Resolve the effective worker count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ResizeConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.threads.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer that file values are merged on top of.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ResizeConfig::default())?)
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

/// Merge an optional overlay onto the stock defaults, then deserialize,
/// normalize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<ResizeConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let mut config: ResizeConfig = merged.try_into()?;
    config.normalize();
    config.validate()?;
    Ok(config)
}

/// Load configuration.
///
/// An explicit path must exist. Without one, [`DEFAULT_CONFIG_FILE`] in
/// `search_dir` is used when present, stock defaults otherwise.
pub fn load_config(explicit: Option<&Path>, search_dir: &Path) -> Result<ResizeConfig, ConfigError> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => Some(search_dir.join(DEFAULT_CONFIG_FILE)).filter(|p| p.exists()),
    };
    let overlay = match path {
        Some(path) => {
            let content = fs::read_to_string(&path)?;
            Some(toml::from_str::<toml::Value>(&content)?)
        }
        None => None,
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Printed by `--gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# img-resize configuration
# ========================
# Every key is optional. Command-line flags override values set here.

# Target widths in pixels. Each source image is resized to every width
# strictly smaller than its own width; an image narrower than all of them
# is resized to the smallest one. Order and duplicates do not matter.
sizes = [1400, 1200, 800, 400]

# Directory scanned for source images.
input_dir = "."

# Root directory for generated files. Subdirectories are mirrored into it
# when `recursive` is on.
output_dir = "."

# Descend into subdirectories of input_dir.
recursive = false

# Write each image's files into a folder named after the image.
container = false

# Output name template. {s} is replaced by the width, {f} by the source
# name without extension. ".webp" is always appended.
template = "{s}w:{f}"

# Accepted source extensions (case-sensitive).
extensions = ["jpeg", "jpg", "png", "webp"]

# Worker threads. Omit for one per CPU core; larger values are clamped.
# threads = 4
"##
}
