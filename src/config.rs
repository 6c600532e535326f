//! Store configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives in
//! the store root next to the zine directories:
//!
//! ```text
//! zines/
//! ├── config.toml          # optional, overrides stock defaults
//! ├── 3f2c9a…/
//! │   └── zine.json
//! └── …
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [layout]
//! filter = "lanczos3"       # Resampling filter for the cover-fit
//! compression = "default"   # PNG compression: fast | default | best
//! filename = "print.png"    # Print sheet file name inside each zine dir
//!
//! [generation]
//! prompt_max_chars = 500    # Cap on page-image prompt length
//! poll_max_attempts = 60    # Status checks before a job times out
//! poll_interval_ms = 2000   # Pause between status checks
//! placeholder_fallback = true
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [layout]
//! compression = "best"
//! ```
//!
//! Unknown keys are rejected to catch typos early. The print geometry
//! (3300×2550, 4×2 panels) is fixed and deliberately not configurable.

use crate::imaging::{Compression, Resample};
use crate::jobs::PollPolicy;
use crate::layout::LayoutOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Name of the config file inside the store root.
pub const CONFIG_FILENAME: &str = "config.toml";

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
}

/// Store configuration loaded from `config.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ZineConfig {
    /// Print sheet rendering settings.
    pub layout: LayoutConfig,
    /// Prompt and provider-job settings.
    pub generation: GenerationConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl ZineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generation.prompt_max_chars == 0 {
            return Err(ConfigError::Validation(
                "generation.prompt_max_chars must be positive".into(),
            ));
        }
        if self.generation.poll_max_attempts == 0 {
            return Err(ConfigError::Validation(
                "generation.poll_max_attempts must be positive".into(),
            ));
        }
        let name = self.layout.filename.as_str();
        if name.is_empty() || name.contains(['/', '\\']) || name == "zine.json" {
            return Err(ConfigError::Validation(
                "layout.filename must be a plain file name other than zine.json".into(),
            ));
        }
        if is_page_filename(name) {
            return Err(ConfigError::Validation(format!(
                "layout.filename {name:?} would overwrite a page image"
            )));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn is_page_filename(name: &str) -> bool {
    crate::types::PageNumber::all().any(|p| name == crate::store::page_filename(p))
}

/// Print sheet rendering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Resampling filter used when cover-fitting pages into panels.
    pub filter: Resample,
    /// PNG compression level for the print sheet.
    pub compression: Compression,
    /// File name of the print sheet inside each zine directory.
    pub filename: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            filter: Resample::Lanczos3,
            compression: Compression::Default,
            filename: "print.png".to_string(),
        }
    }
}

impl LayoutConfig {
    pub fn options(&self) -> LayoutOptions {
        LayoutOptions {
            filter: self.filter,
            compression: self.compression,
        }
    }
}

/// Prompt and provider-job settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    /// Page-image prompts are cut to this many characters.
    pub prompt_max_chars: usize,
    /// Status checks before a queued job is abandoned.
    pub poll_max_attempts: u32,
    /// Milliseconds between status checks.
    pub poll_interval_ms: u64,
    /// Store a styled placeholder when every image provider fails.
    pub placeholder_fallback: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            prompt_max_chars: crate::prompts::DEFAULT_PROMPT_MAX_CHARS,
            poll_max_attempts: 60,
            poll_interval_ms: 2000,
            placeholder_fallback: true,
        }
    }
}

impl GenerationConfig {
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            max_attempts: self.poll_max_attempts,
            interval: Duration::from_millis(self.poll_interval_ms),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel panel workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ZineConfig::default())?)
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

/// Read `config.toml` from `root`, if present, without applying defaults.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto `base`, deserialize, and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ZineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ZineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective config for a store root.
pub fn load_config(root: &Path) -> Result<ZineConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Documented stock `config.toml`, printed by `gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# mycozine Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# This file lives in the store root (next to the zine directories).
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Print layout
# ---------------------------------------------------------------------------
[layout]
# Resampling filter used to cover-fit each page into its 825x1275 panel.
# One of: nearest, triangle, catmull-rom, gaussian, lanczos3.
filter = "lanczos3"

# PNG compression for the print sheet: fast, default, best.
compression = "default"

# File name of the print sheet inside each zine directory.
filename = "print.png"

# ---------------------------------------------------------------------------
# Generation
# ---------------------------------------------------------------------------
[generation]
# Page-image prompts are cut to this many characters.
prompt_max_chars = 500

# Queue-based providers: status checks before giving up, and the pause
# between them in milliseconds (60 x 2000 ms = two minutes).
poll_max_attempts = 60
poll_interval_ms = 2000

# Store a styled placeholder page when every image provider fails.
placeholder_fallback = true

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel panel workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = ZineConfig::default();
        assert_eq!(config.layout.filter, Resample::Lanczos3);
        assert_eq!(config.layout.compression, Compression::Default);
        assert_eq!(config.layout.filename, "print.png");
        assert_eq!(config.generation.prompt_max_chars, 500);
        assert_eq!(config.generation.poll_max_attempts, 60);
        assert_eq!(config.generation.poll_interval_ms, 2000);
        assert!(config.generation.placeholder_fallback);
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[layout]
compression = "best"
"#;
        let config: ZineConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.layout.compression, Compression::Best);
        // Defaults preserved
        assert_eq!(config.layout.filter, Resample::Lanczos3);
        assert_eq!(config.generation.poll_max_attempts, 60);
    }

    #[test]
    fn parse_kebab_case_filter() {
        let config: ZineConfig = toml::from_str("[layout]\nfilter = \"catmull-rom\"").unwrap();
        assert_eq!(config.layout.filter, Resample::CatmullRom);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: Result<ZineConfig, _> = toml::from_str("[layout]\ndpi = 600");
        assert!(result.is_err());
        let result: Result<ZineConfig, _> = toml::from_str("[colors]\nbackground = \"#fff\"");
        assert!(result.is_err());
    }

    #[test]
    fn layout_options_follow_config() {
        let layout = LayoutConfig {
            filter: Resample::Nearest,
            compression: Compression::Fast,
            ..LayoutConfig::default()
        };
        let options = layout.options();
        assert_eq!(options.filter, Resample::Nearest);
        assert_eq!(options.compression, Compression::Fast);
    }

    #[test]
    fn poll_policy_follows_config() {
        let generation = GenerationConfig {
            poll_max_attempts: 5,
            poll_interval_ms: 250,
            ..GenerationConfig::default()
        };
        let policy = generation.poll_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.interval, Duration::from_millis(250));
        assert_eq!(GenerationConfig::default().poll_policy(), PollPolicy::default());
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn validate_accepts_defaults() {
        assert!(ZineConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_limits() {
        let mut config = ZineConfig::default();
        config.generation.prompt_max_chars = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = ZineConfig::default();
        config.generation.poll_max_attempts = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = ZineConfig::default();
        config.processing.max_processes = Some(0);
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_clobbering_filenames() {
        for bad in ["", "zine.json", "p3.png", "../print.png", "out/print.png"] {
            let mut config = ZineConfig::default();
            config.layout.filename = bad.to_string();
            assert!(
                matches!(config.validate(), Err(ConfigError::Validation(_))),
                "{bad:?}"
            );
        }
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config, ZineConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r#"
[layout]
filename = "sheet.png"

[processing]
max_processes = 2
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.layout.filename, "sheet.png");
        assert_eq!(config.processing.max_processes, Some(2));
        // Unspecified values should be defaults
        assert_eq!(config.layout.filter, Resample::Lanczos3);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "this is not valid toml [[[").unwrap();
        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_invalid_value_is_validation_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            "[generation]\nprompt_max_chars = 0\n",
        )
        .unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_overlay_wins_per_key() {
        let base: toml::Value = toml::from_str(
            r#"
[layout]
filter = "lanczos3"
compression = "default"
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[layout]
compression = "fast"
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let layout = merged.get("layout").unwrap();
        assert_eq!(layout.get("filter").unwrap().as_str(), Some("lanczos3"));
        assert_eq!(layout.get("compression").unwrap().as_str(), Some("fast"));
    }

    #[test]
    fn merge_toml_adds_new_sections() {
        let base: toml::Value = toml::from_str("[layout]\nfilter = \"nearest\"").unwrap();
        let overlay: toml::Value = toml::from_str("[processing]\nmax_processes = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert!(merged.get("layout").is_some());
        assert_eq!(
            merged
                .get("processing")
                .unwrap()
                .get("max_processes")
                .unwrap()
                .as_integer(),
            Some(3)
        );
    }

    #[test]
    fn resolve_config_with_overlay() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value = toml::from_str("[generation]\npoll_interval_ms = 500").unwrap();
        let config = resolve_config(base, Some(overlay)).unwrap();
        assert_eq!(config.generation.poll_interval_ms, 500);
        assert_eq!(config.generation.poll_max_attempts, 60);
    }

    // =========================================================================
    // stock config tests
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: ZineConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, ZineConfig::default());
    }

    #[test]
    fn stock_config_toml_contains_all_sections() {
        let content = stock_config_toml();
        assert!(content.contains("[layout]"));
        assert!(content.contains("[generation]"));
        assert!(content.contains("[processing]"));
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value().unwrap();
        assert!(val.is_table());
        assert!(val.get("layout").is_some());
        assert!(val.get("generation").is_some());
        assert!(val.get("processing").is_some());
    }

    #[test]
    fn effective_threads_clamps_to_cores() {
        let cores = effective_threads(&ProcessingConfig::default());
        assert!(cores >= 1);
        let one = effective_threads(&ProcessingConfig {
            max_processes: Some(1),
        });
        assert_eq!(one, 1);
        let many = effective_threads(&ProcessingConfig {
            max_processes: Some(100_000),
        });
        assert_eq!(many, cores);
    }
}
