//! Configuration types for sift.
//!
//! [`Config::load`] reads `~/.config/sift/config.toml`, creating it with
//! hardcoded defaults if it does not yet exist. [`Config::defaults`] returns
//! the same defaults without touching the filesystem (useful in tests).

use crate::error::PresetError;
use crate::presets::{Preset, PresetSet};
use crate::registry::FieldRegistry;
use serde::Deserialize;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[fetch]
base_url       = "http://127.0.0.1:8080"
list_path      = "/api/v1/jobs"
page_size      = 50
timeout_ms     = 10000
trust_has_more = false

[search]
suggestion_limit = 8
default_field    = "name"

[[presets]]
id     = "waiting"
label  = "Waiting"
field  = "status"
values = ["PENDING", "WAITING"]

[[presets]]
id     = "running"
label  = "Running"
field  = "status"
values = ["RUNNING"]

[[presets]]
id     = "failed"
label  = "Failed"
field  = "status"
values = ["FAILED", "FAILED_IMAGE_PULL", "FAILED_EVICTED"]
"#;

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level configuration, loaded from `~/.config/sift/config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub presets: Vec<Preset>,
}

/// `[fetch]` section of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_list_path")]
    pub list_path: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Trust the remote "more results" flag instead of inferring it from the
    /// page size. Off by default: the flag is known to stay `false`.
    #[serde(default)]
    pub trust_has_more: bool,
}

fn default_base_url() -> String { "http://127.0.0.1:8080".to_string() }
fn default_list_path() -> String { "/api/v1/jobs".to_string() }
fn default_page_size() -> usize { 50 }
fn default_timeout_ms() -> u64 { 10_000 }

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            list_path: default_list_path(),
            page_size: default_page_size(),
            timeout_ms: default_timeout_ms(),
            trust_has_more: false,
        }
    }
}

/// `[search]` section of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,
    #[serde(default = "default_field")]
    pub default_field: String,
}

fn default_suggestion_limit() -> usize { 8 }
fn default_field() -> String { "name".to_string() }

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            suggestion_limit: default_suggestion_limit(),
            default_field: default_field(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load from `~/.config/sift/config.toml`, layered on top of the built-in
    /// defaults. Creates the file with defaults if it does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let path = config_path();

        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, DEFAULT_CONFIG.trim_start())?;
        }

        Self::load_from(&path)
    }

    /// Load from an explicit file, layered on top of the built-in defaults.
    /// A missing file yields the defaults.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from(path).required(false))
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }

    /// Compile the configured presets against `registry`.
    pub fn validate<E>(&self, registry: &FieldRegistry<E>) -> Result<PresetSet, PresetError> {
        PresetSet::compile(registry, self.presets.iter().cloned())
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("sift")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job_registry;

    #[test]
    fn defaults_load() {
        let cfg = Config::defaults();
        assert_eq!(cfg.fetch.page_size, 50);
        assert!(!cfg.fetch.trust_has_more);
        assert_eq!(cfg.search.default_field, "name");
        assert_eq!(cfg.presets.len(), 3);
        assert_eq!(cfg.presets[0].values, vec!["PENDING", "WAITING"]);
    }

    #[test]
    fn default_presets_fit_the_job_registry() {
        let set = Config::defaults().validate(&job_registry()).unwrap();
        assert!(set.get("failed").is_some());
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[fetch]\npage_size = 25\ntrust_has_more = true\n").unwrap();
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.fetch.page_size, 25);
        assert!(cfg.fetch.trust_has_more);
        assert_eq!(cfg.fetch.list_path, "/api/v1/jobs");
    }

    #[test]
    fn unknown_preset_value_is_caught() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[[presets]]\nid = \"done\"\nfield = \"status\"\nvalues = [\"FINISHED\"]\n",
        )
        .unwrap();
        let cfg = Config::load_from(&path).unwrap();
        assert!(cfg.validate(&job_registry()).is_err());
    }
}
