//! Configuration file support for cmakegen.
//!
//! Two configuration file locations are read:
//! - Global: `~/.cmakegen/config.toml` - User-wide defaults
//! - Project: `cmakegen.toml` in the solution root - Project-specific overrides
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::Pattern;
use serde::{Deserialize, Serialize};

/// Name of the project-level configuration file.
pub const PROJECT_CONFIG_NAME: &str = "cmakegen.toml";

/// Default name of the third-party directory.
pub const DEFAULT_THIRD_PARTY_DIR: &str = "3rdparty";

/// cmakegen configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Script generation settings
    pub generate: GenerateConfig,

    /// Library probe settings
    pub probe: ProbeConfig,
}

/// Script generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// Value passed to `cmake_minimum_required(VERSION ...)`
    pub cmake_minimum_version: String,

    /// C++ standard for every generated project
    pub cxx_standard: u32,

    /// File name patterns collected from each project's source directories
    pub source_patterns: Vec<String>,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        GenerateConfig {
            cmake_minimum_version: "3.10".to_string(),
            cxx_standard: 17,
            source_patterns: ["*.cpp", "*.c", "*.cc", "*.h", "*.hpp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl GenerateConfig {
    /// Compile `source_patterns` into glob patterns.
    pub fn compiled_source_patterns(&self) -> Result<Vec<Pattern>> {
        self.source_patterns
            .iter()
            .map(|p| Pattern::new(p).with_context(|| format!("invalid source pattern: {}", p)))
            .collect()
    }
}

/// Library probe settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Name of the third-party directory looked up in each project and in
    /// the solution root
    pub third_party_dir: String,

    /// Maximum subdirectory depth searched for `*Config.cmake` files
    /// (None = unlimited)
    pub config_search_depth: Option<usize>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig {
            third_party_dir: DEFAULT_THIRD_PARTY_DIR.to_string(),
            config_search_depth: None,
        }
    }
}

/// Partial configuration as written in a file. Only the keys that are
/// present override the layer below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    generate: GenerateOverrides,
    probe: ProbeOverrides,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct GenerateOverrides {
    cmake_minimum_version: Option<String>,
    cxx_standard: Option<u32>,
    source_patterns: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ProbeOverrides {
    third_party_dir: Option<String>,
    config_search_depth: Option<usize>,
}

impl Config {
    /// Apply the keys set in `path` on top of this configuration.
    fn merge_file(&mut self, path: &Path) -> Result<()> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        let file: ConfigFile = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;

        self.merge(file);
        Ok(())
    }

    fn merge(&mut self, other: ConfigFile) {
        if let Some(version) = other.generate.cmake_minimum_version {
            self.generate.cmake_minimum_version = version;
        }
        if let Some(std) = other.generate.cxx_standard {
            self.generate.cxx_standard = std;
        }
        if let Some(patterns) = other.generate.source_patterns {
            self.generate.source_patterns = patterns;
        }
        if let Some(dir) = other.probe.third_party_dir {
            self.probe.third_party_dir = dir;
        }
        if other.probe.config_search_depth.is_some() {
            self.probe.config_search_depth = other.probe.config_search_depth;
        }
    }

    /// Merge a config file if it exists, logging and skipping it when it
    /// cannot be read or parsed.
    fn merge_if_exists(&mut self, path: &Path) {
        if !path.exists() {
            return;
        }
        if let Err(e) = self.merge_file(path) {
            tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (`cmakegen.toml`)
/// 2. Global config (`~/.cmakegen/config.toml`)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global) = global_path {
        config.merge_if_exists(global);
    }
    config.merge_if_exists(project_path);

    config
}

/// Get the global cmakegen config directory (`~/.cmakegen`).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".cmakegen"))
}

/// Get the global config path (`~/.cmakegen/config.toml`).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (`<root>/cmakegen.toml`).
pub fn project_config_path(solution_root: &Path) -> PathBuf {
    solution_root.join(PROJECT_CONFIG_NAME)
}
