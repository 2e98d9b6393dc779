//! Application configuration for convarchive.
//!
//! User config lives at `~/.convarchive/convarchive.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConvArchiveError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "convarchive.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".convarchive";

/// Deepest heading level markdown renders.
const MAX_HEADING_DEPTH: usize = 6;

// ---------------------------------------------------------------------------
// Config structs (matching convarchive.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Transcript conversion settings.
    #[serde(default)]
    pub convert: ConvertConfig,

    /// Merge settings.
    #[serde(default)]
    pub merge: MergeConfig,
}

/// `[convert]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Number of content characters folded into the synthesized dedup key
    /// for messages that carry no identifier.
    #[serde(default = "default_dedup_prefix_chars")]
    pub dedup_prefix_chars: usize,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            dedup_prefix_chars: default_dedup_prefix_chars(),
        }
    }
}

fn default_dedup_prefix_chars() -> usize {
    20
}

/// `[merge]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    /// File name of the merged document, written inside the source directory.
    #[serde(default = "default_output_filename")]
    pub output_filename: String,

    /// Shallowest heading level allowed inside a question or answer fragment.
    #[serde(default = "default_heading_depth")]
    pub heading_depth: usize,

    /// Title of the merged document's top-level heading.
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            output_filename: default_output_filename(),
            heading_depth: default_heading_depth(),
            title: default_title(),
        }
    }
}

fn default_output_filename() -> String {
    "README.md".into()
}
fn default_heading_depth() -> usize {
    convarchive_markdown::DEFAULT_TARGET_DEPTH
}
fn default_title() -> String {
    "Conversation Archive".into()
}

impl AppConfig {
    /// Reject values no run could honor.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_HEADING_DEPTH).contains(&self.merge.heading_depth) {
            return Err(ConvArchiveError::config(format!(
                "merge.heading_depth must be between 1 and {MAX_HEADING_DEPTH}, got {}",
                self.merge.heading_depth
            )));
        }
        if self.merge.output_filename.trim().is_empty() {
            return Err(ConvArchiveError::config("merge.output_filename is empty"));
        }
        if self.convert.dedup_prefix_chars == 0 {
            return Err(ConvArchiveError::config(
                "convert.dedup_prefix_chars must be at least 1",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.convarchive/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ConvArchiveError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.convarchive/convarchive.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ConvArchiveError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        ConvArchiveError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ConvArchiveError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ConvArchiveError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ConvArchiveError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
