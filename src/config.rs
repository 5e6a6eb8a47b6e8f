//! Configuration management for donothing.
//!
//! Handles loading configuration from TOML files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::interaction::{ConsoleSink, StdinLines};
use crate::render::MarkdownRenderer;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Console prompt texts
    pub prompts: PromptConfig,

    /// Rendered output settings
    pub output: OutputConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Extra directories searched for procedure files (`~` is expanded)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub procedure_dirs: Vec<String>,

    /// Shell used for `run` commands (defaults to `sh`, or `cmd` on Windows)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
}

/// Prompt texts shown while waiting on the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Shown before the first step
    pub begin: String,

    /// Shown after each manual step
    pub step_completion: String,
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Printed once every step has run
    pub completion_message: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            begin: "[Enter] to begin".to_string(),
            step_completion: "[Enter] to continue".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { completion_message: "done!".to_string() }
    }
}

impl GeneralConfig {
    /// Procedure directories with `~` and environment variables expanded.
    pub fn expanded_procedure_dirs(&self) -> Vec<PathBuf> {
        self.procedure_dirs
            .iter()
            .map(|dir| match shellexpand::full(dir) {
                Ok(expanded) => PathBuf::from(expanded.into_owned()),
                Err(e) => {
                    tracing::warn!(dir = dir, error = %e, "Could not expand procedure directory");
                    PathBuf::from(shellexpand::tilde(dir).into_owned())
                }
            })
            .collect()
    }
}

impl Config {
    /// Load configuration.
    ///
    /// Looks for config in:
    /// 1. `.donothing.toml` in current directory
    /// 2. `~/.config/donothing/config.toml`
    /// 3. Falls back to defaults
    pub fn load() -> anyhow::Result<Self> {
        let local_config = PathBuf::from(".donothing.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(config_dir) = Self::config_dir() {
            let global_config = config_dir.join("config.toml");
            if global_config.exists() {
                return Self::load_from_file(&global_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        tracing::debug!(path = ?path, "Loaded configuration");
        Ok(config)
    }

    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("donothing"))
    }

    /// Build a renderer from the output settings.
    pub fn renderer(&self) -> MarkdownRenderer {
        MarkdownRenderer::new().with_completion_message(&self.output.completion_message)
    }

    /// Build a console sink on stdin/stdout from the prompt settings.
    pub fn console_sink(&self) -> ConsoleSink<StdinLines, std::io::Stdout> {
        ConsoleSink::stdio().with_prompts(&self.prompts.begin, &self.prompts.step_completion)
    }
}
