//! Host configuration: where grammar libraries live and which ones to load.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Grammar loading configuration.
///
/// Missing fields fall back to [`HostConfig::default`], so `{}` is a valid file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Directories searched, in order, for grammar libraries.
    pub grammar_dirs: Vec<PathBuf>,
    /// Grammar names to load at startup.
    pub grammars: Vec<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            grammar_dirs: default_grammar_dirs(),
            grammars: vec![tree_sitter_sindarin::NAME.to_string()],
        }
    }
}

impl HostConfig {
    /// Read a JSON configuration file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        tracing::debug!(
            "Loaded host config from {}: {} dirs, {} grammars",
            path.display(),
            config.grammar_dirs.len(),
            config.grammars.len()
        );
        Ok(config)
    }

    /// Read `path` if it exists, otherwise use the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Default grammar directories.
/// Order: user data dir, user config dir, next to the executable.
pub fn default_grammar_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    // ~/.local/share/sindarin/grammars
    if let Some(data_dir) = dirs::data_local_dir() {
        dirs.push(data_dir.join("sindarin").join("grammars"));
    }

    // ~/.config/sindarin/grammars
    if let Some(config_dir) = dirs::config_dir() {
        dirs.push(config_dir.join("sindarin").join("grammars"));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.join("grammars"));
        }
    }

    dirs
}
