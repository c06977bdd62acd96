use std::path::{Path, PathBuf};

use ledgerline_import::{DedupeOptions, DEFAULT_SIMILARITY_THRESHOLD};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
    pub database_path: PathBuf,
    /// Default duplicate-matching behavior when a request does not say.
    pub fuzzy_match: bool,
    pub similarity_threshold: f32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "127.0.0.1:8380".to_string(),
            database_path: PathBuf::from("ledgerline.db"),
            fuzzy_match: false,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl ServerConfig {
    /// Load from a TOML file; a missing file means defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(ServerConfig::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    pub fn dedupe_defaults(&self) -> DedupeOptions {
        DedupeOptions {
            fuzzy_match: self.fuzzy_match,
            similarity_threshold: self.similarity_threshold,
        }
    }
}
