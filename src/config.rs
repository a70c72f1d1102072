//! Configuration for pager sessions.
//!
//! This module provides:
//! - The environment variable names consulted when a session begins
//! - The ordered list of fallback pagers
//! - Environment variables injected into the pager process
//! - TOML configuration file loading from `~/.ttypager/config.toml`
//!
//! # Configuration File
//!
//! ```toml
//! # Variable holding an explicit pager command
//! pager_var = "PAGER"
//!
//! # Tried in order when the pager variable is unset
//! fallbacks = ["pager", "less", "more"]
//!
//! # Extra pager environment. LESS and LESSCHARSET are always set to
//! # the fixed values below and cannot be overridden here.
//! [env]
//! LESSKEY = "/home/me/.lesskey"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default variable holding an explicit pager command
pub const PAGER_VAR: &str = "PAGER";

/// Default variable holding the terminal type
pub const TERM_VAR: &str = "TERM";

/// Terminal type that cannot drive an interactive pager
pub const DUMB_TERM: &str = "dumb";

/// Environment every pager is started with.
///
/// less reads `LESS` as default options: `F` quits when the input fits on
/// one screen, `R` passes raw color escapes through, `S` chops long lines
/// and `M` selects the long prompt. Other pagers ignore these.
pub const PAGER_ENV: [(&str, &str); 2] = [("LESS", "FRSM"), ("LESSCHARSET", "utf-8")];

/// Main configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Environment variable holding an explicit pager command
    pub pager_var: String,
    /// Environment variable holding the terminal type
    pub term_var: String,
    /// Pager names tried after the pager variable, in order
    pub fallbacks: Vec<String>,
    /// Extra environment for the pager process, applied under `PAGER_ENV`
    pub env: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pager_var: PAGER_VAR.to_string(),
            term_var: TERM_VAR.to_string(),
            // "pager" is the Debian alternatives name
            fallbacks: vec!["pager".to_string(), "less".to_string(), "more".to_string()],
            env: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Environment added to the pager's inherited one: the configured
    /// extras, then the fixed `PAGER_ENV` entries on top
    pub fn pager_env(&self) -> BTreeMap<String, String> {
        let mut env = self.env.clone();
        for (key, value) in PAGER_ENV {
            env.insert(key.to_string(), value.to_string());
        }
        env
    }

    /// Load configuration from `~/.ttypager/config.toml`, or defaults
    pub fn load() -> Self {
        match Self::get_config_path() {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|e| {
                debug!("Ignoring config {}: {}", path.display(), e);
                Self::default()
            }),
            _ => Self::default(),
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Get config file path
    fn get_config_path() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".ttypager").join("config.toml"))
    }
}

/// Directory holding the config file and the binary's log
pub fn data_dir() -> Option<PathBuf> {
    home_dir().map(|home| home.join(".ttypager"))
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}
