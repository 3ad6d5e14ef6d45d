use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;

use crate::resolver::DEFAULT_OEMBED_ENDPOINT;

pub const DEFAULT_USER_AGENT: &str = concat!("mediavisit/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// sqlx URL of the ledger; `None` uses a SQLite file in the data directory.
    pub database_url: Option<String>,
    pub oembed_endpoint: String,
    pub user_agent: String,
    pub event_buffer: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            oembed_endpoint: DEFAULT_OEMBED_ENDPOINT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            event_buffer: 64,
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location when `None`. A missing file yields defaults.
    /// `MEDIAVISIT_*` environment variables are applied on top.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path(),
        };
        let mut cfg = match path {
            Some(p) if p.exists() => Self::from_file(&p)?,
            _ => Self::default(),
        };
        cfg.apply_env(|k| std::env::var(k).ok());
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("reading config: {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config: {}", path.display()))
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("MEDIAVISIT_DATABASE_URL").filter(|v| !v.trim().is_empty()) { self.database_url = Some(v); }
        if let Some(v) = var("MEDIAVISIT_OEMBED_ENDPOINT").filter(|v| !v.trim().is_empty()) { self.oembed_endpoint = v; }
        if let Some(v) = var("MEDIAVISIT_USER_AGENT").filter(|v| !v.trim().is_empty()) { self.user_agent = v; }
        if let Some(v) = var("MEDIAVISIT_EVENT_BUFFER").and_then(|s| s.parse().ok()) { self.event_buffer = v; }
    }
}

pub(crate) fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "mediavisit", "mediavisit")
}

fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|p| p.config_dir().join("config.toml"))
}
