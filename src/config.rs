// ⚙️ Configuration
// Feed URLs, fetch deadline, session file and server address.
// Defaults point at the published spreadsheet; every field can be
// overridden through ROSTER_* environment variables or a JSON file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const SPREADSHEET_URL: &str =
    "https://docs.google.com/spreadsheets/d/1PBN_HQOi5ZpKDd63mouxttFvvCwtmY97Tb5if5_cdBA/gviz/tq?tqx=out:csv";

pub const ENV_CLIENTS_URL: &str = "ROSTER_CLIENTS_URL";
pub const ENV_ACCOUNTS_URL: &str = "ROSTER_ACCOUNTS_URL";
pub const ENV_AGENCIES_URL: &str = "ROSTER_AGENCIES_URL";
pub const ENV_TIMEOUT_SECS: &str = "ROSTER_TIMEOUT_SECS";
pub const ENV_SESSION_FILE: &str = "ROSTER_SESSION_FILE";
pub const ENV_BIND_ADDR: &str = "ROSTER_BIND_ADDR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub clients_url: String,
    pub accounts_url: String,
    pub agencies_url: String,
    /// Per-fetch deadline; none by default
    pub request_timeout_secs: Option<u64>,
    pub session_file: PathBuf,
    pub bind_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            clients_url: sheet_url("clientes"),
            accounts_url: sheet_url("contas"),
            agencies_url: sheet_url("agencias"),
            request_timeout_secs: None,
            session_file: PathBuf::from(".client-roster-session.json"),
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

fn sheet_url(sheet: &str) -> String {
    format!("{}&sheet={}", SPREADSHEET_URL, sheet)
}

impl AppConfig {
    /// Defaults overridden by whatever ROSTER_* variables are set
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, with an injectable variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();

        if let Some(url) = lookup(ENV_CLIENTS_URL) {
            config.clients_url = url;
        }
        if let Some(url) = lookup(ENV_ACCOUNTS_URL) {
            config.accounts_url = url;
        }
        if let Some(url) = lookup(ENV_AGENCIES_URL) {
            config.agencies_url = url;
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            let secs = secs
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{} must be a whole number of seconds", ENV_TIMEOUT_SECS))?;
            config.request_timeout_secs = Some(secs);
        }
        if let Some(path) = lookup(ENV_SESSION_FILE) {
            config.session_file = PathBuf::from(path);
        }
        if let Some(addr) = lookup(ENV_BIND_ADDR) {
            config.bind_addr = addr;
        }

        Ok(config)
    }

    /// Load from a JSON file; missing keys keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
