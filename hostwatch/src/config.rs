//! Viewer settings: CLI flags layered over a JSON file.
//! The file lives at $XDG_CONFIG_HOME/hostwatch/config.json (fallback ~/.config/hostwatch/config.json).

use std::{fs, path::PathBuf, time::Duration};

use clap::Parser;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::tracking::DEFAULT_TRACKING_DURATION;

pub const DEFAULT_URL: &str = "ws://127.0.0.1:3000/ws";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid agent url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("agent url must use ws://, got {0}://")]
    UnsupportedScheme(String),
    #[error("tracking duration must be at least one second")]
    ZeroDuration,
    #[error("reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("writing config: {0}")]
    Write(#[from] std::io::Error),
    #[error("encoding config: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Parser)]
#[command(name = "hostwatch", version, about = "Live host metrics viewer with timed capture reports")]
pub struct Cli {
    /// Agent WebSocket URL (ws://HOST:PORT/ws)
    pub url: Option<String>,

    /// Directory tracking reports are written to
    #[arg(short = 'r', long, env = "HOSTWATCH_REPORT_DIR")]
    pub report_dir: Option<PathBuf>,

    /// Length of a tracking capture in seconds
    #[arg(short = 'd', long, value_parser = clap::value_parser!(u64).range(1..))]
    pub tracking_secs: Option<u64>,

    /// Store the effective settings in the config file
    #[arg(long)]
    pub save: bool,

    /// Print the effective settings and exit without connecting
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub url: Url,
    pub report_dir: PathBuf,
    pub tracking_duration: Duration,
}

impl ViewerConfig {
    /// CLI values win over the file; the file wins over built-in defaults.
    pub fn resolve(cli: &Cli, file: &ConfigFile) -> Result<Self, ConfigError> {
        let raw = cli
            .url
            .as_deref()
            .or(file.url.as_deref())
            .unwrap_or(DEFAULT_URL);
        let url = parse_agent_url(raw)?;

        let report_dir = cli
            .report_dir
            .clone()
            .or_else(|| file.report_dir.clone())
            .unwrap_or_else(default_report_dir);

        let tracking_duration = match cli.tracking_secs.or(file.tracking_secs) {
            Some(0) => return Err(ConfigError::ZeroDuration),
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_TRACKING_DURATION,
        };

        Ok(Self {
            url,
            report_dir,
            tracking_duration,
        })
    }

    pub fn to_file(&self) -> ConfigFile {
        ConfigFile {
            url: Some(self.url.to_string()),
            report_dir: Some(self.report_dir.clone()),
            tracking_secs: Some(self.tracking_duration.as_secs()),
        }
    }
}

pub fn parse_agent_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl {
        url: raw.to_string(),
        source,
    })?;
    match url.scheme() {
        "ws" => Ok(url),
        other => Err(ConfigError::UnsupportedScheme(other.to_string())),
    }
}

pub fn config_dir() -> PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        PathBuf::from(xdg).join("hostwatch")
    } else {
        dirs_next::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hostwatch")
    }
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Logs and default report directory live here.
pub fn data_dir() -> PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME") {
        PathBuf::from(xdg).join("hostwatch")
    } else {
        dirs_next::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hostwatch")
    }
}

pub fn default_report_dir() -> PathBuf {
    data_dir().join("reports")
}

/// A missing file is an empty config; an unreadable or malformed one is an error.
pub fn load_config() -> Result<ConfigFile, ConfigError> {
    let path = config_path();
    match fs::read_to_string(&path) {
        Ok(s) => serde_json::from_str(&s).map_err(|source| ConfigError::Parse { path, source }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(source) => Err(ConfigError::Read { path, source }),
    }
}

pub fn save_config(c: &ConfigFile) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_vec_pretty(c)?;
    fs::write(&path, data)?;
    Ok(path)
}
