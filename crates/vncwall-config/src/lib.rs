//! Shared configuration for the vncwall CLI and TUI.
//!
//! One flat TOML file plus environment overrides, translated into
//! `vncwall_core::DashboardConfig`. Layering, lowest to highest:
//!
//! 1. built-in defaults
//! 2. `config.toml` in the platform config directory
//! 3. the deployment variables `VNC_COMPRESSION`, `VNC_TILE_SCALE`,
//!    `VNC_TILE_QUALITY`, `VNC_FULLSCREEN_SCALE`, `VNC_FULLSCREEN_QUALITY`
//!    and `VIEW_ONLY_PASS`
//! 4. `VNCWALL_*` variables (e.g. `VNCWALL_BACKEND_URL`)

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use vncwall_core::{DashboardConfig, TlsMode, ViewerConfig};

/// Deployment variables read without a prefix.
const RAW_ENV_KEYS: &[&str] = &[
    "VNC_COMPRESSION",
    "VNC_TILE_SCALE",
    "VNC_TILE_QUALITY",
    "VNC_FULLSCREEN_SCALE",
    "VNC_FULLSCREEN_QUALITY",
];

/// Password variables, lowest precedence first. Read as plain text so
/// `007123` keeps its leading zeros.
const PASSWORD_ENV_KEYS: &[&str] = &["VIEW_ONLY_PASS", "VNCWALL_VIEW_ONLY_PASS"];

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Config struct ───────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Dashboard backend root URL.
    pub backend_url: String,

    /// Request timeout in seconds.
    pub timeout: u64,

    /// Background poll interval in seconds. 0 disables polling.
    pub poll_interval_secs: u64,

    /// Delay between reachability probes in milliseconds.
    pub probe_pacing_ms: u64,

    /// Accept invalid TLS certificates.
    pub insecure: bool,

    /// Extra CA certificate (PEM) for an `https://` backend.
    pub ca_cert: Option<PathBuf>,

    /// Default CLI output format.
    pub output: String,

    /// Named list selected at startup.
    pub default_list: Option<String>,

    pub vnc_compression: u8,
    pub vnc_tile_scale: f64,
    pub vnc_tile_quality: u8,
    pub vnc_fullscreen_scale: f64,
    pub vnc_fullscreen_quality: u8,

    /// Password embedded in view-only viewer URLs.
    #[serde(deserialize_with = "lenient_string", skip_serializing)]
    pub view_only_pass: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let viewer = ViewerConfig::default();
        Self {
            backend_url: "http://localhost:5000".into(),
            timeout: 30,
            poll_interval_secs: 5,
            probe_pacing_ms: 100,
            insecure: false,
            ca_cert: None,
            output: "table".into(),
            default_list: None,
            vnc_compression: viewer.compression,
            vnc_tile_scale: viewer.tile_scale,
            vnc_tile_quality: viewer.tile_quality,
            vnc_fullscreen_scale: viewer.fullscreen_scale,
            vnc_fullscreen_quality: viewer.fullscreen_quality,
            view_only_pass: None,
        }
    }
}

/// TOML allows `view_only_pass = 1234`. Accept any scalar and keep its text.
fn lenient_string<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Str(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(Option::<Scalar>::deserialize(de)?.map(|s| match s {
        Scalar::Str(s) => s,
        Scalar::Int(i) => i.to_string(),
        Scalar::Float(f) => f.to_string(),
        Scalar::Bool(b) => b.to_string(),
    }))
}

impl Config {
    /// Translate into the core's runtime configuration.
    pub fn to_dashboard_config(&self) -> Result<DashboardConfig, ConfigError> {
        let backend_url =
            url::Url::parse(&self.backend_url).map_err(|e| ConfigError::Validation {
                field: "backend_url".into(),
                reason: format!("{e}: {}", self.backend_url),
            })?;
        if self.vnc_compression > 9 {
            return Err(ConfigError::Validation {
                field: "vnc_compression".into(),
                reason: format!("expected 0-9, got {}", self.vnc_compression),
            });
        }

        let tls = if self.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca) = self.ca_cert {
            TlsMode::CustomCa(ca.clone())
        } else {
            TlsMode::System
        };

        Ok(DashboardConfig {
            backend_url,
            tls,
            timeout: Duration::from_secs(self.timeout),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            probe_pacing: Duration::from_millis(self.probe_pacing_ms),
            viewer: ViewerConfig {
                compression: self.vnc_compression,
                tile_scale: self.vnc_tile_scale,
                tile_quality: self.vnc_tile_quality,
                fullscreen_scale: self.vnc_fullscreen_scale,
                fullscreen_quality: self.vnc_fullscreen_quality,
                view_only_pass: SecretString::from(self.view_only_pass.clone().unwrap_or_default()),
            },
            default_list: self.default_list.clone(),
        })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "vncwall", "vncwall").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("vncwall");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Defaults and the TOML file at `path`, without environment overrides.
pub fn file_figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
}

/// Full layering for the file at `path`.
pub fn figment_for(path: &Path) -> Figment {
    let mut figment = file_figment(path).merge(Env::raw().only(RAW_ENV_KEYS));
    for key in PASSWORD_ENV_KEYS {
        if let Ok(pass) = std::env::var(key) {
            figment = figment.merge(Serialized::default("view_only_pass", pass));
        }
    }
    figment.merge(Env::prefixed("VNCWALL_").ignore(&["view_only_pass"]))
}

/// Load from the canonical config path plus environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file path plus environment. A missing file is
/// not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    Ok(figment_for(path).extract()?)
}
