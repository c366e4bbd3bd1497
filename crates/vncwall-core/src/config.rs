// ── Runtime dashboard configuration ──
//
// These types describe how to reach the backend and how to build viewer
// URLs. They never touch disk: the CLI and TUI load a file through
// `vncwall-config` and hand a `DashboardConfig` in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;
use vncwall_api::{TlsMode, TransportConfig};

/// noVNC parameters shared by every tile.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// `compression` query parameter (0-9).
    pub compression: u8,
    /// `scale` used by the embedded tile viewer.
    pub tile_scale: f64,
    /// `quality` used by the embedded tile viewer.
    pub tile_quality: u8,
    /// `scale` used when a desktop is opened on its own.
    pub fullscreen_scale: f64,
    /// `quality` used when a desktop is opened on its own.
    pub fullscreen_quality: u8,
    /// Password embedded in view-only URLs. Empty when unset.
    pub view_only_pass: SecretString,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            compression: 9,
            tile_scale: 0.5,
            tile_quality: 1,
            fullscreen_scale: 0.8,
            fullscreen_quality: 5,
            view_only_pass: SecretString::from(String::new()),
        }
    }
}

/// Configuration for one dashboard session against one backend.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Backend root, e.g. `http://localhost:5000`.
    pub backend_url: Url,
    /// TLS verification for `https://` backends.
    pub tls: TlsMode,
    /// Request timeout.
    pub timeout: Duration,
    /// Background poll interval. Zero disables the poller.
    pub poll_interval: Duration,
    /// Delay between consecutive reachability probes during a full render.
    pub probe_pacing: Duration,
    /// Viewer URL parameters.
    pub viewer: ViewerConfig,
    /// Named list selected when the dashboard starts.
    pub default_list: Option<String>,
}

impl DashboardConfig {
    /// Defaults for everything except the backend URL.
    pub fn new(backend_url: Url) -> Self {
        Self {
            backend_url,
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(5),
            probe_pacing: Duration::from_millis(100),
            viewer: ViewerConfig::default(),
            default_list: None,
        }
    }

    /// Transport settings for the HTTP client.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.clone(),
            timeout: self.timeout,
        }
    }
}
