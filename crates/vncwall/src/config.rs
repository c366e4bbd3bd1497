//! Resolve the runtime configuration for one CLI invocation.
//!
//! The layered file/env config comes from `vncwall-config`; command-line
//! flags are applied on top here. The CLI never runs the background
//! poller, so the poll interval is always forced to zero.

use std::path::PathBuf;
use std::time::Duration;

use vncwall_config::Config;
use vncwall_core::DashboardConfig;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

/// Config file in effect: `--config` or the platform default.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(vncwall_config::config_path)
}

/// Load the file/env layers and apply flag overrides.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = vncwall_config::load_config_from(&config_path(global))?;

    if let Some(ref backend) = global.backend {
        cfg.backend_url.clone_from(backend);
    }
    if global.insecure {
        cfg.insecure = true;
    }
    if let Some(timeout) = global.timeout {
        cfg.timeout = timeout;
    }
    Ok(cfg)
}

/// Build the core configuration for a one-shot command.
pub fn dashboard_config(cfg: &Config) -> Result<DashboardConfig, CliError> {
    let mut dash = cfg.to_dashboard_config()?;
    dash.poll_interval = Duration::ZERO;
    Ok(dash)
}

/// `--output` wins; otherwise the config's `output` key, falling back to table.
pub fn output_format(global: &GlobalOpts, cfg: &Config) -> OutputFormat {
    global.output.unwrap_or_else(|| parse_output(&cfg.output))
}

fn parse_output(name: &str) -> OutputFormat {
    match name.trim().to_ascii_lowercase().as_str() {
        "json" => OutputFormat::Json,
        "json-compact" | "json_compact" => OutputFormat::JsonCompact,
        "yaml" => OutputFormat::Yaml,
        "plain" => OutputFormat::Plain,
        _ => OutputFormat::Table,
    }
}
