//! `vncwall-tui`: live terminal wall of VNC desktops.
//!
//! Built on [ratatui](https://ratatui.rs) over `vncwall-core`'s grid
//! engine. The Grid screen shows one tile per reachable server, patched in
//! place by the background poller; the Lists screen manages named lists
//! and picks the grid's list filter.
//!
//! Logs go to a file (default `/tmp/vncwall-tui.log`) so they never
//! corrupt the terminal. A data bridge task forwards the engine's watch
//! channels into the action loop.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod screen;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use vncwall_core::Dashboard;

use crate::app::App;

/// Terminal wall for watching and managing VNC desktops.
#[derive(Parser, Debug)]
#[command(name = "vncwall-tui", version, about)]
struct Cli {
    /// Dashboard backend URL (e.g., http://dashboard:5000)
    #[arg(short = 'b', long, env = "VNCWALL_BACKEND_URL")]
    backend: Option<String>,

    /// Config file path
    #[arg(long, env = "VNCWALL_CONFIG")]
    config: Option<PathBuf>,

    /// Named list to show at startup
    #[arg(short = 'l', long)]
    list: Option<String>,

    /// Log file path
    #[arg(long, default_value = "/tmp/vncwall-tui.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-only tracing; the returned guard flushes on drop.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("vncwall_tui={log_level},vncwall_core={log_level}"))
    });

    let log_dir = cli
        .log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("vncwall-tui.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

/// Config file and environment, then command-line overrides.
fn build_dashboard(cli: &Cli) -> Result<Dashboard> {
    let path = cli.config.clone().unwrap_or_else(vncwall_config::config_path);
    let mut cfg = vncwall_config::load_config_from(&path)?;
    if let Some(backend) = &cli.backend {
        cfg.backend_url.clone_from(backend);
    }
    if let Some(list) = &cli.list {
        cfg.default_list = Some(list.clone());
    }
    Ok(Dashboard::new(&cfg.to_dashboard_config()?)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    tui::install_hooks()?;

    let cli = Cli::parse();
    let _guard = setup_tracing(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "starting vncwall-tui");

    let dashboard = Arc::new(build_dashboard(&cli)?);
    info!(backend = %dashboard.backend().client().base_url(), "dashboard ready");

    let mut app = App::new(dashboard);
    app.run().await?;

    info!("vncwall-tui exited cleanly");
    Ok(())
}
