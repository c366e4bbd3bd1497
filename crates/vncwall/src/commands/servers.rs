//! Server command handlers.

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tabled::Tabled;

use vncwall_core::{
    ALL_SERVERS_LIST, Backend, Command as CoreCommand, Dashboard, GridFilter, Server, Tile,
    ViewMode,
};

use crate::cli::{ServersArgs, ServersCommand};
use crate::error::CliError;
use crate::output;

use super::{OutputOpts, util};

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct ServerRow {
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "User")]
    username: String,
    #[tabled(rename = "Port")]
    port: u16,
    #[tabled(rename = "Excluded")]
    excluded: String,
}

impl ServerRow {
    fn new(s: &Server, color: bool) -> Self {
        Self {
            ip: s.ip.clone(),
            username: s.username.clone(),
            port: s.display_port,
            excluded: output::flag(s.excluded, color),
        }
    }
}

#[derive(Tabled)]
struct TileRow {
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Excluded")]
    excluded: String,
    #[tabled(rename = "Open")]
    open_url: String,
}

impl TileRow {
    fn new(t: &Tile, color: bool) -> Self {
        Self {
            label: t.label.clone(),
            excluded: output::flag(t.excluded, color),
            open_url: t.open_url.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CheckResult {
    ip: String,
    port: u16,
    reachable: bool,
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    dashboard: &Dashboard,
    args: ServersArgs,
    out: &OutputOpts,
) -> Result<(), CliError> {
    match args.command {
        ServersCommand::List {
            include_excluded,
            excluded_only,
            list,
        } => {
            let mut servers = dashboard
                .backend()
                .fetch_servers(include_excluded || excluded_only)
                .await?;
            servers.retain(|s| {
                if excluded_only {
                    s.excluded
                } else {
                    include_excluded || !s.excluded
                }
            });
            if let Some(name) = list {
                let filter = list_filter(dashboard, &name, false).await?;
                servers = filter.apply_list(servers, &dashboard.lists());
            }

            let color = out.color;
            let rendered = output::render_list(
                out.format,
                &servers,
                |s| ServerRow::new(s, color),
                |s| s.ip.clone(),
            );
            output::print_output(&rendered, out.quiet);
            Ok(())
        }

        ServersCommand::Check { ip, port } => {
            let port = match port {
                Some(port) => port,
                None => find_server(dashboard, &ip).await?.display_port,
            };
            let reachable = vncwall_core::probe::is_reachable(dashboard.backend(), &ip, port).await;
            let result = CheckResult {
                ip,
                port,
                reachable,
            };
            let color = out.color;
            let rendered = output::render_single(
                out.format,
                &result,
                |r| format!("{}:{}  {}", r.ip, r.port, output::reachability(r.reachable, color)),
                |r| output::reachability(r.reachable, false),
            );
            output::print_output(&rendered, out.quiet);
            Ok(())
        }

        ServersCommand::Probe { list, excluded } => {
            let filter = match list {
                Some(name) => list_filter(dashboard, &name, excluded).await?,
                None => GridFilter {
                    show_excluded: excluded,
                    list: None,
                },
            };
            dashboard.set_filter(filter);

            let bar = progress_bar(out.quiet);
            let progress = bar.clone();
            let report = dashboard
                .load_and_render_with(move |p| {
                    progress.set_length(p.total as u64);
                    progress.set_position(p.done as u64);
                    progress.set_message(p.server.ip.clone());
                })
                .await;
            bar.finish_and_clear();
            let report = report?;

            let tiles: Vec<Tile> = dashboard.grid().snapshot().tiles().cloned().collect();
            let color = out.color;
            let rendered = output::render_list(
                out.format,
                &tiles,
                |t| TileRow::new(t, color),
                |t| t.ip.clone(),
            );
            output::print_output(&rendered, out.quiet);
            out.status(&format!(
                "{} of {} servers reachable",
                report.rendered, report.candidates
            ));
            Ok(())
        }

        ServersCommand::Exclude { ips } => {
            let summary = util::describe_ips(&ips);
            dashboard.execute(CoreCommand::Exclude { ips }).await?;
            out.status(&format!("Excluded {summary}"));
            Ok(())
        }

        ServersCommand::Include { ips } => {
            let summary = util::describe_ips(&ips);
            dashboard.execute(CoreCommand::Include { ips }).await?;
            out.status(&format!("Included {summary}"));
            Ok(())
        }

        ServersCommand::Reset => {
            let ips: Vec<String> = dashboard
                .backend()
                .fetch_servers(true)
                .await?
                .into_iter()
                .filter(|s| s.excluded)
                .map(|s| s.ip)
                .collect();
            if ips.is_empty() {
                out.status("No excluded servers");
                return Ok(());
            }
            let prompt = format!("Include {} again?", util::describe_ips(&ips));
            if !util::confirm("servers reset", &prompt, out.yes)? {
                return Ok(());
            }
            let summary = util::describe_ips(&ips);
            dashboard.execute(CoreCommand::Include { ips }).await?;
            out.status(&format!("Included {summary}"));
            Ok(())
        }

        ServersCommand::Open {
            ip,
            view_only,
            tile,
        } => {
            let server = find_server(dashboard, &ip).await?;
            let mode = if tile {
                ViewMode::Tile
            } else {
                ViewMode::Fullscreen
            };
            let renderer = dashboard.renderer();
            let url = if view_only {
                renderer.view_only_url(&server.ip, server.display_port, mode)
            } else {
                renderer.management_url(&server.ip, server.display_port, mode)
            };
            output::print_output(&url, out.quiet);
            Ok(())
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Look a server up in the full inventory, excluded ones included.
async fn find_server(dashboard: &Dashboard, ip: &str) -> Result<Server, CliError> {
    dashboard
        .backend()
        .fetch_servers(true)
        .await?
        .into_iter()
        .find(|s| s.ip == ip)
        .ok_or_else(|| CliError::server_not_found(ip))
}

/// Filter for a named list, refusing names the backend does not know.
async fn list_filter(
    dashboard: &Dashboard,
    name: &str,
    show_excluded: bool,
) -> Result<GridFilter, CliError> {
    let lists = dashboard.refresh_lists().await?;
    if name != ALL_SERVERS_LIST && !lists.contains_key(name) {
        return Err(CliError::NotFound {
            resource_type: "list".into(),
            identifier: name.into(),
            list_command: "lists show".into(),
        });
    }
    let mut filter = GridFilter {
        show_excluded,
        list: None,
    };
    filter.select_list(name);
    Ok(filter)
}

fn progress_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::with_template("{spinner} probing [{bar:30}] {pos}/{len} {msg}")
    {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}
