//! Clap derive structures for the `vncwall` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// vncwall -- scriptable access to a wall of VNC desktops
#[derive(Debug, Parser)]
#[command(
    name = "vncwall",
    version,
    about = "Inspect and manage a vncwall remote desktop dashboard",
    long_about = "Command-line access to a vncwall dashboard backend.\n\n\
        Lists registered VNC desktops, probes their reachability through\n\
        websockify, toggles exclusion, and manages named server lists.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Dashboard backend URL (overrides config)
    #[arg(long, short = 'b', env = "VNCWALL_BACKEND_URL", global = true)]
    pub backend: Option<String>,

    /// Config file path
    #[arg(long, env = "VNCWALL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format [default: table, or `output` from config]
    #[arg(long, short = 'o', env = "VNCWALL_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides config)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inspect, probe and (un)exclude servers
    #[command(alias = "s")]
    Servers(ServersArgs),

    /// Manage named server lists
    #[command(alias = "l")]
    Lists(ListsArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SERVERS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ServersArgs {
    #[command(subcommand)]
    pub command: ServersCommand,
}

#[derive(Debug, Subcommand)]
pub enum ServersCommand {
    /// List registered servers (no probing)
    #[command(alias = "ls")]
    List {
        /// Include excluded servers
        #[arg(long, short = 'a')]
        include_excluded: bool,

        /// Show only excluded servers
        #[arg(long, short = 'x', conflicts_with = "include_excluded")]
        excluded_only: bool,

        /// Only servers in this named list
        #[arg(long, short = 'l')]
        list: Option<String>,
    },

    /// Check whether one server answers on its websockify port
    Check {
        /// Server IP
        ip: String,

        /// Websockify port (looked up from the inventory when omitted)
        #[arg(long, short = 'p')]
        port: Option<u16>,
    },

    /// Probe servers one by one, as the dashboard grid does, and list the
    /// reachable ones
    Probe {
        /// Only servers in this named list
        #[arg(long, short = 'l')]
        list: Option<String>,

        /// Probe excluded servers instead of active ones
        #[arg(long, short = 'x')]
        excluded: bool,
    },

    /// Exclude servers from management
    Exclude {
        /// Server IPs
        #[arg(required = true)]
        ips: Vec<String>,
    },

    /// Include previously excluded servers
    Include {
        /// Server IPs
        #[arg(required = true)]
        ips: Vec<String>,
    },

    /// Include every excluded server
    Reset,

    /// Print the noVNC URL for a server
    Open {
        /// Server IP
        ip: String,

        /// View-only URL (embeds the view-only password)
        #[arg(long)]
        view_only: bool,

        /// Use tile scale/quality instead of fullscreen
        #[arg(long)]
        tile: bool,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  LISTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ListsArgs {
    #[command(subcommand)]
    pub command: ListsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ListsCommand {
    /// Show named lists and their members
    #[command(alias = "ls")]
    Show,

    /// Create an empty list
    Create {
        /// List name
        name: String,
    },

    /// Delete lists
    #[command(alias = "rm")]
    Delete {
        /// List names
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Add servers to a list
    Add {
        /// List name
        list: String,

        /// Server IPs
        #[arg(required = true)]
        ips: Vec<String>,
    },

    /// Remove servers from a list
    Remove {
        /// List name
        list: String,

        /// Server IPs
        #[arg(required = true)]
        ips: Vec<String>,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
