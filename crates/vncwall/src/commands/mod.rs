//! Command dispatch: bridges CLI args -> core Commands -> output formatting.

pub mod lists;
pub mod servers;
pub mod util;

use vncwall_core::Dashboard;

use crate::cli::{Command, OutputFormat};
use crate::error::CliError;

/// How a handler should print its results.
#[derive(Debug, Clone, Copy)]
pub struct OutputOpts {
    pub format: OutputFormat,
    pub color: bool,
    pub quiet: bool,
    pub yes: bool,
}

impl OutputOpts {
    /// Status line on stderr, unless `--quiet`.
    pub fn status(&self, message: &str) {
        if !self.quiet {
            eprintln!("{message}");
        }
    }
}

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    dashboard: &Dashboard,
    out: &OutputOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Servers(args) => servers::handle(dashboard, args, out).await,
        Command::Lists(args) => lists::handle(dashboard, args, out).await,
        Command::Completions(_) => Err(CliError::Internal(
            "completions are generated before dispatch".into(),
        )),
    }
}
