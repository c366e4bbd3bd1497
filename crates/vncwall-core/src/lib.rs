//! Live grid engine between `vncwall-api` and the front ends (CLI / TUI).
//!
//! - **[`Dashboard`]**: facade owning one [`GridSession`]. Loads the
//!   inventory, applies the [`GridFilter`], and dispatches every
//!   [`Command`] (selection, bulk exclusion, named lists, tile patches).
//!
//! - **[`GridReconciler`]**: full render (probe each candidate in turn,
//!   paced, append reachable tiles) and single-tile patch that swaps one
//!   node while keeping the scroll position. Renders carry an epoch and
//!   patches a per-ip generation so late results are dropped.
//!
//! - **[`PollScheduler`]**: background task that re-fetches the inventory
//!   and patches only tiles whose username or exclusion flag diverged from
//!   the [`TileStateStore`].
//!
//! - **[`Grid`]**: the rendered grid, published as [`GridView`] snapshots
//!   through a `tokio::sync::watch` channel.
//!
//! - **[`Backend`]**: the seam to the HTTP API ([`HttpBackend`]), so the
//!   engine runs against an in-memory backend in tests.

pub mod backend;
pub mod command;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod grid;
pub mod lists;
pub mod model;
pub mod poller;
pub mod probe;
pub mod reconciler;
pub mod render;
pub mod selection;
pub mod session;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backend::{Backend, HttpBackend};
pub use command::{Command, CommandResult};
pub use config::{DashboardConfig, ViewerConfig};
pub use dashboard::Dashboard;
pub use error::CoreError;
pub use filter::GridFilter;
pub use grid::{Grid, GridSlot, GridView, NodeId, SlotContent, column_count};
pub use model::{Server, TileComparisonState};
pub use poller::{PollReport, PollScheduler};
pub use reconciler::{GridReconciler, PatchOutcome, ProbeProgress, RenderReport};
pub use render::{Tile, TileRenderer, ViewMode};
pub use selection::BulkButtons;
pub use session::GridSession;
pub use store::TileStateStore;

pub use vncwall_api::{ALL_SERVERS_LIST, ListAction, NamedLists, TlsMode};
