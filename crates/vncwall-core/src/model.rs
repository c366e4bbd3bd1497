// ── Domain model ──

use serde::{Deserialize, Serialize};
use vncwall_api::ServerRecord;

/// One registered desktop, as the core sees it.
///
/// The core never edits a `Server`; state changes arrive by re-fetching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    /// Unique key across the whole dashboard.
    pub ip: String,
    pub username: String,
    pub excluded: bool,
    /// Websockify port serving this desktop.
    pub display_port: u16,
}

impl Server {
    /// The fields whose change requires rebuilding the tile.
    pub fn comparison_state(&self) -> TileComparisonState {
        TileComparisonState {
            username: self.username.clone(),
            excluded: self.excluded,
        }
    }
}

impl From<ServerRecord> for Server {
    fn from(rec: ServerRecord) -> Self {
        Self {
            ip: rec.ip,
            username: rec.username,
            excluded: rec.excluded,
            display_port: rec.websockify_port,
        }
    }
}

/// Last-observed snapshot of the tile-relevant fields of a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileComparisonState {
    pub username: String,
    pub excluded: bool,
}
