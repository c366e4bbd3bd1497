// ── Tile state store ──
//
// Last-observed comparison fields per server ip. Written by full renders
// (for every incoming server, visible or not) and by the poller when it
// detects a change; read by the poller to decide what to patch.

use dashmap::DashMap;

use crate::model::{Server, TileComparisonState};

#[derive(Debug, Default)]
pub struct TileStateStore {
    entries: DashMap<String, TileComparisonState>,
}

impl TileStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the snapshot for one server.
    pub fn record(&self, server: &Server) {
        self.entries
            .insert(server.ip.clone(), server.comparison_state());
    }

    pub fn record_all(&self, servers: &[Server]) {
        for server in servers {
            self.record(server);
        }
    }

    pub fn get(&self, ip: &str) -> Option<TileComparisonState> {
        self.entries.get(ip).map(|r| r.value().clone())
    }

    pub fn contains(&self, ip: &str) -> bool {
        self.entries.contains_key(ip)
    }

    /// `true` only when a prior snapshot exists and differs from `server`.
    /// Servers never seen before are not considered diverged.
    pub fn diverged(&self, server: &Server) -> bool {
        self.entries.get(&server.ip).is_some_and(|prev| {
            prev.username != server.username || prev.excluded != server.excluded
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
