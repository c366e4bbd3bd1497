// ── Grid filter ──

use serde::{Deserialize, Serialize};
use vncwall_api::{ALL_SERVERS_LIST, NamedLists};

use crate::model::Server;

/// What the grid currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridFilter {
    /// `false` shows active servers, `true` shows excluded servers only.
    pub show_excluded: bool,
    /// Selected named list. `None` means all servers.
    pub list: Option<String>,
}

impl GridFilter {
    /// Set the list filter; the reserved "All Servers" name clears it.
    pub fn select_list(&mut self, name: &str) {
        self.list = (name != ALL_SERVERS_LIST && !name.is_empty()).then(|| name.to_owned());
    }

    /// Name shown for the current list selection.
    pub fn list_label(&self) -> &str {
        self.list.as_deref().unwrap_or(ALL_SERVERS_LIST)
    }

    /// Whether the exclusion rule lets `server` onto the grid.
    pub fn shows(&self, server: &Server) -> bool {
        server.excluded == self.show_excluded
    }

    /// Keep only servers in the selected list. An unknown list keeps nothing.
    pub fn apply_list(&self, servers: Vec<Server>, lists: &NamedLists) -> Vec<Server> {
        let Some(name) = &self.list else {
            return servers;
        };
        let Some(members) = lists.get(name) else {
            return Vec::new();
        };
        servers
            .into_iter()
            .filter(|s| members.iter().any(|ip| ip == &s.ip))
            .collect()
    }
}
