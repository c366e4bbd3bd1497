// Wire types for the dashboard backend.
//
// Field names follow the backend's JSON exactly. Missing optional fields
// are tolerated: the inventory drops the `excluded` key entirely when a
// server is re-included, so it must default to `false`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Name of the built-in list that always means "no list filter".
pub const ALL_SERVERS_LIST: &str = "All Servers";

/// Named lists as returned by `GET /api/lists`, in backend order.
pub type NamedLists = IndexMap<String, Vec<String>>;

/// One registered server as served by `GET /api/servers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRecord {
    pub ip: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub excluded: bool,
    /// Port websockify listens on for this desktop.
    pub websockify_port: u16,
}

/// Response of `GET /api/servers/check`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReachabilityResponse {
    #[serde(default)]
    pub ip: Option<String>,
    pub reachable: bool,
}

/// Body of the exclude/include endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct IpPayload<'a> {
    pub ip: &'a str,
}

/// Direction of a named-list mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ListAction {
    Add,
    Remove,
}

/// Body of `POST /api/lists`.
///
/// `remove` with an empty `servers` array deletes the list; `add` with an
/// empty array creates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMutation {
    pub action: ListAction,
    pub list_name: String,
    pub servers: Vec<String>,
}

impl ListMutation {
    pub fn create(list_name: impl Into<String>) -> Self {
        Self {
            action: ListAction::Add,
            list_name: list_name.into(),
            servers: Vec::new(),
        }
    }

    pub fn delete(list_name: impl Into<String>) -> Self {
        Self {
            action: ListAction::Remove,
            list_name: list_name.into(),
            servers: Vec::new(),
        }
    }
}
