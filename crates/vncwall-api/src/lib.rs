//! Async client for the vncwall dashboard backend.
//!
//! The backend fronts a fleet of VNC desktops (each exposed through
//! websockify) and stores operator-defined named lists. This crate speaks
//! its small JSON surface:
//!
//! - **[`DashboardClient`]**: typed wrappers for `/api/servers`,
//!   `/api/servers/check`, `/api/servers/{exclude,include}` and `/api/lists`.
//! - **[`TransportConfig`]**: shared `reqwest::Client` construction
//!   (timeout, TLS mode, user agent).
//! - **[`models`]**: wire types exactly as the backend serializes them.
//!
//! Higher-level behaviour (reachability probing, grid reconciliation,
//! polling) lives in `vncwall-core`.

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::DashboardClient;
pub use error::Error;
pub use models::{
    ALL_SERVERS_LIST, IpPayload, ListAction, ListMutation, NamedLists, ReachabilityResponse,
    ServerRecord,
};
pub use transport::{TlsMode, TransportConfig};
