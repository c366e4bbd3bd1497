// ── Backend abstraction ──
//
// The reconciler, poller and dashboard talk to the backend through this
// trait so the engine can run against an in-memory fake in tests.

use std::future::Future;

use vncwall_api::{DashboardClient, ListMutation, NamedLists};

use crate::config::DashboardConfig;
use crate::error::CoreError;
use crate::model::Server;

/// Operations the dashboard needs from its backend.
pub trait Backend: Send + Sync + 'static {
    /// Fetch the server inventory.
    fn fetch_servers(
        &self,
        include_excluded: bool,
    ) -> impl Future<Output = Result<Vec<Server>, CoreError>> + Send;

    /// Ask the backend whether a desktop answers on its websockify port.
    fn check_reachable(
        &self,
        ip: &str,
        port: u16,
    ) -> impl Future<Output = Result<bool, CoreError>> + Send;

    fn exclude(&self, ip: &str) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn include(&self, ip: &str) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn fetch_lists(&self) -> impl Future<Output = Result<NamedLists, CoreError>> + Send;

    fn mutate_list(
        &self,
        mutation: ListMutation,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// [`Backend`] over the real HTTP API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: DashboardClient,
}

impl HttpBackend {
    pub fn new(config: &DashboardConfig) -> Result<Self, CoreError> {
        let client = DashboardClient::new(config.backend_url.clone(), &config.transport())?;
        Ok(Self { client })
    }

    pub fn from_client(client: DashboardClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &DashboardClient {
        &self.client
    }
}

impl Backend for HttpBackend {
    async fn fetch_servers(&self, include_excluded: bool) -> Result<Vec<Server>, CoreError> {
        let records = self.client.list_servers(include_excluded).await?;
        Ok(records.into_iter().map(Server::from).collect())
    }

    async fn check_reachable(&self, ip: &str, port: u16) -> Result<bool, CoreError> {
        Ok(self.client.check_server(ip, port).await?)
    }

    async fn exclude(&self, ip: &str) -> Result<(), CoreError> {
        Ok(self.client.exclude_server(ip).await?)
    }

    async fn include(&self, ip: &str) -> Result<(), CoreError> {
        Ok(self.client.include_server(ip).await?)
    }

    async fn fetch_lists(&self) -> Result<NamedLists, CoreError> {
        Ok(self.client.list_lists().await?)
    }

    async fn mutate_list(&self, mutation: ListMutation) -> Result<(), CoreError> {
        Ok(self.client.mutate_list(&mutation).await?)
    }
}
