// Dashboard backend HTTP client
//
// Wraps `reqwest::Client` with URL construction and status handling for
// the backend's JSON endpoints. Every method maps one endpoint; callers
// decide how failures degrade.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{
    IpPayload, ListMutation, NamedLists, ReachabilityResponse, ServerRecord,
};
use crate::transport::TransportConfig;

/// Longest body excerpt carried in error messages.
const BODY_PREVIEW_LEN: usize = 200;

/// Raw HTTP client for the dashboard backend.
#[derive(Debug, Clone)]
pub struct DashboardClient {
    http: reqwest::Client,
    base_url: Url,
}

impl DashboardClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the backend root, e.g. `http://dashboard:5000`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Servers ──────────────────────────────────────────────────────

    /// `GET /api/servers[?include_excluded=true]`
    pub async fn list_servers(&self, include_excluded: bool) -> Result<Vec<ServerRecord>, Error> {
        let mut url = self.api_url("servers")?;
        if include_excluded {
            url.query_pairs_mut().append_pair("include_excluded", "true");
        }
        self.get(url).await
    }

    /// `GET /api/servers/check?ip=&websockify_port=`
    ///
    /// Returns the backend's verdict. Transport failures and non-success
    /// statuses are errors; treating those as "unreachable" is up to the
    /// caller.
    pub async fn check_server(&self, ip: &str, websockify_port: u16) -> Result<bool, Error> {
        let mut url = self.api_url("servers/check")?;
        url.query_pairs_mut()
            .append_pair("ip", ip)
            .append_pair("websockify_port", &websockify_port.to_string());
        let resp: ReachabilityResponse = self.get(url).await?;
        Ok(resp.reachable)
    }

    /// `POST /api/servers/exclude`
    pub async fn exclude_server(&self, ip: &str) -> Result<(), Error> {
        let url = self.api_url("servers/exclude")?;
        self.post(url, &IpPayload { ip }).await
    }

    /// `POST /api/servers/include`
    pub async fn include_server(&self, ip: &str) -> Result<(), Error> {
        let url = self.api_url("servers/include")?;
        self.post(url, &IpPayload { ip }).await
    }

    // ── Named lists ──────────────────────────────────────────────────

    /// `GET /api/lists`
    pub async fn list_lists(&self) -> Result<NamedLists, Error> {
        let url = self.api_url("lists")?;
        self.get(url).await
    }

    /// `POST /api/lists`
    pub async fn mutate_list(&self, mutation: &ListMutation) -> Result<(), Error> {
        let url = self.api_url("lists")?;
        self.post(url, mutation).await
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/api/{path}`, tolerating a trailing slash on the base.
    fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/api/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await?;
        let body = Self::checked_body(resp).await?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }

    async fn post(&self, url: Url, body: &(impl Serialize + Sync)) -> Result<(), Error> {
        debug!("POST {}", url);
        let resp = self.http.post(url).json(body).send().await?;
        Self::checked_body(resp).await.map(drop)
    }

    /// Read the body, turning non-success statuses into [`Error::Http`].
    async fn checked_body(resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                message: preview(&body).to_owned(),
            });
        }
        Ok(resp.text().await?)
    }
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(BODY_PREVIEW_LEN) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
