// ── Tile rendering ──
//
// Turns a `Server` into a `Tile`: the label, the exclusion class and the
// two noVNC URLs. Deterministic; node identity is assigned by the grid.

use secrecy::ExposeSecret;
use serde::Serialize;
use strum::{Display, EnumString};
use url::form_urlencoded;

use crate::config::ViewerConfig;
use crate::model::Server;

/// Which scale/quality pair a viewer URL uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ViewMode {
    /// Small embedded viewer inside the grid.
    Tile,
    /// A desktop opened on its own.
    Fullscreen,
}

/// Visual representation of one server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tile {
    pub ip: String,
    pub username: String,
    pub excluded: bool,
    pub display_port: u16,
    /// `"{username} | host: {ip}"`
    pub label: String,
    /// View-only URL at tile scale, for the embedded viewer.
    pub view_url: String,
    /// Management URL at fullscreen scale, for the open control.
    pub open_url: String,
}

impl Tile {
    pub fn css_class(&self) -> &'static str {
        if self.excluded { "tile excluded" } else { "tile" }
    }
}

/// Builds tiles and viewer URLs from a fixed viewer configuration.
#[derive(Debug, Clone, Default)]
pub struct TileRenderer {
    viewer: ViewerConfig,
}

impl TileRenderer {
    pub fn new(viewer: ViewerConfig) -> Self {
        Self { viewer }
    }

    pub fn build(&self, server: &Server) -> Tile {
        Tile {
            ip: server.ip.clone(),
            username: server.username.clone(),
            excluded: server.excluded,
            display_port: server.display_port,
            label: format!("{} | host: {}", server.username, server.ip),
            view_url: self.view_only_url(&server.ip, server.display_port, ViewMode::Tile),
            open_url: self.management_url(&server.ip, server.display_port, ViewMode::Fullscreen),
        }
    }

    /// `vnc.html` URL that cannot send input; carries the view-only password.
    pub fn view_only_url(&self, ip: &str, port: u16, mode: ViewMode) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query
            .append_pair("password", self.viewer.view_only_pass.expose_secret())
            .append_pair("autoconnect", "true")
            .append_pair("resize", "scale")
            .append_pair("view_only", "true");
        self.append_quality(&mut query, mode);
        format!("http://{ip}:{port}/vnc.html?{}", query.finish())
    }

    /// Interactive `vnc.html` URL; the viewer prompts for the password.
    pub fn management_url(&self, ip: &str, port: u16, mode: ViewMode) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query
            .append_pair("autoconnect", "true")
            .append_pair("resize", "scale");
        self.append_quality(&mut query, mode);
        format!("http://{ip}:{port}/vnc.html?{}", query.finish())
    }

    fn append_quality(&self, query: &mut form_urlencoded::Serializer<'_, String>, mode: ViewMode) {
        let (scale, quality) = match mode {
            ViewMode::Tile => (self.viewer.tile_scale, self.viewer.tile_quality),
            ViewMode::Fullscreen => (self.viewer.fullscreen_scale, self.viewer.fullscreen_quality),
        };
        query
            .append_pair("compression", &self.viewer.compression.to_string())
            .append_pair("scale", &format_scale(scale))
            .append_pair("quality", &quality.to_string());
    }
}

/// Scales always carry a decimal point: `1.0` stays `1.0`, not `1`.
fn format_scale(scale: f64) -> String {
    format!("{scale:?}")
}
