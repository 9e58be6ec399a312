use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use vaultgraph_render::{PlannerOptions, Viewport};

pub const ENV_SERVER: &str = "VAULTGRAPH_SERVER";
pub const ENV_TIMEOUT_SECS: &str = "VAULTGRAPH_TIMEOUT_SECS";
pub const ENV_VIEWPORT_WIDTH: &str = "VAULTGRAPH_VIEWPORT_WIDTH";

/// Client configuration.
///
/// Layers, lowest precedence first: [`ClientConfig::default`], an optional JSON file
/// ([`ClientConfig::load`]), then the environment ([`ClientConfig::apply_env`]). Every field is
/// optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    pub server_url: String,
    pub timeout_secs: u64,
    pub viewport: Viewport,
    pub zoom_step: f64,
    pub fit_padding: f64,
    pub planner: PlannerOptions,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".to_string(),
            // Extraction of large scans is slow upstream; generation is bounded by the LLM call.
            timeout_secs: 120,
            viewport: Viewport::default(),
            zoom_step: 1.2,
            fit_padding: 50.0,
            planner: PlannerOptions::default(),
        }
    }
}

impl ClientConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Overlays values from the process environment.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Overlays values from an arbitrary variable source; empty values are ignored.
    pub fn apply_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_SERVER) {
            self.server_url = url.trim().to_string();
        }
        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            self.timeout_secs = raw.trim().parse().map_err(|_| Error::InvalidEnv {
                key: ENV_TIMEOUT_SECS,
                value: raw.clone(),
            })?;
        }
        if let Some(raw) = get(ENV_VIEWPORT_WIDTH) {
            let width: f64 = raw.trim().parse().map_err(|_| Error::InvalidEnv {
                key: ENV_VIEWPORT_WIDTH,
                value: raw.clone(),
            })?;
            if !(width.is_finite() && width > 0.0) {
                return Err(Error::InvalidEnv {
                    key: ENV_VIEWPORT_WIDTH,
                    value: raw,
                });
            }
            self.viewport.width = width;
        }
        Ok(self)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            viewport_width: self.viewport.width,
            planner: self.planner,
            zoom_step: self.zoom_step,
            fit_padding: self.fit_padding,
        }
    }
}

/// The subset of configuration a [`crate::Session`] needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionOptions {
    pub viewport_width: f64,
    pub planner: PlannerOptions,
    /// Multiplicative zoom factor; zooming out divides by it.
    pub zoom_step: f64,
    pub fit_padding: f64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        ClientConfig::default().session_options()
    }
}
