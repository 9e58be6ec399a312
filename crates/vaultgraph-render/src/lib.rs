#![forbid(unsafe_code)]

//! Layout, canvas and export encoders for sanitized Data Vault models.
//!
//! Everything here is a pure function of a [`vaultgraph_core::Model`] plus explicit options; no
//! module reads ambient state.

pub mod canvas;
pub mod csv;
pub mod drawio;
pub mod export;
pub mod layout;
pub mod model;
pub mod svg;
mod util;

pub use canvas::{Canvas, HeadlessCanvas, Viewport};
pub use export::{ExportFormat, ExportPayload, export};
pub use layout::{BandOptions, PlannerOptions, plan_layers};
pub use model::{BandLayout, Bounds, LayeredLayout, NodeBox, Point};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported export format: {format}")]
    UnsupportedFormat { format: String },
    #[error("model JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
