#![forbid(unsafe_code)]

//! Headless Data Vault 2.1 modeling client.
//!
//! This crate stitches together the sanitizer (`vaultgraph-core`) and the planner, canvas and
//! export encoders (`vaultgraph-render`) behind an explicit [`Session`]. Network collaborators
//! sit behind the [`Backend`] trait; [`HttpBackend`] (feature `http`) talks to the modeling
//! service. User actions enter through [`Dispatcher::dispatch`].

pub mod backend;
pub mod config;
pub mod dispatch;
pub mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod session;

pub use backend::{
    Backend, BackendError, BackendResult, BackendStatus, CorrelationId, Extraction, Generated,
    ModelSummary, SourceFile,
};
pub use config::{ClientConfig, SessionOptions};
pub use dispatch::{Command, Dispatcher, Outcome, Persisted};
pub use error::{Error, Result};
#[cfg(feature = "http")]
pub use http::HttpBackend;
pub use session::{
    Confirmation, Control, FlowState, GenerationSummary, PendingReview, Session, SessionError,
    Step, Ticket,
};

pub use vaultgraph_core::{
    Edge, Model, ModelStats, Node, NodeDetails, NodeKind, SanitizeReport, sanitize, sanitize_str,
};

pub mod render {
    pub use vaultgraph_render::canvas::{CanvasNode, MAX_ZOOM, MIN_ZOOM, mount};
    pub use vaultgraph_render::svg::{SvgRenderOptions, render_svg};
    pub use vaultgraph_render::{
        BandOptions, Bounds, Canvas, ExportFormat, ExportPayload, HeadlessCanvas, LayeredLayout,
        NodeBox, PlannerOptions, Point, Viewport, export, plan_layers,
    };
}

#[cfg(test)]
mod tests;
