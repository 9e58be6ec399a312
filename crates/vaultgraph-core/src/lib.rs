#![forbid(unsafe_code)]

//! Data Vault 2.1 graph model and sanitizer (headless).
//!
//! A generation service turns source schema text into a loosely-shaped JSON graph of hubs, links
//! and satellites. This crate owns the typed [`Model`] and the [`sanitize`] step that turns such a
//! payload into a model with unique node identities and no dangling edges.

pub mod error;
pub mod inspect;
pub mod model;
pub mod sanitize;

pub use error::{Error, Result};
pub use inspect::NodeDetails;
pub use model::{Edge, Model, ModelStats, Node, NodeKind};
pub use sanitize::{
    Disposition, EdgeOrigin, EdgeVerdict, NodeVerdict, SanitizeReport, SanitizeStats, sanitize,
    sanitize_model, sanitize_parts,
};

/// Parses payload text and sanitizes it.
///
/// Only malformed JSON is an error; a well-formed payload without nodes yields an empty model.
pub fn sanitize_str(text: &str) -> Result<SanitizeReport> {
    let payload: serde_json::Value = serde_json::from_str(text)?;
    Ok(sanitize(&payload))
}

#[cfg(test)]
mod tests;
