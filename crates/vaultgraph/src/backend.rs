//! Contract for the remote services the session talks to.
//!
//! One trait covers extraction, schema persistence, generation, methodology upload and model
//! history. Implementations only move data; all validation and state handling stays in
//! [`crate::Session`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use vaultgraph_core::sanitize::coerce_text;

pub const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "pdf", "gif"];
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Opaque token binding extracted text, its edits and later generation requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Reads an identifier from JSON, accepting numbers as well as strings.
    pub fn from_json(v: &Value) -> Option<Self> {
        coerce_text(v).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn read(path: &std::path::Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { name, bytes })
    }

    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.name.rsplit_once('.')?;
        Some(ext.to_ascii_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BackendStatus {
    pub ocr_configured: bool,
    pub generation_configured: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extraction {
    pub ocr_id: CorrelationId,
    pub text: String,
}

/// Raw result of a generation call; the payload is sanitized by the session.
#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    pub model_id: Option<String>,
    pub payload: Value,
}

/// One entry of the stored model history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelSummary {
    pub id: String,
    pub ocr_id: Option<CorrelationId>,
    pub filename: Option<String>,
    pub grounded: bool,
    pub created_at: Option<String>,
}

impl ModelSummary {
    pub fn from_json(v: &Value) -> Option<Self> {
        Some(Self {
            id: v.get("id").and_then(coerce_text)?,
            ocr_id: v.get("ocr_id").and_then(CorrelationId::from_json),
            filename: v.get("filename").and_then(coerce_text),
            grounded: v.get("grounded").and_then(Value::as_bool).unwrap_or(false),
            created_at: v.get("created_at").and_then(coerce_text),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The server answered with an error message (or a generic one when it gave none).
    #[error("{message}")]
    Server { status: Option<u16>, message: String },

    /// The body was empty or not JSON.
    #[error("Unreadable response from server (HTTP {status})")]
    UnreadableResponse { status: u16 },

    /// The body was JSON but lacked a required field.
    #[error("Malformed response from server: {message}")]
    MalformedResponse { message: String },

    #[error("Request failed: {message}")]
    Transport { message: String },
}

impl BackendError {
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            status: None,
            message: message.into(),
        }
    }
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

#[async_trait]
pub trait Backend: Send + Sync {
    /// Reports which upstream services are configured.
    async fn check_config(&self) -> BackendResult<BackendStatus>;

    async fn extract(&self, file: &SourceFile) -> BackendResult<Extraction>;

    /// Registers manually entered schema text, obtaining a correlation id like an upload does.
    async fn submit_schema(&self, text: &str) -> BackendResult<Extraction>;

    async fn update_schema(&self, ocr_id: &CorrelationId, text: &str) -> BackendResult<()>;

    async fn generate(&self, ocr_id: &CorrelationId, grounded: bool) -> BackendResult<Generated>;

    /// Uploads the methodology document used by grounded generation.
    async fn upload_knowledge(&self, file: &SourceFile) -> BackendResult<()>;

    async fn list_models(&self) -> BackendResult<Vec<ModelSummary>>;

    async fn fetch_model(&self, model_id: &str) -> BackendResult<Value>;
}
