//! [`Backend`] over the modeling service's JSON API.

use crate::backend::{
    Backend, BackendError, BackendResult, BackendStatus, CorrelationId, Extraction, Generated,
    ModelSummary, SourceFile,
};
use crate::config::ClientConfig;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde_json::{Value, json};
use std::time::Duration;
use vaultgraph_core::sanitize::coerce_text;

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> BackendResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(transport)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> BackendResult<Self> {
        Self::new(&config.server_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, request: RequestBuilder, fallback: &str) -> BackendResult<Value> {
        let response = request.send().await.map_err(transport)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport)?;
        tracing::debug!(status, bytes = body.len(), "service response");
        decode_body(status, &body, fallback)
    }

    fn file_form(file: &SourceFile) -> Form {
        let part = Part::bytes(file.bytes.clone()).file_name(file.name.clone());
        Form::new().part("file", part)
    }
}

fn transport(err: reqwest::Error) -> BackendError {
    BackendError::Transport {
        message: err.to_string(),
    }
}

/// Decodes a response body without trusting its shape.
///
/// Empty or non-JSON bodies are unreadable. A body carrying `error`, a `success: false` flag or a
/// non-2xx status is a server error whose message is the body's `error` (or `message`), falling
/// back to `fallback`.
pub(crate) fn decode_body(status: u16, body: &str, fallback: &str) -> BackendResult<Value> {
    if body.trim().is_empty() {
        return Err(BackendError::UnreadableResponse { status });
    }
    let value: Value =
        serde_json::from_str(body).map_err(|_| BackendError::UnreadableResponse { status })?;

    let error = value.get("error").and_then(coerce_text);
    let declined = value.get("success").and_then(Value::as_bool) == Some(false);
    if error.is_some() || declined || !(200..300).contains(&status) {
        let message = error
            .or_else(|| value.get("message").and_then(coerce_text))
            .unwrap_or_else(|| fallback.to_string());
        return Err(BackendError::Server {
            status: Some(status),
            message,
        });
    }
    Ok(value)
}

/// Ids in canonical integer form travel as JSON numbers; anything else (`"007"`, `"+5"`) is sent
/// back verbatim as a string.
pub(crate) fn wire_id(id: &CorrelationId) -> Value {
    match id.as_str().parse::<i64>() {
        Ok(n) if n.to_string() == id.as_str() => Value::from(n),
        _ => Value::String(id.to_string()),
    }
}

fn extraction(value: &Value) -> BackendResult<Extraction> {
    let ocr_id = value
        .get("ocr_id")
        .and_then(CorrelationId::from_json)
        .ok_or_else(|| BackendError::MalformedResponse {
            message: "missing ocr_id".to_string(),
        })?;
    let text = value
        .get("extracted_text")
        .or_else(|| value.get("text"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Ok(Extraction { ocr_id, text })
}

fn model_payload(value: &mut Value) -> BackendResult<Value> {
    match value.get_mut("model").map(Value::take) {
        Some(model) if !model.is_null() => Ok(model),
        _ => Err(BackendError::MalformedResponse {
            message: "missing model".to_string(),
        }),
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn check_config(&self) -> BackendResult<BackendStatus> {
        let value = self
            .send(
                self.client.get(self.url("/api/config/check")),
                "Configuration check failed",
            )
            .await?;
        let flag = |key: &str| value.get(key).and_then(Value::as_bool).unwrap_or(false);
        Ok(BackendStatus {
            ocr_configured: flag("ocr_configured"),
            generation_configured: flag("generation_configured") || flag("groq_configured"),
        })
    }

    async fn extract(&self, file: &SourceFile) -> BackendResult<Extraction> {
        let request = self
            .client
            .post(self.url("/api/upload"))
            .multipart(Self::file_form(file));
        let value = self.send(request, "Upload failed").await?;
        extraction(&value)
    }

    async fn submit_schema(&self, text: &str) -> BackendResult<Extraction> {
        let request = self
            .client
            .post(self.url("/api/schema"))
            .json(&json!({ "text": text }));
        let value = self.send(request, "Schema submission failed").await?;
        extraction(&value)
    }

    async fn update_schema(&self, ocr_id: &CorrelationId, text: &str) -> BackendResult<()> {
        let request = self
            .client
            .post(self.url("/api/schema/update"))
            .json(&json!({ "ocr_id": wire_id(ocr_id), "text": text }));
        self.send(request, "Schema update failed").await?;
        Ok(())
    }

    async fn generate(&self, ocr_id: &CorrelationId, grounded: bool) -> BackendResult<Generated> {
        let request = self
            .client
            .post(self.url("/api/generate"))
            .json(&json!({ "ocr_id": wire_id(ocr_id), "grounded": grounded }));
        let mut value = self.send(request, "Generation failed").await?;
        Ok(Generated {
            model_id: value.get("model_id").and_then(coerce_text),
            payload: model_payload(&mut value)?,
        })
    }

    async fn upload_knowledge(&self, file: &SourceFile) -> BackendResult<()> {
        let request = self
            .client
            .post(self.url("/api/knowledge/upload"))
            .multipart(Self::file_form(file));
        self.send(request, "Knowledge upload failed").await?;
        Ok(())
    }

    async fn list_models(&self) -> BackendResult<Vec<ModelSummary>> {
        let value = self
            .send(
                self.client.get(self.url("/api/models")),
                "Could not load models",
            )
            .await?;
        let models = value
            .get("models")
            .and_then(Value::as_array)
            .map(|list| list.iter().filter_map(ModelSummary::from_json).collect())
            .unwrap_or_default();
        Ok(models)
    }

    async fn fetch_model(&self, model_id: &str) -> BackendResult<Value> {
        let mut value = self
            .send(
                self.client.get(self.url(&format!("/api/models/{model_id}"))),
                "Could not load model",
            )
            .await?;
        model_payload(&mut value)
    }
}
