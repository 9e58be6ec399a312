use crate::backend::*;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;

pub(crate) const CUSTOMER_ORDER: &str = include_str!("../../../../fixtures/customer_order.json");

pub(crate) fn customer_order() -> Value {
    serde_json::from_str(CUSTOMER_ORDER).unwrap()
}

pub(crate) fn extraction(id: &str, text: &str) -> Extraction {
    Extraction {
        ocr_id: CorrelationId::new(id),
        text: text.to_string(),
    }
}

pub(crate) fn generated(payload: Value) -> Generated {
    Generated {
        model_id: Some("1".to_string()),
        payload,
    }
}

pub(crate) fn scan() -> SourceFile {
    SourceFile::new("schema.png", b"\x89PNG...".to_vec())
}

/// Scripted backend that records every call it receives.
pub(crate) struct MockBackend {
    pub status: BackendStatus,
    pub extract: BackendResult<Extraction>,
    pub submit: BackendResult<Extraction>,
    pub update: BackendResult<()>,
    pub generate: BackendResult<Generated>,
    pub knowledge: BackendResult<()>,
    pub models: Vec<ModelSummary>,
    pub calls: Mutex<Vec<String>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            status: BackendStatus {
                ocr_configured: true,
                generation_configured: true,
            },
            extract: Ok(extraction("7", "CREATE TABLE customer (customer_id INT);")),
            submit: Ok(extraction("8", "CREATE TABLE orders (order_id INT);")),
            update: Ok(()),
            generate: Ok(generated(customer_order())),
            knowledge: Ok(()),
            models: vec![ModelSummary {
                id: "1".to_string(),
                ocr_id: Some(CorrelationId::new("7")),
                filename: Some("schema.png".to_string()),
                grounded: true,
                created_at: None,
            }],
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockBackend {
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn check_config(&self) -> BackendResult<BackendStatus> {
        self.record("check_config".to_string());
        Ok(self.status)
    }

    async fn extract(&self, file: &SourceFile) -> BackendResult<Extraction> {
        self.record(format!("extract:{}", file.name));
        self.extract.clone()
    }

    async fn submit_schema(&self, _text: &str) -> BackendResult<Extraction> {
        self.record("submit".to_string());
        self.submit.clone()
    }

    async fn update_schema(&self, ocr_id: &CorrelationId, text: &str) -> BackendResult<()> {
        self.record(format!("update:{ocr_id}:{text}"));
        self.update.clone()
    }

    async fn generate(&self, ocr_id: &CorrelationId, grounded: bool) -> BackendResult<Generated> {
        self.record(format!("generate:{ocr_id}:{grounded}"));
        self.generate.clone()
    }

    async fn upload_knowledge(&self, file: &SourceFile) -> BackendResult<()> {
        self.record(format!("knowledge:{}", file.name));
        self.knowledge.clone()
    }

    async fn list_models(&self) -> BackendResult<Vec<ModelSummary>> {
        self.record("list_models".to_string());
        Ok(self.models.clone())
    }

    async fn fetch_model(&self, model_id: &str) -> BackendResult<Value> {
        self.record(format!("fetch:{model_id}"));
        match model_id {
            "1" => Ok(customer_order()),
            _ => Err(BackendError::server("Model not found")),
        }
    }
}
