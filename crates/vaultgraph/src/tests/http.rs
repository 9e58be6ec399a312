use crate::backend::{BackendError, CorrelationId};
use crate::http::*;
use serde_json::json;
use std::time::Duration;

#[test]
fn success_body_is_returned() {
    let value = decode_body(200, r#"{"success": true, "ocr_id": 3}"#, "Upload failed").unwrap();
    assert_eq!(value["ocr_id"], 3);
}

#[test]
fn empty_or_non_json_bodies_are_unreadable() {
    assert_eq!(
        decode_body(500, "", "Upload failed"),
        Err(BackendError::UnreadableResponse { status: 500 })
    );
    assert_eq!(
        decode_body(502, "<html>Bad Gateway</html>", "Upload failed"),
        Err(BackendError::UnreadableResponse { status: 502 })
    );
}

#[test]
fn server_error_message_is_surfaced() {
    assert_eq!(
        decode_body(400, r#"{"error": "No file uploaded"}"#, "Upload failed"),
        Err(BackendError::Server {
            status: Some(400),
            message: "No file uploaded".to_string(),
        })
    );
}

#[test]
fn missing_error_message_falls_back() {
    assert_eq!(
        decode_body(500, "{}", "Generation failed"),
        Err(BackendError::Server {
            status: Some(500),
            message: "Generation failed".to_string(),
        })
    );
    assert_eq!(
        decode_body(200, r#"{"success": false}"#, "Generation failed"),
        Err(BackendError::Server {
            status: Some(200),
            message: "Generation failed".to_string(),
        })
    );
}

#[test]
fn backend_trims_trailing_slash() {
    let backend = HttpBackend::new("http://localhost:5000/", Duration::from_secs(5)).unwrap();
    assert_eq!(backend.base_url(), "http://localhost:5000");
}

#[test]
fn model_history_entries_tolerate_gaps() {
    let entry = crate::backend::ModelSummary::from_json(&json!({
        "id": 4,
        "ocr_id": 2,
        "grounded": true
    }))
    .unwrap();
    assert_eq!(entry.id, "4");
    assert_eq!(entry.ocr_id, Some(CorrelationId::new("2")));
    assert!(entry.filename.is_none());
    assert!(crate::backend::ModelSummary::from_json(&json!({"filename": "x.png"})).is_none());
}

#[test]
fn correlation_ids_keep_their_exact_text_on_the_wire() {
    assert_eq!(wire_id(&CorrelationId::new("12")), json!(12));
    assert_eq!(wire_id(&CorrelationId::new("-3")), json!(-3));
    assert_eq!(wire_id(&CorrelationId::new("007")), json!("007"));
    assert_eq!(wire_id(&CorrelationId::new("+5")), json!("+5"));
    assert_eq!(wire_id(&CorrelationId::new("-0")), json!("-0"));
    assert_eq!(wire_id(&CorrelationId::new("abc-9")), json!("abc-9"));
}
