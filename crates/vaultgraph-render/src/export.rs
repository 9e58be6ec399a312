use crate::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use vaultgraph_core::Model;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
    DrawIo,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Json, ExportFormat::Csv, ExportFormat::DrawIo];

    pub fn file_name(self) -> &'static str {
        match self {
            ExportFormat::Json => "data_vault_model.json",
            ExportFormat::Csv => "data_vault_model.csv",
            ExportFormat::DrawIo => "data_vault_model.drawio",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
            ExportFormat::DrawIo => "application/xml",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "drawio" | "draw.io" | "diagram" => Ok(Self::DrawIo),
            other => Err(Error::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::DrawIo => "drawio",
        })
    }
}

/// A complete, self-contained export ready to be written under `file_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub format: ExportFormat,
    pub file_name: &'static str,
    pub mime_type: &'static str,
    pub content: String,
}

impl ExportPayload {
    pub fn new(format: ExportFormat, content: String) -> Self {
        Self {
            format,
            file_name: format.file_name(),
            mime_type: format.mime_type(),
            content,
        }
    }
}

/// Lossless structured dump of the model.
pub fn to_json(model: &Model) -> Result<String> {
    let mut text = serde_json::to_string_pretty(model)?;
    text.push('\n');
    Ok(text)
}

pub fn export(model: &Model, format: ExportFormat) -> Result<ExportPayload> {
    let content = match format {
        ExportFormat::Json => to_json(model)?,
        ExportFormat::Csv => crate::csv::to_csv(model),
        ExportFormat::DrawIo => crate::drawio::to_drawio(model),
    };
    tracing::debug!(%format, bytes = content.len(), "exported model");
    Ok(ExportPayload::new(format, content))
}
