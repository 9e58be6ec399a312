//! Named user commands executed against a [`Backend`] and a [`Session`].

use crate::backend::{Backend, BackendError, BackendStatus, CorrelationId, ModelSummary, SourceFile};
use crate::session::{FlowState, GenerationSummary, PendingReview, Result, Session};
use serde::Serialize;
use vaultgraph_core::NodeDetails;
use vaultgraph_render::{Canvas, ExportFormat, ExportPayload};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CheckConfig,
    Upload(SourceFile),
    EnterSchema(String),
    EditText(String),
    Confirm,
    Generate { grounded: bool },
    UploadKnowledge(SourceFile),
    Inspect(String),
    Reset,
    Fit,
    ZoomIn,
    ZoomOut,
    Export(ExportFormat),
    ListModels,
    OpenModel(String),
    Acknowledge,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::CheckConfig => "check_config",
            Command::Upload(_) => "upload",
            Command::EnterSchema(_) => "enter_schema",
            Command::EditText(_) => "edit_text",
            Command::Confirm => "confirm",
            Command::Generate { .. } => "generate",
            Command::UploadKnowledge(_) => "upload_knowledge",
            Command::Inspect(_) => "inspect",
            Command::Reset => "reset",
            Command::Fit => "fit",
            Command::ZoomIn => "zoom_in",
            Command::ZoomOut => "zoom_out",
            Command::Export(_) => "export",
            Command::ListModels => "list_models",
            Command::OpenModel(_) => "open_model",
            Command::Acknowledge => "acknowledge",
        }
    }
}

/// Whether an edited schema was written back before generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "persisted", content = "error", rename_all = "snake_case")]
pub enum Persisted {
    NotNeeded,
    Saved,
    /// The edit could not be stored; generation still proceeds with the confirmed id.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "data", rename_all = "snake_case")]
pub enum Outcome {
    Config(BackendStatus),
    Review(PendingReview),
    Confirmed {
        ocr_id: CorrelationId,
        persisted: Persisted,
    },
    Generated(GenerationSummary),
    KnowledgeStored,
    Details(NodeDetails),
    Redrawn,
    Zoom(f64),
    Exported(ExportPayload),
    Models(Vec<ModelSummary>),
    State(FlowState),
}

pub struct Dispatcher<B, C: Canvas> {
    backend: B,
    session: Session<C>,
}

impl<B: Backend, C: Canvas> Dispatcher<B, C> {
    pub fn new(backend: B, session: Session<C>) -> Self {
        Self { backend, session }
    }

    pub fn session(&self) -> &Session<C> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<C> {
        &mut self.session
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_parts(self) -> (B, Session<C>) {
        (self.backend, self.session)
    }

    pub async fn dispatch(&mut self, command: Command) -> Result<Outcome> {
        tracing::debug!(command = command.name(), "dispatch");
        match command {
            Command::CheckConfig => {
                let ticket = self.session.begin_status()?;
                let result = self.backend.check_config().await;
                Ok(Outcome::Config(self.session.finish_request(ticket, result)?))
            }
            Command::Upload(file) => {
                let ticket = self.session.begin_upload(&file)?;
                let result = self.backend.extract(&file).await;
                let pending = self.session.finish_upload(ticket, result)?;
                Ok(Outcome::Review(pending.clone()))
            }
            Command::EnterSchema(text) => {
                let ticket = self.session.begin_submit(&text)?;
                let result = self.backend.submit_schema(&text).await;
                let pending = self.session.finish_submit(ticket, result)?;
                Ok(Outcome::Review(pending.clone()))
            }
            Command::EditText(text) => Ok(Outcome::Review(self.session.edit(text)?.clone())),
            Command::Confirm => {
                let confirmation = self.session.confirm()?;
                let persisted = if confirmation.needs_persist {
                    match self
                        .backend
                        .update_schema(&confirmation.ocr_id, &confirmation.text)
                        .await
                    {
                        Ok(()) => Persisted::Saved,
                        Err(err) => {
                            tracing::warn!(ocr_id = %confirmation.ocr_id, error = %err, "failed to persist edited schema");
                            Persisted::Failed(err.to_string())
                        }
                    }
                } else {
                    Persisted::NotNeeded
                };
                Ok(Outcome::Confirmed {
                    ocr_id: confirmation.ocr_id,
                    persisted,
                })
            }
            Command::Generate { grounded } => {
                let ticket = self.session.begin_generate(grounded)?;
                let result = match ticket.ocr_id() {
                    Some(ocr_id) => self.backend.generate(ocr_id, grounded).await,
                    None => Err(BackendError::MalformedResponse {
                        message: "generation ticket has no correlation id".to_string(),
                    }),
                };
                Ok(Outcome::Generated(
                    self.session.finish_generate(ticket, result)?,
                ))
            }
            Command::UploadKnowledge(file) => {
                let ticket = self.session.begin_knowledge(&file)?;
                let result = self.backend.upload_knowledge(&file).await;
                self.session.finish_knowledge(ticket, result)?;
                Ok(Outcome::KnowledgeStored)
            }
            Command::Inspect(id) => Ok(Outcome::Details(self.session.inspect(&id)?)),
            Command::Reset => {
                self.session.reset()?;
                Ok(Outcome::Redrawn)
            }
            Command::Fit => {
                self.session.fit();
                Ok(Outcome::Zoom(self.session.canvas().zoom()))
            }
            Command::ZoomIn => Ok(Outcome::Zoom(self.session.zoom_in())),
            Command::ZoomOut => Ok(Outcome::Zoom(self.session.zoom_out())),
            Command::Export(format) => Ok(Outcome::Exported(self.session.export(format)?)),
            Command::ListModels => {
                let ticket = self.session.begin_history()?;
                let result = self.backend.list_models().await;
                Ok(Outcome::Models(self.session.finish_request(ticket, result)?))
            }
            Command::OpenModel(model_id) => {
                let ticket = self.session.begin_history()?;
                let result = self.backend.fetch_model(&model_id).await;
                let payload = self.session.finish_request(ticket, result)?;
                Ok(Outcome::Generated(
                    self.session.load(&payload, Some(model_id)),
                ))
            }
            Command::Acknowledge => Ok(Outcome::State(self.session.acknowledge().clone())),
        }
    }
}
