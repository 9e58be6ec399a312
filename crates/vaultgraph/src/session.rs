//! Interaction state for one user: the upload/review/generate flow, the current model and the
//! canvas it is drawn on.
//!
//! Every networked step is split in two. `begin_*` validates locally, marks the triggering
//! control busy and hands out a [`Ticket`]; the caller performs the collaborator call and passes
//! the ticket back to the matching `finish_*`. A control cannot be begun twice while its ticket is
//! outstanding, and a response whose ticket is no longer the latest for its lane is discarded as
//! [`SessionError::Stale`]. Uploads and manual schema submissions share one lane.
//!
//! The current model is replaced only after a payload has been fully sanitized and planned, so
//! readers (inspection, export) never observe a partial model.

use crate::backend::{
    ALLOWED_EXTENSIONS, BackendError, BackendResult, CorrelationId, Extraction, Generated,
    MAX_UPLOAD_BYTES, SourceFile,
};
use crate::config::SessionOptions;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use vaultgraph_core::{Model, ModelStats, NodeDetails, SanitizeStats, sanitize};
use vaultgraph_render::canvas::mount;
use vaultgraph_render::{Canvas, ExportFormat, ExportPayload, LayeredLayout, plan_layers};

pub const EMPTY_MODEL_WARNING: &str = "The generated model contains no nodes; nothing to render.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    Upload,
    Submit,
    Generate,
    Knowledge,
    Status,
    History,
}

impl Control {
    fn lane(self) -> usize {
        match self {
            Control::Upload | Control::Submit => 0,
            Control::Generate => 1,
            Control::Knowledge => 2,
            Control::Status => 3,
            Control::History => 4,
        }
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Control::Upload => "Upload",
            Control::Submit => "Schema submission",
            Control::Generate => "Generation",
            Control::Knowledge => "Knowledge upload",
            Control::Status => "Configuration check",
            Control::History => "Model history",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Upload,
    Generate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FlowState {
    Idle,
    Uploading,
    PendingReview,
    Confirmed,
    Generating,
    Rendered,
    Error { step: Step, message: String },
}

impl FlowState {
    pub fn name(&self) -> &'static str {
        match self {
            FlowState::Idle => "idle",
            FlowState::Uploading => "uploading",
            FlowState::PendingReview => "pending_review",
            FlowState::Confirmed => "confirmed",
            FlowState::Generating => "generating",
            FlowState::Rendered => "rendered",
            FlowState::Error { .. } => "error",
        }
    }
}

/// Extracted text awaiting user confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingReview {
    pub ocr_id: CorrelationId,
    pub original: String,
    pub edited: String,
}

impl PendingReview {
    pub fn is_edited(&self) -> bool {
        self.edited != self.original
    }
}

/// Result of confirming a review. When `needs_persist` is set the caller should store `text`
/// under `ocr_id`; failing to do so does not undo the confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Confirmation {
    pub ocr_id: CorrelationId,
    pub text: String,
    pub needs_persist: bool,
}

/// Proof that a control's call was begun; consumed by the matching `finish_*`.
#[derive(Debug, PartialEq, Eq)]
pub struct Ticket {
    control: Control,
    seq: u64,
    ocr_id: Option<CorrelationId>,
    grounded: bool,
}

impl Ticket {
    pub fn control(&self) -> Control {
        self.control
    }

    /// The correlation id a generation ticket was issued for.
    pub fn ocr_id(&self) -> Option<&CorrelationId> {
        self.ocr_id.as_ref()
    }

    pub fn grounded(&self) -> bool {
        self.grounded
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationSummary {
    pub model_id: Option<String>,
    pub stats: ModelStats,
    pub sanitize: SanitizeStats,
    /// Set when the payload produced no nodes; the previous model stays current.
    pub warning: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("{0}")]
    Validation(String),

    #[error("{control} is already in progress.")]
    ControlBusy { control: Control },

    #[error("{message}")]
    InvalidState { message: String },

    #[error("No model to {action}. Please generate a model first.")]
    NoModel { action: &'static str },

    #[error("Node not found: {id}")]
    UnknownNode { id: String },

    #[error("Discarded a stale {control} response.")]
    Stale { control: Control },

    #[error("{control} failed: {source}")]
    Backend {
        control: Control,
        #[source]
        source: BackendError,
    },

    #[error(transparent)]
    Export(#[from] vaultgraph_render::Error),
}

impl SessionError {
    fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Clone)]
struct Current {
    model: Model,
    layout: LayeredLayout,
    model_id: Option<String>,
}

pub struct Session<C: Canvas> {
    options: SessionOptions,
    canvas: C,
    state: FlowState,
    pending: Option<PendingReview>,
    confirmed: Option<CorrelationId>,
    current: Option<Current>,
    busy: HashSet<Control>,
    latest: [u64; 5],
    next_seq: u64,
}

impl<C: Canvas> Session<C> {
    pub fn new(canvas: C, options: SessionOptions) -> Self {
        Self {
            options,
            canvas,
            state: FlowState::Idle,
            pending: None,
            confirmed: None,
            current: None,
            busy: HashSet::new(),
            latest: [0; 5],
            next_seq: 0,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn pending(&self) -> Option<&PendingReview> {
        self.pending.as_ref()
    }

    pub fn confirmed_id(&self) -> Option<&CorrelationId> {
        self.confirmed.as_ref()
    }

    pub fn model(&self) -> Option<&Model> {
        self.current.as_ref().map(|c| &c.model)
    }

    pub fn layout(&self) -> Option<&LayeredLayout> {
        self.current.as_ref().map(|c| &c.layout)
    }

    /// Server-side id of the current model, when it came from the generation service.
    pub fn model_id(&self) -> Option<&str> {
        self.current.as_ref().and_then(|c| c.model_id.as_deref())
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut C {
        &mut self.canvas
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn is_busy(&self, control: Control) -> bool {
        self.busy.contains(&control)
    }

    fn issue(
        &mut self,
        control: Control,
        ocr_id: Option<CorrelationId>,
        grounded: bool,
    ) -> Result<Ticket> {
        if !self.busy.insert(control) {
            return Err(SessionError::ControlBusy { control });
        }
        self.next_seq += 1;
        self.latest[control.lane()] = self.next_seq;
        tracing::debug!(%control, seq = self.next_seq, "control busy");
        Ok(Ticket {
            control,
            seq: self.next_seq,
            ocr_id,
            grounded,
        })
    }

    /// Releases the ticket's control and reports whether the ticket is still the latest.
    fn settle(&mut self, ticket: &Ticket) -> Result<()> {
        self.busy.remove(&ticket.control);
        if self.latest[ticket.control.lane()] != ticket.seq {
            tracing::warn!(control = %ticket.control, seq = ticket.seq, "discarding stale response");
            return Err(SessionError::Stale {
                control: ticket.control,
            });
        }
        Ok(())
    }

    fn transition(&mut self, next: FlowState) {
        if self.state != next {
            tracing::info!(from = self.state.name(), to = next.name(), "flow state");
            self.state = next;
        }
    }

    pub fn begin_upload(&mut self, file: &SourceFile) -> Result<Ticket> {
        validate_source(file)?;
        let ticket = self.issue(Control::Upload, None, false)?;
        self.transition(FlowState::Uploading);
        Ok(ticket)
    }

    pub fn finish_upload(
        &mut self,
        ticket: Ticket,
        result: BackendResult<Extraction>,
    ) -> Result<&PendingReview> {
        self.finish_review(ticket, result)
    }

    /// Starts manual schema entry; the text follows the same review path as an upload.
    pub fn begin_submit(&mut self, text: &str) -> Result<Ticket> {
        if text.trim().is_empty() {
            return Err(SessionError::Validation(
                "Please enter schema text.".to_string(),
            ));
        }
        let ticket = self.issue(Control::Submit, None, false)?;
        self.transition(FlowState::Uploading);
        Ok(ticket)
    }

    pub fn finish_submit(
        &mut self,
        ticket: Ticket,
        result: BackendResult<Extraction>,
    ) -> Result<&PendingReview> {
        self.finish_review(ticket, result)
    }

    fn finish_review(
        &mut self,
        ticket: Ticket,
        result: BackendResult<Extraction>,
    ) -> Result<&PendingReview> {
        self.settle(&ticket)?;
        match result {
            Ok(extraction) => {
                tracing::debug!(ocr_id = %extraction.ocr_id, chars = extraction.text.len(), "extraction received");
                self.transition(FlowState::PendingReview);
                Ok(self.pending.insert(PendingReview {
                    ocr_id: extraction.ocr_id,
                    original: extraction.text.clone(),
                    edited: extraction.text,
                }))
            }
            Err(source) => {
                self.transition(FlowState::Error {
                    step: Step::Upload,
                    message: source.to_string(),
                });
                Err(SessionError::Backend {
                    control: ticket.control,
                    source,
                })
            }
        }
    }

    /// Replaces the reviewed text. Only valid while a review is pending.
    pub fn edit(&mut self, text: impl Into<String>) -> Result<&PendingReview> {
        match (&self.state, self.pending.as_mut()) {
            (FlowState::PendingReview, Some(pending)) => {
                pending.edited = text.into();
                Ok(pending)
            }
            _ => Err(SessionError::invalid_state(
                "There is no extracted schema to edit.",
            )),
        }
    }

    pub fn confirm(&mut self) -> Result<Confirmation> {
        if self.state != FlowState::PendingReview {
            return Err(SessionError::invalid_state(
                "There is no extracted schema to confirm.",
            ));
        }
        let Some(pending) = self.pending.as_ref() else {
            return Err(SessionError::invalid_state(
                "There is no extracted schema to confirm.",
            ));
        };
        if pending.edited.trim().is_empty() {
            return Err(SessionError::Validation(
                "Schema text cannot be empty.".to_string(),
            ));
        }
        let confirmation = Confirmation {
            ocr_id: pending.ocr_id.clone(),
            text: pending.edited.clone(),
            needs_persist: pending.is_edited(),
        };
        self.pending = None;
        self.confirmed = Some(confirmation.ocr_id.clone());
        self.transition(FlowState::Confirmed);
        Ok(confirmation)
    }

    /// Resumes from an extraction confirmed earlier, e.g. in another process.
    pub fn confirm_existing(&mut self, ocr_id: CorrelationId) {
        self.pending = None;
        self.confirmed = Some(ocr_id);
        self.transition(FlowState::Confirmed);
    }

    pub fn begin_generate(&mut self, grounded: bool) -> Result<Ticket> {
        let ready = matches!(
            self.state,
            FlowState::Confirmed
                | FlowState::Rendered
                | FlowState::Error {
                    step: Step::Generate,
                    ..
                }
        );
        let Some(ocr_id) = self.confirmed.clone().filter(|_| ready) else {
            return Err(SessionError::invalid_state(
                "Please upload and confirm a schema first.",
            ));
        };
        let ticket = self.issue(Control::Generate, Some(ocr_id), grounded)?;
        self.transition(FlowState::Generating);
        Ok(ticket)
    }

    /// Applies a generation result. On failure the previous model stays current.
    pub fn finish_generate(
        &mut self,
        ticket: Ticket,
        result: BackendResult<Generated>,
    ) -> Result<GenerationSummary> {
        self.settle(&ticket)?;
        if ticket.ocr_id != self.confirmed {
            tracing::warn!("discarding generation for a superseded extraction");
            return Err(SessionError::Stale {
                control: ticket.control,
            });
        }
        let generating = self.state == FlowState::Generating;
        match result {
            Ok(generated) => {
                let summary = self.install(&generated.payload, generated.model_id);
                if generating {
                    self.transition(if summary.warning.is_some() {
                        FlowState::Confirmed
                    } else {
                        FlowState::Rendered
                    });
                }
                Ok(summary)
            }
            Err(source) => {
                if generating {
                    self.transition(FlowState::Error {
                        step: Step::Generate,
                        message: source.to_string(),
                    });
                }
                Err(SessionError::Backend {
                    control: ticket.control,
                    source,
                })
            }
        }
    }

    /// Shows a stored model payload, e.g. one fetched from the model history.
    ///
    /// The flow moves to `Rendered` unless a review or a network step is under way.
    pub fn load(&mut self, payload: &Value, model_id: Option<String>) -> GenerationSummary {
        let summary = self.install(payload, model_id);
        let settled = matches!(
            self.state,
            FlowState::Idle | FlowState::Confirmed | FlowState::Rendered | FlowState::Error { .. }
        );
        if summary.warning.is_none() && settled {
            self.transition(FlowState::Rendered);
        }
        summary
    }

    /// Sanitizes `payload` and, if it has nodes, makes it the current model and draws it.
    ///
    /// An empty result leaves the previous model in place and reports a warning instead.
    fn install(&mut self, payload: &Value, model_id: Option<String>) -> GenerationSummary {
        let report = sanitize(payload);
        let sanitize_stats = report.stats();
        let model = report.into_model();
        let stats = model.stats();
        if model.is_empty() {
            tracing::warn!("{EMPTY_MODEL_WARNING}");
            return GenerationSummary {
                model_id,
                stats,
                sanitize: sanitize_stats,
                warning: Some(EMPTY_MODEL_WARNING.to_string()),
            };
        }
        let layout = plan_layers(&model, self.options.viewport_width, &self.options.planner);
        mount(&mut self.canvas, &model, &layout);
        self.canvas.fit(self.options.fit_padding);
        tracing::info!(%stats, "model rendered");
        self.current = Some(Current {
            model,
            layout,
            model_id: model_id.clone(),
        });
        GenerationSummary {
            model_id,
            stats,
            sanitize: sanitize_stats,
            warning: None,
        }
    }

    /// Leaves the error state: upload errors return to idle, generation errors to confirmed.
    pub fn acknowledge(&mut self) -> &FlowState {
        if let FlowState::Error { step, .. } = &self.state {
            let next = match step {
                Step::Upload => FlowState::Idle,
                Step::Generate => FlowState::Confirmed,
            };
            self.transition(next);
        }
        &self.state
    }

    pub fn begin_knowledge(&mut self, file: &SourceFile) -> Result<Ticket> {
        if file.name.trim().is_empty() || file.bytes.is_empty() {
            return Err(SessionError::Validation(
                "Please select a knowledge document.".to_string(),
            ));
        }
        self.issue(Control::Knowledge, None, false)
    }

    pub fn finish_knowledge(&mut self, ticket: Ticket, result: BackendResult<()>) -> Result<()> {
        self.settle(&ticket)?;
        result.map_err(|source| SessionError::Backend {
            control: ticket.control,
            source,
        })
    }

    pub fn begin_status(&mut self) -> Result<Ticket> {
        self.issue(Control::Status, None, false)
    }

    pub fn begin_history(&mut self) -> Result<Ticket> {
        self.issue(Control::History, None, false)
    }

    /// Settles a configuration check or history lookup; neither touches the flow state.
    pub fn finish_request<T>(&mut self, ticket: Ticket, result: BackendResult<T>) -> Result<T> {
        self.settle(&ticket)?;
        result.map_err(|source| SessionError::Backend {
            control: ticket.control,
            source,
        })
    }

    pub fn inspect(&self, id: &str) -> Result<NodeDetails> {
        let model = self.model().ok_or(SessionError::NoModel { action: "inspect" })?;
        model
            .node(id)
            .map(NodeDetails::of)
            .ok_or_else(|| SessionError::UnknownNode { id: id.to_string() })
    }

    /// Re-plans and redraws the current model, discarding any manual node moves.
    pub fn reset(&mut self) -> Result<()> {
        let current = self
            .current
            .as_mut()
            .ok_or(SessionError::NoModel { action: "reset" })?;
        current.layout = plan_layers(
            &current.model,
            self.options.viewport_width,
            &self.options.planner,
        );
        mount(&mut self.canvas, &current.model, &current.layout);
        self.canvas.fit(self.options.fit_padding);
        Ok(())
    }

    pub fn fit(&mut self) {
        self.canvas.fit(self.options.fit_padding);
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.zoom_by(self.options.zoom_step)
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.zoom_by(1.0 / self.options.zoom_step)
    }

    fn zoom_by(&mut self, factor: f64) -> f64 {
        let level = self.canvas.zoom() * factor;
        self.canvas.set_zoom(level);
        self.canvas.center();
        self.canvas.zoom()
    }

    pub fn export(&self, format: ExportFormat) -> Result<ExportPayload> {
        let model = self.model().ok_or(SessionError::NoModel { action: "export" })?;
        Ok(vaultgraph_render::export(model, format)?)
    }
}

fn validate_source(file: &SourceFile) -> Result<()> {
    if file.name.trim().is_empty() || file.bytes.is_empty() {
        return Err(SessionError::Validation(
            "Please select a file first.".to_string(),
        ));
    }
    let allowed = file
        .extension()
        .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()));
    if !allowed {
        return Err(SessionError::Validation(
            "Invalid file type. Allowed: PNG, JPG, JPEG, PDF, GIF".to_string(),
        ));
    }
    if file.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(SessionError::Validation(
            "File is too large (maximum 16 MB).".to_string(),
        ));
    }
    Ok(())
}
