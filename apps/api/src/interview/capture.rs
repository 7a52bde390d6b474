//! Oral interview capture session.
//!
//! [`InterviewCapture`] owns one speech backend and turns its events into a
//! transcript the host can submit for evaluation:
//!
//! ```text
//! Idle ──mount──▶ PermissionPending ──granted──▶ Ready ⇄ Recording
//!                                   ──denied───▶ Denied
//! Idle ──mount (unsupported)──▶ Denied
//! Recording ──permission fault──▶ Denied
//! ```
//!
//! Denied is terminal for the session. The session is single-owner; the host
//! drives it with `&mut self` calls from its event loop.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::flows::contracts::{call, OralFluencyPromptRequest};
use crate::flows::registry::{FlowError, FlowExecutor};
use crate::interview::speech::{CaptureFault, PermissionStatus, SpeechBackend, SpeechSegment};

// ────────────────────────────────────────────────────────────────────────────
// State, errors, notices
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureState {
    #[default]
    Idle,
    PermissionPending,
    Ready,
    Recording,
    Denied,
}

impl CaptureState {
    pub fn label(self) -> &'static str {
        match self {
            CaptureState::Idle => "Idle",
            CaptureState::PermissionPending => "Waiting for microphone",
            CaptureState::Ready => "Ready",
            CaptureState::Recording => "Recording",
            CaptureState::Denied => "Microphone unavailable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("microphone permission was denied")]
    PermissionDenied,

    #[error("speech capture is not supported on this device")]
    CaptureUnavailable,

    #[error("capture is not ready ({0})")]
    NotReady(&'static str),

    #[error("a recording is already in progress")]
    AlreadyRecording,

    #[error("no recording is in progress")]
    NotRecording,

    #[error("speech backend error: {0}")]
    Backend(String),
}

/// User-facing messages raised by the session, drained by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    Unsupported,
    PermissionDenied,
    PermissionRevoked,
    PromptUnavailable,
}

impl Notice {
    pub fn message(self) -> &'static str {
        match self {
            Notice::Unsupported => "Speech recognition is not supported on this device.",
            Notice::PermissionDenied => {
                "Please enable microphone permissions to start your practice session."
            }
            Notice::PermissionRevoked => {
                "Microphone access was revoked. Recording has been stopped."
            }
            Notice::PromptUnavailable => "Could not load a new prompt. Please try again.",
        }
    }
}

/// What happened to an incoming segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentOutcome {
    Accepted,
    Interim,
    Ignored,
}

/// Read-only view for the host UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSnapshot {
    pub state: CaptureState,
    pub prompt: Option<String>,
    pub prompt_loading: bool,
    pub transcript: String,
    pub interim: Option<String>,
    pub elapsed: String,
    pub can_start: bool,
    pub status_line: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Session
// ────────────────────────────────────────────────────────────────────────────

pub struct InterviewCapture<B: SpeechBackend> {
    backend: B,
    state: CaptureState,
    transcript: String,
    interim: Option<String>,
    elapsed_secs: u32,
    prompt: Option<String>,
    fixed_prompt: bool,
    prompt_loading: bool,
    notices: Vec<Notice>,
}

impl<B: SpeechBackend> InterviewCapture<B> {
    /// A practice session whose prompt comes from `getOralFluencyPrompt`.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: CaptureState::Idle,
            transcript: String::new(),
            interim: None,
            elapsed_secs: 0,
            prompt: None,
            fixed_prompt: false,
            prompt_loading: false,
            notices: Vec::new(),
        }
    }

    /// A session answering a prompt supplied by the host (e.g. an interview question).
    pub fn with_prompt(backend: B, prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            fixed_prompt: true,
            ..Self::new(backend)
        }
    }

    /// Detects capability and asks for permission. Only acts from `Idle`.
    pub fn mount(&mut self) -> CaptureState {
        if self.state != CaptureState::Idle {
            return self.state;
        }

        if !self.backend.is_supported() {
            warn!("speech capture unsupported; session disabled");
            self.state = CaptureState::Denied;
            self.notices.push(Notice::Unsupported);
            return self.state;
        }

        self.state = CaptureState::PermissionPending;
        match self.backend.request_permission() {
            PermissionStatus::Granted => self.resolve_permission(true),
            PermissionStatus::Denied => self.resolve_permission(false),
            PermissionStatus::Pending => debug!("microphone permission pending"),
        }
        self.state
    }

    /// Applies a permission answer. Ignored unless the request is still pending.
    pub fn resolve_permission(&mut self, granted: bool) {
        if self.state != CaptureState::PermissionPending {
            return;
        }
        if granted {
            info!("microphone permission granted");
            self.state = CaptureState::Ready;
        } else {
            info!("microphone permission denied");
            self.state = CaptureState::Denied;
            self.notices.push(Notice::PermissionDenied);
        }
    }

    pub fn start(&mut self) -> Result<(), CaptureError> {
        match self.state {
            CaptureState::Ready => {}
            CaptureState::Recording => return Err(CaptureError::AlreadyRecording),
            CaptureState::Denied => {
                self.notices.push(Notice::PermissionDenied);
                return Err(CaptureError::PermissionDenied);
            }
            other => return Err(CaptureError::NotReady(other.label())),
        }
        if self.prompt_loading {
            return Err(CaptureError::NotReady("prompt is loading"));
        }

        self.backend.start()?;
        self.transcript.clear();
        self.interim = None;
        self.elapsed_secs = 0;
        self.state = CaptureState::Recording;
        info!("recording started");
        Ok(())
    }

    /// Stops capture. The transcript and elapsed time are kept.
    pub fn stop(&mut self) -> Result<(), CaptureError> {
        if self.state != CaptureState::Recording {
            return Err(CaptureError::NotRecording);
        }
        self.backend.stop();
        self.interim = None;
        self.state = CaptureState::Ready;
        info!(
            "recording stopped after {} ({} chars)",
            self.elapsed_label(),
            self.transcript.len()
        );
        Ok(())
    }

    /// One-second cadence from the host timer.
    pub fn tick(&mut self) {
        if self.state == CaptureState::Recording {
            self.elapsed_secs += 1;
        }
    }

    pub fn on_segment(&mut self, segment: SpeechSegment) -> SegmentOutcome {
        if self.state != CaptureState::Recording {
            debug!("segment ignored outside recording");
            return SegmentOutcome::Ignored;
        }

        let text = segment.text.trim();
        if !segment.is_final {
            self.interim = (!text.is_empty()).then(|| text.to_string());
            return SegmentOutcome::Interim;
        }
        if text.is_empty() {
            return SegmentOutcome::Ignored;
        }

        let joined = match self.transcript.trim_end() {
            "" => text.to_string(),
            prev => format!("{prev} {text}"),
        };
        self.transcript = joined;
        self.interim = None;
        SegmentOutcome::Accepted
    }

    /// Permission-class faults end the session; others are logged and dropped.
    pub fn on_capture_error(&mut self, fault: CaptureFault) {
        if !fault.is_permission() {
            warn!("speech capture error ignored: {}", fault.code());
            return;
        }
        warn!("speech capture permission lost: {}", fault.code());
        if self.state == CaptureState::Recording {
            self.backend.stop();
        }
        self.interim = None;
        self.state = CaptureState::Denied;
        self.notices.push(Notice::PermissionRevoked);
    }

    // ── prompt refresh ──────────────────────────────────────────────────────

    /// Clears the transcript and marks a prompt fetch in flight.
    /// Returns `false` for fixed-prompt sessions, which never refresh.
    pub fn begin_prompt_refresh(&mut self) -> Result<bool, CaptureError> {
        if self.state == CaptureState::Recording {
            return Err(CaptureError::AlreadyRecording);
        }
        if self.fixed_prompt {
            return Ok(false);
        }
        self.transcript.clear();
        self.interim = None;
        self.prompt_loading = true;
        Ok(true)
    }

    /// On failure the previous prompt stays and a notice is raised.
    pub fn finish_prompt_refresh(&mut self, result: Result<String, FlowError>) {
        self.prompt_loading = false;
        match result {
            Ok(prompt) => self.prompt = Some(prompt),
            Err(err) => {
                warn!("prompt refresh failed: {}", err);
                self.notices.push(Notice::PromptUnavailable);
            }
        }
    }

    /// Fetches a fresh practice prompt. Returns whether a fetch was made.
    pub async fn refresh_prompt(&mut self, executor: &FlowExecutor) -> Result<bool, CaptureError> {
        if !self.begin_prompt_refresh()? {
            return Ok(false);
        }
        let result = call(executor, &OralFluencyPromptRequest {})
            .await
            .map(|response| response.prompt);
        self.finish_prompt_refresh(result);
        Ok(true)
    }

    // ── accessors ───────────────────────────────────────────────────────────

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn interim(&self) -> Option<&str> {
        self.interim.as_deref()
    }

    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    pub fn is_prompt_loading(&self) -> bool {
        self.prompt_loading
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn elapsed_label(&self) -> String {
        format!("{:02}:{:02}", self.elapsed_secs / 60, self.elapsed_secs % 60)
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn can_start(&self) -> bool {
        self.state == CaptureState::Ready && !self.prompt_loading
    }

    pub fn snapshot(&self) -> CaptureSnapshot {
        let status_line = match self.state {
            CaptureState::Recording => format!("Recording... ({})", self.elapsed_label()),
            CaptureState::Ready => "Click to start recording".to_string(),
            _ => "Microphone access needed".to_string(),
        };
        CaptureSnapshot {
            state: self.state,
            prompt: self.prompt.clone(),
            prompt_loading: self.prompt_loading,
            transcript: self.transcript.clone(),
            interim: self.interim.clone(),
            elapsed: self.elapsed_label(),
            can_start: self.can_start(),
            status_line,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
