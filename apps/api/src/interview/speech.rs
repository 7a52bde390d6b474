//! Speech capture backend seam.
//!
//! The host platform supplies the recognizer (browser, OS service, or a test
//! fake). The capture state machine only talks to it through [`SpeechBackend`].

use serde::Serialize;

use crate::interview::capture::CaptureError;

/// Answer to a microphone permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// The platform will answer later; the host resolves it on the session.
    Pending,
}

/// One recognition result. Interim segments may still change; final ones are settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechSegment {
    pub text: String,
    pub is_final: bool,
}

impl SpeechSegment {
    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }

    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }
}

/// Asynchronous error reported by the recognizer while a session is live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureFault {
    NotAllowed,
    ServiceNotAllowed,
    Other(String),
}

impl CaptureFault {
    /// Maps a recognizer error code such as `"not-allowed"` or `"network"`.
    pub fn from_code(code: &str) -> Self {
        match code {
            "not-allowed" => CaptureFault::NotAllowed,
            "service-not-allowed" => CaptureFault::ServiceNotAllowed,
            other => CaptureFault::Other(other.to_string()),
        }
    }

    /// Permission-class faults end the session; everything else is noise.
    pub fn is_permission(&self) -> bool {
        matches!(
            self,
            CaptureFault::NotAllowed | CaptureFault::ServiceNotAllowed
        )
    }

    pub fn code(&self) -> &str {
        match self {
            CaptureFault::NotAllowed => "not-allowed",
            CaptureFault::ServiceNotAllowed => "service-not-allowed",
            CaptureFault::Other(code) => code,
        }
    }
}

/// Continuous speech recognizer with interim results.
pub trait SpeechBackend: Send {
    /// Whether the platform has a recognizer at all.
    fn is_supported(&self) -> bool;

    fn request_permission(&mut self) -> PermissionStatus;

    fn start(&mut self) -> Result<(), CaptureError>;

    fn stop(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_codes() {
        assert_eq!(CaptureFault::from_code("not-allowed"), CaptureFault::NotAllowed);
        assert!(CaptureFault::from_code("service-not-allowed").is_permission());

        let network = CaptureFault::from_code("network");
        assert!(!network.is_permission());
        assert_eq!(network.code(), "network");
    }
}
