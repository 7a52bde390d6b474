// Oral interview capture: the speech backend seam and the recording state machine.
// The host owns the recognizer; answers are evaluated through flows::coaching.

pub mod capture;
pub mod speech;

pub use capture::{CaptureError, CaptureSnapshot, CaptureState, InterviewCapture, Notice, SegmentOutcome};
pub use speech::{CaptureFault, PermissionStatus, SpeechBackend, SpeechSegment};
