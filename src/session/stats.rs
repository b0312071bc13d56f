use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who spoke a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeakerRole {
    User,
    Model,
}

/// One finalized utterance from a completed turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: SpeakerRole,
    pub text: String,
    /// When the turn containing this utterance completed.
    pub timestamp: DateTime<Utc>,
}

/// Statistics about a live session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Whether the session is currently active.
    pub is_active: bool,

    /// When the session started.
    pub started_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_secs: f64,

    /// Capture frames encoded and transmitted.
    pub frames_sent: usize,

    /// Capture frames dropped under outbound backpressure.
    pub frames_dropped: usize,

    /// Inbound audio chunks scheduled for playback.
    pub chunks_scheduled: usize,

    /// Inbound audio chunks rejected at the active-buffer cap.
    pub chunks_rejected: usize,

    /// Inbound audio chunks dropped for malformed framing.
    pub chunks_malformed: usize,

    /// Barge-in interruptions handled.
    pub interruptions: usize,

    /// Turns completed (transcript flushes).
    pub turns_completed: usize,
}
