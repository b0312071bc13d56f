use super::stats::{SpeakerRole, TranscriptEntry};
use chrono::Utc;

/// Accumulates incremental transcript fragments per speaker role.
///
/// Has no knowledge of turn boundaries; the session controller decides when
/// to flush.
#[derive(Debug, Default)]
pub struct TranscriptAggregator {
    user: String,
    model: String,
}

impl TranscriptAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_user(&mut self, fragment: &str) {
        self.user.push_str(fragment);
    }

    pub fn append_model(&mut self, fragment: &str) {
        self.model.push_str(fragment);
    }

    /// Finalize the turn: emit the non-empty buffers in fixed order (user
    /// first, then model) and clear both. Empty buffers emit nothing.
    pub fn flush(&mut self) -> Vec<TranscriptEntry> {
        let mut entries = Vec::new();
        let timestamp = Utc::now();

        if !self.user.is_empty() {
            entries.push(TranscriptEntry {
                role: SpeakerRole::User,
                text: std::mem::take(&mut self.user),
                timestamp,
            });
        }

        if !self.model.is_empty() {
            entries.push(TranscriptEntry {
                role: SpeakerRole::Model,
                text: std::mem::take(&mut self.model),
                timestamp,
            });
        }

        entries
    }

    pub fn is_empty(&self) -> bool {
        self.user.is_empty() && self.model.is_empty()
    }
}
