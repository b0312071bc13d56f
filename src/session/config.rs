use crate::channel::SessionSetup;
use serde::{Deserialize, Serialize};

/// Configuration for a live voice session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique session identifier (e.g. "live-<uuid>").
    pub session_id: String,

    /// Websocket URL of the live service.
    pub url: String,

    /// Target model identifier.
    pub model: String,

    /// Prebuilt voice identifier.
    pub voice: String,

    /// Behavioral preamble for the assistant persona.
    pub preamble: String,

    /// Capture sample rate in Hz (the service expects 16 kHz input).
    pub capture_sample_rate: u32,

    /// Playback sample rate in Hz (the service sends 24 kHz audio).
    pub playback_sample_rate: u32,

    /// Samples per capture frame.
    pub frame_samples: usize,

    /// Bounded capture queue depth; frames beyond it are dropped.
    pub capture_queue_capacity: usize,
}

impl SessionConfig {
    /// Session-open parameters derived from this configuration. Audio
    /// responses with transcription of both sides, always.
    pub fn setup(&self) -> SessionSetup {
        SessionSetup {
            model: self.model.clone(),
            response_modality: "audio".to_string(),
            voice: self.voice.clone(),
            input_transcription: true,
            output_transcription: true,
            system_instruction: self.preamble.clone(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("live-{}", uuid::Uuid::new_v4()),
            url: "wss://localhost:8443/live".to_string(),
            model: "gemini-2.5-flash-native-audio-preview-09-2025".to_string(),
            voice: "Zephyr".to_string(),
            preamble: "You are a warm, human-like voice assistant called Aetheris. \
                       You speak fluently and empathetically."
                .to_string(),
            capture_sample_rate: 16000,
            playback_sample_rate: 24000,
            frame_samples: 4096,
            capture_queue_capacity: 32,
        }
    }
}
