use serde::{Deserialize, Serialize};

/// Session-open parameters sent once when the channel is established.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSetup {
    /// Target model identifier.
    pub model: String,
    /// Response modality requested from the service.
    pub response_modality: String,
    /// Prebuilt voice identifier.
    pub voice: String,
    /// Request transcription of user speech.
    pub input_transcription: bool,
    /// Request transcription of model speech.
    pub output_transcription: bool,
    /// Free-text behavioral preamble for the assistant persona.
    pub system_instruction: String,
}

/// Outbound realtime audio message, one per captured frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundAudio {
    /// Base64-encoded 16-bit PCM bytes.
    pub media: String,
    pub sample_rate: u32,
}

/// Inbound messages from the live service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A chunk of synthesized speech (base64 PCM, 24 kHz mono).
    AudioChunk { data: String },
    /// Previously queued speech is superseded and must stop audibly.
    Interrupted,
    /// Incremental transcript of the user's speech.
    UserTranscript { text: String },
    /// Incremental transcript of the model's speech.
    ModelTranscript { text: String },
    /// The current exchange is complete; transcripts should be finalized.
    TurnComplete,
    /// The service reported a fault.
    Error { detail: String },
    /// Orderly remote termination.
    Closed,
}
