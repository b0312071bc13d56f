pub mod audio;
pub mod channel;
pub mod config;
pub mod error;
pub mod session;

pub use audio::{
    AudioFrame, CaptureBackend, CaptureConfig, CpalCapture, CpalPlayback, PlaybackScheduler,
    PlaybackSink, MAX_ACTIVE_BUFFERS, PLAYBACK_SAMPLE_RATE,
};
pub use channel::{
    ChannelConnector, LiveChannel, OutboundAudio, ServerEvent, SessionSetup, WsChannel, WsConnector,
};
pub use config::Config;
pub use error::SessionError;
pub use session::{
    LiveSession, SessionConfig, SessionState, SessionStats, SpeakerRole, StopHandle,
    TranscriptAggregator, TranscriptEntry,
};
