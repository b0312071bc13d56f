pub mod config;
pub mod controller;
pub mod stats;
pub mod transcript;

pub use config::SessionConfig;
pub use controller::{LiveSession, SessionState, StopHandle};
pub use stats::{SessionStats, SpeakerRole, TranscriptEntry};
pub use transcript::TranscriptAggregator;
