pub mod capture;
pub mod codec;
pub mod output;
pub mod playback;

pub use capture::{AudioFrame, CaptureBackend, CaptureConfig, CpalCapture};
pub use output::CpalPlayback;
pub use playback::{PlaybackScheduler, PlaybackSink, MAX_ACTIVE_BUFFERS, PLAYBACK_SAMPLE_RATE};
