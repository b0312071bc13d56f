use thiserror::Error;

/// Errors surfaced by a live voice session.
///
/// `MalformedPayload` is recovered locally (the offending chunk is dropped);
/// every other kind ends the session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Microphone or output device could not be opened.
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The duplex channel handshake failed.
    #[error("failed to open live channel: {0}")]
    ChannelOpenFailure(String),

    /// An inbound audio payload had invalid framing.
    #[error("malformed audio payload: {0}")]
    MalformedPayload(String),

    /// The channel faulted mid-session.
    #[error("live channel error: {0}")]
    ChannelRuntimeError(String),

    /// An operation was attempted in a state that does not allow it.
    #[error("invalid session state: {0}")]
    InvalidState(&'static str),
}
