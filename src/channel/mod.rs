pub mod messages;
pub mod ws;

pub use messages::{OutboundAudio, ServerEvent, SessionSetup};
pub use ws::{WsChannel, WsConnector};

use anyhow::Result;

/// Duplex, message-oriented channel to the live conversational service.
///
/// Messages from the same channel arrive in order; `next_event` returning
/// `None` means the transport is gone.
#[async_trait::async_trait]
pub trait LiveChannel: Send {
    /// Send one captured frame of realtime audio.
    async fn send_audio(&mut self, audio: OutboundAudio) -> Result<()>;

    /// Receive the next inbound event.
    async fn next_event(&mut self) -> Option<ServerEvent>;

    /// Close the channel. Idempotent.
    async fn close(&mut self) -> Result<()>;
}

/// Opens a channel for a session, sending the setup parameters as part of
/// the handshake.
#[async_trait::async_trait]
pub trait ChannelConnector: Send {
    async fn connect(&mut self, setup: &SessionSetup) -> Result<Box<dyn LiveChannel>>;
}
