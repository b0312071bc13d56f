use super::messages::{OutboundAudio, ServerEvent, SessionSetup};
use super::{ChannelConnector, LiveChannel};
use anyhow::{Context, Result};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Websocket transport for the live service.
pub struct WsChannel {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
    closed: bool,
}

impl WsChannel {
    /// Connect and send the session-setup message.
    pub async fn connect(url: &str, setup: &SessionSetup) -> Result<Self> {
        info!("Connecting to live service at {}", url);

        let (ws, _response) = tokio_tungstenite::connect_async(url)
            .await
            .context("Failed to connect to live service")?;

        let (mut sink, stream) = ws.split();

        let payload = serde_json::to_string(setup)?;
        sink.send(Message::Text(payload))
            .await
            .context("Failed to send session setup")?;

        info!(
            "Live channel open (model={}, voice={})",
            setup.model, setup.voice
        );

        Ok(Self {
            sink,
            stream,
            closed: false,
        })
    }
}

/// Connector producing websocket channels for a fixed service URL.
pub struct WsConnector {
    pub url: String,
}

#[async_trait::async_trait]
impl ChannelConnector for WsConnector {
    async fn connect(&mut self, setup: &SessionSetup) -> Result<Box<dyn LiveChannel>> {
        let channel = WsChannel::connect(&self.url, setup).await?;
        Ok(Box::new(channel))
    }
}

#[async_trait::async_trait]
impl LiveChannel for WsChannel {
    async fn send_audio(&mut self, audio: OutboundAudio) -> Result<()> {
        let payload = serde_json::to_string(&audio)?;
        self.sink
            .send(Message::Text(payload))
            .await
            .context("Failed to send realtime audio")
    }

    async fn next_event(&mut self) -> Option<ServerEvent> {
        while let Some(message) = self.stream.next().await {
            match message {
                Ok(Message::Text(text)) => match serde_json::from_str::<ServerEvent>(&text) {
                    Ok(event) => return Some(event),
                    Err(e) => {
                        // Transport-level noise, not a session fault.
                        warn!("Ignoring unparseable channel message: {}", e);
                    }
                },
                Ok(Message::Close(_)) => return Some(ServerEvent::Closed),
                Ok(_) => continue,
                Err(e) => {
                    return Some(ServerEvent::Error {
                        detail: e.to_string(),
                    })
                }
            }
        }

        None
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        // The remote may already be gone; a failed close handshake is fine.
        if let Err(e) = self.sink.send(Message::Close(None)).await {
            warn!("Close handshake failed: {}", e);
        }

        info!("Live channel closed");
        Ok(())
    }
}
