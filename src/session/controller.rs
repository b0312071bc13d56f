use super::config::SessionConfig;
use super::stats::{SessionStats, SpeakerRole, TranscriptEntry};
use super::transcript::TranscriptAggregator;
use crate::audio::capture::{AudioFrame, CaptureBackend};
use crate::audio::codec;
use crate::audio::playback::{PlaybackScheduler, PlaybackSink};
use crate::channel::{ChannelConnector, LiveChannel, OutboundAudio, ServerEvent};
use crate::error::SessionError;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::Notify;
use tracing::{error, info, warn};

/// Lifecycle state of a live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Active,
    Closing,
}

/// Requests a stop from outside the event loop.
///
/// Safe to invoke from any task and at any time; stopping an idle session is
/// a no-op.
#[derive(Debug, Clone)]
pub struct StopHandle {
    requested: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl StopHandle {
    pub fn request_stop(&self) {
        self.requested.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }
}

enum Dispatch {
    Continue,
    Shutdown(Result<(), SessionError>),
}

/// The session controller: owns the channel, capture backend, playback
/// scheduler, and transcript aggregator, and drives all of them from a
/// single event-handling loop.
pub struct LiveSession {
    config: SessionConfig,
    state: SessionState,
    capture: Box<dyn CaptureBackend>,
    connector: Box<dyn ChannelConnector>,
    channel: Option<Box<dyn LiveChannel>>,
    capture_rx: Option<mpsc::Receiver<AudioFrame>>,
    scheduler: PlaybackScheduler,
    aggregator: TranscriptAggregator,
    transcript_log: Vec<TranscriptEntry>,
    started_at: chrono::DateTime<Utc>,
    frames_sent: usize,
    interruptions: usize,
    chunks_malformed: usize,
    turns_completed: usize,
    stop_requested: Arc<AtomicBool>,
    stop_notify: Arc<Notify>,
}

impl LiveSession {
    pub fn new(
        config: SessionConfig,
        capture: Box<dyn CaptureBackend>,
        connector: Box<dyn ChannelConnector>,
        sink: Box<dyn PlaybackSink>,
    ) -> Self {
        let scheduler = PlaybackScheduler::new(sink, config.playback_sample_rate);

        Self {
            config,
            state: SessionState::Idle,
            capture,
            connector,
            channel: None,
            capture_rx: None,
            scheduler,
            aggregator: TranscriptAggregator::new(),
            transcript_log: Vec::new(),
            started_at: Utc::now(),
            frames_sent: 0,
            interruptions: 0,
            chunks_malformed: 0,
            turns_completed: 0,
            stop_requested: Arc::new(AtomicBool::new(false)),
            stop_notify: Arc::new(Notify::new()),
        }
    }

    /// Acquire the capture device and open the channel. On any failure the
    /// session returns to `Idle` with nothing held.
    pub async fn start(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::InvalidState(
                "start() is only valid on an idle session",
            ));
        }

        info!("Starting live session: {}", self.config.session_id);
        self.state = SessionState::Connecting;

        let capture_rx = match self.capture.start().await {
            Ok(rx) => rx,
            Err(e) => {
                self.state = SessionState::Idle;
                return Err(SessionError::DeviceUnavailable(e.to_string()));
            }
        };

        let setup = self.config.setup();
        match self.connector.connect(&setup).await {
            Ok(channel) => self.channel = Some(channel),
            Err(e) => {
                if let Err(stop_err) = self.capture.stop().await {
                    warn!("Failed to release capture after failed connect: {}", stop_err);
                }
                self.state = SessionState::Idle;
                return Err(SessionError::ChannelOpenFailure(e.to_string()));
            }
        }

        self.capture_rx = Some(capture_rx);
        self.started_at = Utc::now();
        self.stop_requested.store(false, Ordering::SeqCst);
        self.state = SessionState::Active;

        info!("Live session active: {}", self.config.session_id);
        Ok(())
    }

    /// Drive the session until it is stopped, the remote closes, or the
    /// channel faults. Always tears down before returning; a channel fault
    /// is surfaced after teardown.
    pub async fn run(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Active {
            return Err(SessionError::InvalidState("run() requires an active session"));
        }

        let mut channel = self
            .channel
            .take()
            .ok_or(SessionError::InvalidState("active session without a channel"))?;
        let mut capture_rx = self
            .capture_rx
            .take()
            .ok_or(SessionError::InvalidState("active session without capture"))?;

        let notify = Arc::clone(&self.stop_notify);
        let mut capture_open = true;

        let outcome = loop {
            if self.stop_requested.load(Ordering::SeqCst) {
                info!("Stop requested");
                break Ok(());
            }

            tokio::select! {
                _ = notify.notified() => {
                    info!("Stop requested");
                    break Ok(());
                }

                frame = capture_rx.recv(), if capture_open => match frame {
                    Some(frame) => {
                        if let Err(e) = self.transmit_frame(&mut *channel, frame).await {
                            break Err(e);
                        }
                    }
                    None => {
                        warn!("Capture stream ended");
                        capture_open = false;
                    }
                },

                event = channel.next_event() => match event {
                    Some(event) => match self.dispatch(event) {
                        Dispatch::Continue => {}
                        Dispatch::Shutdown(result) => break result,
                    },
                    None => {
                        info!("Channel transport ended");
                        break Ok(());
                    }
                },
            }
        };

        drop(capture_rx);
        self.teardown(Some(channel)).await;
        outcome
    }

    /// Stop the session and release every held resource. Valid in any state;
    /// stopping an idle session is a no-op.
    pub async fn stop(&mut self) {
        if self.state == SessionState::Idle {
            return;
        }
        self.teardown(None).await;
    }

    /// Handle for requesting a stop while `run()` owns the session.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            requested: Arc::clone(&self.stop_requested),
            notify: Arc::clone(&self.stop_notify),
        }
    }

    /// Discard all queued playback immediately. Does not change session state.
    pub fn interrupt(&mut self) {
        self.scheduler.interrupt();
        self.interruptions += 1;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Finalized utterances from completed turns, in emission order.
    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript_log
    }

    pub fn stats(&self) -> SessionStats {
        let duration = Utc::now().signed_duration_since(self.started_at);

        SessionStats {
            is_active: self.state == SessionState::Active,
            started_at: self.started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            frames_sent: self.frames_sent,
            frames_dropped: self.capture.frames_dropped(),
            chunks_scheduled: self.scheduler.chunks_scheduled(),
            chunks_rejected: self.scheduler.chunks_rejected(),
            chunks_malformed: self.chunks_malformed,
            interruptions: self.interruptions,
            turns_completed: self.turns_completed,
        }
    }

    async fn transmit_frame(
        &mut self,
        channel: &mut dyn LiveChannel,
        frame: AudioFrame,
    ) -> Result<(), SessionError> {
        let audio = OutboundAudio {
            media: codec::encode_base64(&frame.samples),
            sample_rate: frame.sample_rate,
        };

        if let Err(e) = channel.send_audio(audio).await {
            error!("Failed to transmit capture frame: {}", e);
            return Err(SessionError::ChannelRuntimeError(e.to_string()));
        }

        self.frames_sent += 1;
        Ok(())
    }

    fn dispatch(&mut self, event: ServerEvent) -> Dispatch {
        match event {
            ServerEvent::AudioChunk { data } => {
                match codec::decode_base64(&data) {
                    Ok(samples) => self.scheduler.schedule(samples),
                    // Recovered locally: the chunk is dropped, the session
                    // continues.
                    Err(e) => {
                        warn!("Dropping malformed audio chunk: {}", e);
                        self.chunks_malformed += 1;
                    }
                }
                Dispatch::Continue
            }

            ServerEvent::Interrupted => {
                self.interrupt();
                Dispatch::Continue
            }

            ServerEvent::UserTranscript { text } => {
                self.aggregator.append_user(&text);
                Dispatch::Continue
            }

            ServerEvent::ModelTranscript { text } => {
                self.aggregator.append_model(&text);
                Dispatch::Continue
            }

            ServerEvent::TurnComplete => {
                let entries = self.aggregator.flush();
                for entry in &entries {
                    let role = match entry.role {
                        SpeakerRole::User => "user",
                        SpeakerRole::Model => "model",
                    };
                    info!("[{}] {}", role, entry.text);
                }
                self.transcript_log.extend(entries);
                self.turns_completed += 1;
                Dispatch::Continue
            }

            ServerEvent::Error { detail } => {
                error!("Live service error: {}", detail);
                Dispatch::Shutdown(Err(SessionError::ChannelRuntimeError(detail)))
            }

            ServerEvent::Closed => {
                info!("Remote closed the session");
                Dispatch::Shutdown(Ok(()))
            }
        }
    }

    /// Release the channel, capture device, and queued playback. Idempotent.
    async fn teardown(&mut self, channel: Option<Box<dyn LiveChannel>>) {
        if self.state == SessionState::Idle {
            return;
        }

        self.state = SessionState::Closing;

        let channel = channel.or_else(|| self.channel.take());
        if let Some(mut channel) = channel {
            if let Err(e) = channel.close().await {
                warn!("Failed to close channel: {}", e);
            }
        }

        if let Err(e) = self.capture.stop().await {
            warn!("Failed to stop capture: {}", e);
        }
        self.capture_rx = None;

        // No stale scheduled audio survives teardown, and the output device
        // context is released along with the channel and capture stream.
        self.scheduler.interrupt();
        self.scheduler.close();

        self.state = SessionState::Idle;
        info!("Live session stopped: {}", self.config.session_id);
    }
}
