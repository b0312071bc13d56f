use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleRate, StreamConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// A fixed-size block of mono f32 samples from the capture device.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw samples in [-1.0, 1.0].
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

/// Configuration for the capture backend.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Capture sample rate (the live service expects 16 kHz input).
    pub sample_rate: u32,
    /// Samples per delivered frame.
    pub frame_samples: usize,
    /// Bounded frame queue depth; frames are dropped when it is full.
    pub queue_capacity: usize,
    /// Input device name, or None for the system default.
    pub device: Option<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            frame_samples: 4096,
            queue_capacity: 32,
            device: None,
        }
    }
}

/// Microphone capture backend.
///
/// `start()` returns a bounded channel of fixed-size frames. Producers never
/// block the device callback: when the session loop falls behind, frames are
/// dropped and counted.
#[async_trait::async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Start capturing audio, returning the frame receiver.
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>>;

    /// Stop capturing and release the device.
    async fn stop(&mut self) -> Result<()>;

    /// Whether the backend is currently capturing.
    fn is_capturing(&self) -> bool;

    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Frames dropped because the session loop could not keep pace.
    fn frames_dropped(&self) -> usize {
        0
    }
}

/// cpal microphone backend. The stream lives on a dedicated thread so the
/// backend stays `Send` and the device is released on `stop()`.
pub struct CpalCapture {
    config: CaptureConfig,
    stop_tx: Option<std::sync::mpsc::Sender<()>>,
    dropped: Arc<AtomicUsize>,
}

impl CpalCapture {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            stop_tx: None,
            dropped: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait::async_trait]
impl CaptureBackend for CpalCapture {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.stop_tx.is_some() {
            anyhow::bail!("Capture already running");
        }

        let (frame_tx, frame_rx) = mpsc::channel(self.config.queue_capacity);
        let (stop_tx, stop_rx) = std::sync::mpsc::channel::<()>();
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<()>>();

        let config = self.config.clone();
        let dropped = Arc::clone(&self.dropped);

        std::thread::spawn(move || {
            capture_thread(config, frame_tx, stop_rx, ready_tx, dropped);
        });

        // The thread reports exactly one readiness result.
        tokio::task::spawn_blocking(move || ready_rx.recv())
            .await
            .context("Capture thread setup task failed")?
            .context("Capture thread exited before reporting readiness")??;

        self.stop_tx = Some(stop_tx);
        info!("Microphone capture started ({} Hz)", self.config.sample_rate);
        Ok(frame_rx)
    }

    async fn stop(&mut self) -> Result<()> {
        // Dropping the sender unblocks the capture thread, which drops the
        // stream and releases the device.
        if self.stop_tx.take().is_some() {
            info!("Microphone capture stopped");
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.stop_tx.is_some()
    }

    fn name(&self) -> &str {
        "cpal-microphone"
    }

    fn frames_dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

fn capture_thread(
    config: CaptureConfig,
    frame_tx: mpsc::Sender<AudioFrame>,
    stop_rx: std::sync::mpsc::Receiver<()>,
    ready_tx: std::sync::mpsc::Sender<Result<()>>,
    dropped: Arc<AtomicUsize>,
) {
    let built = build_input_stream(&config, frame_tx, dropped);

    match built {
        Ok(stream) => {
            let _ = ready_tx.send(Ok(()));
            // Parks until stop() drops its sender or the backend is dropped.
            let _ = stop_rx.recv();
            drop(stream);
        }
        Err(e) => {
            let _ = ready_tx.send(Err(e));
        }
    }
}

fn build_input_stream(
    config: &CaptureConfig,
    frame_tx: mpsc::Sender<AudioFrame>,
    dropped: Arc<AtomicUsize>,
) -> Result<cpal::Stream> {
    let host = cpal::default_host();

    let device = if let Some(name) = &config.device {
        host.input_devices()?
            .find(|d| d.name().map(|n| n == *name).unwrap_or(false))
            .context(format!("Audio device '{}' not found", name))?
    } else {
        host.default_input_device()
            .context("No default input device available")?
    };

    info!(
        "Using capture device: {}",
        device.name().unwrap_or_else(|_| "Unknown".to_string())
    );

    let stream_config = StreamConfig {
        channels: 1,
        sample_rate: SampleRate(config.sample_rate),
        buffer_size: BufferSize::Default,
    };

    let frame_samples = config.frame_samples;
    let sample_rate = config.sample_rate;
    let mut pending: Vec<f32> = Vec::with_capacity(frame_samples * 2);

    let stream = device
        .build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                deliver_frames(
                    &mut pending,
                    data,
                    frame_samples,
                    sample_rate,
                    &frame_tx,
                    &dropped,
                );
            },
            move |err| {
                error!("Capture stream error: {}", err);
            },
            None,
        )
        .context("Failed to build input stream")?;

    stream.play().context("Failed to start input stream")?;

    Ok(stream)
}

/// Accumulate device samples and emit full fixed-size frames.
///
/// Backpressure policy: drop-newest. The device callback never blocks; a
/// frame that finds the queue full is dropped and counted.
fn deliver_frames(
    pending: &mut Vec<f32>,
    data: &[f32],
    frame_samples: usize,
    sample_rate: u32,
    frame_tx: &mpsc::Sender<AudioFrame>,
    dropped: &AtomicUsize,
) {
    pending.extend_from_slice(data);

    while pending.len() >= frame_samples {
        let samples: Vec<f32> = pending.drain(..frame_samples).collect();
        let frame = AudioFrame {
            samples,
            sample_rate,
        };

        if frame_tx.try_send(frame).is_err() {
            let total = dropped.fetch_add(1, Ordering::Relaxed) + 1;
            warn!("Outbound queue full, dropped capture frame ({} total)", total);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_input_emits_no_frame() {
        let (tx, mut rx) = mpsc::channel(4);
        let dropped = AtomicUsize::new(0);
        let mut pending = Vec::new();

        deliver_frames(&mut pending, &[0.1; 100], 4096, 16000, &tx, &dropped);

        assert!(rx.try_recv().is_err());
        assert_eq!(pending.len(), 100, "samples stay buffered for the next callback");
        assert_eq!(dropped.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_accumulated_input_emits_fixed_frames() {
        let (tx, mut rx) = mpsc::channel(4);
        let dropped = AtomicUsize::new(0);
        let mut pending = Vec::new();

        // Three callbacks worth of audio crossing two frame boundaries.
        deliver_frames(&mut pending, &[0.0; 3000], 4096, 16000, &tx, &dropped);
        deliver_frames(&mut pending, &[0.0; 3000], 4096, 16000, &tx, &dropped);
        deliver_frames(&mut pending, &[0.0; 3000], 4096, 16000, &tx, &dropped);

        let first = rx.try_recv().expect("first frame");
        let second = rx.try_recv().expect("second frame");
        assert_eq!(first.samples.len(), 4096);
        assert_eq!(second.samples.len(), 4096);
        assert_eq!(first.sample_rate, 16000);
        assert!(rx.try_recv().is_err());
        assert_eq!(pending.len(), 9000 - 2 * 4096);
        assert_eq!(dropped.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_full_queue_drops_newest_and_counts() {
        let (tx, mut rx) = mpsc::channel(1);
        let dropped = AtomicUsize::new(0);
        let mut pending = Vec::new();

        // Four full frames against a single-slot queue.
        deliver_frames(&mut pending, &[0.0; 4 * 4096], 4096, 16000, &tx, &dropped);

        assert_eq!(dropped.load(Ordering::Relaxed), 3);
        assert!(rx.try_recv().is_ok(), "the oldest frame was delivered");
        assert!(rx.try_recv().is_err(), "the rest were dropped, not queued");
        assert!(pending.is_empty());
    }
}
