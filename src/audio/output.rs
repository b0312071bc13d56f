use super::playback::PlaybackSink;
use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleRate, StreamConfig};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{error, info};

struct OutputVoice {
    start_frame: u64,
    samples: Vec<f32>,
}

struct SharedOutput {
    /// Total device frames rendered since the stream started.
    frames_rendered: AtomicU64,
    voices: Mutex<Vec<OutputVoice>>,
}

/// cpal output sink: mixes scheduled voices in the device callback.
///
/// The device clock is the count of frames pushed to the hardware, so
/// scheduled start times are sample-accurate regardless of callback size.
pub struct CpalPlayback {
    sample_rate: u32,
    shared: Arc<SharedOutput>,
    stop_tx: Option<std::sync::mpsc::Sender<()>>,
}

impl CpalPlayback {
    /// Open the default output device at `sample_rate` (mono).
    pub fn open(sample_rate: u32) -> Result<Self> {
        let shared = Arc::new(SharedOutput {
            frames_rendered: AtomicU64::new(0),
            voices: Mutex::new(Vec::new()),
        });

        let (stop_tx, stop_rx) = std::sync::mpsc::channel::<()>();
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<()>>();

        let thread_shared = Arc::clone(&shared);
        std::thread::spawn(move || {
            output_thread(sample_rate, thread_shared, stop_rx, ready_tx);
        });

        ready_rx
            .recv()
            .context("Output thread exited before reporting readiness")??;

        info!("Audio output opened ({} Hz)", sample_rate);

        Ok(Self {
            sample_rate,
            shared,
            stop_tx: Some(stop_tx),
        })
    }

    fn release(&mut self) {
        if self.stop_tx.take().is_some() {
            info!("Audio output closed");
        }
    }
}

impl Drop for CpalPlayback {
    fn drop(&mut self) {
        self.release();
    }
}

impl PlaybackSink for CpalPlayback {
    fn clock(&self) -> f64 {
        self.shared.frames_rendered.load(Ordering::Acquire) as f64 / self.sample_rate as f64
    }

    fn begin(&mut self, _voice: u64, samples: Vec<f32>, start_at: f64) {
        let start_frame = (start_at * self.sample_rate as f64).round() as u64;
        if let Ok(mut voices) = self.shared.voices.lock() {
            voices.push(OutputVoice {
                start_frame,
                samples,
            });
        }
    }

    fn halt_all(&mut self) {
        if let Ok(mut voices) = self.shared.voices.lock() {
            voices.clear();
        }
    }

    fn close(&mut self) {
        self.halt_all();
        self.release();
    }
}

fn output_thread(
    sample_rate: u32,
    shared: Arc<SharedOutput>,
    stop_rx: std::sync::mpsc::Receiver<()>,
    ready_tx: std::sync::mpsc::Sender<Result<()>>,
) {
    let built = build_output_stream(sample_rate, shared);

    match built {
        Ok(stream) => {
            let _ = ready_tx.send(Ok(()));
            let _ = stop_rx.recv();
            drop(stream);
        }
        Err(e) => {
            let _ = ready_tx.send(Err(e));
        }
    }
}

fn build_output_stream(sample_rate: u32, shared: Arc<SharedOutput>) -> Result<cpal::Stream> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .context("No default output device available")?;

    info!(
        "Using output device: {}",
        device.name().unwrap_or_else(|_| "Unknown".to_string())
    );

    let stream_config = StreamConfig {
        channels: 1,
        sample_rate: SampleRate(sample_rate),
        buffer_size: BufferSize::Default,
    };

    let stream = device
        .build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let base = shared
                    .frames_rendered
                    .fetch_add(data.len() as u64, Ordering::AcqRel);

                data.fill(0.0);

                let Ok(mut voices) = shared.voices.lock() else {
                    return;
                };

                for voice in voices.iter() {
                    for (i, out) in data.iter_mut().enumerate() {
                        let t = base + i as u64;
                        if t < voice.start_frame {
                            continue;
                        }
                        let offset = (t - voice.start_frame) as usize;
                        if let Some(&sample) = voice.samples.get(offset) {
                            *out += sample;
                        }
                    }
                }

                let horizon = base + data.len() as u64;
                voices.retain(|v| v.start_frame + v.samples.len() as u64 > horizon);
            },
            move |err| {
                error!("Output stream error: {}", err);
            },
            None,
        )
        .context("Failed to build output stream")?;

    stream.play().context("Failed to start output stream")?;

    Ok(stream)
}
