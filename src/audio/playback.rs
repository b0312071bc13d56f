use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Sample rate of audio received from the live service.
pub const PLAYBACK_SAMPLE_RATE: u32 = 24_000;

/// Upper bound on in-flight scheduled buffers. A slow output device cannot
/// grow the active set past this; chunks arriving at the cap are rejected.
pub const MAX_ACTIVE_BUFFERS: usize = 64;

/// Output-device seam for the scheduler.
///
/// Implementations own the device; the scheduler only reads its clock and
/// hands it buffers with absolute start times.
pub trait PlaybackSink: Send {
    /// Current device clock in seconds. Monotonic while the device runs.
    fn clock(&self) -> f64;

    /// Start playing `samples` at `start_at` seconds on the device clock.
    fn begin(&mut self, voice: u64, samples: Vec<f32>, start_at: f64);

    /// Audibly stop every voice immediately.
    fn halt_all(&mut self);

    /// Release the output device. Idempotent; no voice plays afterwards.
    fn close(&mut self);
}

#[derive(Debug, Clone, Copy)]
struct ScheduledBuffer {
    start: f64,
    end: f64,
}

/// Schedules decoded audio chunks back-to-back on an output device.
///
/// Owns the "next start" clock and the active-buffer set. Chunks are never
/// reordered; they are dropped only by `interrupt()` or at the capacity cap.
pub struct PlaybackScheduler {
    sink: Box<dyn PlaybackSink>,
    sample_rate: u32,
    next_start: f64,
    active: BTreeMap<u64, ScheduledBuffer>,
    next_voice: u64,
    chunks_scheduled: usize,
    chunks_rejected: usize,
    interruptions: usize,
}

impl PlaybackScheduler {
    pub fn new(sink: Box<dyn PlaybackSink>, sample_rate: u32) -> Self {
        Self {
            sink,
            sample_rate,
            next_start: 0.0,
            active: BTreeMap::new(),
            next_voice: 0,
            chunks_scheduled: 0,
            chunks_rejected: 0,
            interruptions: 0,
        }
    }

    /// Schedule a decoded chunk to start as soon as the clock allows, never
    /// before the device's current time and never overlapping the previous
    /// chunk.
    pub fn schedule(&mut self, samples: Vec<f32>) {
        if samples.is_empty() {
            return;
        }

        let now = self.sink.clock();
        self.reclaim_finished_at(now);

        if self.active.len() >= MAX_ACTIVE_BUFFERS {
            warn!(
                "Active buffer set at capacity ({}), rejecting {}-sample chunk",
                MAX_ACTIVE_BUFFERS,
                samples.len()
            );
            self.chunks_rejected += 1;
            return;
        }

        let start = now.max(self.next_start);
        let duration = samples.len() as f64 / self.sample_rate as f64;

        let voice = self.next_voice;
        self.next_voice += 1;

        debug!(
            "Scheduling {} samples at t={:.3}s (duration {:.3}s)",
            samples.len(),
            start,
            duration
        );

        self.sink.begin(voice, samples, start);
        self.active.insert(
            voice,
            ScheduledBuffer {
                start,
                end: start + duration,
            },
        );
        self.next_start = start + duration;
        self.chunks_scheduled += 1;
    }

    /// Barge-in: halt everything queued or playing and reset the clock so the
    /// next chunk starts as soon as the device allows.
    pub fn interrupt(&mut self) {
        if !self.active.is_empty() {
            debug!("Interrupting {} active buffers", self.active.len());
        }
        self.sink.halt_all();
        self.active.clear();
        self.next_start = 0.0;
        self.interruptions += 1;
    }

    /// Release the output device context. The active set is cleared first so
    /// nothing is left scheduled against a closed device.
    pub fn close(&mut self) {
        self.active.clear();
        self.next_start = 0.0;
        self.sink.close();
    }

    /// Drop bookkeeping for buffers whose playback has completed.
    pub fn reclaim_finished(&mut self) {
        let now = self.sink.clock();
        self.reclaim_finished_at(now);
    }

    fn reclaim_finished_at(&mut self, now: f64) {
        self.active.retain(|_, buffer| buffer.end > now);
    }

    pub fn active_buffers(&self) -> usize {
        self.active.len()
    }

    pub fn next_start(&self) -> f64 {
        self.next_start
    }

    pub fn chunks_scheduled(&self) -> usize {
        self.chunks_scheduled
    }

    pub fn chunks_rejected(&self) -> usize {
        self.chunks_rejected
    }

    pub fn interruptions(&self) -> usize {
        self.interruptions
    }
}
