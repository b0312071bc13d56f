// Unit tests for the playback scheduler: gapless back-to-back scheduling,
// device-clock clamping, barge-in, and the active-set capacity bound.

use aetheris_voice::{PlaybackScheduler, PlaybackSink, MAX_ACTIVE_BUFFERS, PLAYBACK_SAMPLE_RATE};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct SinkState {
    clock: f64,
    begun: Vec<(u64, usize, f64)>,
    halts: usize,
    closes: usize,
}

#[derive(Debug, Clone, Default)]
struct MockSink(Arc<Mutex<SinkState>>);

impl MockSink {
    fn set_clock(&self, t: f64) {
        self.0.lock().unwrap().clock = t;
    }

    fn begun(&self) -> Vec<(u64, usize, f64)> {
        self.0.lock().unwrap().begun.clone()
    }

    fn halts(&self) -> usize {
        self.0.lock().unwrap().halts
    }

    fn closes(&self) -> usize {
        self.0.lock().unwrap().closes
    }
}

impl PlaybackSink for MockSink {
    fn clock(&self) -> f64 {
        self.0.lock().unwrap().clock
    }

    fn begin(&mut self, voice: u64, samples: Vec<f32>, start_at: f64) {
        self.0.lock().unwrap().begun.push((voice, samples.len(), start_at));
    }

    fn halt_all(&mut self) {
        self.0.lock().unwrap().halts += 1;
    }

    fn close(&mut self) {
        self.0.lock().unwrap().closes += 1;
    }
}

fn scheduler_with_sink() -> (PlaybackScheduler, MockSink) {
    let sink = MockSink::default();
    let scheduler = PlaybackScheduler::new(Box::new(sink.clone()), PLAYBACK_SAMPLE_RATE);
    (scheduler, sink)
}

/// 100 ms of silence at the playback rate.
fn chunk_100ms() -> Vec<f32> {
    vec![0.0; PLAYBACK_SAMPLE_RATE as usize / 10]
}

#[test]
fn test_chunks_schedule_back_to_back() {
    let (mut scheduler, sink) = scheduler_with_sink();

    scheduler.schedule(chunk_100ms());
    scheduler.schedule(chunk_100ms());
    scheduler.schedule(chunk_100ms());

    let begun = sink.begun();
    assert_eq!(begun.len(), 3);
    assert_eq!(begun[0].2, 0.0);
    assert!((begun[1].2 - 0.1).abs() < 1e-9, "second chunk starts at 0.1s");
    assert!((begun[2].2 - 0.2).abs() < 1e-9, "third chunk starts at 0.2s");
    assert!((scheduler.next_start() - 0.3).abs() < 1e-9);
    assert_eq!(scheduler.active_buffers(), 3);
}

#[test]
fn test_start_time_clamped_to_device_clock() {
    let (mut scheduler, sink) = scheduler_with_sink();

    sink.set_clock(5.0);
    scheduler.schedule(chunk_100ms());

    let begun = sink.begun();
    assert_eq!(begun[0].2, 5.0, "never schedule in the past");
    assert!((scheduler.next_start() - 5.1).abs() < 1e-9);
}

#[test]
fn test_monotonicity_under_drifting_clock() {
    let (mut scheduler, sink) = scheduler_with_sink();

    sink.set_clock(1.0);
    scheduler.schedule(chunk_100ms()); // starts at 1.0, ends 1.1
    sink.set_clock(1.05);
    scheduler.schedule(chunk_100ms()); // next_start 1.1 wins over clock 1.05
    sink.set_clock(1.5);
    scheduler.schedule(chunk_100ms()); // clock 1.5 wins over next_start 1.2

    let begun = sink.begun();
    assert!((begun[1].2 - 1.1).abs() < 1e-9);
    assert!((begun[2].2 - 1.5).abs() < 1e-9);

    // Each start >= previous start + previous duration is violated only when
    // the device clock already passed the queue end, never by reordering.
    assert!(begun[1].2 >= begun[0].2 + 0.1 - 1e-9);
    assert!(begun[2].2 >= begun[1].2 + 0.1 - 1e-9);
}

#[test]
fn test_interrupt_clears_active_set_and_resets_clock() {
    let (mut scheduler, sink) = scheduler_with_sink();

    sink.set_clock(2.0);
    scheduler.schedule(chunk_100ms());
    scheduler.schedule(chunk_100ms());
    assert_eq!(scheduler.active_buffers(), 2);

    scheduler.interrupt();

    assert_eq!(sink.halts(), 1);
    assert_eq!(scheduler.active_buffers(), 0);
    assert_eq!(scheduler.next_start(), 0.0);
    assert_eq!(scheduler.interruptions(), 1);

    // Next chunk starts at the current device clock, never before.
    sink.set_clock(3.0);
    scheduler.schedule(chunk_100ms());
    let begun = sink.begun();
    assert_eq!(begun.last().unwrap().2, 3.0);
}

#[test]
fn test_finished_buffers_are_reclaimed() {
    let (mut scheduler, sink) = scheduler_with_sink();

    scheduler.schedule(chunk_100ms()); // ends at 0.1
    scheduler.schedule(chunk_100ms()); // ends at 0.2
    assert_eq!(scheduler.active_buffers(), 2);

    sink.set_clock(0.15);
    scheduler.reclaim_finished();
    assert_eq!(scheduler.active_buffers(), 1, "first buffer has completed");

    sink.set_clock(1.0);
    scheduler.reclaim_finished();
    assert_eq!(scheduler.active_buffers(), 0);
}

#[test]
fn test_capacity_bound_rejects_excess_chunks() {
    let (mut scheduler, sink) = scheduler_with_sink();

    // Device clock frozen at 0: nothing ever completes.
    for _ in 0..MAX_ACTIVE_BUFFERS {
        scheduler.schedule(chunk_100ms());
    }
    assert_eq!(scheduler.active_buffers(), MAX_ACTIVE_BUFFERS);

    scheduler.schedule(chunk_100ms());

    assert_eq!(scheduler.active_buffers(), MAX_ACTIVE_BUFFERS);
    assert_eq!(scheduler.chunks_rejected(), 1);
    assert_eq!(sink.begun().len(), MAX_ACTIVE_BUFFERS, "rejected chunk never reached the sink");
}

#[test]
fn test_capacity_recovers_after_playback_progresses() {
    let (mut scheduler, sink) = scheduler_with_sink();

    for _ in 0..MAX_ACTIVE_BUFFERS {
        scheduler.schedule(chunk_100ms());
    }

    // Playback advanced past the first few buffers; room again.
    sink.set_clock(0.35);
    scheduler.schedule(chunk_100ms());

    assert_eq!(scheduler.chunks_rejected(), 0);
    assert_eq!(scheduler.chunks_scheduled(), MAX_ACTIVE_BUFFERS + 1);
}

#[test]
fn test_close_releases_device_and_clears_queue() {
    let (mut scheduler, sink) = scheduler_with_sink();

    scheduler.schedule(chunk_100ms());
    scheduler.schedule(chunk_100ms());

    scheduler.close();

    assert_eq!(sink.closes(), 1);
    assert_eq!(scheduler.active_buffers(), 0);
    assert_eq!(scheduler.next_start(), 0.0);
}

#[test]
fn test_empty_chunk_is_ignored() {
    let (mut scheduler, sink) = scheduler_with_sink();

    scheduler.schedule(Vec::new());

    assert_eq!(scheduler.active_buffers(), 0);
    assert_eq!(scheduler.chunks_scheduled(), 0);
    assert!(sink.begun().is_empty());
}
