/*!
    Process-wide configuration constants (spec §6).

    All compile-time; none of these are read from a config file or
    environment — the core treats them as fixed engineering constants,
    mirroring the `#define`s in the original `codec.c`/`audio.c`.
*/

use std::time::Duration;

/// Capacity of a per-stream packet queue.
pub const PKT_QUEUE_SIZE: usize = 20;

/// Capacity of a per-stream frame queue.
pub const FRAME_QUEUE_SIZE: usize = 40;

/// Max submitted-but-not-completed audio sink buffers before backpressure kicks in.
pub const MAX_AUDIO_QUEUED: usize = 50;

/// How many frame-durations to sleep while waiting out audio backpressure.
pub const IDLE_WAIT_FRAMES: u32 = 2;

/// Max events drained from an event queue per event-loop invocation.
pub const MAX_EVENTS_PER_LOOP: usize = 10;

/// Timeout for timed queue waits, in microseconds.
pub const QUEUE_WAIT_US: u64 = 16_000;

/// A/V sync tolerance, in microseconds.
pub const SYNC_DIFF_THRESHOLD_US: i64 = 50_000;

/// Max number of frame-durations the video presenter will sleep to stay in sync.
pub const SYNC_MAX_WAIT_FRAMES: u32 = 1;

/// Seek step requested by the `→`/`←` keys, in microseconds.
pub const SEEK_STEP_US: i64 = 5_000_000;

pub const fn queue_wait() -> Duration {
    Duration::from_micros(QUEUE_WAIT_US)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_wait_matches_microsecond_constant() {
        assert_eq!(queue_wait().as_micros() as u64, QUEUE_WAIT_US);
    }
}
