/*!
    Per-stream and whole-pipeline state (spec §3, §4.8).
*/

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use rustplay_types::{AudioFrame, Packet, Rational, VideoFrame};

use super::config::{FRAME_QUEUE_SIZE, PKT_QUEUE_SIZE};
use super::event::{Event, EventKind, EventQueue};
use super::queue::BoundedQueue;

pub fn can_enqueue_packet(len: usize) -> bool {
    len < PKT_QUEUE_SIZE
}

pub fn can_enqueue_frame(len: usize) -> bool {
    len < FRAME_QUEUE_SIZE
}

pub fn has_data(len: usize) -> bool {
    len > 0
}

/// End-of-stream sentinel: `None` in either packet or frame queue.
pub type PacketSlot = Option<Packet>;
pub type AudioFrameSlot = Option<AudioFrame>;
pub type VideoFrameSlot = Option<VideoFrame>;

/**
    Per-stream pipeline state shared by the decode and presentation
    threads for one elementary stream. `StreamContext` in spec §3 is
    split into an audio and a video variant here: the frame payload type
    differs between the two (`AudioFrame` vs `VideoFrame`), and a single
    generic struct would force every call site to monomorphize over a
    type parameter that's always known statically at construction.
*/
pub struct AudioStreamContext {
    pub packet_queue: BoundedQueue<PacketSlot>,
    pub frame_queue: BoundedQueue<AudioFrameSlot>,
    pub decode_events: EventQueue,
    pub present_events: EventQueue,
    pub play_time_us: AtomicI64,
    pub time_base: Rational,
}

impl AudioStreamContext {
    pub fn new(time_base: Rational) -> Self {
        Self {
            packet_queue: BoundedQueue::new(),
            frame_queue: BoundedQueue::new(),
            decode_events: EventQueue::new(),
            present_events: EventQueue::new(),
            play_time_us: AtomicI64::new(0),
            time_base,
        }
    }

    pub fn play_time_us(&self) -> i64 {
        self.play_time_us.load(Ordering::Acquire)
    }

    pub fn set_play_time_us(&self, value: i64) {
        self.play_time_us.store(value, Ordering::Release);
    }
}

pub struct VideoStreamContext {
    pub packet_queue: BoundedQueue<PacketSlot>,
    pub frame_queue: BoundedQueue<VideoFrameSlot>,
    pub decode_events: EventQueue,
    pub present_events: EventQueue,
    pub play_time_us: AtomicI64,
    pub time_base: Rational,
    /// Wall-clock spacing between frames, from the stream's frame rate
    /// (falls back to a conservative 25fps when the container doesn't
    /// report one — see spec §4.6's "frame_duration computed from the
    /// codec frame rate").
    pub frame_duration: Duration,
}

impl VideoStreamContext {
    pub fn new(time_base: Rational, frame_duration: Duration) -> Self {
        Self {
            packet_queue: BoundedQueue::new(),
            frame_queue: BoundedQueue::new(),
            decode_events: EventQueue::new(),
            present_events: EventQueue::new(),
            play_time_us: AtomicI64::new(0),
            time_base,
            frame_duration,
        }
    }

    pub fn play_time_us(&self) -> i64 {
        self.play_time_us.load(Ordering::Acquire)
    }

    pub fn set_play_time_us(&self, value: i64) {
        self.play_time_us.store(value, Ordering::Release);
    }
}

/**
    Playback state machine (spec §4.8). Transitions other than the ones
    implemented on [`PlayContext`] are illegal and never occur; the
    methods below silently no-op on every trigger that doesn't name a
    transition out of the current state, matching "any other trigger in
    any state → ignored (return no-op)".
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    Pause,
    PlaySeeking,
    PauseSeeking,
}

/**
    Whole-pipeline state (spec §3). At least one of `audio`/`video` is
    present; the format-reader handle itself lives in the demux stage,
    which is the only stage that touches it.
*/
pub struct PlayContext {
    pub audio: Option<AudioStreamContext>,
    pub video: Option<VideoStreamContext>,
    state: Mutex<PlaybackState>,
    pub demux_events: EventQueue,
}

impl PlayContext {
    pub fn new(audio: Option<AudioStreamContext>, video: Option<VideoStreamContext>) -> Self {
        Self {
            audio,
            video,
            state: Mutex::new(PlaybackState::Playing),
            demux_events: EventQueue::new(),
        }
    }

    pub fn state(&self) -> PlaybackState {
        *self.state.lock().expect("play context mutex poisoned")
    }

    /// The reference clock for A/V sync: audio's `play_time_us` if audio
    /// is present, else the video stream's own (see spec §4.6's "if audio
    /// is present" guard — a video-only file has no master clock to sync
    /// against).
    pub fn master_play_time_us(&self) -> Option<i64> {
        self.audio.as_ref().map(|a| a.play_time_us())
    }

    fn broadcast_to_stage_queues(&self, kind: EventKind) {
        if let Some(audio) = &self.audio {
            audio.decode_events.push(Event::new(kind));
            audio.present_events.push(Event::new(kind));
        }
        if let Some(video) = &self.video {
            video.decode_events.push(Event::new(kind));
            video.present_events.push(Event::new(kind));
        }
    }

    /// `PLAYING + pause() -> PAUSE`.
    pub fn pause(&self) {
        let mut state = self.state.lock().expect("play context mutex poisoned");
        if *state == PlaybackState::Playing {
            *state = PlaybackState::Pause;
            drop(state);
            self.broadcast_to_stage_queues(EventKind::Pause);
        }
    }

    /// `PAUSE + resume() -> PLAYING`.
    pub fn resume(&self) {
        let mut state = self.state.lock().expect("play context mutex poisoned");
        if *state == PlaybackState::Pause {
            *state = PlaybackState::Playing;
            drop(state);
            self.broadcast_to_stage_queues(EventKind::Resume);
        }
    }

    /// `PLAYING + seek(t) -> PLAY_SEEKING`, `PAUSE + seek(t) -> PAUSE_SEEKING`.
    /// `SEEK_START` is sent to the demuxer only; the demuxer fans it out
    /// to decode/present stages once it begins processing it (§4.3 step 1).
    pub fn seek(&self, to_us: i64) {
        let mut state = self.state.lock().expect("play context mutex poisoned");
        let next = match *state {
            PlaybackState::Playing => Some(PlaybackState::PlaySeeking),
            PlaybackState::Pause => Some(PlaybackState::PauseSeeking),
            _ => None,
        };
        if let Some(next) = next {
            *state = next;
            drop(state);
            self.demux_events.push(Event::new(EventKind::SeekStart { to_us }));
        }
    }

    /// Called by the demuxer after it finishes fanning out `SEEK_END`
    /// (§4.3 step 4): `PLAY_SEEKING -> PLAYING`, `PAUSE_SEEKING -> PAUSE`.
    pub fn complete_seek(&self) {
        let mut state = self.state.lock().expect("play context mutex poisoned");
        *state = match *state {
            PlaybackState::PlaySeeking => PlaybackState::Playing,
            PlaybackState::PauseSeeking => PlaybackState::Pause,
            other => other,
        };
    }

    /// `STOP` traverses every event queue; presenters and decoders exit
    /// their loops on receipt (§5, "Cancellation & shutdown").
    pub fn stop(&self) {
        self.demux_events.push(Event::new(EventKind::Stop));
        self.broadcast_to_stage_queues(EventKind::Stop);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rational() -> Rational {
        Rational::new(1, 1_000)
    }

    #[test]
    fn pause_then_resume_round_trips_through_playing() {
        let ctx = PlayContext::new(Some(AudioStreamContext::new(rational())), None);
        assert_eq!(ctx.state(), PlaybackState::Playing);
        ctx.pause();
        assert_eq!(ctx.state(), PlaybackState::Pause);
        assert_eq!(
            ctx.audio.as_ref().unwrap().present_events.pop_wait().kind(),
            EventKind::Pause
        );
        ctx.resume();
        assert_eq!(ctx.state(), PlaybackState::Playing);
    }

    #[test]
    fn seek_while_playing_enters_play_seeking_and_only_reaches_demux_queue() {
        let ctx = PlayContext::new(Some(AudioStreamContext::new(rational())), None);
        ctx.seek(3_000_000);
        assert_eq!(ctx.state(), PlaybackState::PlaySeeking);
        assert_eq!(ctx.demux_events.len(), 1);
        assert!(ctx.audio.as_ref().unwrap().decode_events.is_empty());
        ctx.complete_seek();
        assert_eq!(ctx.state(), PlaybackState::Playing);
    }

    #[test]
    fn seek_while_paused_returns_to_pause_not_playing() {
        let ctx = PlayContext::new(Some(AudioStreamContext::new(rational())), None);
        ctx.pause();
        ctx.seek(1_000_000);
        assert_eq!(ctx.state(), PlaybackState::PauseSeeking);
        ctx.complete_seek();
        assert_eq!(ctx.state(), PlaybackState::Pause);
    }

    #[test]
    fn seek_while_already_seeking_is_a_noop() {
        let ctx = PlayContext::new(Some(AudioStreamContext::new(rational())), None);
        ctx.seek(1_000_000);
        assert_eq!(ctx.demux_events.len(), 1);
        ctx.seek(2_000_000);
        // second seek request is ignored: state stays PLAY_SEEKING, no
        // second SEEK_START is enqueued.
        assert_eq!(ctx.state(), PlaybackState::PlaySeeking);
        assert_eq!(ctx.demux_events.len(), 1);
    }
}
