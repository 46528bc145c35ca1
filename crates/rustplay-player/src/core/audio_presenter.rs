/*!
    Audio presenter — the pipeline's master clock (spec §4.5).

    Dequeues decoded audio frames, converts them to stereo S16 via
    `rustplay-transform`, and submits the interleaved samples to an
    [`AudioSink`]. `cpal`'s push model doesn't expose discrete
    "buffer completion" events the way the submit/poll-completion
    contract expects, so this presenter keeps its own side queue of
    (cumulative-frame-offset, PTS) pairs and retires entries as
    [`AudioSink::consumed_frames`] advances past their offset.
*/

use std::collections::VecDeque;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use rustplay_transform::{AudioTransform, AudioTransformConfig};
use rustplay_types::{ChannelLayout, SampleFormat};

use super::config::{queue_wait, IDLE_WAIT_FRAMES, MAX_AUDIO_QUEUED, MAX_EVENTS_PER_LOOP};
use super::context::{has_data, AudioStreamContext};
use super::error::Result;
use super::event::EventKind;
use super::log::log_audio;
use super::sink::AudioSink;

struct PendingBuffer {
    /// Cumulative per-channel frame count at which this buffer ends.
    end_offset: u64,
    pts_us: i64,
}

/// Sleep granularity used while backpressuring or draining. Not tied to
/// the actual codec frame rate the way the video presenter's
/// `frame_duration` is (§4.6) — audio has no single "frame duration"
/// once frames of varying sample counts are resampled to a fixed rate.
const IDLE_SLICE: Duration = Duration::from_millis(20);

pub fn run_audio_presenter(sc: &AudioStreamContext, sink: &dyn AudioSink) -> Result<()> {
    let mut transform = AudioTransform::new(AudioTransformConfig::new(
        sink.sample_rate(),
        ChannelLayout::Stereo,
        SampleFormat::S16,
    ));

    let mut submitted_offset: u64 = 0;
    let mut pending: VecDeque<PendingBuffer> = VecDeque::new();

    loop {
        let frame = loop {
            match sc.frame_queue.dequeue_timedwait(has_data, queue_wait()) {
                Some(frame) => break frame,
                None => run_present_event_loop(sc, sink, &mut transform, &mut pending, &mut submitted_offset)?,
            }
        };

        let Some(frame) = frame else {
            log_audio!("audio presenter draining at end of stream");
            while !pending.is_empty() {
                retire_completed(sink, &mut pending, sc);
                thread::sleep(IDLE_SLICE);
            }
            return Ok(());
        };

        while pending.len() >= MAX_AUDIO_QUEUED {
            retire_completed(sink, &mut pending, sc);
            ensure_playing(sink)?;
            thread::sleep(IDLE_SLICE * IDLE_WAIT_FRAMES);
        }

        let converted = transform.transform(&frame)?;
        let pts_us = converted.presentation_time().map(|d| d.as_micros() as i64).unwrap_or(0);
        let samples = bytes_to_i16(&converted.data);

        sink.submit(&samples)?;
        submitted_offset += converted.samples as u64;
        pending.push_back(PendingBuffer { end_offset: submitted_offset, pts_us });

        ensure_playing(sink)?;
        retire_completed(sink, &mut pending, sc);

        run_present_event_loop(sc, sink, &mut transform, &mut pending, &mut submitted_offset)?;
    }
}

fn ensure_playing(sink: &dyn AudioSink) -> Result<()> {
    if !sink.is_playing() {
        sink.play()?;
    }
    Ok(())
}

fn retire_completed(sink: &dyn AudioSink, pending: &mut VecDeque<PendingBuffer>, sc: &AudioStreamContext) {
    let consumed = sink.consumed_frames();
    while let Some(front) = pending.front() {
        if front.end_offset > consumed {
            break;
        }
        let buffer = pending.pop_front().expect("front checked above");
        sc.play_time_us.store(buffer.pts_us, Ordering::Release);
    }
}

fn bytes_to_i16(data: &[u8]) -> Vec<i16> {
    data.chunks_exact(2).map(|b| i16::from_ne_bytes([b[0], b[1]])).collect()
}

/// §4.7, specialized for audio: `SEEK_START` additionally flushes the
/// sink, clears the local submitted-buffer side queue, and resets the
/// resampler so no pre-seek samples linger in its delay line.
fn run_present_event_loop(
    sc: &AudioStreamContext,
    sink: &dyn AudioSink,
    transform: &mut AudioTransform,
    pending: &mut VecDeque<PendingBuffer>,
    submitted_offset: &mut u64,
) -> Result<()> {
    for _ in 0..MAX_EVENTS_PER_LOOP {
        let Some(event) = sc.present_events.try_pop() else {
            return Ok(());
        };

        match event.kind() {
            EventKind::Pause => {
                sink.pause()?;
                sc.present_events.pop_wait_matching(|kind| matches!(kind, EventKind::Resume));
                sink.play()?;
            }
            EventKind::SeekStart { to_us } => {
                sink.drop_all()?;
                pending.clear();
                *submitted_offset = 0;
                transform.reset();
                sc.set_play_time_us(to_us);
                sc.present_events.pop_wait_matching(|kind| matches!(kind, EventKind::SeekEnd { .. }));
            }
            EventKind::Resume | EventKind::Stop | EventKind::SeekEnd { .. } => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize};
    use std::sync::Mutex;

    use rustplay_types::Rational;

    use super::*;
    use crate::core::event::Event;

    /// Stands in for `CpalAudioSink`: tracks submitted samples and lets
    /// tests drive `consumed_frames()` directly instead of waiting on a
    /// real audio device's callback thread.
    #[derive(Default)]
    struct FakeSink {
        submitted: Mutex<Vec<i16>>,
        consumed: AtomicU64,
        playing: AtomicBool,
        play_calls: AtomicUsize,
        pause_calls: AtomicUsize,
        drop_all_calls: AtomicUsize,
    }

    impl AudioSink for FakeSink {
        fn sample_rate(&self) -> u32 {
            48_000
        }

        fn channels(&self) -> u16 {
            2
        }

        fn submit(&self, samples: &[i16]) -> Result<()> {
            self.submitted.lock().expect("submitted mutex poisoned").extend_from_slice(samples);
            Ok(())
        }

        fn consumed_frames(&self) -> u64 {
            self.consumed.load(Ordering::Acquire)
        }

        fn is_playing(&self) -> bool {
            self.playing.load(Ordering::Acquire)
        }

        fn play(&self) -> Result<()> {
            self.play_calls.fetch_add(1, Ordering::SeqCst);
            self.playing.store(true, Ordering::Release);
            Ok(())
        }

        fn pause(&self) -> Result<()> {
            self.pause_calls.fetch_add(1, Ordering::SeqCst);
            self.playing.store(false, Ordering::Release);
            Ok(())
        }

        fn drop_all(&self) -> Result<()> {
            self.drop_all_calls.fetch_add(1, Ordering::SeqCst);
            self.consumed.store(0, Ordering::Release);
            Ok(())
        }
    }

    fn audio_stream_context() -> AudioStreamContext {
        AudioStreamContext::new(Rational::new(1, 1_000))
    }

    #[test]
    fn bytes_to_i16_round_trips_native_endian_samples() {
        let samples: [i16; 3] = [0, 1234, -5];
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_ne_bytes()).collect();
        assert_eq!(bytes_to_i16(&bytes), samples.to_vec());
    }

    #[test]
    fn ensure_playing_starts_a_stopped_sink_but_not_a_running_one() {
        let sink = FakeSink::default();
        ensure_playing(&sink).unwrap();
        assert_eq!(sink.play_calls.load(Ordering::SeqCst), 1);

        ensure_playing(&sink).unwrap();
        assert_eq!(sink.play_calls.load(Ordering::SeqCst), 1, "already playing, should not call play again");
    }

    #[test]
    fn retire_completed_pops_only_buffers_the_sink_has_consumed() {
        let sink = FakeSink::default();
        let sc = audio_stream_context();
        let mut pending = VecDeque::new();
        pending.push_back(PendingBuffer { end_offset: 100, pts_us: 1_000 });
        pending.push_back(PendingBuffer { end_offset: 200, pts_us: 2_000 });

        sink.consumed.store(150, Ordering::Release);
        retire_completed(&sink, &mut pending, &sc);

        assert_eq!(pending.len(), 1);
        assert_eq!(sc.play_time_us.load(Ordering::Acquire), 1_000);

        sink.consumed.store(200, Ordering::Release);
        retire_completed(&sink, &mut pending, &sc);

        assert!(pending.is_empty());
        assert_eq!(sc.play_time_us.load(Ordering::Acquire), 2_000);
    }

    fn test_transform() -> AudioTransform {
        AudioTransform::new(AudioTransformConfig::new(48_000, ChannelLayout::Stereo, SampleFormat::S16))
    }

    #[test]
    fn present_event_loop_pause_blocks_sink_until_resume_then_resumes() {
        let sink = FakeSink::default();
        let sc = audio_stream_context();
        let mut transform = test_transform();
        let mut pending = VecDeque::new();
        let mut submitted_offset = 0u64;

        sc.present_events.push(Event::new(EventKind::Pause));
        sc.present_events.push(Event::new(EventKind::Resume));

        run_present_event_loop(&sc, &sink, &mut transform, &mut pending, &mut submitted_offset).unwrap();

        assert_eq!(sink.pause_calls.load(Ordering::SeqCst), 1);
        assert_eq!(sink.play_calls.load(Ordering::SeqCst), 1);
        assert!(sc.present_events.is_empty());
    }

    #[test]
    fn present_event_loop_seek_start_flushes_sink_transform_and_local_state() {
        let sink = FakeSink::default();
        let sc = audio_stream_context();
        let mut transform = test_transform();
        let mut pending = VecDeque::new();
        pending.push_back(PendingBuffer { end_offset: 500, pts_us: 9_000 });
        let mut submitted_offset = 500u64;

        sc.present_events.push(Event::new(EventKind::SeekStart { to_us: 3_000_000 }));
        sc.present_events.push(Event::new(EventKind::SeekEnd { to_us: 3_000_000 }));

        run_present_event_loop(&sc, &sink, &mut transform, &mut pending, &mut submitted_offset).unwrap();

        assert_eq!(sink.drop_all_calls.load(Ordering::SeqCst), 1);
        assert!(pending.is_empty());
        assert_eq!(submitted_offset, 0);
        assert_eq!(sc.play_time_us.load(Ordering::Acquire), 3_000_000);
    }
}
