/*!
    Video presenter — the sync-slave stage (spec §4.6).
*/

use std::thread;
use std::time::Duration;

use rustplay_transform::{VideoTransform, VideoTransformConfig};

use super::config::{queue_wait, MAX_EVENTS_PER_LOOP, SYNC_DIFF_THRESHOLD_US, SYNC_MAX_WAIT_FRAMES};
use super::context::{has_data, PlaybackState, PlayContext, VideoStreamContext};
use super::error::Result;
use super::event::EventKind;
use super::log::log_render;
use super::surface::GraphicsSurface;

/// The three outcomes spec.md §4.6's A/V sync comparison can produce for
/// one video frame, given how far its PTS sits from the audio master clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncDecision {
    /// Frame is too far behind the master clock: drop it, never render.
    Drop,
    /// Frame is ahead of the master clock: sleep, then render.
    Delay(Duration),
    /// Within tolerance: render immediately.
    Render,
}

/// Pure boundary logic for spec.md §4.6: `diff` is `frame_pts - master_us`,
/// in microseconds. `diff <= -threshold` drops, `diff >= threshold` delays
/// (capped at `frame_duration * SYNC_MAX_WAIT_FRAMES`), otherwise renders.
fn sync_decision(diff: i64, frame_duration: Duration) -> SyncDecision {
    if diff <= -SYNC_DIFF_THRESHOLD_US {
        SyncDecision::Drop
    } else if diff >= SYNC_DIFF_THRESHOLD_US {
        let wait = (diff as u64).min(frame_duration.as_micros() as u64 * SYNC_MAX_WAIT_FRAMES as u64);
        SyncDecision::Delay(Duration::from_micros(wait))
    } else {
        SyncDecision::Render
    }
}

pub fn run_video_presenter(
    sc: &VideoStreamContext,
    ctx: &PlayContext,
    surface: &dyn GraphicsSurface,
) -> Result<()> {
    let mut transform: Option<VideoTransform> = None;

    loop {
        let frame = loop {
            match sc.frame_queue.dequeue_timedwait(has_data, queue_wait()) {
                Some(frame) => break frame,
                None => run_present_event_loop(sc, &mut transform)?,
            }
        };

        let Some(frame) = frame else {
            log_render!("video presenter reached end of stream");
            return Ok(());
        };

        let pts_us = frame.presentation_time().map(|d| d.as_micros() as i64).unwrap_or(0);
        sc.set_play_time_us(pts_us);

        let mut render = true;
        if let Some(master_us) = ctx.master_play_time_us() {
            if !matches!(ctx.state(), PlaybackState::PlaySeeking | PlaybackState::PauseSeeking) {
                match sync_decision(pts_us - master_us, sc.frame_duration) {
                    SyncDecision::Drop => render = false,
                    SyncDecision::Delay(wait) => thread::sleep(wait),
                    SyncDecision::Render => {}
                }
            }
        }

        if render {
            let scaler = transform.get_or_insert_with(|| {
                VideoTransform::new(VideoTransformConfig::to_rgb24(frame.width, frame.height))
            });
            let rgb = scaler.transform(&frame)?;
            surface.commit_frame(rgb);
            thread::sleep(sc.frame_duration);
        }

        run_present_event_loop(sc, &mut transform)?;
    }
}

/// §4.7, specialized for video: `SEEK_START` additionally resets the
/// scaler, matching the decoder/resampler reset on the decode and audio
/// presenter sides of the same barrier (lower-severity here since swscale
/// carries no cross-frame delay state, but cheap and consistent).
fn run_present_event_loop(sc: &VideoStreamContext, transform: &mut Option<VideoTransform>) -> Result<()> {
    for _ in 0..MAX_EVENTS_PER_LOOP {
        let Some(event) = sc.present_events.try_pop() else {
            return Ok(());
        };

        match event.kind() {
            EventKind::Pause => {
                sc.present_events.pop_wait_matching(|kind| matches!(kind, EventKind::Resume));
            }
            EventKind::SeekStart { to_us } => {
                if let Some(scaler) = transform {
                    scaler.reset();
                }
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
    use rustplay_types::Rational;

    use super::*;
    use crate::core::event::Event;

    fn video_stream_context() -> VideoStreamContext {
        VideoStreamContext::new(Rational::new(1, 1_000), Duration::from_millis(40))
    }

    #[test]
    fn present_event_loop_drains_pause_resume_pair() {
        let sc = video_stream_context();
        sc.present_events.push(Event::new(EventKind::Pause));
        sc.present_events.push(Event::new(EventKind::Resume));

        run_present_event_loop(&sc, &mut None).unwrap();

        assert!(sc.present_events.is_empty());
    }

    #[test]
    fn present_event_loop_seek_start_updates_play_time_and_drains_seek_end() {
        let sc = video_stream_context();
        sc.present_events.push(Event::new(EventKind::SeekStart { to_us: 7_500_000 }));
        sc.present_events.push(Event::new(EventKind::SeekEnd { to_us: 7_500_000 }));

        run_present_event_loop(&sc, &mut None).unwrap();

        assert_eq!(sc.play_time_us(), 7_500_000);
        assert!(sc.present_events.is_empty());
    }

    #[test]
    fn present_event_loop_is_a_noop_when_empty() {
        let sc = video_stream_context();
        run_present_event_loop(&sc, &mut None).unwrap();
        assert!(sc.present_events.is_empty());
    }

    #[test]
    fn sync_decision_drops_at_and_beyond_the_negative_threshold() {
        let frame_duration = Duration::from_millis(40);
        assert_eq!(sync_decision(-SYNC_DIFF_THRESHOLD_US, frame_duration), SyncDecision::Drop);
        assert_eq!(sync_decision(-SYNC_DIFF_THRESHOLD_US - 1, frame_duration), SyncDecision::Drop);
    }

    #[test]
    fn sync_decision_renders_just_inside_the_negative_threshold() {
        let frame_duration = Duration::from_millis(40);
        assert_eq!(sync_decision(-SYNC_DIFF_THRESHOLD_US + 1, frame_duration), SyncDecision::Render);
    }

    #[test]
    fn sync_decision_renders_just_below_the_positive_threshold() {
        let frame_duration = Duration::from_millis(40);
        assert_eq!(sync_decision(SYNC_DIFF_THRESHOLD_US - 1, frame_duration), SyncDecision::Render);
    }

    #[test]
    fn sync_decision_delays_at_and_beyond_the_positive_threshold() {
        let frame_duration = Duration::from_millis(40);
        let expected_wait = Duration::from_micros(
            (SYNC_DIFF_THRESHOLD_US as u64).min(frame_duration.as_micros() as u64 * SYNC_MAX_WAIT_FRAMES as u64),
        );
        assert_eq!(sync_decision(SYNC_DIFF_THRESHOLD_US, frame_duration), SyncDecision::Delay(expected_wait));
    }

    #[test]
    fn sync_decision_caps_delay_at_sync_max_wait_frames() {
        let frame_duration = Duration::from_millis(40);
        let huge_diff = SYNC_DIFF_THRESHOLD_US * 1000;
        let cap = Duration::from_micros(frame_duration.as_micros() as u64 * SYNC_MAX_WAIT_FRAMES as u64);
        assert_eq!(sync_decision(huge_diff, frame_duration), SyncDecision::Delay(cap));
    }
}
