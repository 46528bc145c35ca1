/*!
    Controller: the foreground input/shutdown thread (spec §6 "Keyboard").

    Polls the graphics surface for input, dispatches to the play context,
    and owns the final join sequencing once a stop is requested (spec §5:
    "decoders first, then presenters, then demuxer").
*/

use std::thread::JoinHandle;

use super::config::SEEK_STEP_US;
use super::context::PlayContext;
use super::error::Result;
use super::surface::{GraphicsSurface, InputEvent};

/// One worker thread's join handle plus a label for diagnostics on panic.
pub struct StageHandle {
    pub label: &'static str,
    pub handle: JoinHandle<Result<()>>,
}

/// Runs the input loop until `Q` is pressed or the surface requests
/// close, then joins every stage thread in the order spec §5 specifies.
pub fn run_controller(
    ctx: &PlayContext,
    surface: &dyn GraphicsSurface,
    decoders: Vec<StageHandle>,
    presenters: Vec<StageHandle>,
    demuxer: StageHandle,
) -> Result<()> {
    println!("rustplay — Q quit, Space pause/resume, arrows seek, I dump queues");

    loop {
        if surface.close_requested() {
            ctx.stop();
            break;
        }

        for event in surface.poll_events() {
            match event {
                InputEvent::Quit => {
                    ctx.stop();
                }
                InputEvent::TogglePause => toggle_pause(ctx),
                InputEvent::SeekForward => seek_relative(ctx, SEEK_STEP_US),
                InputEvent::SeekBackward => seek_relative(ctx, -SEEK_STEP_US),
                InputEvent::DumpQueueState => dump_queue_state(ctx),
            }
        }

        if demuxer.handle.is_finished()
            && decoders.iter().all(|h| h.handle.is_finished())
            && presenters.iter().all(|h| h.handle.is_finished())
        {
            break;
        }

        std::thread::sleep(std::time::Duration::from_millis(15));
    }

    join_all(decoders)?;
    join_all(presenters)?;
    join_one(demuxer)?;
    Ok(())
}

fn toggle_pause(ctx: &PlayContext) {
    match ctx.state() {
        super::context::PlaybackState::Playing => ctx.pause(),
        super::context::PlaybackState::Pause => ctx.resume(),
        _ => {}
    }
}

fn seek_relative(ctx: &PlayContext, delta_us: i64) {
    let current = ctx.master_play_time_us().unwrap_or(0);
    ctx.seek((current + delta_us).max(0));
}

/// `I`: dump queue occupancy to the diagnostic stream (spec §6, §11
/// supplemented diagnostic — the original exposes no equivalent command
/// but every stage's queue already tracks its own length).
fn dump_queue_state(ctx: &PlayContext) {
    if let Some(sc) = &ctx.audio {
        eprintln!(
            "[queue] audio packets={} frames={} decode_events={} present_events={}",
            sc.packet_queue.len(),
            sc.frame_queue.len(),
            sc.decode_events.len(),
            sc.present_events.len(),
        );
    }
    if let Some(sc) = &ctx.video {
        eprintln!(
            "[queue] video packets={} frames={} decode_events={} present_events={}",
            sc.packet_queue.len(),
            sc.frame_queue.len(),
            sc.decode_events.len(),
            sc.present_events.len(),
        );
    }
    eprintln!("[queue] demux_events={}", ctx.demux_events.len());
}

fn join_all(handles: Vec<StageHandle>) -> Result<()> {
    for handle in handles {
        join_one(handle)?;
    }
    Ok(())
}

fn join_one(handle: StageHandle) -> Result<()> {
    match handle.handle.join() {
        Ok(result) => result,
        Err(_) => {
            eprintln!("[controller] {} thread panicked", handle.label);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use rustplay_types::Rational;

    use super::*;
    use crate::core::context::{AudioStreamContext, PlaybackState};
    use crate::core::surface::GraphicsSurface;

    struct FakeSurface {
        close_requested: AtomicBool,
        queued_events: Mutex<Vec<InputEvent>>,
    }

    impl FakeSurface {
        fn closed() -> Self {
            Self { close_requested: AtomicBool::new(true), queued_events: Mutex::new(vec![]) }
        }
    }

    impl GraphicsSurface for FakeSurface {
        fn commit_frame(&self, _frame: rustplay_types::VideoFrame) {}

        fn poll_events(&self) -> Vec<InputEvent> {
            std::mem::take(&mut *self.queued_events.lock().expect("queued events mutex poisoned"))
        }

        fn close_requested(&self) -> bool {
            self.close_requested.load(Ordering::Acquire)
        }
    }

    fn play_context() -> PlayContext {
        PlayContext::new(Some(AudioStreamContext::new(Rational::new(1, 1_000))), None)
    }

    #[test]
    fn toggle_pause_moves_between_playing_and_pause() {
        let ctx = play_context();
        toggle_pause(&ctx);
        assert_eq!(ctx.state(), PlaybackState::Pause);
        toggle_pause(&ctx);
        assert_eq!(ctx.state(), PlaybackState::Playing);
    }

    #[test]
    fn toggle_pause_is_a_noop_while_seeking() {
        let ctx = play_context();
        ctx.seek(1_000_000);
        toggle_pause(&ctx);
        assert_eq!(ctx.state(), PlaybackState::PlaySeeking);
    }

    #[test]
    fn seek_relative_clamps_to_zero_and_enqueues_a_seek() {
        let ctx = play_context();
        seek_relative(&ctx, -5_000_000);
        assert_eq!(ctx.demux_events.len(), 1);
        assert_eq!(ctx.state(), PlaybackState::PlaySeeking);
    }

    #[test]
    fn dump_queue_state_does_not_panic_with_no_streams() {
        let ctx = PlayContext::new(None, None);
        dump_queue_state(&ctx);
    }

    #[test]
    fn run_controller_joins_every_stage_once_surface_requests_close() {
        let ctx = play_context();
        let surface = FakeSurface::closed();
        let demuxer = StageHandle { label: "demux", handle: std::thread::spawn(|| Ok(())) };

        let result = run_controller(&ctx, &surface, Vec::new(), Vec::new(), demuxer);

        assert!(result.is_ok());
        assert_eq!(ctx.demux_events.len(), 1);
    }
}
