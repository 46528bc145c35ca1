/*!
    Graphics surface interface (spec §6) and a terminal-backed
    implementation.

    Video output (window, texture upload, VSync) is an explicit non-goal
    (§1): the core only depends on `commit_frame`/`poll_events`/
    `close_requested`. `TerminalSurface` satisfies that interface using
    `crossterm` raw-mode input, the way `Kajmany-bytebeat`'s `tui.rs`
    drives its key handling, but owns no actual pixel renderer — holding
    the latest committed frame is enough to prove the dedup-to-newest
    contract without reimplementing a terminal video renderer, which is
    out of scope for the pipeline/sync engine this crate specifies.
*/

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEventKind};
use crossterm::terminal;

use rustplay_types::VideoFrame;

use super::error::{PlayerError, Result};

/// Input events the controller (§6 "Keyboard") dispatches to the play context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Quit,
    TogglePause,
    SeekForward,
    SeekBackward,
    DumpQueueState,
}

pub trait GraphicsSurface: Send + Sync {
    /// The surface dedups to the latest committed frame per VSync and
    /// owns the frame from commit onwards (§6).
    fn commit_frame(&self, frame: VideoFrame);
    fn poll_events(&self) -> Vec<InputEvent>;
    fn close_requested(&self) -> bool;
}

pub struct TerminalSurface {
    latest_frame: Mutex<Option<VideoFrame>>,
    close_requested: AtomicBool,
}

impl TerminalSurface {
    pub fn new() -> Result<Self> {
        terminal::enable_raw_mode()
            .map_err(|e| PlayerError::GraphicsSurface(e.to_string()))?;
        Ok(Self {
            latest_frame: Mutex::new(None),
            close_requested: AtomicBool::new(false),
        })
    }

    /// Peek the most recently committed frame, for diagnostics/tests.
    pub fn peek_latest_frame(&self) -> Option<VideoFrame> {
        self.latest_frame.lock().expect("surface mutex poisoned").clone()
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

impl GraphicsSurface for TerminalSurface {
    fn commit_frame(&self, frame: VideoFrame) {
        *self.latest_frame.lock().expect("surface mutex poisoned") = Some(frame);
    }

    fn poll_events(&self) -> Vec<InputEvent> {
        let mut events = Vec::new();
        while event::poll(Duration::from_secs(0)).unwrap_or(false) {
            let Ok(raw) = event::read() else { break };
            let CrosstermEvent::Key(key) = raw else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Char('Q') => {
                    self.close_requested.store(true, Ordering::Release);
                    events.push(InputEvent::Quit);
                }
                KeyCode::Char(' ') => events.push(InputEvent::TogglePause),
                KeyCode::Right => events.push(InputEvent::SeekForward),
                KeyCode::Left => events.push(InputEvent::SeekBackward),
                KeyCode::Char('i') | KeyCode::Char('I') => events.push(InputEvent::DumpQueueState),
                _ => {}
            }
        }
        events
    }

    fn close_requested(&self) -> bool {
        self.close_requested.load(Ordering::Acquire)
    }
}
