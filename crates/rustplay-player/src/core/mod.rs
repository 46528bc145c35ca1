/*!
    The pipeline and synchronization engine.
*/

mod audio_presenter;
mod config;
mod context;
mod controller;
mod decode_stage;
mod demux;
mod error;
mod event;
mod log;
mod queue;
mod sink;
mod surface;
mod video_presenter;

pub use audio_presenter::run_audio_presenter;
pub use config::{PKT_QUEUE_SIZE, SEEK_STEP_US};
pub use context::{AudioStreamContext, PlayContext, PlaybackState, VideoStreamContext};
pub use controller::{run_controller, StageHandle};
pub use decode_stage::{run_audio_decode_stage, run_video_decode_stage};
pub use demux::run_demux;
pub use error::{PlayerError, Result};
pub use event::{Event, EventKind, EventQueue};
pub use queue::BoundedQueue;
pub use sink::{AudioSink, CpalAudioSink};
pub use surface::{GraphicsSurface, InputEvent, TerminalSurface};
pub use video_presenter::run_video_presenter;
