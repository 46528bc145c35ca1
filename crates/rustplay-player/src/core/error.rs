/*!
    Player-level error type (spec §7).

    Wraps the library-level [`rustplay_types::Error`] (demux/decode/
    transform failures) with the fatal-setup conditions that only make
    sense at the player's own boundary: no decodable stream, audio device
    open failure, graphics/terminal init failure.
*/

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error(transparent)]
    Media(#[from] rustplay_types::Error),

    #[error("no decodable audio or video stream in input")]
    NoDecodableStream,

    #[error("audio device error: {0}")]
    AudioDevice(String),

    #[error("graphics surface error: {0}")]
    GraphicsSurface(String),
}

pub type Result<T> = std::result::Result<T, PlayerError>;
