/*!
    Error types shared across the pipeline crates.
*/

use thiserror::Error;

/// Result alias used throughout the ecosystem.
pub type Result<T> = std::result::Result<T, Error>;

/**
    Errors that can occur while demuxing, decoding, or transforming media.

    This is the vocabulary-level error type: it has no knowledge of threads,
    queues, or playback state. `rustplay-player` wraps this in its own
    `PlayerError` for failures specific to the pipeline/sync engine.
*/
#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("no such stream")]
    NoSuchStream,

    #[error("source does not support seeking: {0}")]
    NotSeekable(String),
}

impl Error {
    pub fn codec(msg: impl Into<String>) -> Self {
        Self::Codec(msg.into())
    }

    pub fn unsupported_format(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    pub fn not_seekable(msg: impl Into<String>) -> Self {
        Self::NotSeekable(msg.into())
    }
}
