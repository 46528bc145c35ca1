/*!
    Media source and demuxing for the rustplay pipeline.

    This crate handles the input side of the pipeline. It opens a media
    file, parses its container, and produces encoded packets that
    `rustplay-decode` turns into frames.

    # Example

    ```ignore
    use rustplay_source::{open, probe};

    let info = probe("video.mp4")?;
    println!("duration: {:?}", info.duration);

    let mut source = open("video.mp4")?;
    while let Some(packet) = source.next_packet()? {
        match packet.stream_type {
            StreamType::Video => { /* decode video */ }
            StreamType::Audio => { /* decode audio */ }
        }
    }
    ```
*/

pub use rustplay_types::{
    AudioStreamInfo, Error, MediaInfo, Packet, Result, StreamType, VideoStreamInfo,
};

mod codec_config;
mod convert;
mod probe;
mod source;

pub use codec_config::CodecConfig;
pub use probe::probe;
pub use source::{Source, SourceConfig, StreamFilter, open, open_with_config};
