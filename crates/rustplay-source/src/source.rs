/*!
    Media source implementation.
*/

use std::path::Path;
use std::time::Duration;

use ffmpeg_next::{format::context::Input as InputContext, media::Type};

use rustplay_types::{Error, MediaInfo, Packet, Rational, Result, StreamType};

use crate::codec_config::CodecConfig;
use crate::convert::{duration_from_ffmpeg, pts_from_ffmpeg, rational_from_ffmpeg};
use crate::probe::extract_media_info;

/**
    Configuration for opening a media source.
*/
#[derive(Clone, Debug, Default)]
pub struct SourceConfig {
    /// Filter which streams to demux (None = all available).
    pub stream_filter: Option<StreamFilter>,
}

/**
    Filter for selecting which streams to demux.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StreamFilter {
    /// Only demux video streams.
    VideoOnly,
    /// Only demux audio streams.
    AudioOnly,
    /// Demux both video and audio streams.
    #[default]
    Both,
}

/**
    A media source that produces encoded packets.

    Created by [`open`] or [`Source::open`]. Provides access to stream
    information and produces packets via [`Source::next_packet`], which
    the demux stage drives in a loop (see the core pipeline's demux thread).
*/
pub struct Source {
    input: InputContext,
    media_info: MediaInfo,
    video_stream_index: Option<usize>,
    audio_stream_index: Option<usize>,
    video_time_base: Option<Rational>,
    audio_time_base: Option<Rational>,
    video_codec_config: Option<CodecConfig>,
    audio_codec_config: Option<CodecConfig>,
    /// Packet buffered by `seek` and returned by the next `next_packet` call.
    buffered_packet: Option<Packet>,
}

impl Source {
    /**
        Open a media file at the given path.
    */
    pub fn open<P: AsRef<Path>>(path: P, config: SourceConfig) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::codec(e.to_string()))?;

        let input = ffmpeg_next::format::input(&path).map_err(|e| {
            if e.to_string().contains("No such file") {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    e.to_string(),
                ))
            } else {
                Error::codec(e.to_string())
            }
        })?;

        Self::from_input_context(input, config)
    }

    fn from_input_context(input: InputContext, config: SourceConfig) -> Result<Self> {
        let media_info = extract_media_info(&input)?;

        let want_video = !matches!(config.stream_filter, Some(StreamFilter::AudioOnly));
        let want_audio = !matches!(config.stream_filter, Some(StreamFilter::VideoOnly));

        let (video_stream_index, video_time_base, video_codec_config) = if want_video {
            if let Some(stream) = input.streams().best(Type::Video) {
                let index = stream.index();
                let time_base = rational_from_ffmpeg(stream.time_base());
                let codec_config = CodecConfig::new(stream.parameters());
                (Some(index), Some(time_base), Some(codec_config))
            } else {
                (None, None, None)
            }
        } else {
            (None, None, None)
        };

        let (audio_stream_index, audio_time_base, audio_codec_config) = if want_audio {
            if let Some(stream) = input.streams().best(Type::Audio) {
                let index = stream.index();
                let time_base = rational_from_ffmpeg(stream.time_base());
                let codec_config = CodecConfig::new(stream.parameters());
                (Some(index), Some(time_base), Some(codec_config))
            } else {
                (None, None, None)
            }
        } else {
            (None, None, None)
        };

        match config.stream_filter {
            Some(StreamFilter::VideoOnly) if video_stream_index.is_none() => {
                return Err(Error::NoSuchStream);
            }
            Some(StreamFilter::AudioOnly) if audio_stream_index.is_none() => {
                return Err(Error::NoSuchStream);
            }
            _ => {}
        }

        if video_stream_index.is_none() && audio_stream_index.is_none() {
            return Err(Error::invalid_data("no playable audio or video stream"));
        }

        Ok(Self {
            input,
            media_info,
            video_stream_index,
            audio_stream_index,
            video_time_base,
            audio_time_base,
            video_codec_config,
            audio_codec_config,
            buffered_packet: None,
        })
    }

    pub fn media_info(&self) -> &MediaInfo {
        &self.media_info
    }

    pub fn video_codec_config(&self) -> Option<&CodecConfig> {
        self.video_codec_config.as_ref()
    }

    pub fn take_video_codec_config(&mut self) -> Option<CodecConfig> {
        self.video_codec_config.take()
    }

    pub fn audio_codec_config(&self) -> Option<&CodecConfig> {
        self.audio_codec_config.as_ref()
    }

    pub fn take_audio_codec_config(&mut self) -> Option<CodecConfig> {
        self.audio_codec_config.take()
    }

    pub fn video_time_base(&self) -> Option<Rational> {
        self.video_time_base
    }

    pub fn audio_time_base(&self) -> Option<Rational> {
        self.audio_time_base
    }

    pub fn has_video(&self) -> bool {
        self.video_stream_index.is_some()
    }

    pub fn has_audio(&self) -> bool {
        self.audio_stream_index.is_some()
    }

    /**
        Check if this source supports seeking.

        Returns false for sources without a seekable I/O context.
    */
    pub fn is_seekable(&self) -> bool {
        // SAFETY: `self.input` always wraps a valid AVFormatContext.
        unsafe {
            let ctx = self.input.as_ptr();
            if (*ctx).pb.is_null() {
                return false;
            }
            (*(*ctx).pb).seekable != 0
        }
    }

    /**
        Read the next packet from the source.

        Returns `Ok(Some(packet))` for each packet, `Ok(None)` at end of
        stream. Packets are returned in file order, interleaved between
        streams not excluded by the configured `StreamFilter`.
    */
    pub fn next_packet(&mut self) -> Result<Option<Packet>> {
        if let Some(packet) = self.buffered_packet.take() {
            return Ok(Some(packet));
        }

        self.read_next_packet_internal()
    }

    fn read_next_packet_internal(&mut self) -> Result<Option<Packet>> {
        loop {
            let (stream, ffmpeg_packet) = match self.input.packets().next() {
                Some(result) => result,
                None => return Ok(None),
            };

            let stream_index = stream.index();

            let (stream_type, time_base) = if Some(stream_index) == self.video_stream_index {
                (StreamType::Video, self.video_time_base.unwrap())
            } else if Some(stream_index) == self.audio_stream_index {
                (StreamType::Audio, self.audio_time_base.unwrap())
            } else {
                continue;
            };

            let is_keyframe = ffmpeg_packet.is_key();
            let data = ffmpeg_packet.data().map(|d| d.to_vec()).unwrap_or_default();

            let packet = Packet::new(
                data,
                pts_from_ffmpeg(ffmpeg_packet.pts()),
                pts_from_ffmpeg(ffmpeg_packet.dts()),
                duration_from_ffmpeg(ffmpeg_packet.duration()),
                time_base,
                is_keyframe,
                stream_type,
            );

            return Ok(Some(packet));
        }
    }

    /**
        Seek to a position in the media.

        Seeks to the nearest keyframe at or before the target position and
        returns the actual position seeked to; callers use this to reset
        their playback clock rather than trusting the requested position.
    */
    pub fn seek(&mut self, position: Duration) -> Result<Duration> {
        if !self.is_seekable() {
            return Err(Error::not_seekable("source has no seekable I/O context"));
        }

        let timestamp = (position.as_secs_f64() * ffmpeg_next::ffi::AV_TIME_BASE as f64) as i64;

        self.input
            .seek(timestamp, ..timestamp)
            .map_err(|e| Error::codec(format!("seek failed: {}", e)))?;

        self.buffered_packet = None;

        if let Some(packet) = self.read_next_packet_internal()? {
            let actual_position = packet.presentation_time().unwrap_or(position);
            self.buffered_packet = Some(packet);
            Ok(actual_position)
        } else {
            Ok(position)
        }
    }
}

/// Open a media file with default configuration.
pub fn open<P: AsRef<Path>>(path: P) -> Result<Source> {
    Source::open(path, SourceConfig::default())
}

/// Open a media file with the given configuration.
pub fn open_with_config<P: AsRef<Path>>(path: P, config: SourceConfig) -> Result<Source> {
    Source::open(path, config)
}

impl Iterator for Source {
    type Item = Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_packet() {
            Ok(Some(packet)) => Some(Ok(packet)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
