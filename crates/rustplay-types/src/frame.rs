/*!
    Decoded frame types.
*/

use std::time::Duration;

use crate::format::{ChannelLayout, PixelFormat, SampleFormat};
use crate::packet::Pts;
use crate::rational::Rational;

/**
    A decoded block of audio samples, already planar-to-interleaved per
    `rustplay-decode`'s conversion, in the format the decoder produced.

    `rustplay-transform` converts this to the presenter's target format
    and layout; the core pipeline only reads `pts`/`presentation_time`.
*/
#[derive(Clone, Debug)]
pub struct AudioFrame {
    pub data: Vec<u8>,
    pub samples: usize,
    pub sample_rate: u32,
    pub channels: ChannelLayout,
    pub format: SampleFormat,
    pub pts: Option<Pts>,
    pub time_base: Rational,
}

impl AudioFrame {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        data: Vec<u8>,
        samples: usize,
        sample_rate: u32,
        channels: ChannelLayout,
        format: SampleFormat,
        pts: Option<Pts>,
        time_base: Rational,
    ) -> Self {
        Self {
            data,
            samples,
            sample_rate,
            channels,
            format,
            pts,
            time_base,
        }
    }

    pub fn presentation_time(&self) -> Option<Duration> {
        self.pts.map(|Pts(pts)| {
            let us = self.time_base.pts_to_us(pts).max(0);
            Duration::from_micros(us as u64)
        })
    }
}

/**
    A decoded video frame, in the format the decoder/transform stage
    produced (typically RGB24 after `rustplay-transform`, see spec §4.6).
*/
#[derive(Clone, Debug)]
pub struct VideoFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub pts: Option<Pts>,
    pub time_base: Rational,
}

impl VideoFrame {
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: PixelFormat,
        pts: Option<Pts>,
        time_base: Rational,
    ) -> Self {
        Self {
            data,
            width,
            height,
            format,
            pts,
            time_base,
        }
    }

    pub fn presentation_time(&self) -> Option<Duration> {
        self.pts.map(|Pts(pts)| {
            let us = self.time_base.pts_to_us(pts).max(0);
            Duration::from_micros(us as u64)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_frame_presentation_time() {
        let f = AudioFrame::new(
            vec![0; 8],
            2,
            48_000,
            ChannelLayout::Stereo,
            SampleFormat::S16,
            Some(Pts(48_000)),
            Rational::new(1, 48_000),
        );
        assert_eq!(f.presentation_time(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn video_frame_no_pts() {
        let f = VideoFrame::new(
            vec![0; 4],
            1,
            1,
            PixelFormat::Rgb24,
            None,
            Rational::new(1, 25),
        );
        assert_eq!(f.presentation_time(), None);
    }
}
