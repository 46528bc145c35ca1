/*!
    Video decoder implementation.
*/

use ffmpeg_next::{
    codec::{self, decoder::Video as VideoDecoderFFmpeg},
    ffi,
    util::frame::video::Video as VideoFrameFFmpeg,
};

use rustplay_source::CodecConfig;
use rustplay_types::{Error, Packet, PixelFormat, Pts, Rational, Result, VideoFrame};

use crate::config::VideoDecoderConfig;

/**
    Decodes video packets into frames.
*/
pub struct VideoDecoder {
    decoder: VideoDecoderFFmpeg,
    time_base: Rational,
}

impl VideoDecoder {
    pub fn new(
        codec_config: CodecConfig,
        time_base: Rational,
        config: VideoDecoderConfig,
    ) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::codec(e.to_string()))?;

        let parameters = codec_config.into_parameters();

        let decoder_ctx = codec::context::Context::from_parameters(parameters)
            .map_err(|e| Error::codec(e.to_string()))?;

        let mut decoder = decoder_ctx
            .decoder()
            .video()
            .map_err(|e| Error::codec(e.to_string()))?;

        if let Some(threads) = config.thread_count {
            // SAFETY: decoder is freshly created and not yet opened for decoding.
            unsafe {
                (*decoder.as_mut_ptr()).thread_count = threads as i32;
            }
        }

        Ok(Self { decoder, time_base })
    }

    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    /**
        Decode a packet, returning zero, one, or multiple frames. B-frames
        cause the decoder to buffer frames internally.
    */
    pub fn decode(&mut self, packet: &Packet) -> Result<Vec<VideoFrame>> {
        let mut ffmpeg_pkt = if packet.data.is_empty() {
            ffmpeg_next::Packet::empty()
        } else {
            ffmpeg_next::Packet::copy(&packet.data)
        };

        // SAFETY: ffmpeg_pkt was just constructed and is uniquely owned here.
        unsafe {
            let pkt_ptr = ffmpeg_pkt.as_mut_ptr();
            if let Some(pts) = packet.pts {
                (*pkt_ptr).pts = pts.0;
            }
            if let Some(dts) = packet.dts {
                (*pkt_ptr).dts = dts.0;
            }
            (*pkt_ptr).duration = packet.duration.0;
        }

        match self.decoder.send_packet(&ffmpeg_pkt) {
            Ok(()) => {}
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => {
                let mut all_frames = self.receive_frames()?;
                match self.decoder.send_packet(&ffmpeg_pkt) {
                    Ok(()) => all_frames.extend(self.receive_frames()?),
                    Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => {}
                    Err(e) => return Err(Error::codec(e.to_string())),
                }
                return Ok(all_frames);
            }
            Err(e) => return Err(Error::codec(e.to_string())),
        }

        self.receive_frames()
    }

    /// Flush the decoder to get any remaining buffered frames at end of stream.
    pub fn flush(&mut self) -> Result<Vec<VideoFrame>> {
        let mut all_frames = self.receive_frames()?;

        match self.decoder.send_eof() {
            Ok(()) => {}
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => {
                all_frames.extend(self.receive_frames()?);
                let _ = self.decoder.send_eof();
            }
            Err(ffmpeg_next::Error::Eof) => {}
            Err(e) => return Err(Error::codec(e.to_string())),
        }

        all_frames.extend(self.receive_frames()?);
        Ok(all_frames)
    }

    /// Clear internal buffers. Call after a seek, before feeding post-seek packets.
    pub fn reset(&mut self) {
        self.decoder.flush();
    }

    fn receive_frames(&mut self) -> Result<Vec<VideoFrame>> {
        let mut frames = Vec::new();
        let mut decoded_frame = VideoFrameFFmpeg::empty();

        loop {
            match self.decoder.receive_frame(&mut decoded_frame) {
                Ok(()) => match self.convert_frame(&decoded_frame) {
                    Ok(frame) => frames.push(frame),
                    Err(e) => eprintln!("[video_decode] frame conversion error: {}", e),
                },
                Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => break,
                Err(ffmpeg_next::Error::Eof) => break,
                Err(e) => {
                    if frames.is_empty() {
                        return Err(Error::codec(e.to_string()));
                    }
                    break;
                }
            }
        }

        Ok(frames)
    }

    fn convert_frame(&self, frame: &VideoFrameFFmpeg) -> Result<VideoFrame> {
        let width = frame.width();
        let height = frame.height();

        if width == 0 || height == 0 {
            return Err(Error::invalid_data("frame has zero dimensions"));
        }

        let ffmpeg_format = frame.format();
        let format = pixel_format_from_ffmpeg(ffmpeg_format).ok_or_else(|| {
            Error::unsupported_format(format!("unsupported pixel format: {:?}", ffmpeg_format))
        })?;

        let pts = frame.pts().map(Pts);
        let data = copy_frame_data(frame, format)?;

        Ok(VideoFrame::new(data, width, height, format, pts, self.time_base))
    }
}

/// Copy frame data from an FFmpeg frame into a contiguous buffer.
fn copy_frame_data(frame: &VideoFrameFFmpeg, format: PixelFormat) -> Result<Vec<u8>> {
    match format {
        PixelFormat::Bgra | PixelFormat::Rgba => {
            let width = frame.width() as usize;
            let height = frame.height() as usize;
            let bytes_per_pixel = 4;
            let stride = frame.stride(0);
            let data = frame.data(0);

            let mut output = Vec::with_capacity(width * height * bytes_per_pixel);
            for y in 0..height {
                let row_start = y * stride;
                let row_end = row_start + width * bytes_per_pixel;
                output.extend_from_slice(&data[row_start..row_end]);
            }
            Ok(output)
        }

        PixelFormat::Rgb24 | PixelFormat::Bgr24 => {
            let width = frame.width() as usize;
            let height = frame.height() as usize;
            let bytes_per_pixel = 3;
            let stride = frame.stride(0);
            let data = frame.data(0);

            let mut output = Vec::with_capacity(width * height * bytes_per_pixel);
            for y in 0..height {
                let row_start = y * stride;
                let row_end = row_start + width * bytes_per_pixel;
                output.extend_from_slice(&data[row_start..row_end]);
            }
            Ok(output)
        }

        PixelFormat::Yuv420p | PixelFormat::Yuv422p | PixelFormat::Yuv444p => {
            let width = frame.width() as usize;
            let height = frame.height() as usize;

            let uv_height = match format {
                PixelFormat::Yuv420p => height / 2,
                _ => height,
            };
            let uv_width = match format {
                PixelFormat::Yuv420p | PixelFormat::Yuv422p => width / 2,
                PixelFormat::Yuv444p => width,
                _ => unreachable!(),
            };

            let y_size = width * height;
            let total_size = y_size + 2 * uv_width * uv_height;
            let mut output = Vec::with_capacity(total_size);

            let y_stride = frame.stride(0);
            let y_data = frame.data(0);
            for y in 0..height {
                let row_start = y * y_stride;
                let row_end = row_start + width;
                output.extend_from_slice(&y_data[row_start..row_end]);
            }

            let u_stride = frame.stride(1);
            let u_data = frame.data(1);
            for y in 0..uv_height {
                let row_start = y * u_stride;
                let row_end = row_start + uv_width;
                output.extend_from_slice(&u_data[row_start..row_end]);
            }

            let v_stride = frame.stride(2);
            let v_data = frame.data(2);
            for y in 0..uv_height {
                let row_start = y * v_stride;
                let row_end = row_start + uv_width;
                output.extend_from_slice(&v_data[row_start..row_end]);
            }

            Ok(output)
        }
    }
}

fn pixel_format_from_ffmpeg(format: ffmpeg_next::format::Pixel) -> Option<PixelFormat> {
    use ffmpeg_next::format::Pixel;

    match format {
        Pixel::YUV420P => Some(PixelFormat::Yuv420p),
        Pixel::BGRA => Some(PixelFormat::Bgra),
        Pixel::RGBA => Some(PixelFormat::Rgba),
        Pixel::RGB24 => Some(PixelFormat::Rgb24),
        Pixel::BGR24 => Some(PixelFormat::Bgr24),
        Pixel::YUV422P => Some(PixelFormat::Yuv422p),
        Pixel::YUV444P => Some(PixelFormat::Yuv444p),
        _ => None,
    }
}

impl std::fmt::Debug for VideoDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoDecoder")
            .field("time_base", &self.time_base)
            .finish_non_exhaustive()
    }
}
