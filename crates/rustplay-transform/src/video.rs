/*!
    Video frame transformation.
*/

use ffmpeg_next::{
    software::scaling::{context::Context as ScalerContext, flag::Flags as ScalerFlags},
    util::frame::video::Video as VideoFrameFFmpeg,
};

use rustplay_types::{Error, PixelFormat, Result, VideoFrame};

/**
    Scaling algorithm for video resizing.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScalingAlgorithm {
    /// Nearest neighbor - fastest, lowest quality.
    Nearest,
    /// Bilinear interpolation - fast, acceptable quality.
    #[default]
    Bilinear,
    /// Bicubic interpolation - moderate speed, good quality.
    Bicubic,
    /// Lanczos resampling - slowest, highest quality.
    Lanczos,
}

impl ScalingAlgorithm {
    fn to_ffmpeg_flags(self) -> ScalerFlags {
        match self {
            Self::Nearest => ScalerFlags::POINT,
            Self::Bilinear => ScalerFlags::BILINEAR,
            Self::Bicubic => ScalerFlags::BICUBIC,
            Self::Lanczos => ScalerFlags::LANCZOS,
        }
    }
}

/**
    Configuration for video transformation.
*/
#[derive(Clone, Debug)]
pub struct VideoTransformConfig {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub algorithm: ScalingAlgorithm,
}

impl VideoTransformConfig {
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
            algorithm: ScalingAlgorithm::default(),
        }
    }

    /// RGB24 output — the core video presenter's target pixel format (spec §4.6).
    pub fn to_rgb24(width: u32, height: u32) -> Self {
        Self::new(width, height, PixelFormat::Rgb24)
    }

    pub fn with_algorithm(mut self, algorithm: ScalingAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }
}

/**
    Converts video frames between pixel format and dimensions. The scaler
    context is lazily initialized on first use and reinitialized if the
    input format changes.
*/
pub struct VideoTransform {
    config: VideoTransformConfig,
    scaler_state: Option<ScalerState>,
}

struct ScalerState {
    context: ScalerContext,
    src_width: u32,
    src_height: u32,
    src_format: PixelFormat,
}

impl VideoTransform {
    pub fn new(config: VideoTransformConfig) -> Self {
        Self {
            config,
            scaler_state: None,
        }
    }

    pub fn config(&self) -> &VideoTransformConfig {
        &self.config
    }

    /**
        Transform a video frame to the target format, (re)initializing
        the scaler if the input dimensions or format changed.
    */
    pub fn transform(&mut self, frame: &VideoFrame) -> Result<VideoFrame> {
        if frame.width == 0 || frame.height == 0 {
            return Err(Error::invalid_data("input frame has zero dimensions"));
        }
        if frame.data.is_empty() {
            return Err(Error::invalid_data("input frame has no data"));
        }

        let needs_init = match &self.scaler_state {
            None => true,
            Some(state) => {
                state.src_width != frame.width
                    || state.src_height != frame.height
                    || state.src_format != frame.format
            }
        };

        if needs_init {
            self.init_scaler(frame.width, frame.height, frame.format)?;
        }

        self.scale_frame(frame)
    }

    /// Drop the scaler state. Call after a seek.
    pub fn reset(&mut self) {
        self.scaler_state = None;
    }

    fn init_scaler(&mut self, src_width: u32, src_height: u32, src_format: PixelFormat) -> Result<()> {
        let src_pixel = pixel_format_to_ffmpeg(src_format)?;
        let dst_pixel = pixel_format_to_ffmpeg(self.config.format)?;

        let context = ScalerContext::get(
            src_pixel,
            src_width,
            src_height,
            dst_pixel,
            self.config.width,
            self.config.height,
            self.config.algorithm.to_ffmpeg_flags(),
        )
        .map_err(|e| Error::codec(format!("failed to create scaler: {}", e)))?;

        self.scaler_state = Some(ScalerState {
            context,
            src_width,
            src_height,
            src_format,
        });

        Ok(())
    }

    fn scale_frame(&mut self, frame: &VideoFrame) -> Result<VideoFrame> {
        let state = self.scaler_state.as_mut().expect("scaler not initialized");

        let src_pixel = pixel_format_to_ffmpeg(frame.format)?;
        let mut src_frame = VideoFrameFFmpeg::new(src_pixel, frame.width, frame.height);
        copy_data_to_ffmpeg_frame(&mut src_frame, frame)?;

        let dst_pixel = pixel_format_to_ffmpeg(self.config.format)?;
        let mut dst_frame = VideoFrameFFmpeg::new(dst_pixel, self.config.width, self.config.height);

        state
            .context
            .run(&src_frame, &mut dst_frame)
            .map_err(|e| Error::codec(format!("scaling failed: {}", e)))?;

        let data = copy_data_from_ffmpeg_frame(&dst_frame, self.config.format)?;

        Ok(VideoFrame::new(
            data,
            self.config.width,
            self.config.height,
            self.config.format,
            frame.pts,
            frame.time_base,
        ))
    }
}

fn pixel_format_to_ffmpeg(format: PixelFormat) -> Result<ffmpeg_next::format::Pixel> {
    use ffmpeg_next::format::Pixel;

    match format {
        PixelFormat::Yuv420p => Ok(Pixel::YUV420P),
        PixelFormat::Bgra => Ok(Pixel::BGRA),
        PixelFormat::Rgba => Ok(Pixel::RGBA),
        PixelFormat::Rgb24 => Ok(Pixel::RGB24),
        PixelFormat::Bgr24 => Ok(Pixel::BGR24),
        PixelFormat::Yuv422p => Ok(Pixel::YUV422P),
        PixelFormat::Yuv444p => Ok(Pixel::YUV444P),
    }
}

fn copy_data_to_ffmpeg_frame(dst: &mut VideoFrameFFmpeg, src: &VideoFrame) -> Result<()> {
    match src.format {
        PixelFormat::Bgra | PixelFormat::Rgba => {
            let bytes_per_pixel = 4;
            let dst_stride = dst.stride(0);
            let dst_data = dst.data_mut(0);

            for y in 0..src.height as usize {
                let src_row_start = y * src.width as usize * bytes_per_pixel;
                let src_row_end = src_row_start + src.width as usize * bytes_per_pixel;
                let dst_row_start = y * dst_stride;

                dst_data[dst_row_start..dst_row_start + src.width as usize * bytes_per_pixel]
                    .copy_from_slice(&src.data[src_row_start..src_row_end]);
            }
            Ok(())
        }

        PixelFormat::Rgb24 | PixelFormat::Bgr24 => {
            let bytes_per_pixel = 3;
            let dst_stride = dst.stride(0);
            let dst_data = dst.data_mut(0);

            for y in 0..src.height as usize {
                let src_row_start = y * src.width as usize * bytes_per_pixel;
                let src_row_end = src_row_start + src.width as usize * bytes_per_pixel;
                let dst_row_start = y * dst_stride;

                dst_data[dst_row_start..dst_row_start + src.width as usize * bytes_per_pixel]
                    .copy_from_slice(&src.data[src_row_start..src_row_end]);
            }
            Ok(())
        }

        PixelFormat::Yuv420p | PixelFormat::Yuv422p | PixelFormat::Yuv444p => {
            let width = src.width as usize;
            let height = src.height as usize;

            let (uv_width, uv_height) = match src.format {
                PixelFormat::Yuv420p => (width / 2, height / 2),
                PixelFormat::Yuv422p => (width / 2, height),
                PixelFormat::Yuv444p => (width, height),
                _ => unreachable!(),
            };

            let y_size = width * height;
            let uv_size = uv_width * uv_height;

            let y_stride = dst.stride(0);
            let y_data = dst.data_mut(0);
            for y in 0..height {
                let src_start = y * width;
                let dst_start = y * y_stride;
                y_data[dst_start..dst_start + width]
                    .copy_from_slice(&src.data[src_start..src_start + width]);
            }

            let u_stride = dst.stride(1);
            let u_data = dst.data_mut(1);
            for y in 0..uv_height {
                let src_start = y_size + y * uv_width;
                let dst_start = y * u_stride;
                u_data[dst_start..dst_start + uv_width]
                    .copy_from_slice(&src.data[src_start..src_start + uv_width]);
            }

            let v_stride = dst.stride(2);
            let v_data = dst.data_mut(2);
            for y in 0..uv_height {
                let src_start = y_size + uv_size + y * uv_width;
                let dst_start = y * v_stride;
                v_data[dst_start..dst_start + uv_width]
                    .copy_from_slice(&src.data[src_start..src_start + uv_width]);
            }

            Ok(())
        }
    }
}

fn copy_data_from_ffmpeg_frame(frame: &VideoFrameFFmpeg, format: PixelFormat) -> Result<Vec<u8>> {
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

            let (uv_width, uv_height) = match format {
                PixelFormat::Yuv420p => (width / 2, height / 2),
                PixelFormat::Yuv422p => (width / 2, height),
                PixelFormat::Yuv444p => (width, height),
                _ => unreachable!(),
            };

            let total_size = width * height + 2 * uv_width * uv_height;
            let mut output = Vec::with_capacity(total_size);

            let y_stride = frame.stride(0);
            let y_data = frame.data(0);
            for y in 0..height {
                let row_start = y * y_stride;
                output.extend_from_slice(&y_data[row_start..row_start + width]);
            }

            let u_stride = frame.stride(1);
            let u_data = frame.data(1);
            for y in 0..uv_height {
                let row_start = y * u_stride;
                output.extend_from_slice(&u_data[row_start..row_start + uv_width]);
            }

            let v_stride = frame.stride(2);
            let v_data = frame.data(2);
            for y in 0..uv_height {
                let row_start = y * v_stride;
                output.extend_from_slice(&v_data[row_start..row_start + uv_width]);
            }

            Ok(output)
        }
    }
}

impl std::fmt::Debug for VideoTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoTransform")
            .field("config", &self.config)
            .field("initialized", &self.scaler_state.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_rgb24_sets_format() {
        let config = VideoTransformConfig::to_rgb24(640, 480);
        assert_eq!(config.format, PixelFormat::Rgb24);
        assert_eq!(config.algorithm, ScalingAlgorithm::Bilinear);
    }
}
