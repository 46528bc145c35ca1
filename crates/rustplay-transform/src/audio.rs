/*!
    Audio frame transformation.
*/

use ffmpeg_next::{
    ChannelLayout as FFmpegChannelLayout,
    software::resampling::context::Context as ResamplerContext,
    util::frame::audio::Audio as AudioFrameFFmpeg,
};

use rustplay_types::{AudioFrame, ChannelLayout, Error, Rational, Result, SampleFormat};

/**
    Configuration for audio transformation.
*/
#[derive(Clone, Debug)]
pub struct AudioTransformConfig {
    /// Target sample rate in Hz.
    pub sample_rate: u32,
    /// Target channel layout.
    pub channels: ChannelLayout,
    /// Target sample format.
    pub format: SampleFormat,
}

impl AudioTransformConfig {
    pub fn new(sample_rate: u32, channels: ChannelLayout, format: SampleFormat) -> Self {
        Self {
            sample_rate,
            channels,
            format,
        }
    }

    /// 48kHz stereo S16 — the target the core audio presenter plays out (spec §4.5, §6).
    pub fn playback() -> Self {
        Self::new(48_000, ChannelLayout::Stereo, SampleFormat::S16)
    }
}

/**
    Converts audio frames between sample rate, channel layout, and sample
    format. The resampler context is lazily initialized on first use and
    reinitialized if the input format changes.

    Resampling is stateful: frames must be processed in order, and
    `flush()` called at end of stream.
*/
pub struct AudioTransform {
    config: AudioTransformConfig,
    resampler_state: Option<ResamplerState>,
}

struct ResamplerState {
    context: ResamplerContext,
    src_sample_rate: u32,
    src_channels: ChannelLayout,
    src_format: SampleFormat,
}

impl AudioTransform {
    pub fn new(config: AudioTransformConfig) -> Self {
        Self {
            config,
            resampler_state: None,
        }
    }

    pub fn config(&self) -> &AudioTransformConfig {
        &self.config
    }

    /**
        Transform an audio frame to the target format, (re)initializing
        the resampler if the input format changed since the last call.
    */
    pub fn transform(&mut self, frame: &AudioFrame) -> Result<AudioFrame> {
        if frame.samples == 0 {
            return Err(Error::invalid_data("input frame has zero samples"));
        }
        if frame.data.is_empty() {
            return Err(Error::invalid_data("input frame has no data"));
        }

        let needs_init = match &self.resampler_state {
            None => true,
            Some(state) => {
                state.src_sample_rate != frame.sample_rate
                    || state.src_channels != frame.channels
                    || state.src_format != frame.format
            }
        };

        if needs_init {
            self.init_resampler(frame.sample_rate, frame.channels, frame.format)?;
        }

        self.resample_frame(frame)
    }

    /// Flush any samples the resampler has buffered. Call at end of stream.
    pub fn flush(&mut self) -> Result<Option<AudioFrame>> {
        let state = match &mut self.resampler_state {
            Some(s) => s,
            None => return Ok(None),
        };

        let dst_sample = sample_format_to_ffmpeg(self.config.format)?;
        let dst_layout = channel_layout_to_ffmpeg(self.config.channels);

        let delay = state.context.delay();
        let delay_samples = delay.map(|d| d.output as usize).unwrap_or(0);
        if delay_samples == 0 {
            return Ok(None);
        }

        let mut dst_frame = AudioFrameFFmpeg::new(dst_sample, delay_samples, dst_layout);
        dst_frame.set_rate(self.config.sample_rate);

        match state.context.flush(&mut dst_frame) {
            Ok(_) => {}
            Err(e) => {
                if dst_frame.samples() == 0 {
                    return Ok(None);
                }
                return Err(Error::codec(format!("resampler flush failed: {}", e)));
            }
        }

        if dst_frame.samples() == 0 {
            return Ok(None);
        }

        let data =
            copy_audio_data_from_ffmpeg(&dst_frame, self.config.format, self.config.channels)?;
        let samples = dst_frame.samples();

        Ok(Some(AudioFrame::new(
            data,
            samples,
            self.config.sample_rate,
            self.config.channels,
            self.config.format,
            None,
            Rational::new(1, self.config.sample_rate as i32),
        )))
    }

    /// Drop the resampler state. Call after a seek to discard buffered samples.
    pub fn reset(&mut self) {
        self.resampler_state = None;
    }

    fn init_resampler(
        &mut self,
        src_sample_rate: u32,
        src_channels: ChannelLayout,
        src_format: SampleFormat,
    ) -> Result<()> {
        let src_sample = sample_format_to_ffmpeg(src_format)?;
        let src_layout = channel_layout_to_ffmpeg(src_channels);

        let dst_sample = sample_format_to_ffmpeg(self.config.format)?;
        let dst_layout = channel_layout_to_ffmpeg(self.config.channels);

        let context = ResamplerContext::get(
            src_sample,
            src_layout,
            src_sample_rate,
            dst_sample,
            dst_layout,
            self.config.sample_rate,
        )
        .map_err(|e| Error::codec(format!("failed to create resampler: {}", e)))?;

        self.resampler_state = Some(ResamplerState {
            context,
            src_sample_rate,
            src_channels,
            src_format,
        });

        Ok(())
    }

    fn resample_frame(&mut self, frame: &AudioFrame) -> Result<AudioFrame> {
        let state = self
            .resampler_state
            .as_mut()
            .expect("resampler not initialized");

        let src_sample = sample_format_to_ffmpeg(frame.format)?;
        let src_layout = channel_layout_to_ffmpeg(frame.channels);
        let mut src_frame = AudioFrameFFmpeg::new(src_sample, frame.samples, src_layout);
        src_frame.set_rate(frame.sample_rate);

        copy_audio_data_to_ffmpeg(&mut src_frame, frame)?;

        let output_samples = if frame.sample_rate == self.config.sample_rate {
            frame.samples
        } else {
            ((frame.samples as u64 * self.config.sample_rate as u64) / frame.sample_rate as u64
                + 64) as usize
        };

        let dst_sample = sample_format_to_ffmpeg(self.config.format)?;
        let dst_layout = channel_layout_to_ffmpeg(self.config.channels);
        let mut dst_frame = AudioFrameFFmpeg::new(dst_sample, output_samples, dst_layout);
        dst_frame.set_rate(self.config.sample_rate);

        state
            .context
            .run(&src_frame, &mut dst_frame)
            .map_err(|e| Error::codec(format!("resampling failed: {}", e)))?;

        let actual_samples = dst_frame.samples();
        let data =
            copy_audio_data_from_ffmpeg(&dst_frame, self.config.format, self.config.channels)?;

        Ok(AudioFrame::new(
            data,
            actual_samples,
            self.config.sample_rate,
            self.config.channels,
            self.config.format,
            frame.pts,
            frame.time_base,
        ))
    }
}

fn sample_format_to_ffmpeg(format: SampleFormat) -> Result<ffmpeg_next::format::Sample> {
    use ffmpeg_next::format::Sample;
    use ffmpeg_next::format::sample::Type;

    match format {
        SampleFormat::F32 => Ok(Sample::F32(Type::Packed)),
        SampleFormat::S16 => Ok(Sample::I16(Type::Packed)),
        SampleFormat::S32 => Ok(Sample::I32(Type::Packed)),
        SampleFormat::U8 => Ok(Sample::U8(Type::Packed)),
    }
}

fn channel_layout_to_ffmpeg(layout: ChannelLayout) -> FFmpegChannelLayout {
    match layout {
        ChannelLayout::Mono => FFmpegChannelLayout::MONO,
        ChannelLayout::Stereo => FFmpegChannelLayout::STEREO,
        ChannelLayout::Surround5_1 => FFmpegChannelLayout::_5POINT1,
    }
}

fn copy_audio_data_to_ffmpeg(dst: &mut AudioFrameFFmpeg, src: &AudioFrame) -> Result<()> {
    let bytes_per_sample = src.format.bytes_per_sample();
    let total_bytes = src.samples * src.channels.channels() as usize * bytes_per_sample;

    let dst_data = dst.data_mut(0);
    if dst_data.len() < total_bytes {
        return Err(Error::invalid_data(format!(
            "destination buffer too small: {} < {}",
            dst_data.len(),
            total_bytes
        )));
    }

    dst_data[..total_bytes].copy_from_slice(&src.data[..total_bytes]);
    Ok(())
}

fn copy_audio_data_from_ffmpeg(
    frame: &AudioFrameFFmpeg,
    format: SampleFormat,
    channels: ChannelLayout,
) -> Result<Vec<u8>> {
    let samples = frame.samples();
    let bytes_per_sample = format.bytes_per_sample();
    let channel_count = channels.channels() as usize;
    let total_bytes = samples * channel_count * bytes_per_sample;

    let src_data = frame.data(0);
    Ok(src_data[..total_bytes].to_vec())
}

impl std::fmt::Debug for AudioTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioTransform")
            .field("config", &self.config)
            .field("initialized", &self.resampler_state.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playback_config_is_48khz_stereo_s16() {
        let config = AudioTransformConfig::playback();
        assert_eq!(config.sample_rate, 48_000);
        assert_eq!(config.channels, ChannelLayout::Stereo);
        assert_eq!(config.format, SampleFormat::S16);
    }
}
