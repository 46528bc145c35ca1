/*!
    `rustplay` — pipeline and synchronization engine entry point (spec §6).
*/

mod core;

use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rustplay_decode::{AudioDecoder, AudioDecoderConfig, VideoDecoder, VideoDecoderConfig};
use rustplay_source::{Source, SourceConfig};
use rustplay_types::Rational;

use core::{
    AudioStreamContext, CpalAudioSink, PlayContext, PlayerError, StageHandle, TerminalSurface,
    VideoStreamContext,
};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        eprintln!("usage: {} FILE", program_name(&args));
        return ExitCode::from(255);
    }

    match run(&args[1]) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("rustplay: {}", e);
            ExitCode::from(255)
        }
    }
}

fn program_name(args: &[String]) -> String {
    args.first()
        .map(|p| {
            std::path::Path::new(p)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| p.clone())
        })
        .unwrap_or_else(|| "rustplay".to_string())
}

/// One-line startup diagnostic (spec §11, supplemented from the original's
/// `print_versions()`): no OpenGL/OpenAL here, so the FFmpeg-next link
/// version and the selected audio backend stand in for the original trio.
fn print_version_banner() {
    eprintln!("rustplay {} (ffmpeg-next decode backend, cpal audio backend)", env!("CARGO_PKG_VERSION"));
}

fn run(path: &str) -> core::Result<()> {
    print_version_banner();

    let mut source = Source::open(path, SourceConfig::default()).map_err(PlayerError::Media)?;

    if !source.has_audio() && !source.has_video() {
        return Err(PlayerError::NoDecodableStream);
    }

    let audio_decoder = if source.has_audio() {
        let config = source.take_audio_codec_config().ok_or(PlayerError::NoDecodableStream)?;
        let time_base = source.audio_time_base().unwrap_or(Rational::new(1, 1_000));
        let decoder = AudioDecoder::new(config, time_base, AudioDecoderConfig::default())
            .map_err(PlayerError::Media)?;
        Some((decoder, time_base))
    } else {
        None
    };

    let video_decoder = if source.has_video() {
        let config = source.take_video_codec_config().ok_or(PlayerError::NoDecodableStream)?;
        let time_base = source.video_time_base().unwrap_or(Rational::new(1, 1_000));
        let decoder = VideoDecoder::new(config, time_base, VideoDecoderConfig::default())
            .map_err(PlayerError::Media)?;
        Some((decoder, time_base))
    } else {
        None
    };

    let frame_duration = source
        .media_info()
        .video
        .as_ref()
        .and_then(|v| v.fps())
        .filter(|fps| *fps > 0.0)
        .map(|fps| Duration::from_secs_f64(1.0 / fps))
        .unwrap_or_else(|| Duration::from_secs_f64(1.0 / 25.0));

    let audio_sc = audio_decoder.as_ref().map(|(_, tb)| AudioStreamContext::new(*tb));
    let video_sc = video_decoder.as_ref().map(|(_, tb)| VideoStreamContext::new(*tb, frame_duration));

    let audio_sample_rate = source.media_info().audio.as_ref().map(|a| a.sample_rate).unwrap_or(48_000);

    let ctx = Arc::new(PlayContext::new(audio_sc, video_sc));

    let surface = Arc::new(TerminalSurface::new()?);

    let mut decoders = Vec::new();
    let mut presenters = Vec::new();

    if let Some((decoder, _)) = audio_decoder {
        let ctx = Arc::clone(&ctx);
        let handle = thread::spawn(move || {
            let sc = ctx.audio.as_ref().expect("audio context present");
            core::run_audio_decode_stage(sc, decoder)
        });
        decoders.push(StageHandle { label: "audio-decode", handle });
    }

    if let Some((decoder, _)) = video_decoder {
        let ctx = Arc::clone(&ctx);
        let handle = thread::spawn(move || {
            let sc = ctx.video.as_ref().expect("video context present");
            core::run_video_decode_stage(sc, decoder)
        });
        decoders.push(StageHandle { label: "video-decode", handle });
    }

    if ctx.audio.is_some() {
        let ctx = Arc::clone(&ctx);
        let handle = thread::spawn(move || {
            // The cpal stream is opened on the thread that drives it, the
            // way the teacher's `AudioOutput::with_config` does — a
            // `cpal::Stream` isn't meant to cross threads once built.
            let sink = CpalAudioSink::open(audio_sample_rate, 2)?;
            let sc = ctx.audio.as_ref().expect("audio context present");
            core::run_audio_presenter(sc, &sink)
        });
        presenters.push(StageHandle { label: "audio-present", handle });
    }

    if ctx.video.is_some() {
        let ctx = Arc::clone(&ctx);
        let surface = Arc::clone(&surface);
        let handle = thread::spawn(move || {
            let sc = ctx.video.as_ref().expect("video context present");
            core::run_video_presenter(sc, &ctx, surface.as_ref())
        });
        presenters.push(StageHandle { label: "video-present", handle });
    }

    let demuxer = {
        let ctx = Arc::clone(&ctx);
        let handle = thread::spawn(move || core::run_demux(source, &ctx));
        StageHandle { label: "demux", handle }
    };

    core::run_controller(&ctx, surface.as_ref(), decoders, presenters, demuxer)
}
