/*!
    Demux stage (spec §4.3).
*/

use std::time::Duration;

use rustplay_source::Source;
use rustplay_types::StreamType;

use super::config::{queue_wait, MAX_EVENTS_PER_LOOP};
use super::context::{can_enqueue_packet, PlayContext};
use super::error::Result;
use super::event::{Event, EventKind};
use super::log::log_codec;

/// Runs until the source reaches end-of-file or a fatal read error occurs.
/// Enqueues a `None` (end-of-stream) sentinel into every active stream's
/// packet queue before returning.
pub fn run_demux(mut source: Source, ctx: &PlayContext) -> Result<()> {
    loop {
        match source.next_packet()? {
            Some(packet) => {
                let target = match packet.stream_type {
                    StreamType::Video => ctx.video.as_ref().map(|sc| &sc.packet_queue),
                    StreamType::Audio => ctx.audio.as_ref().map(|sc| &sc.packet_queue),
                };

                let Some(queue) = target else {
                    // Packet belongs to neither selected stream (spec §7: "Ignored").
                    continue;
                };

                let mut pending = Some(packet);
                while let Some(packet) = pending.take() {
                    match queue.enqueue_timedwait(Some(packet), can_enqueue_packet, queue_wait()) {
                        Ok(()) => {
                            run_demux_event_loop(&mut source, ctx)?;
                        }
                        Err(timed_out_packet) => {
                            run_demux_event_loop(&mut source, ctx)?;
                            pending = Some(timed_out_packet.expect("packet always Some here"));
                        }
                    }
                }
            }
            None => {
                if let Some(sc) = &ctx.video {
                    sc.packet_queue.enqueue_wait(None, can_enqueue_packet);
                }
                if let Some(sc) = &ctx.audio {
                    sc.packet_queue.enqueue_wait(None, can_enqueue_packet);
                }
                log_codec!("demux reached end of file");
                return Ok(());
            }
        }
    }
}

fn run_demux_event_loop(source: &mut Source, ctx: &PlayContext) -> Result<()> {
    for _ in 0..MAX_EVENTS_PER_LOOP {
        let Some(event) = ctx.demux_events.try_pop() else {
            return Ok(());
        };

        match event.kind() {
            EventKind::SeekStart { to_us } => handle_seek(source, ctx, to_us)?,
            EventKind::Stop => {
                // Propagation to decode/present stages already happened via
                // `PlayContext::stop`'s own broadcast; nothing further to do here.
            }
            EventKind::Pause | EventKind::Resume | EventKind::SeekEnd { .. } => {
                // The demuxer never originates or awaits these.
            }
        }
    }
    Ok(())
}

fn handle_seek(source: &mut Source, ctx: &PlayContext, to_us: i64) -> Result<()> {
    log_codec!("seeking to {}us", to_us);

    // Step 1: fan SEEK_START out to every decode-event and present-event queue.
    if let Some(sc) = &ctx.audio {
        sc.decode_events.push(Event::new(EventKind::SeekStart { to_us }));
        sc.present_events.push(Event::new(EventKind::SeekStart { to_us }));
    }
    if let Some(sc) = &ctx.video {
        sc.decode_events.push(Event::new(EventKind::SeekStart { to_us }));
        sc.present_events.push(Event::new(EventKind::SeekStart { to_us }));
    }

    // Step 2: perform the container seek once; it repositions every stream.
    // Decoder flush is deferred to each decode stage on SEEK_END receipt
    // (§4.4) — the decoder instance is owned by the decode thread here,
    // not shared global state as in the original, so the demuxer cannot
    // reach into it directly.
    let position = Duration::from_micros(to_us.max(0) as u64);
    let actual = source.seek(position).unwrap_or(position);
    let actual_us = actual.as_micros() as i64;

    if let Some(sc) = &ctx.audio {
        sc.set_play_time_us(actual_us);
        sc.packet_queue.clear(|_packet| {});
    }
    if let Some(sc) = &ctx.video {
        sc.set_play_time_us(actual_us);
        sc.packet_queue.clear(|_packet| {});
    }

    // Step 3: allocate SEEK_END and fan it out to every decode-event queue.
    if let Some(sc) = &ctx.audio {
        sc.decode_events.push(Event::new(EventKind::SeekEnd { to_us: actual_us }));
    }
    if let Some(sc) = &ctx.video {
        sc.decode_events.push(Event::new(EventKind::SeekEnd { to_us: actual_us }));
    }

    // Step 4: complete the state transition.
    ctx.complete_seek();
    Ok(())
}
