/*!
    Decode stage, one instance per active stream (spec §4.4).

    `AudioDecoder::decode`/`flush` (see `rustplay-decode`) already
    implement the packet-exhausted/EAGAIN and draining/EOF handling this
    section describes, returning a batch of ready frames per call instead
    of yielding them one at a time — so the "repeatedly pull decoded
    frames" loop collapses into a single `decode()`/`flush()` call per
    dequeued packet. What's left to implement here is the queue
    choreography: predicate-waited dequeue/enqueue with event-loop
    retries on timeout, and the seek barrier.

    The decoder is wrapped in a `RefCell` so the `on_seek_start` closure
    (shared by both the packet-dequeue and frame-enqueue retry paths) can
    flush it without needing `&mut` plumbed through every call site —
    this stage is single-threaded internally, so the `RefCell` never
    actually contends.
*/

use std::cell::RefCell;

use rustplay_decode::{AudioDecoder, VideoDecoder};
use rustplay_types::Packet;

use super::config::{queue_wait, MAX_EVENTS_PER_LOOP};
use super::context::{can_enqueue_frame, has_data, AudioStreamContext, VideoStreamContext};
use super::error::Result;
use super::event::{EventKind, EventQueue};
use super::log::log_codec;
use super::queue::BoundedQueue;

pub fn run_audio_decode_stage(sc: &AudioStreamContext, decoder: AudioDecoder) -> Result<()> {
    let decoder = RefCell::new(decoder);
    let on_seek_start = || {
        sc.frame_queue.clear(|_frame| {});
        decoder.borrow_mut().reset();
    };

    loop {
        let packet = dequeue_packet(&sc.packet_queue, &sc.decode_events, &sc.present_events, on_seek_start);

        match packet {
            Some(packet) => {
                let frames = decoder.borrow_mut().decode(&packet)?;
                for frame in frames {
                    enqueue_frame(&sc.frame_queue, &sc.decode_events, &sc.present_events, Some(frame), on_seek_start);
                }
            }
            None => {
                let remaining = decoder.borrow_mut().flush()?;
                for frame in remaining {
                    enqueue_frame(&sc.frame_queue, &sc.decode_events, &sc.present_events, Some(frame), on_seek_start);
                }
                enqueue_frame(&sc.frame_queue, &sc.decode_events, &sc.present_events, None, on_seek_start);
                log_codec!("audio decode stage finished");
                return Ok(());
            }
        }
    }
}

pub fn run_video_decode_stage(sc: &VideoStreamContext, decoder: VideoDecoder) -> Result<()> {
    let decoder = RefCell::new(decoder);
    let on_seek_start = || {
        sc.frame_queue.clear(|_frame| {});
        decoder.borrow_mut().reset();
    };

    loop {
        let packet = dequeue_packet(&sc.packet_queue, &sc.decode_events, &sc.present_events, on_seek_start);

        match packet {
            Some(packet) => {
                let frames = decoder.borrow_mut().decode(&packet)?;
                for frame in frames {
                    enqueue_frame(&sc.frame_queue, &sc.decode_events, &sc.present_events, Some(frame), on_seek_start);
                }
            }
            None => {
                let remaining = decoder.borrow_mut().flush()?;
                for frame in remaining {
                    enqueue_frame(&sc.frame_queue, &sc.decode_events, &sc.present_events, Some(frame), on_seek_start);
                }
                enqueue_frame(&sc.frame_queue, &sc.decode_events, &sc.present_events, None, on_seek_start);
                log_codec!("video decode stage finished");
                return Ok(());
            }
        }
    }
}

fn dequeue_packet(
    packet_queue: &BoundedQueue<Option<Packet>>,
    decode_events: &EventQueue,
    present_events: &EventQueue,
    on_seek_start: impl Fn(),
) -> Option<Packet> {
    loop {
        match packet_queue.dequeue_timedwait(has_data, queue_wait()) {
            Some(packet) => return packet,
            None => run_decode_event_loop(decode_events, present_events, &on_seek_start),
        }
    }
}

fn enqueue_frame<F>(
    frame_queue: &BoundedQueue<Option<F>>,
    decode_events: &EventQueue,
    present_events: &EventQueue,
    frame: Option<F>,
    on_seek_start: impl Fn(),
) {
    let mut pending = Some(frame);
    while let Some(frame) = pending.take() {
        match frame_queue.enqueue_timedwait(frame, can_enqueue_frame, queue_wait()) {
            Ok(()) => break,
            Err(frame) => {
                run_decode_event_loop(decode_events, present_events, &on_seek_start);
                pending = Some(frame);
            }
        }
    }
}

/// Drains up to `MAX_EVENTS_PER_LOOP` from `decode_events`. `SEEK_START`
/// flushes local state via `on_seek_start` and blocks for `SEEK_END`,
/// forwarding it onward; `PAUSE`/`RESUME`/`STOP` are ignored at this
/// layer (§4.4).
fn run_decode_event_loop(decode_events: &EventQueue, present_events: &EventQueue, on_seek_start: &impl Fn()) {
    for _ in 0..MAX_EVENTS_PER_LOOP {
        let Some(event) = decode_events.try_pop() else {
            return;
        };

        match event.kind() {
            EventKind::SeekStart { .. } => {
                on_seek_start();
                let seek_end =
                    decode_events.pop_wait_matching(|kind| matches!(kind, EventKind::SeekEnd { .. }));
                present_events.push(seek_end);
            }
            EventKind::Pause | EventKind::Resume | EventKind::Stop | EventKind::SeekEnd { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use rustplay_types::{MediaDuration, Rational, StreamType};

    use super::*;
    use crate::core::event::Event;

    fn packet() -> Packet {
        Packet::new(vec![], None, None, MediaDuration(0), Rational::new(1, 1_000), false, StreamType::Audio)
    }

    #[test]
    fn dequeue_packet_returns_immediately_when_data_present() {
        let queue: BoundedQueue<Option<Packet>> = BoundedQueue::new();
        queue.enqueue(Some(packet()));
        let decode_events = EventQueue::new();
        let present_events = EventQueue::new();

        let result = dequeue_packet(&queue, &decode_events, &present_events, || {});
        assert!(result.is_some());
    }

    #[test]
    fn dequeue_packet_retries_through_timeout_until_producer_delivers() {
        let queue: Arc<BoundedQueue<Option<Packet>>> = Arc::new(BoundedQueue::new());
        let producer_queue = Arc::clone(&queue);
        let producer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(40));
            producer_queue.enqueue(Some(packet()));
        });

        let decode_events = EventQueue::new();
        let present_events = EventQueue::new();
        let result = dequeue_packet(&queue, &decode_events, &present_events, || {});
        producer.join().unwrap();
        assert!(result.is_some());
    }

    #[test]
    fn enqueue_frame_delivers_and_can_be_read_back() {
        let queue: BoundedQueue<Option<i32>> = BoundedQueue::new();
        let decode_events = EventQueue::new();
        let present_events = EventQueue::new();

        enqueue_frame(&queue, &decode_events, &present_events, Some(7), || {});
        assert_eq!(queue.dequeue_wait(has_data), Some(7));
    }

    #[test]
    fn seek_start_runs_hook_once_and_forwards_seek_end_to_present_queue() {
        let decode_events = EventQueue::new();
        let present_events = EventQueue::new();
        let hook_calls = Arc::new(AtomicUsize::new(0));

        decode_events.push(Event::new(EventKind::SeekStart { to_us: 5_000_000 }));
        decode_events.push(Event::new(EventKind::SeekEnd { to_us: 5_000_000 }));

        let hook_calls_clone = Arc::clone(&hook_calls);
        run_decode_event_loop(&decode_events, &present_events, &move || {
            hook_calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(hook_calls.load(Ordering::SeqCst), 1);
        let forwarded = present_events.try_pop().expect("seek end forwarded");
        assert_eq!(forwarded.kind(), EventKind::SeekEnd { to_us: 5_000_000 });
    }

    #[test]
    fn pause_and_resume_are_ignored_at_decode_layer() {
        let decode_events = EventQueue::new();
        let present_events = EventQueue::new();
        decode_events.push(Event::new(EventKind::Pause));
        decode_events.push(Event::new(EventKind::Resume));

        run_decode_event_loop(&decode_events, &present_events, &|| {
            panic!("seek hook must not run for pause/resume");
        });

        assert!(present_events.is_empty());
    }
}
