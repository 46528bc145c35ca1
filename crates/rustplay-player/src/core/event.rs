/*!
    Reference-counted tagged event (spec §4.2, §3).

    The original (`event.h`/`event.c`) implements this as a manually
    managed struct with an embedded atomic refcount and an optional
    before-free function pointer, unref'd down to zero by hand. Per the
    redesign note in spec §9 ("Manual reference counting on events:
    replace with an atomic reference-counted smart handle; eliminates the
    explicit `ref`/`unref` protocol but preserves at-last-release hook
    semantics"), this is an `Arc<EventKind>`: cloning takes a reference,
    dropping the last clone releases it, and `Drop` stands in for the
    before-free hook. `Event` itself carries no payload beyond the
    `Arc`, so cloning an `Event` is exactly "ref" and dropping it is
    exactly "unref".
*/

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Pause,
    Resume,
    Stop,
    SeekStart { to_us: i64 },
    SeekEnd { to_us: i64 },
}

#[derive(Clone)]
pub struct Event(Arc<EventKind>);

impl Event {
    pub fn new(kind: EventKind) -> Self {
        Self(Arc::new(kind))
    }

    pub fn kind(&self) -> EventKind {
        *self.0
    }

    /// Number of live references to this event (including this one).
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event({:?}, refs={})", self.kind(), self.ref_count())
    }
}

/**
    Unbounded event queue (`decode_events`/`present_events`/`demux_events`
    in spec §3). Unlike [`BoundedQueue`](super::queue::BoundedQueue) this
    never applies backpressure to its producer — events are control
    signals, not buffered media, and the original never bounds them.
*/
pub struct EventQueue {
    inner: Mutex<VecDeque<Event>>,
    not_empty: Condvar,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
            not_empty: Condvar::new(),
        }
    }

    pub fn push(&self, event: Event) {
        let mut q = self.inner.lock().expect("event queue mutex poisoned");
        q.push_back(event);
        self.not_empty.notify_all();
    }

    /// Non-blocking pop, used by the bounded event-loop drains (§4.3, §4.7).
    pub fn try_pop(&self) -> Option<Event> {
        self.inner.lock().expect("event queue mutex poisoned").pop_front()
    }

    pub fn pop_wait(&self) -> Event {
        let mut q = self.inner.lock().expect("event queue mutex poisoned");
        while q.is_empty() {
            q = self.not_empty.wait(q).expect("event queue mutex poisoned");
        }
        q.pop_front().expect("queue non-empty under lock")
    }

    /// Block until an event matching `pred` arrives. Events that don't
    /// match are dropped (§4.7: "non-matching events are unref'd and
    /// discarded — documented limitation").
    pub fn pop_wait_matching(&self, pred: impl Fn(EventKind) -> bool) -> Event {
        loop {
            let event = self.pop_wait();
            if pred(event.kind()) {
                return event;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("event queue mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_increments_and_drop_decrements_refcount() {
        let e = Event::new(EventKind::Stop);
        assert_eq!(e.ref_count(), 1);
        let e2 = e.clone();
        assert_eq!(e.ref_count(), 2);
        drop(e2);
        assert_eq!(e.ref_count(), 1);
    }

    #[test]
    fn fanout_then_producer_drop_releases_on_last_consumer_drop() {
        // Mirrors §4.2: "the producer takes one reference per destination
        // queue, then drops its own reference, so the event is released
        // exactly when consumed by all recipients."
        let produced = Event::new(EventKind::SeekStart { to_us: 3_000_000 });
        let fanned_out: Vec<Event> = (0..3).map(|_| produced.clone()).collect();
        assert_eq!(produced.ref_count(), 4);

        drop(produced);
        assert_eq!(fanned_out[0].ref_count(), 3);

        let mut remaining = fanned_out;
        while remaining.len() > 1 {
            remaining.pop();
        }
        assert_eq!(remaining[0].ref_count(), 1);
    }

    #[test]
    fn seek_payload_round_trips() {
        let e = Event::new(EventKind::SeekEnd { to_us: 42 });
        match e.kind() {
            EventKind::SeekEnd { to_us } => assert_eq!(to_us, 42),
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn event_queue_is_fifo() {
        let q = EventQueue::new();
        q.push(Event::new(EventKind::Pause));
        q.push(Event::new(EventKind::Resume));
        assert_eq!(q.pop_wait().kind(), EventKind::Pause);
        assert_eq!(q.pop_wait().kind(), EventKind::Resume);
    }

    #[test]
    fn pop_wait_matching_discards_non_matching_events() {
        let q = EventQueue::new();
        q.push(Event::new(EventKind::Stop));
        q.push(Event::new(EventKind::SeekStart { to_us: 10 }));
        q.push(Event::new(EventKind::Resume));

        let resume = q.pop_wait_matching(|kind| matches!(kind, EventKind::Resume));
        assert_eq!(resume.kind(), EventKind::Resume);
        assert!(q.is_empty());
    }
}
