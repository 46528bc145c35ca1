/*!
    Bounded blocking queue with predicate-wait (spec §4.1).

    Generalizes the teacher's `PacketQueue`/`FrameQueue` (capacity baked
    into a fixed-size `VecDeque` with separate `not_full`/`not_empty`
    condvars) into a single `BoundedQueue<T>` whose capacity check is a
    caller-supplied predicate over the current length. Packet queues use
    `can_enqueue_packet` (`len < PKT_QUEUE_SIZE`), frame queues use
    `can_enqueue_frame`, and both share `has_data` to dequeue.

    A single condvar is broadcast on every mutation, per the contract
    ("broadcast on every mutation ... so any number of waiters on either
    side wake up") rather than the teacher's asymmetric `not_full`/
    `not_empty` pair — this keeps a single predicate type for both
    enqueue and dequeue waits.
*/

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

pub struct BoundedQueue<T> {
    inner: Mutex<VecDeque<T>>,
    changed: Condvar,
}

impl<T> BoundedQueue<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
            changed: Condvar::new(),
        }
    }

    /// Current length. Advisory only when read outside the lock (spec §4.1).
    pub fn len(&self) -> usize {
        self.inner.lock().expect("queue mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unconditional enqueue; used where the caller has already reserved
    /// capacity externally (e.g. the decode stage's video path, which the
    /// original leaves unbounded on purpose — see `decode_packet` in
    /// `codec.c`, which uses plain `queue_enqueue` for video).
    pub fn enqueue(&self, item: T) {
        let mut q = self.inner.lock().expect("queue mutex poisoned");
        q.push_back(item);
        self.changed.notify_all();
    }

    pub fn enqueue_wait(&self, item: T, pred: impl Fn(usize) -> bool) {
        let mut q = self.inner.lock().expect("queue mutex poisoned");
        while !pred(q.len()) {
            q = self.changed.wait(q).expect("queue mutex poisoned");
        }
        q.push_back(item);
        self.changed.notify_all();
    }

    pub fn dequeue_wait(&self, pred: impl Fn(usize) -> bool) -> T {
        let mut q = self.inner.lock().expect("queue mutex poisoned");
        while !pred(q.len()) {
            q = self.changed.wait(q).expect("queue mutex poisoned");
        }
        let item = q.pop_front().expect("predicate guarantees an item is present");
        self.changed.notify_all();
        item
    }

    /// Returns `Ok(())` if enqueued before `timeout` elapsed, `Err(item)`
    /// (handing the item back for a retry) on timeout.
    pub fn enqueue_timedwait(
        &self,
        item: T,
        pred: impl Fn(usize) -> bool,
        timeout: Duration,
    ) -> Result<(), T> {
        let mut q = self.inner.lock().expect("queue mutex poisoned");
        let deadline = Instant::now() + timeout;
        loop {
            if pred(q.len()) {
                q.push_back(item);
                self.changed.notify_all();
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(item);
            }
            let (guard, _) = self
                .changed
                .wait_timeout(q, deadline - now)
                .expect("queue mutex poisoned");
            q = guard;
        }
    }

    pub fn dequeue_timedwait(&self, pred: impl Fn(usize) -> bool, timeout: Duration) -> Option<T> {
        let mut q = self.inner.lock().expect("queue mutex poisoned");
        let deadline = Instant::now() + timeout;
        loop {
            if pred(q.len()) {
                let item = q.pop_front().expect("predicate guarantees an item is present");
                self.changed.notify_all();
                return Some(item);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let (guard, _) = self
                .changed
                .wait_timeout(q, deadline - now)
                .expect("queue mutex poisoned");
            q = guard;
        }
    }

    /// Drain every item and apply `destructor` to each, outside the lock.
    pub fn clear(&self, mut destructor: impl FnMut(T)) {
        let drained: Vec<T> = {
            let mut q = self.inner.lock().expect("queue mutex poisoned");
            q.drain(..).collect()
        };
        self.changed.notify_all();
        for item in drained {
            destructor(item);
        }
    }
}

impl<T> Default for BoundedQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn has_data(len: usize) -> bool {
        len > 0
    }

    fn can_enqueue(cap: usize) -> impl Fn(usize) -> bool {
        move |len| len < cap
    }

    #[test]
    fn never_exceeds_capacity_under_enqueue_wait() {
        let q: Arc<BoundedQueue<i32>> = Arc::new(BoundedQueue::new());
        let cap = 4;
        for i in 0..cap {
            q.enqueue_wait(i as i32, can_enqueue(cap));
            assert!(q.len() <= cap);
        }
        assert_eq!(q.len(), cap);
    }

    #[test]
    fn fifo_order_is_preserved() {
        let q: BoundedQueue<i32> = BoundedQueue::new();
        for i in 0..10 {
            q.enqueue(i);
        }
        for i in 0..10 {
            assert_eq!(q.dequeue_wait(has_data), i);
        }
    }

    #[test]
    fn enqueue_timedwait_reports_timeout_and_returns_item() {
        let q: BoundedQueue<&'static str> = BoundedQueue::new();
        q.enqueue("already here");
        let result = q.enqueue_timedwait("blocked", can_enqueue(1), Duration::from_millis(20));
        assert_eq!(result, Err("blocked"));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn dequeue_timedwait_reports_timeout() {
        let q: BoundedQueue<i32> = BoundedQueue::new();
        let result = q.dequeue_timedwait(has_data, Duration::from_millis(20));
        assert_eq!(result, None);
    }

    #[test]
    fn clear_runs_destructor_on_every_item_exactly_once() {
        let q: BoundedQueue<i32> = BoundedQueue::new();
        for i in 0..5 {
            q.enqueue(i);
        }
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        q.clear(move |item| seen_clone.lock().unwrap().push(item));
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
        assert_eq!(q.len(), 0);
    }

    #[test]
    fn producer_consumer_delivers_every_item_exactly_once_in_order() {
        let q = Arc::new(BoundedQueue::new());
        let cap = 8;
        let producer_q = Arc::clone(&q);
        let producer = thread::spawn(move || {
            for i in 0..200 {
                producer_q.enqueue_wait(i, can_enqueue(cap));
            }
        });

        let mut received = Vec::new();
        for _ in 0..200 {
            received.push(q.dequeue_wait(has_data));
        }
        producer.join().unwrap();

        let expected: Vec<i32> = (0..200).collect();
        assert_eq!(received, expected);
    }
}
