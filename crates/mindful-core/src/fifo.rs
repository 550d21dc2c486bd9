//! Bounded FIFO for real-time event handoff.
//!
//! [`Fifo`] moves events between one producer thread and one consumer
//! thread without locks or allocation after construction. Both `push` and
//! `pop` are non-blocking. When the queue is full, `push` drops the item,
//! counts it and returns `false`; the producer is never made to wait.
//!
//! Storage is a [`crossbeam_queue::ArrayQueue`] allocated once at the
//! configured capacity.

use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_queue::ArrayQueue;

/// Default capacity of the MIDI event queues.
pub const DEFAULT_FIFO_CAPACITY: usize = 100;

/// Bounded single-producer/single-consumer queue.
pub struct Fifo<T> {
    queue: ArrayQueue<T>,
    /// Number of items rejected because the queue was full.
    dropped: AtomicUsize,
}

impl<T> Fifo<T> {
    /// Create a queue that holds up to `capacity` items.
    ///
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: ArrayQueue::new(capacity.max(1)),
            dropped: AtomicUsize::new(0),
        }
    }

    /// Maximum number of items the queue can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Push an item. Producer thread only.
    ///
    /// Returns `false` and drops the item when the queue is full.
    pub fn push(&self, item: T) -> bool {
        match self.queue.push(item) {
            Ok(()) => true,
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Pop the oldest item. Consumer thread only.
    pub fn pop(&self) -> Option<T> {
        self.queue.pop()
    }

    /// Number of items currently queued.
    ///
    /// A snapshot from either side; it may be stale by the time it is used
    /// but never exceeds [`capacity`](Self::capacity).
    pub fn used_slots(&self) -> usize {
        self.queue.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Total number of items rejected by [`push`](Self::push) since creation.
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Discard all queued items. Returns how many were discarded.
    ///
    /// Call only while both sides are quiesced (see
    /// [`Lifecycle::begin_swap`](crate::Lifecycle::begin_swap)), so the
    /// producer and consumer roles can be handed over cleanly.
    pub fn reset(&self) -> usize {
        let mut discarded = 0;
        while self.queue.pop().is_some() {
            discarded += 1;
        }
        discarded
    }
}

impl<T> Default for Fifo<T> {
    fn default() -> Self {
        Self::new(DEFAULT_FIFO_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_fifo_order() {
        let fifo = Fifo::new(4);
        assert!(fifo.push(1));
        assert!(fifo.push(2));
        assert!(fifo.push(3));

        assert_eq!(fifo.pop(), Some(1));
        assert!(fifo.push(4));
        assert!(fifo.push(5));
        assert_eq!(fifo.pop(), Some(2));
        assert_eq!(fifo.pop(), Some(3));
        assert_eq!(fifo.pop(), Some(4));
        assert_eq!(fifo.pop(), Some(5));
        assert_eq!(fifo.pop(), None);
    }

    #[test]
    fn test_overflow_drops_excess() {
        let fifo = Fifo::new(3);
        for i in 0..10 {
            fifo.push(i);
            assert!(fifo.used_slots() <= fifo.capacity());
        }

        assert_eq!(fifo.used_slots(), 3);
        assert_eq!(fifo.dropped(), 7);
        assert_eq!(fifo.pop(), Some(0));
        assert_eq!(fifo.pop(), Some(1));
        assert_eq!(fifo.pop(), Some(2));
        assert_eq!(fifo.pop(), None);
    }

    #[test]
    fn test_used_slots_wraps() {
        let fifo = Fifo::new(3);
        for round in 0..5 {
            assert!(fifo.push(round));
            assert!(fifo.push(round + 100));
            assert_eq!(fifo.used_slots(), 2);
            assert_eq!(fifo.pop(), Some(round));
            assert_eq!(fifo.used_slots(), 1);
            assert_eq!(fifo.pop(), Some(round + 100));
            assert!(fifo.is_empty());
        }
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let fifo = Fifo::new(0);
        assert_eq!(fifo.capacity(), 1);
        assert!(fifo.push(1u8));
        assert!(!fifo.push(2u8));
        assert_eq!(fifo.dropped(), 1);
    }

    #[test]
    fn test_reset() {
        let fifo = Fifo::new(2);
        fifo.push(1);
        fifo.push(2);

        assert_eq!(fifo.reset(), 2);
        assert_eq!(fifo.capacity(), 2);
        assert!(fifo.is_empty());
        assert_eq!(fifo.pop(), None);

        assert!(fifo.push(3));
        assert!(fifo.push(4));
        assert!(!fifo.push(5));
        assert_eq!(fifo.pop(), Some(3));
    }

    #[test]
    fn test_cross_thread_order() {
        const COUNT: u32 = 100_000;
        let fifo = Arc::new(Fifo::new(64));

        let producer = {
            let fifo = Arc::clone(&fifo);
            thread::spawn(move || {
                let mut next = 0;
                while next < COUNT {
                    if fifo.push(next) {
                        next += 1;
                    } else {
                        thread::yield_now();
                    }
                }
            })
        };

        let mut expected = 0;
        while expected < COUNT {
            match fifo.pop() {
                Some(value) => {
                    assert_eq!(value, expected);
                    expected += 1;
                }
                None => thread::yield_now(),
            }
        }

        producer.join().unwrap();
        assert!(fifo.is_empty());
    }
}
