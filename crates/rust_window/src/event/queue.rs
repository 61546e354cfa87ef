//! Fixed-capacity circular event buffer
//!
//! The queue keeps a `begin` index (oldest element) and an `end` index (next
//! free slot). When the two meet after a push, `end` is replaced by the
//! [`FULL`] sentinel, so "full" and "empty" never need a separate counter.
//!
//! No operation here allocates except construction and [`EventQueue::resize`],
//! and none of them can fail.

use super::Event;
use std::iter::FusedIterator;

/// `end` value marking a queue that holds exactly `capacity` events
const FULL: usize = usize::MAX;

/// Which events survive when [`EventQueue::resize`] shrinks below the current length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum ResizePolicy {
    /// Drop the oldest events, keep the newest
    #[default]
    DiscardOld,
    /// Drop the newest events, keep the oldest
    DiscardNew,
}

/// What [`EventQueue::push`] does when the queue is already full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum OverflowPolicy {
    /// Overwrite the oldest unread event; memory stays bounded
    #[default]
    OverwriteOldest,
    /// Keep the queued events and drop the incoming one
    DiscardIncoming,
}

/// Bounded FIFO of [`Event`]s backed by a ring buffer
#[derive(Debug)]
pub struct EventQueue {
    buffer: Box<[Event]>,
    begin: usize,
    end: usize,
    overflow: OverflowPolicy,
}

impl EventQueue {
    /// Create an empty queue holding at most `capacity` events
    pub fn new(capacity: usize) -> Self {
        Self::with_overflow_policy(capacity, OverflowPolicy::default())
    }

    /// Create an empty queue with an explicit overflow policy
    pub fn with_overflow_policy(capacity: usize, overflow: OverflowPolicy) -> Self {
        Self {
            buffer: empty_buffer(capacity),
            begin: 0,
            end: 0,
            overflow,
        }
    }

    /// Current overflow policy
    pub fn overflow_policy(&self) -> OverflowPolicy {
        self.overflow
    }

    /// Change the overflow policy; queued events are untouched
    pub fn set_overflow_policy(&mut self, overflow: OverflowPolicy) {
        self.overflow = overflow;
    }

    /// Maximum number of events
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Number of queued events
    pub fn len(&self) -> usize {
        let capacity = self.capacity();
        if capacity == 0 {
            0
        } else if self.end == FULL {
            capacity
        } else {
            (self.end + capacity - self.begin) % capacity
        }
    }

    /// Whether no events are queued
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the next push overflows
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }

    /// Raw view of every slot, including stale ones, in storage order
    pub fn as_slice(&self) -> &[Event] {
        &self.buffer
    }

    /// Exchange contents, indices and policy with another queue
    pub fn swap(&mut self, other: &mut EventQueue) {
        std::mem::swap(self, other);
    }

    /// Forget every event by resetting the indices
    ///
    /// Old slot contents stay in memory until overwritten by later pushes.
    pub fn reset(&mut self) {
        self.begin = 0;
        self.end = 0;
    }

    /// Forget every event and overwrite all slots with [`Event::Empty`]
    ///
    /// Unlike [`reset`](Self::reset) this releases heap data held by old
    /// events, such as the path list of a file drop.
    pub fn clear(&mut self) {
        self.reset();
        self.buffer.fill(Event::Empty);
    }

    /// Append an event and return the slot it was written to
    ///
    /// On a full queue the [`OverflowPolicy`] decides between overwriting the
    /// oldest event and discarding this one. Returns `None` when the event
    /// was discarded, which is always the case for a zero-capacity queue.
    pub fn push(&mut self, event: Event) -> Option<&mut Event> {
        let capacity = self.capacity();
        if capacity == 0 {
            return None;
        }

        let slot = if self.end != FULL {
            let slot = self.end;
            self.end = (self.end + 1) % capacity;
            if self.end == self.begin {
                self.end = FULL;
            }
            slot
        } else {
            match self.overflow {
                OverflowPolicy::OverwriteOldest => {
                    let slot = self.begin;
                    self.begin = (self.begin + 1) % capacity;
                    slot
                }
                OverflowPolicy::DiscardIncoming => return None,
            }
        };

        self.buffer[slot] = event;
        Some(&mut self.buffer[slot])
    }

    /// Remove and return the oldest event
    pub fn pop(&mut self) -> Option<Event> {
        if self.is_empty() {
            return None;
        }

        let event = std::mem::take(&mut self.buffer[self.begin]);
        if self.end == FULL {
            self.end = self.begin;
        }
        self.begin = (self.begin + 1) % self.capacity();

        Some(event)
    }

    /// Change the capacity, keeping as many events as fit
    ///
    /// Growing keeps every event in order. Shrinking below [`len`](Self::len)
    /// drops exactly `len - new_capacity` events chosen by `policy`. Either
    /// way the surviving events are re-linearised so `begin` becomes 0.
    pub fn resize(&mut self, new_capacity: usize, policy: ResizePolicy) {
        let capacity = self.capacity();
        if new_capacity == capacity {
            return;
        }

        let count = self.len();
        if count == 0 || new_capacity == 0 {
            self.buffer = empty_buffer(new_capacity);
            self.reset();
            return;
        }

        let keep = count.min(new_capacity);
        let skip = match policy {
            ResizePolicy::DiscardOld => count - keep,
            ResizePolicy::DiscardNew => 0,
        };

        let mut buffer = empty_buffer(new_capacity);
        for (i, slot) in buffer.iter_mut().take(keep).enumerate() {
            let from = (self.begin + skip + i) % capacity;
            *slot = std::mem::take(&mut self.buffer[from]);
        }

        self.buffer = buffer;
        self.begin = 0;
        self.end = if keep < new_capacity { keep } else { FULL };
    }

    /// Iterate queued events from oldest to newest
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            queue: self,
            front: 0,
            back: self.len(),
        }
    }

    /// Call `visitor` on every queued event, oldest first
    pub fn visit<F: FnMut(&Event)>(&self, visitor: F) {
        self.iter().for_each(visitor);
    }

    fn get(&self, offset: usize) -> &Event {
        &self.buffer[(self.begin + offset) % self.capacity()]
    }
}

impl<'a> IntoIterator for &'a EventQueue {
    type Item = &'a Event;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn empty_buffer(capacity: usize) -> Box<[Event]> {
    std::iter::repeat_with(Event::default).take(capacity).collect()
}

/// Borrowing iterator over an [`EventQueue`], oldest event first
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    queue: &'a EventQueue,
    front: usize,
    back: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Event;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let event = self.queue.get(self.front);
        self.front += 1;
        Some(event)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(self.queue.get(self.back))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{KeyCode, KeyState};

    fn scroll(n: i32) -> Event {
        Event::Scrolled { dx: f64::from(n), dy: 0.0 }
    }

    fn collect(queue: &EventQueue) -> Vec<Event> {
        queue.iter().cloned().collect()
    }

    fn queue_of(capacity: usize, values: &[i32]) -> EventQueue {
        let mut queue = EventQueue::new(capacity);
        for &n in values {
            queue.push(scroll(n));
        }
        queue
    }

    #[test]
    fn test_push_below_capacity() {
        let mut queue = EventQueue::new(4);
        assert!(queue.is_empty());

        for count in 1..4 {
            queue.push(scroll(count));
            assert_eq!(queue.len(), count as usize);
            assert!(!queue.is_empty());
            assert!(!queue.is_full());
        }
    }

    #[test]
    fn test_push_until_full_then_overwrite() {
        let mut queue = queue_of(3, &[1, 2, 3]);
        assert!(queue.is_full());
        assert_eq!(queue.len(), 3);

        let slot = queue.push(scroll(4)).cloned();
        assert_eq!(slot, Some(scroll(4)));
        assert_eq!(queue.len(), 3);
        assert_eq!(collect(&queue), vec![scroll(2), scroll(3), scroll(4)]);
    }

    #[test]
    fn test_discard_incoming_overflow() {
        let mut queue = EventQueue::with_overflow_policy(2, OverflowPolicy::DiscardIncoming);
        queue.push(scroll(1));
        queue.push(scroll(2));

        assert!(queue.push(scroll(3)).is_none());
        assert_eq!(collect(&queue), vec![scroll(1), scroll(2)]);
    }

    #[test]
    fn test_pop_order_and_empty_pop() {
        let mut queue = EventQueue::new(2);
        assert_eq!(queue.pop(), None);

        let event = Event::key(KeyCode::Q, KeyState::Press);
        queue.push(event.clone());
        assert_eq!(queue.pop(), Some(event));
        assert_eq!(queue.pop(), None);
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_pop_from_full_queue_frees_one_slot() {
        let mut queue = queue_of(3, &[1, 2, 3]);
        assert_eq!(queue.pop(), Some(scroll(1)));
        assert_eq!(queue.len(), 2);

        queue.push(scroll(4));
        assert!(queue.is_full());
        assert_eq!(collect(&queue), vec![scroll(2), scroll(3), scroll(4)]);
    }

    #[test]
    fn test_wrapped_iteration() {
        let mut queue = queue_of(3, &[1, 2, 3, 4, 5]);
        assert_eq!(collect(&queue), vec![scroll(3), scroll(4), scroll(5)]);
        assert_eq!(queue.iter().len(), 3);

        let reversed: Vec<_> = queue.iter().rev().cloned().collect();
        assert_eq!(reversed, vec![scroll(5), scroll(4), scroll(3)]);

        // iteration is restartable and does not consume
        assert_eq!(collect(&queue), collect(&queue));
        queue.pop();
        assert_eq!(collect(&queue), vec![scroll(4), scroll(5)]);
    }

    #[test]
    fn test_resize_grow_preserves_order() {
        let mut queue = queue_of(4, &[1, 2, 3, 4, 5, 6]);
        let before = collect(&queue);

        queue.resize(8, ResizePolicy::DiscardOld);
        assert_eq!(queue.capacity(), 8);
        assert_eq!(collect(&queue), before);
        assert!(!queue.is_full());

        queue.push(scroll(7));
        assert_eq!(queue.len(), 5);
        assert_eq!(queue.as_slice()[4], scroll(7));
    }

    #[test]
    fn test_resize_shrink_discard_old() {
        let mut queue = queue_of(5, &[1, 2, 3, 4, 5]);
        queue.resize(3, ResizePolicy::DiscardOld);

        assert_eq!(collect(&queue), vec![scroll(3), scroll(4), scroll(5)]);
        assert!(queue.is_full());
    }

    #[test]
    fn test_resize_shrink_discard_new() {
        let mut queue = queue_of(5, &[1, 2, 3, 4, 5]);
        queue.resize(3, ResizePolicy::DiscardNew);

        assert_eq!(collect(&queue), vec![scroll(1), scroll(2), scroll(3)]);
        assert!(queue.is_full());
    }

    #[test]
    fn test_resize_shrink_wrapped_buffer() {
        // begin sits in the middle of the buffer after the overwrites
        let mut old = queue_of(4, &[1, 2, 3, 4, 5, 6]);
        let mut new = queue_of(4, &[1, 2, 3, 4, 5, 6]);

        old.resize(2, ResizePolicy::DiscardOld);
        new.resize(2, ResizePolicy::DiscardNew);

        assert_eq!(collect(&old), vec![scroll(5), scroll(6)]);
        assert_eq!(collect(&new), vec![scroll(3), scroll(4)]);
    }

    #[test]
    fn test_resize_shrink_to_exact_length_is_full() {
        let mut queue = queue_of(6, &[1, 2, 3]);
        queue.resize(3, ResizePolicy::DiscardOld);

        assert!(queue.is_full());
        assert_eq!(collect(&queue), vec![scroll(1), scroll(2), scroll(3)]);
    }

    #[test]
    fn test_resize_shrink_above_length_keeps_everything() {
        let mut queue = queue_of(8, &[1, 2]);
        queue.resize(4, ResizePolicy::DiscardNew);

        assert_eq!(queue.len(), 2);
        assert_eq!(collect(&queue), vec![scroll(1), scroll(2)]);
    }

    #[test]
    fn test_zero_capacity() {
        let mut queue = queue_of(3, &[1, 2]);
        queue.resize(0, ResizePolicy::DiscardOld);

        assert!(queue.is_empty());
        assert!(queue.push(scroll(1)).is_none());
        assert_eq!(queue.pop(), None);
        assert_eq!(queue.iter().count(), 0);

        queue.resize(2, ResizePolicy::DiscardOld);
        queue.push(scroll(9));
        assert_eq!(collect(&queue), vec![scroll(9)]);
    }

    #[test]
    fn test_reset_and_clear() {
        let mut queue = EventQueue::new(2);
        queue.push(Event::FileDropped { files: vec!["a.txt".into()] });

        queue.reset();
        assert!(queue.is_empty());
        assert!(!queue.as_slice()[0].is_empty());

        queue.push(scroll(1));
        queue.clear();
        assert!(queue.is_empty());
        assert!(queue.as_slice().iter().all(Event::is_empty));
    }

    #[test]
    fn test_swap() {
        let mut a = queue_of(2, &[1]);
        let mut b = EventQueue::new(5);

        a.swap(&mut b);
        assert_eq!(a.capacity(), 5);
        assert!(a.is_empty());
        assert_eq!(collect(&b), vec![scroll(1)]);
    }

    #[test]
    fn test_visit() {
        let queue = queue_of(4, &[1, 2, 3]);
        let mut total = 0.0;
        queue.visit(|event| {
            if let Event::Scrolled { dx, .. } = event {
                total += dx;
            }
        });
        assert_eq!(total, 6.0);
    }
}
