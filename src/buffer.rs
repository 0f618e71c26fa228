use crate::event::Event;
use std::collections::VecDeque;

/// Number of events kept for display
pub const DEFAULT_CAPACITY: usize = 100;

/// Fixed-capacity buffer of the most recent events, newest first
///
/// Push is O(1): the new event goes to the front and, once the buffer is
/// over capacity, the oldest event is dropped from the back in the same call.
#[derive(Debug, Clone)]
pub struct EventBuffer {
    events: VecDeque<Event>,
    capacity: usize,
}

impl EventBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert at the head. Returns the evicted event, if any.
    pub fn push(&mut self, event: Event) -> Option<Event> {
        if self.capacity == 0 {
            return Some(event);
        }

        self.events.push_front(event);
        if self.events.len() > self.capacity {
            self.events.pop_back()
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Ordered copy of the contents, newest first
    pub fn snapshot(&self) -> Vec<Event> {
        self.events.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn newest(&self) -> Option<&Event> {
        self.events.front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Category, EventData};

    fn create_test_event(sequence: u64) -> Event {
        Event {
            category: Category::Transfer,
            kind: "transfer".to_string(),
            sequence,
            data: EventData::default(),
        }
    }

    #[test]
    fn test_push_is_newest_first() {
        let mut buffer = EventBuffer::new(10);
        for seq in 1..=3 {
            buffer.push(create_test_event(seq));
        }

        let order: Vec<u64> = buffer.iter().map(|e| e.sequence).collect();
        assert_eq!(order, vec![3, 2, 1]);
        assert_eq!(buffer.newest().map(|e| e.sequence), Some(3));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut buffer = EventBuffer::new(DEFAULT_CAPACITY);
        let mut evicted = Vec::new();

        for seq in 0..150 {
            if let Some(old) = buffer.push(create_test_event(seq)) {
                evicted.push(old.sequence);
            }
            assert!(buffer.len() <= DEFAULT_CAPACITY);
        }

        assert_eq!(buffer.len(), 100);
        assert_eq!(evicted, (0..50).collect::<Vec<_>>());
        assert_eq!(buffer.newest().map(|e| e.sequence), Some(149));
        assert_eq!(buffer.iter().last().map(|e| e.sequence), Some(50));
    }

    #[test]
    fn test_clear_and_snapshot_independence() {
        let mut buffer = EventBuffer::new(5);
        buffer.push(create_test_event(1));
        buffer.push(create_test_event(2));

        let snapshot = buffer.snapshot();
        buffer.clear();

        assert!(buffer.is_empty());
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].sequence, 2);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut buffer = EventBuffer::new(0);
        let evicted = buffer.push(create_test_event(1));
        assert_eq!(evicted.map(|e| e.sequence), Some(1));
        assert!(buffer.is_empty());
    }
}
