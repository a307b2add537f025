//! Bounded FIFO storage for timestamped samples.
//!
//! [`SampleBuffer`] is a fixed-capacity ring: pushing into a full buffer
//! overwrites the oldest entry, so appends never fail and never block.
//! The acquisition layer keeps several of these over the same stream
//! (a short one for display, a long one for analysis, one for recording).

use alloc::vec::Vec;

/// A single voltage reading.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sample {
    /// Seconds since acquisition start.
    pub timestamp: f64,
    /// Measured value in volts.
    pub value: f64,
}

impl Sample {
    /// Creates a new sample.
    pub const fn new(timestamp: f64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Fixed-capacity ring buffer that evicts the oldest item when full.
///
/// Iteration and snapshots are always ordered oldest → newest.
///
/// # Example
///
/// ```rust
/// use resoscope_core::SampleBuffer;
///
/// let mut buf = SampleBuffer::new(3);
/// for v in 1..=5 {
///     buf.push(v);
/// }
/// assert_eq!(buf.to_vec(), vec![3, 4, 5]);
/// assert_eq!(buf.snapshot(2), vec![4, 5]);
/// ```
#[derive(Debug, Clone)]
pub struct SampleBuffer<T> {
    /// Backing storage, grows up to `capacity` and is then reused
    storage: Vec<T>,
    /// Index of the slot the next push writes to (once full)
    write_pos: usize,
    capacity: usize,
}

impl<T: Copy> SampleBuffer<T> {
    /// Creates an empty buffer holding at most `capacity` items.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            storage: Vec::new(),
            write_pos: 0,
            capacity,
        }
    }

    /// Appends an item, discarding the oldest one if the buffer is full.
    #[inline]
    pub fn push(&mut self, item: T) {
        if self.storage.len() < self.capacity {
            self.storage.push(item);
        } else {
            self.storage[self.write_pos] = item;
            self.write_pos = (self.write_pos + 1) % self.capacity;
        }
    }

    /// Appends every item of `items` in order.
    pub fn extend_from_slice(&mut self, items: &[T]) {
        for &item in items {
            self.push(item);
        }
    }

    /// Returns a copy of the most recent `min(n, len)` items, oldest first.
    pub fn snapshot(&self, n: usize) -> Vec<T> {
        let take = n.min(self.len());
        self.iter().skip(self.len() - take).collect()
    }

    /// Returns a copy of every stored item, oldest first.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// Iterates from the oldest to the newest item.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        let (newer, older) = self.storage.split_at(self.start());
        older.iter().chain(newer.iter()).copied()
    }

    /// Most recently pushed item.
    pub fn latest(&self) -> Option<T> {
        if self.storage.is_empty() {
            return None;
        }
        let idx = if self.is_full() {
            (self.write_pos + self.capacity - 1) % self.capacity
        } else {
            self.storage.len() - 1
        };
        Some(self.storage[idx])
    }

    /// Oldest item still retained.
    pub fn oldest(&self) -> Option<T> {
        self.storage.get(self.start()).copied()
    }

    /// Number of stored items.
    #[inline]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Returns `true` if nothing has been pushed since creation or the last clear.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Returns `true` once the next push will evict.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.storage.len() == self.capacity
    }

    /// Maximum number of retained items.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Removes every item. Capacity is unchanged.
    pub fn clear(&mut self) {
        self.storage.clear();
        self.write_pos = 0;
    }

    /// Physical index of the oldest item.
    fn start(&self) -> usize {
        if self.is_full() { self.write_pos } else { 0 }
    }
}

impl SampleBuffer<Sample> {
    /// Copies out the values of the most recent `n` samples.
    pub fn values(&self, n: usize) -> Vec<f64> {
        let take = n.min(self.len());
        self.iter()
            .skip(self.len() - take)
            .map(|s| s.value)
            .collect()
    }

    /// Time between the oldest and newest retained sample, in seconds.
    pub fn span(&self) -> Option<f64> {
        match (self.oldest(), self.latest()) {
            (Some(first), Some(last)) => Some(last.timestamp - first.timestamp),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_then_evicts_oldest() {
        let mut buf = SampleBuffer::new(4);
        for i in 0..4 {
            buf.push(i);
        }
        assert!(buf.is_full());
        assert_eq!(buf.to_vec(), vec![0, 1, 2, 3]);

        buf.push(4);
        buf.push(5);
        assert_eq!(buf.len(), 4);
        assert_eq!(buf.to_vec(), vec![2, 3, 4, 5]);
        assert_eq!(buf.oldest(), Some(2));
        assert_eq!(buf.latest(), Some(5));
    }

    #[test]
    fn snapshot_returns_tail() {
        let mut buf = SampleBuffer::new(5);
        for i in 0..12 {
            buf.push(i);
        }
        assert_eq!(buf.snapshot(3), vec![9, 10, 11]);
        assert_eq!(buf.snapshot(100), vec![7, 8, 9, 10, 11]);
        assert!(buf.snapshot(0).is_empty());
    }

    #[test]
    fn empty_buffer_queries() {
        let buf: SampleBuffer<u8> = SampleBuffer::new(8);
        assert!(buf.is_empty());
        assert_eq!(buf.latest(), None);
        assert_eq!(buf.oldest(), None);
        assert!(buf.snapshot(4).is_empty());
    }

    #[test]
    fn zero_capacity_is_raised() {
        let mut buf = SampleBuffer::new(0);
        assert_eq!(buf.capacity(), 1);
        buf.push(1);
        buf.push(2);
        assert_eq!(buf.to_vec(), vec![2]);
    }

    #[test]
    fn clear_resets_ring() {
        let mut buf = SampleBuffer::new(3);
        buf.extend_from_slice(&[1, 2, 3, 4]);
        buf.clear();
        assert!(buf.is_empty());
        buf.push(9);
        assert_eq!(buf.to_vec(), vec![9]);
    }

    #[test]
    fn sample_values_and_span() {
        let mut buf = SampleBuffer::new(3);
        for i in 0..5 {
            buf.push(Sample::new(i as f64 * 0.5, i as f64));
        }
        assert_eq!(buf.values(2), vec![3.0, 4.0]);
        assert_eq!(buf.span(), Some(1.0));
    }
}
