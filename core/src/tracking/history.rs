/// Fixed-capacity ring buffer with a write cursor.
///
/// Once full, each push overwrites the oldest element, so memory per track
/// stays constant and iteration always runs oldest to newest.
#[derive(Debug, Clone)]
pub struct HistoryRing<T> {
    slots: Vec<T>,
    capacity: usize,
    cursor: usize,
}

impl<T> HistoryRing<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            cursor: 0,
        }
    }

    pub fn push(&mut self, value: T) {
        if self.slots.len() < self.capacity {
            self.slots.push(value);
        } else {
            self.slots[self.cursor] = value;
        }
        self.cursor = (self.cursor + 1) % self.capacity;
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&T> {
        if self.slots.is_empty() {
            return None;
        }
        let idx = (self.cursor + self.slots.len() - 1) % self.slots.len();
        self.slots.get(idx)
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + Clone + '_ {
        let split = self.cursor.min(self.slots.len());
        self.slots[split..].iter().chain(self.slots[..split].iter())
    }

    /// The newest `n` elements, oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &T> + '_ {
        self.iter().skip(self.len().saturating_sub(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_keeps_insertion_order_before_wrapping() {
        let mut ring = HistoryRing::with_capacity(4);
        ring.push(1);
        ring.push(2);
        assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(ring.latest(), Some(&2));
    }

    #[test]
    fn ring_discards_oldest_first() {
        let mut ring = HistoryRing::with_capacity(3);
        for value in 1..=5 {
            ring.push(value);
        }
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![3, 4, 5]);
        assert_eq!(ring.latest(), Some(&5));
        assert_eq!(ring.recent(2).copied().collect::<Vec<_>>(), vec![4, 5]);
    }
}
