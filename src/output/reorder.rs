use log::debug;
use std::collections::BTreeMap;

/// Releases items in ascending sequence order regardless of arrival order.
#[derive(Debug)]
pub struct ReorderBuffer<T> {
    next: u64,
    pending: BTreeMap<u64, T>,
    peak: usize,
}

impl<T> Default for ReorderBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ReorderBuffer<T> {
    pub fn new() -> Self {
        Self {
            next: 0,
            pending: BTreeMap::new(),
            peak: 0,
        }
    }

    /// Sequence numbers already released or already pending are dropped.
    pub fn push(&mut self, seq: u64, item: T) {
        if seq < self.next || self.pending.contains_key(&seq) {
            debug!("dropping duplicate sequence number {seq}");
            return;
        }
        self.pending.insert(seq, item);
        self.peak = self.peak.max(self.pending.len());
    }

    /// The next item in sequence, if it has arrived.
    pub fn pop_ready(&mut self) -> Option<T> {
        let item = self.pending.remove(&self.next)?;
        self.next += 1;
        Some(item)
    }

    pub fn next_seq(&self) -> u64 {
        self.next
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Largest number of items held at once.
    pub fn peak_pending(&self) -> usize {
        self.peak
    }
}
