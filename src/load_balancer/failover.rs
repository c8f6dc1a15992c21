//! Per-session failure tracking.
//!
//! A `FailureSet` records which backend indices one session has already tried
//! and failed. It is owned by the session and never shared, so other sessions
//! keep selecting a backend that failed here.

/// Fixed-capacity bitset of failed backend indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureSet {
    words: Vec<u64>,
    capacity: usize,
    len: usize,
}

impl FailureSet {
    /// An empty set able to hold indices `0..capacity`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity.div_ceil(64)],
            capacity,
            len: 0,
        }
    }

    /// Mark `index` as failed. Returns `false` if it was already marked or out of range.
    pub fn insert(&mut self, index: usize) -> bool {
        if index >= self.capacity || self.contains(index) {
            return false;
        }
        self.words[index / 64] |= 1 << (index % 64);
        self.len += 1;
        true
    }

    pub fn contains(&self, index: usize) -> bool {
        index < self.capacity && self.words[index / 64] & (1 << (index % 64)) != 0
    }

    /// Number of indices marked failed.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True once every index in `0..capacity` has failed.
    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }
}
