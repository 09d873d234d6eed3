//! # Sliding Window
//!
//! Fixed-capacity FIFO history of one scalar channel.

use std::collections::VecDeque;

/// Number of samples kept per channel
pub const WINDOW_CAPACITY: usize = 200;

/// Most-recent-N history of a scalar channel
///
/// Appending to a full window drops the oldest value, so the window always
/// holds the last `capacity` values in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct SlidingWindow<T> {
    values: VecDeque<T>,
    capacity: usize,
}

impl<T: Copy + Default> SlidingWindow<T> {
    /// Create a window pre-filled with `capacity` default (zero) values
    ///
    /// Plots render a flat baseline until real data pushes the zeros out.
    pub fn zeroed(capacity: usize) -> Self {
        let mut window = Self::empty(capacity);
        window.values.resize(capacity, T::default());
        window
    }
}

impl<T: Copy> SlidingWindow<T> {
    /// Create an empty window
    pub fn empty(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a value, evicting the oldest one when full
    pub fn append(&mut self, value: T) {
        if self.capacity == 0 {
            return;
        }
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    /// Copy of the current contents, oldest first
    pub fn snapshot(&self) -> Vec<T> {
        self.values.iter().copied().collect()
    }

    /// Most recently appended value
    pub fn latest(&self) -> Option<T> {
        self.values.back().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T: Copy + Default> Default for SlidingWindow<T> {
    fn default() -> Self {
        Self::zeroed(WINDOW_CAPACITY)
    }
}
