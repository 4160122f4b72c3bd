// ─────────────────────────────────────────────────────────────────────
// Attractor Forge — Rolling Smoother
// ─────────────────────────────────────────────────────────────────────

use std::collections::VecDeque;

use crate::params::DEFAULT_WINDOW;

/// Fixed-capacity FIFO producing a running mean of a scalar stream.
///
/// Invariant: `len() <= capacity()`; the oldest value is evicted first.
#[derive(Debug, Clone)]
pub struct RollingSmoother {
    window: VecDeque<f64>,
    capacity: usize,
}

impl RollingSmoother {
    /// A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `value` (evicting the oldest if full) and return the mean.
    pub fn update(&mut self, value: f64) -> f64 {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(value);
        self.mean()
    }

    /// Mean of the current contents; 0.0 when empty.
    pub fn mean(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        self.window.iter().sum::<f64>() / self.window.len() as f64
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for RollingSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
