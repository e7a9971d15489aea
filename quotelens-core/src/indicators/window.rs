//! Bounded rolling window over a single numeric series.
//!
//! FIFO buffer of the most recent `capacity` values. Mean and standard
//! deviation are recomputed over the buffer (at most `capacity` values) using
//! data shifted by the oldest value. A window of identical values therefore
//! has a stddev of exactly 0 and a mean exactly equal to that value, and
//! `mean()` is bit-identical to `stats().mean`.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct RollingWindow {
    capacity: usize,
    values: VecDeque<f64>,
}

/// Mean and sample standard deviation of a full window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    pub mean: f64,
    pub stddev: f64,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "window capacity must be >= 1");
        Self {
            capacity,
            values: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a value, evicting and returning the oldest one when full.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        let evicted = if self.values.len() == self.capacity {
            self.values.pop_front()
        } else {
            None
        };
        self.values.push_back(value);
        evicted
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True once `capacity` values have been seen.
    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    /// Most recently pushed value.
    pub fn last(&self) -> Option<f64> {
        self.values.back().copied()
    }

    /// Value `back` positions before the newest one (`ago(0)` is the newest).
    pub fn ago(&self, back: usize) -> Option<f64> {
        let len = self.values.len();
        if back >= len {
            return None;
        }
        self.values.get(len - 1 - back).copied()
    }

    /// Values in insertion order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    /// Arithmetic mean of the full window; `None` until the window is full.
    pub fn mean(&self) -> Option<f64> {
        self.stats().map(|s| s.mean)
    }

    /// Sample standard deviation (n - 1) of the full window.
    pub fn stddev(&self) -> Option<f64> {
        self.stats().map(|s| s.stddev)
    }

    /// Mean and sample stddev of the full window in one shifted pass.
    pub fn stats(&self) -> Option<WindowStats> {
        if !self.is_full() {
            return None;
        }
        let n = self.capacity as f64;
        let shift = self.values[0];
        let (sum_d, sum_d2) = self.values.iter().fold((0.0, 0.0), |(s, s2), &v| {
            let d = v - shift;
            (s + d, s2 + d * d)
        });
        let mean = shift + sum_d / n;
        let stddev = if self.capacity < 2 {
            0.0
        } else {
            // Rounding can push a zero variance slightly negative
            ((sum_d2 - sum_d * sum_d / n) / (n - 1.0)).max(0.0).sqrt()
        };
        Some(WindowStats { mean, stddev })
    }
}
