//! Relative Strength Index (RSI).
//!
//! Simple (non-Wilder) averages of gains and absolute losses over the trailing
//! `period` changes, including the current bar's change.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Edge cases: avg_gain == 0 → RSI = 0; avg_loss == 0 → RSI = 100.

use super::window::RollingWindow;

#[derive(Debug, Clone)]
pub struct Rsi {
    gains: RollingWindow,
    losses: RollingWindow,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            gains: RollingWindow::new(period),
            losses: RollingWindow::new(period),
        }
    }

    /// Feed one change value; returns the RSI once `period` changes are seen.
    pub fn push(&mut self, change: f64) -> Option<f64> {
        self.gains.push(change.max(0.0));
        self.losses.push((-change).max(0.0));
        let avg_gain = self.gains.mean()?;
        let avg_loss = self.losses.mean()?;
        Some(rsi_from_averages(avg_gain, avg_loss))
    }
}

/// RSI from average gain and average absolute loss.
pub fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_gain == 0.0 {
        0.0
    } else if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn rsi_all_gains() {
        let mut rsi = Rsi::new(3);
        assert_eq!(rsi.push(0.01), None);
        assert_eq!(rsi.push(0.02), None);
        assert_approx(rsi.push(0.01).unwrap(), 100.0, 1e-9);
    }

    #[test]
    fn rsi_all_losses() {
        let mut rsi = Rsi::new(3);
        rsi.push(-0.01);
        rsi.push(-0.02);
        assert_approx(rsi.push(-0.03).unwrap(), 0.0, 1e-9);
    }

    #[test]
    fn rsi_flat_is_zero() {
        // No gains at all: defined as 0 even though there are no losses either
        let mut rsi = Rsi::new(2);
        rsi.push(0.0);
        assert_eq!(rsi.push(0.0), Some(0.0));
    }

    #[test]
    fn rsi_mixed() {
        // gains 0.34 + 0.72 = 1.06, losses 0.25 + 0.48 = 0.73 over 4 changes
        let mut rsi = Rsi::new(4);
        let mut last = None;
        for ch in [0.34, -0.25, -0.48, 0.72] {
            last = rsi.push(ch);
        }
        let expected = 100.0 - 100.0 / (1.0 + 1.06 / 0.73);
        assert_approx(last.unwrap(), expected, 1e-9);
    }

    #[test]
    fn rsi_window_rolls() {
        let mut rsi = Rsi::new(2);
        rsi.push(-1.0);
        rsi.push(-1.0);
        // Window is now [-1, +1]: equal averages → 50
        assert_approx(rsi.push(1.0).unwrap(), 50.0, 1e-9);
    }

    #[test]
    fn rsi_bounds() {
        let mut rsi = Rsi::new(3);
        for ch in [0.05, -0.07, 0.12, -0.15, 0.2, -0.25, 0.3] {
            if let Some(v) = rsi.push(ch) {
                assert!((0.0..=100.0).contains(&v), "RSI out of bounds: {v}");
            }
        }
    }
}
