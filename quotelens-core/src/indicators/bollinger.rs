//! Bollinger Bands: moving average +/- standard deviation multiplier.
//!
//! - Middle: mean(close, period)
//! - Upper: middle + mult * stddev(close, period)
//! - Lower: middle - mult * stddev(close, period)
//!
//! Uses sample stddev (divide by N - 1).

use super::window::RollingWindow;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerBands {
    /// Bands over a full close window; `None` while the window is filling.
    pub fn from_window(closes: &RollingWindow, multiplier: f64) -> Option<Self> {
        let stats = closes.stats()?;
        Some(Self {
            upper: stats.mean + multiplier * stats.stddev,
            middle: stats.mean,
            lower: stats.mean - multiplier * stats.stddev,
        })
    }

    /// Position of `close` within the bands. 0 at the lower band, 1 at the
    /// upper. Not clamped: closes outside the bands fall outside [0, 1].
    pub fn position(&self, close: f64) -> f64 {
        bb_position(close, self.upper, self.lower)
    }
}

/// (close - lower) / (upper - lower), or 0.5 when the bands have collapsed.
pub fn bb_position(close: f64, upper: f64, lower: f64) -> f64 {
    let width = upper - lower;
    if width == 0.0 {
        0.5
    } else {
        (close - lower) / width
    }
}
