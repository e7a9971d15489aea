//! Streaming indicator building blocks.
//!
//! Every type here consumes one value per bar and keeps only a bounded
//! trailing state, so an indicator value at bar t never depends on bar t+1.
//! `SymbolState` in `engine::state` wires them together per symbol.

pub mod bollinger;
pub mod ema;
pub mod rsi;
pub mod window;

pub use bollinger::{bb_position, BollingerBands};
pub use ema::{Ema, Macd, MacdValue};
pub use rsi::{rsi_from_averages, Rsi};
pub use window::{RollingWindow, WindowStats};

/// `numerator / denominator`, or 1.0 when the denominator is missing or zero.
pub fn ratio_or_one(numerator: f64, denominator: Option<f64>) -> f64 {
    match denominator {
        Some(d) if d != 0.0 => numerator / d,
        _ => 1.0,
    }
}

/// Percent change from `base` to `value` (×100).
pub fn percent_change(value: f64, base: f64) -> f64 {
    (value - base) / base * 100.0
}

/// Create synthetic bars from close prices for testing.
///
/// open = close - 1.0, high = close + 1.0, low = open - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            symbol: "TEST".to_string(),
            trading_date: base_date + chrono::Duration::days(i as i64),
            open: close - 1.0,
            high: close + 1.0,
            low: close - 2.0,
            close,
            adjusted_close: close,
            volume: 1000,
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
