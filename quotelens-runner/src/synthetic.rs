//! Synthetic bars for demos, fixtures and benchmarks.
//!
//! A seeded random walk from a starting price of 100.0 over weekdays. The
//! same (symbol, start, n, seed) always yields the same bars.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use quotelens_core::domain::Bar;

/// Generate `n` weekday bars for `symbol` starting on or after `start`.
pub fn generate_synthetic_bars(symbol: &str, start: NaiveDate, n: usize, seed: u64) -> Vec<Bar> {
    // Mix the symbol into the seed so different symbols diverge
    let mut hasher = blake3::Hasher::new();
    hasher.update(&seed.to_le_bytes());
    hasher.update(symbol.as_bytes());
    let mut rng = StdRng::from_seed(*hasher.finalize().as_bytes());

    let mut bars = Vec::with_capacity(n);
    let mut price = 100.0_f64;
    let mut current = start;

    while bars.len() < n {
        if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = (price * (1.0 + daily_return)).max(0.01);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000..5_000_000u64);

        bars.push(Bar {
            symbol: symbol.to_string(),
            trading_date: current,
            open,
            high,
            low,
            close,
            adjusted_close: close,
            volume,
        });

        price = close;
        current += chrono::Duration::days(1);
    }

    bars
}
