//! Criterion benchmarks for QuoteLens hot paths.
//!
//! Benchmarks:
//! 1. Per-symbol engine loop (validate, step, classify, signal, alerts)
//! 2. Raw state transition (indicator frames only)
//! 3. Rolling window push + stats
//! 4. Mixed-symbol series (grouping plus one engine per symbol)

use chrono::{DateTime, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use quotelens_core::domain::Bar;
use quotelens_core::engine::SymbolState;
use quotelens_core::indicators::RollingWindow;
use quotelens_core::{process_series, AlertThresholds, SymbolEngine};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_bars(symbol: &str, n: usize) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            let open = close - 0.3;
            Bar {
                symbol: symbol.to_string(),
                trading_date: base_date + chrono::Duration::days(i as i64),
                open,
                high: close + 1.5,
                low: close - 1.5,
                close,
                adjusted_close: close,
                volume: 1_000_000 + (i as u64 % 500_000),
            }
        })
        .collect()
}

fn processed_at() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default()
}

// ── 1. Engine Loop ───────────────────────────────────────────────────

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("symbol_engine");

    for &bar_count in &[252, 1260, 2520] {
        let bars = make_bars("BENCH", bar_count);
        group.bench_with_input(
            BenchmarkId::new("process_all", bar_count),
            &bar_count,
            |b, _| {
                b.iter(|| {
                    SymbolEngine::new("BENCH", AlertThresholds::default())
                        .process_all(black_box(&bars), processed_at())
                });
            },
        );
    }

    group.finish();
}

// ── 2. State Transition ──────────────────────────────────────────────

fn bench_state_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("state_step");
    let bars = make_bars("BENCH", 2520);

    group.bench_function("indicator_frames_2520", |b| {
        b.iter(|| {
            let mut state = SymbolState::new("BENCH");
            for bar in &bars {
                black_box(state.step(black_box(bar)));
            }
        });
    });

    group.finish();
}

// ── 3. Rolling Window ────────────────────────────────────────────────

fn bench_window(c: &mut Criterion) {
    let mut group = c.benchmark_group("rolling_window");

    for &capacity in &[5, 20, 50] {
        group.bench_with_input(
            BenchmarkId::new("push_stats_10k", capacity),
            &capacity,
            |b, &capacity| {
                b.iter(|| {
                    let mut w = RollingWindow::new(capacity);
                    for i in 0..10_000 {
                        w.push(black_box(i as f64 * 0.25));
                        black_box(w.stats());
                    }
                });
            },
        );
    }

    group.finish();
}

// ── 4. Mixed-Symbol Series ───────────────────────────────────────────

fn bench_series(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_series");

    let mut mixed = Vec::new();
    let per_symbol: Vec<Vec<Bar>> = (0..10)
        .map(|s| make_bars(&format!("SYM{s}"), 1260))
        .collect();
    for i in 0..1260 {
        for bars in &per_symbol {
            mixed.push(bars[i].clone());
        }
    }

    group.bench_function("10_symbols_1260_bars", |b| {
        b.iter(|| {
            process_series(
                black_box(mixed.clone()),
                &AlertThresholds::default(),
                processed_at(),
            )
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_engine,
    bench_state_step,
    bench_window,
    bench_series
);
criterion_main!(benches);
