//! End-to-end engine behavior on synthetic sequences.

use chrono::{DateTime, NaiveDate, Utc};
use quotelens_core::classify::{DailyPerformance, RsiSignal, TrendDirection};
use quotelens_core::domain::Bar;
use quotelens_core::signals::{SignalConfidence, TradingSignal};
use quotelens_core::{process_series, AlertThresholds, SymbolEngine, SymbolOutput};

fn processed_at() -> DateTime<Utc> {
    DateTime::from_timestamp(1_720_000_000, 0).unwrap()
}

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
}

fn bar(symbol: &str, i: usize, close: f64, volume: u64) -> Bar {
    let open = close - 1.0;
    Bar {
        symbol: symbol.to_string(),
        trading_date: base_date() + chrono::Duration::days(i as i64),
        open,
        high: close + 0.5,
        low: open - 0.5,
        close,
        adjusted_close: close,
        volume,
    }
}

/// Closes rising linearly from 100, open = close - 1, constant volume.
fn rising(symbol: &str, n: usize) -> Vec<Bar> {
    (0..n)
        .map(|i| bar(symbol, i, 100.0 + i as f64, 1_000_000))
        .collect()
}

/// Deterministic zig-zag walk with varying volume.
fn wavy(symbol: &str, n: usize) -> Vec<Bar> {
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.7).sin() * 8.0 + i as f64 * 0.05;
            bar(symbol, i, close, 500_000 + (i as u64 * 37_000) % 900_000)
        })
        .collect()
}

fn run(bars: &[Bar]) -> SymbolOutput {
    SymbolEngine::new(bars[0].symbol.clone(), AlertThresholds::default())
        .process_all(bars, processed_at())
}

#[test]
fn output_matches_input_length_and_order() {
    let bars = wavy("AAA", 80);
    let out = run(&bars);
    assert_eq!(out.records.len(), bars.len());
    for (record, bar) in out.records.iter().zip(&bars) {
        assert_eq!(&record.bar, bar);
        assert_eq!(record.processed_at, processed_at());
    }
}

#[test]
fn runs_are_deterministic() {
    let bars = wavy("AAA", 120);
    let first = run(&bars);
    let second = run(&bars);
    assert_eq!(first, second);
    let a = first.records[119].indicators.bb_position.unwrap();
    let b = second.records[119].indicators.bb_position.unwrap();
    assert_eq!(a.to_bits(), b.to_bits());
}

#[test]
fn ma_20_is_mean_of_first_twenty_closes() {
    let bars = wavy("AAA", 30);
    let out = run(&bars);
    for record in &out.records[..19] {
        assert!(record.indicators.ma_20.is_none());
    }
    let expected = bars[..20].iter().map(|b| b.close).sum::<f64>() / 20.0;
    let ma_20 = out.records[19].indicators.ma_20.unwrap();
    assert!((ma_20 - expected).abs() < 1e-10, "{ma_20} vs {expected}");
}

#[test]
fn constant_volume_gives_unit_ratio() {
    let bars = rising("AAA", 40);
    let out = run(&bars);
    for record in &out.records {
        assert_eq!(record.indicators.volume_ratio, 1.0);
    }
    for record in &out.records[19..] {
        assert_eq!(record.indicators.volume_ma_20, Some(1_000_000.0));
    }
}

#[test]
fn flat_closes_collapse_bollinger_bands() {
    // Varied history first, then 20 identical closes
    let mut bars = wavy("AAA", 15);
    for i in 15..35 {
        bars.push(bar("AAA", i, 101.25, 750_000));
    }
    let out = run(&bars);
    let last = &out.records[34].indicators;
    assert_eq!(last.bb_upper, Some(101.25));
    assert_eq!(last.bb_lower, Some(101.25));
    assert_eq!(last.bb_middle, Some(101.25));
    assert_eq!(last.bb_position, Some(0.5));
}

#[test]
fn flat_series_has_exact_averages_and_neutral_trend() {
    for price in [19.99, 0.1, 101.37, 3.3, 47.61] {
        let bars: Vec<Bar> = (0..80)
            .map(|i| Bar {
                symbol: "FLAT".to_string(),
                trading_date: base_date() + chrono::Duration::days(i as i64),
                open: price,
                high: price,
                low: price,
                close: price,
                adjusted_close: price,
                volume: 1_000_000,
            })
            .collect();
        let out = run(&bars);
        for (i, record) in out.records.iter().enumerate() {
            let f = &record.indicators;
            if i >= 19 {
                assert_eq!(f.ma_20, Some(price), "bar {i} at {price}");
                assert_eq!(f.ma_20, f.bb_middle, "bar {i} at {price}");
            }
            if i >= 49 {
                assert_eq!(f.ma_50, Some(price), "bar {i} at {price}");
            }
            assert_eq!(
                record.classification.trend_direction,
                TrendDirection::Neutral,
                "bar {i} at {price}"
            );
        }
    }
}

#[test]
fn zero_close_is_rejected_and_skipped() {
    let clean = wavy("AAA", 30);
    let mut dirty = clean.clone();
    let mut bad = clean[10].clone();
    bad.close = 0.0;
    bad.low = 0.0;
    dirty.insert(10, bad);

    let clean_out = run(&clean);
    let dirty_out = run(&dirty);

    assert_eq!(dirty_out.rejections.len(), 1);
    assert_eq!(dirty_out.rejections[0].index, 10);
    assert_eq!(dirty_out.rejections[0].error.rule(), "non_positive_close");
    assert!(dirty_out.records.iter().all(|r| r.bar.close > 0.0));
    assert_eq!(dirty_out.records, clean_out.records);
}

#[test]
fn twenty_five_rising_bars_stay_neutral_without_ma_50() {
    let bars = rising("TEST", 25);
    let out = run(&bars);
    assert_eq!(out.records.len(), 25);

    let expected_ma_20 = (100..120).map(f64::from).sum::<f64>() / 20.0;
    assert_eq!(out.records[19].indicators.ma_20, Some(expected_ma_20));
    assert!(out.records[24].indicators.ma_20.is_some());

    for record in &out.records {
        assert!(record.indicators.ma_50.is_none());
        assert_eq!(record.classification.trend_direction, TrendDirection::Neutral);
        assert_eq!(record.signal.trading_signal, TradingSignal::Hold);
        assert_eq!(record.signal.signal_confidence, SignalConfidence::Low);
    }

    // Every intraday change is positive, so RSI pins at 100 once defined
    assert_eq!(out.records[13].indicators.rsi_14, Some(100.0));
    assert_eq!(out.records[13].classification.rsi_signal, RsiSignal::Overbought);

    assert_eq!(out.records[0].classification.daily_performance, None);
    assert_eq!(
        out.records[1].classification.daily_performance,
        Some(DailyPerformance::SmallGain)
    );
}

#[test]
fn long_uptrend_turns_bullish_after_fifty_bars() {
    let bars = rising("TEST", 60);
    let out = run(&bars);
    assert_eq!(out.records[48].classification.trend_direction, TrendDirection::Neutral);
    assert_eq!(out.records[49].classification.trend_direction, TrendDirection::Bullish);
    // RSI stays overbought on a one-way rise, so no buy signal fires
    assert_eq!(out.records[59].signal.trading_signal, TradingSignal::Hold);
}

#[test]
fn symbols_do_not_affect_each_other() {
    let a = wavy("AAA", 60);
    let b = rising("BBB", 60);
    let mut mixed = Vec::new();
    for (x, y) in a.iter().zip(&b) {
        mixed.push(y.clone());
        mixed.push(x.clone());
    }

    let outputs = process_series(mixed, &AlertThresholds::default(), processed_at());
    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs[0].symbol, "BBB");
    assert_eq!(outputs[1].symbol, "AAA");
    assert_eq!(outputs[0].records, run(&b).records);
    assert_eq!(outputs[1].records, run(&a).records);
}

#[test]
fn volume_spike_raises_alert() {
    let mut bars = rising("AAA", 25);
    bars[24].volume = 5_000_000;
    let out = run(&bars);
    let kinds: Vec<&str> = out.records[24]
        .alerts
        .iter()
        .map(|a| a.kind.as_str())
        .collect();
    assert!(kinds.contains(&"volume_spike"), "{kinds:?}");
}
