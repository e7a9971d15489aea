//! Per-symbol rolling state and its transition function.
//!
//! State = window contents. Transition = push the new bar's values, evicting
//! the oldest once a window is at capacity. `step` is the only mutator, and it
//! only ever sees bars in the order they are accepted, so no indicator can
//! look ahead.

use chrono::NaiveDate;

use crate::domain::{Bar, CandleColor, IndicatorFrame};
use crate::indicators::{
    percent_change, ratio_or_one, BollingerBands, Macd, RollingWindow, Rsi,
};

pub const MA_SHORT: usize = 5;
pub const MA_MEDIUM: usize = 20;
pub const MA_LONG: usize = 50;
pub const VOLUME_WINDOW: usize = 20;
pub const VOLATILITY_WINDOW: usize = 20;
pub const RSI_PERIOD: usize = 14;
/// Bands are computed over the `MA_MEDIUM` close window.
pub const BOLLINGER_MULTIPLIER: f64 = 2.0;
/// Close lookback for `price_change_5d_percent`.
pub const CHANGE_LOOKBACK: usize = 5;

#[derive(Debug, Clone)]
pub struct SymbolState {
    symbol: String,
    last_date: Option<NaiveDate>,
    bars_seen: usize,
    closes_short: RollingWindow,
    closes_medium: RollingWindow,
    closes_long: RollingWindow,
    recent_closes: RollingWindow,
    volumes: RollingWindow,
    change_pcts: RollingWindow,
    rsi: Rsi,
    macd: Macd,
}

impl SymbolState {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            last_date: None,
            bars_seen: 0,
            closes_short: RollingWindow::new(MA_SHORT),
            closes_medium: RollingWindow::new(MA_MEDIUM),
            closes_long: RollingWindow::new(MA_LONG),
            recent_closes: RollingWindow::new(CHANGE_LOOKBACK + 1),
            volumes: RollingWindow::new(VOLUME_WINDOW),
            change_pcts: RollingWindow::new(VOLATILITY_WINDOW),
            rsi: Rsi::new(RSI_PERIOD),
            macd: Macd::standard(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Date of the last accepted bar.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.last_date
    }

    pub fn bars_seen(&self) -> usize {
        self.bars_seen
    }

    /// Advance the state by one validated bar and return its indicators.
    pub fn step(&mut self, bar: &Bar) -> IndicatorFrame {
        let daily_change = bar.close - bar.open;
        let daily_change_percent = daily_change / bar.open;
        let daily_range = bar.high - bar.low;
        let volume = bar.volume as f64;

        self.closes_short.push(bar.close);
        self.closes_medium.push(bar.close);
        self.closes_long.push(bar.close);
        self.recent_closes.push(bar.close);
        self.volumes.push(volume);
        self.change_pcts.push(daily_change_percent);

        let rsi_14 = self.rsi.push(daily_change_percent);
        let macd = self.macd.push(bar.close);

        let price_change_1d_percent = self
            .recent_closes
            .ago(1)
            .map(|prev| percent_change(bar.close, prev));
        let price_change_5d_percent = self
            .recent_closes
            .ago(CHANGE_LOOKBACK)
            .map(|base| percent_change(bar.close, base));

        let volume_ma_20 = self.volumes.mean();
        let bands = BollingerBands::from_window(&self.closes_medium, BOLLINGER_MULTIPLIER);

        self.last_date = Some(bar.trading_date);
        self.bars_seen += 1;

        IndicatorFrame {
            daily_change,
            daily_change_percent,
            daily_range,
            daily_range_percent: daily_range / bar.open,
            volume_millions: volume / 1_000_000.0,
            candle_color: CandleColor::from_bar(bar),
            price_change_1d_percent,
            price_change_5d_percent,
            ma_5: self.closes_short.mean(),
            ma_20: self.closes_medium.mean(),
            ma_50: self.closes_long.mean(),
            volume_ma_20,
            volume_ratio: ratio_or_one(volume, volume_ma_20),
            volatility_20d: self.change_pcts.stddev(),
            rsi_14,
            bb_upper: bands.map(|b| b.upper),
            bb_middle: bands.map(|b| b.middle),
            bb_lower: bands.map(|b| b.lower),
            bb_position: bands.map(|b| b.position(bar.close)),
            macd: macd.macd,
            macd_signal: macd.signal,
            macd_histogram: macd.histogram,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    fn run(closes: &[f64]) -> Vec<IndicatorFrame> {
        let mut state = SymbolState::new("TEST");
        make_bars(closes).iter().map(|b| state.step(b)).collect()
    }

    #[test]
    fn intraday_fields() {
        let frames = run(&[100.0]);
        let f = &frames[0];
        // make_bars: open = 99, high = 101, low = 98
        assert_approx(f.daily_change, 1.0, DEFAULT_EPSILON);
        assert_approx(f.daily_change_percent, 1.0 / 99.0, DEFAULT_EPSILON);
        assert_approx(f.daily_range, 3.0, DEFAULT_EPSILON);
        assert_approx(f.daily_range_percent, 3.0 / 99.0, DEFAULT_EPSILON);
        assert_approx(f.volume_millions, 0.001, DEFAULT_EPSILON);
        assert_eq!(f.candle_color, CandleColor::Green);
        assert_eq!(f.price_change_1d_percent, None);
    }

    #[test]
    fn moving_averages_warm_up() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let frames = run(&closes);

        assert!(frames[3].ma_5.is_none());
        assert_approx(frames[4].ma_5.unwrap(), 102.0, DEFAULT_EPSILON);
        assert!(frames[18].ma_20.is_none());
        assert_approx(frames[19].ma_20.unwrap(), 109.5, DEFAULT_EPSILON);
        assert!(frames[48].ma_50.is_none());
        assert_approx(frames[49].ma_50.unwrap(), 124.5, DEFAULT_EPSILON);
        assert!(frames[12].rsi_14.is_none());
        assert!(frames[13].rsi_14.is_some());
    }

    #[test]
    fn price_changes_use_prior_closes() {
        let frames = run(&[100.0, 110.0, 99.0, 100.0, 100.0, 120.0]);
        assert_approx(frames[1].price_change_1d_percent.unwrap(), 10.0, DEFAULT_EPSILON);
        assert_approx(frames[2].price_change_1d_percent.unwrap(), -10.0, DEFAULT_EPSILON);
        assert!(frames[4].price_change_5d_percent.is_none());
        assert_approx(frames[5].price_change_5d_percent.unwrap(), 20.0, DEFAULT_EPSILON);
    }

    #[test]
    fn volume_ratio_defaults_to_one_during_warmup() {
        let frames = run(&[100.0; 25]);
        assert!(frames[..19].iter().all(|f| f.volume_ratio == 1.0));
        assert_eq!(frames[19].volume_ma_20, Some(1000.0));
        assert_eq!(frames[24].volume_ratio, 1.0);
    }

    #[test]
    fn step_tracks_date_and_count() {
        let bars = make_bars(&[10.0, 11.0]);
        let mut state = SymbolState::new("TEST");
        state.step(&bars[0]);
        state.step(&bars[1]);
        assert_eq!(state.bars_seen(), 2);
        assert_eq!(state.last_date(), Some(bars[1].trading_date));
        assert_eq!(state.symbol(), "TEST");
    }
}
