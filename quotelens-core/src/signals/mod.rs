//! Signal generation from one bar's classifications.
//!
//! Signals carry no state of their own: the same frame and classification
//! always produce the same signal. Rules are checked top to bottom and the
//! first match wins, which is what keeps `strong_buy` from being reported as
//! the weaker (overlapping) `buy`.

pub mod intent;

pub use intent::{SignalConfidence, TradingSignal};

use serde::{Deserialize, Serialize};

use crate::classify::{gt, lt, Classification, RsiSignal, TrendDirection, VolumeSignificance};
use crate::domain::IndicatorFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub trading_signal: TradingSignal,
    pub signal_confidence: SignalConfidence,
}

pub fn generate_signal(frame: &IndicatorFrame, c: &Classification) -> Signal {
    Signal {
        trading_signal: trading_signal(frame, c),
        signal_confidence: signal_confidence(c),
    }
}

fn trading_signal(frame: &IndicatorFrame, c: &Classification) -> TradingSignal {
    let bullish = c.trend_direction == TrendDirection::Bullish;
    let bearish = c.trend_direction == TrendDirection::Bearish;
    let elevated = c.volume_significance.is_elevated();
    let bb = frame.bb_position;
    let rsi = frame.rsi_14;

    if bullish && c.rsi_signal == RsiSignal::Oversold && lt(bb, 0.2) && elevated {
        TradingSignal::StrongBuy
    } else if bullish && lt(rsi, 50.0) && lt(bb, 0.5) {
        TradingSignal::Buy
    } else if bearish && c.rsi_signal == RsiSignal::Overbought && gt(bb, 0.8) && elevated {
        TradingSignal::StrongSell
    } else if bearish && gt(rsi, 50.0) && gt(bb, 0.5) {
        TradingSignal::Sell
    } else {
        TradingSignal::Hold
    }
}

fn signal_confidence(c: &Classification) -> SignalConfidence {
    let exceptional = c.volume_significance == VolumeSignificance::ExceptionalVolume;
    let trending = matches!(
        c.trend_direction,
        TrendDirection::Bullish | TrendDirection::Bearish
    );

    if (c.trend_direction == TrendDirection::Bullish
        && c.rsi_signal == RsiSignal::Oversold
        && exceptional)
        || (c.trend_direction == TrendDirection::Bearish
            && c.rsi_signal == RsiSignal::Overbought
            && exceptional)
    {
        SignalConfidence::High
    } else if trending && c.volume_significance.is_elevated() {
        SignalConfidence::Medium
    } else {
        SignalConfidence::Low
    }
}
