//! Per-bar derived values and the annotated output row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alerts::Alert;
use crate::classify::Classification;
use crate::domain::Bar;
use crate::signals::Signal;

/// Candle body direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandleColor {
    Green,
    Red,
    Neutral,
}

impl CandleColor {
    pub fn from_bar(bar: &Bar) -> Self {
        if bar.close > bar.open {
            Self::Green
        } else if bar.close < bar.open {
            Self::Red
        } else {
            Self::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Red => "red",
            Self::Neutral => "neutral",
        }
    }
}

/// Indicator values for one bar.
///
/// Any statistic that needs N bars of history is `None` until the symbol has
/// seen N bars. Values are computed from the current bar and prior bars only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorFrame {
    pub daily_change: f64,
    /// Intraday change as a fraction of open.
    pub daily_change_percent: f64,
    pub daily_range: f64,
    /// Intraday range as a fraction of open.
    pub daily_range_percent: f64,
    pub volume_millions: f64,
    pub candle_color: CandleColor,

    /// Close-to-close change in percent (×100). `None` on the first bar.
    pub price_change_1d_percent: Option<f64>,
    /// Close vs. the close five bars back, in percent.
    pub price_change_5d_percent: Option<f64>,

    pub ma_5: Option<f64>,
    pub ma_20: Option<f64>,
    pub ma_50: Option<f64>,
    pub volume_ma_20: Option<f64>,
    /// Always defined; 1.0 while the 20-bar volume average is missing or zero.
    pub volume_ratio: f64,
    /// Sample stddev of `daily_change_percent` over 20 bars.
    pub volatility_20d: Option<f64>,
    pub rsi_14: Option<f64>,

    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
    pub bb_position: Option<f64>,

    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
}

/// Fully annotated output row for one (symbol, trading_date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedRecord {
    #[serde(flatten)]
    pub bar: Bar,
    #[serde(flatten)]
    pub indicators: IndicatorFrame,
    #[serde(flatten)]
    pub classification: Classification,
    #[serde(flatten)]
    pub signal: Signal,
    pub alerts: Vec<Alert>,
    pub processed_at: DateTime<Utc>,
}
