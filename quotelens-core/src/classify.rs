//! Categorical labels derived from one bar's indicators.
//!
//! Each rule is an ordered cascade: the first branch that matches wins.
//! A comparison against a missing indicator never matches, so a rule whose
//! inputs are still warming up falls through to its final branch.
//! `daily_performance` is the exception: it is `None` when there is no prior
//! close, because its final branch (`strong_loss`) would be a false claim.

use serde::{Deserialize, Serialize};

use crate::domain::{Bar, IndicatorFrame};

macro_rules! labels {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize,
        )]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use labels;

labels!(TrendDirection {
    Bullish => "bullish",
    Bearish => "bearish",
    Neutral => "neutral",
});

labels!(RsiSignal {
    Overbought => "overbought",
    Oversold => "oversold",
    Neutral => "neutral",
});

labels!(VolatilityLevel {
    High => "high",
    Medium => "medium",
    Low => "low",
});

labels!(VolumeClassification {
    High => "high",
    AboveAverage => "above_average",
    Low => "low",
    Normal => "normal",
});

labels!(DailyPerformance {
    StrongGain => "strong_gain",
    ModerateGain => "moderate_gain",
    SmallGain => "small_gain",
    SmallLoss => "small_loss",
    ModerateLoss => "moderate_loss",
    StrongLoss => "strong_loss",
});

labels!(TrendStrength {
    StrongBullish => "strong_bullish",
    WeakBullish => "weak_bullish",
    StrongBearish => "strong_bearish",
    WeakBearish => "weak_bearish",
    Neutral => "neutral",
});

labels!(RiskLevel {
    HighRisk => "high_risk",
    MediumRisk => "medium_risk",
    LowRisk => "low_risk",
});

labels!(
    /// Volume relative to the 20-bar average, as used by the signal rules.
    VolumeSignificance {
        ExceptionalVolume => "exceptional_volume",
        HighVolume => "high_volume",
        LowVolume => "low_volume",
        NormalVolume => "normal_volume",
    }
);

impl VolumeSignificance {
    /// High or exceptional.
    pub fn is_elevated(&self) -> bool {
        matches!(self, Self::HighVolume | Self::ExceptionalVolume)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub trend_direction: TrendDirection,
    pub rsi_signal: RsiSignal,
    pub volatility_level: VolatilityLevel,
    pub volume_classification: VolumeClassification,
    pub daily_performance: Option<DailyPerformance>,
    pub trend_strength: TrendStrength,
    pub risk_level: RiskLevel,
    pub volume_significance: VolumeSignificance,
}

/// `value > threshold`, false when `value` is missing.
pub(crate) fn gt(value: Option<f64>, threshold: f64) -> bool {
    value.is_some_and(|v| v > threshold)
}

/// `value < threshold`, false when `value` is missing.
pub(crate) fn lt(value: Option<f64>, threshold: f64) -> bool {
    value.is_some_and(|v| v < threshold)
}

pub fn classify(bar: &Bar, frame: &IndicatorFrame) -> Classification {
    let trend_direction = trend_direction(bar.close, frame.ma_20, frame.ma_50);
    Classification {
        trend_direction,
        rsi_signal: rsi_signal(frame.rsi_14),
        volatility_level: volatility_level(frame.volatility_20d),
        volume_classification: volume_classification(frame.volume_ratio),
        daily_performance: frame.price_change_1d_percent.map(daily_performance),
        trend_strength: trend_strength(trend_direction, bar.close, frame.ma_20, frame.ma_50),
        risk_level: risk_level(frame.volatility_20d, frame.price_change_1d_percent),
        volume_significance: volume_significance(bar.volume as f64, frame.volume_ma_20),
    }
}

pub fn trend_direction(close: f64, ma_20: Option<f64>, ma_50: Option<f64>) -> TrendDirection {
    let (Some(ma_20), Some(ma_50)) = (ma_20, ma_50) else {
        return TrendDirection::Neutral;
    };
    if close > ma_20 && ma_20 > ma_50 {
        TrendDirection::Bullish
    } else if close < ma_20 && ma_20 < ma_50 {
        TrendDirection::Bearish
    } else {
        TrendDirection::Neutral
    }
}

pub fn rsi_signal(rsi_14: Option<f64>) -> RsiSignal {
    if gt(rsi_14, 70.0) {
        RsiSignal::Overbought
    } else if lt(rsi_14, 30.0) {
        RsiSignal::Oversold
    } else {
        RsiSignal::Neutral
    }
}

pub fn volatility_level(volatility_20d: Option<f64>) -> VolatilityLevel {
    if gt(volatility_20d, 0.03) {
        VolatilityLevel::High
    } else if gt(volatility_20d, 0.02) {
        VolatilityLevel::Medium
    } else {
        VolatilityLevel::Low
    }
}

pub fn volume_classification(volume_ratio: f64) -> VolumeClassification {
    if volume_ratio > 2.0 {
        VolumeClassification::High
    } else if volume_ratio > 1.5 {
        VolumeClassification::AboveAverage
    } else if volume_ratio < 0.5 {
        VolumeClassification::Low
    } else {
        VolumeClassification::Normal
    }
}

/// Cascade over the close-to-close change in percent.
pub fn daily_performance(price_change_1d_percent: f64) -> DailyPerformance {
    let pc = price_change_1d_percent;
    if pc > 5.0 {
        DailyPerformance::StrongGain
    } else if pc > 2.0 {
        DailyPerformance::ModerateGain
    } else if pc > 0.0 {
        DailyPerformance::SmallGain
    } else if pc > -2.0 {
        DailyPerformance::SmallLoss
    } else if pc > -5.0 {
        DailyPerformance::ModerateLoss
    } else {
        DailyPerformance::StrongLoss
    }
}

pub fn trend_strength(
    trend: TrendDirection,
    close: f64,
    ma_20: Option<f64>,
    ma_50: Option<f64>,
) -> TrendStrength {
    let above_both = matches!((ma_20, ma_50), (Some(a), Some(b)) if close > a && close > b);
    let below_both = matches!((ma_20, ma_50), (Some(a), Some(b)) if close < a && close < b);

    match trend {
        TrendDirection::Bullish if above_both => TrendStrength::StrongBullish,
        TrendDirection::Bullish => TrendStrength::WeakBullish,
        TrendDirection::Bearish if below_both => TrendStrength::StrongBearish,
        TrendDirection::Bearish => TrendStrength::WeakBearish,
        TrendDirection::Neutral => TrendStrength::Neutral,
    }
}

pub fn risk_level(volatility_20d: Option<f64>, price_change_1d_percent: Option<f64>) -> RiskLevel {
    let abs_change = price_change_1d_percent.map(f64::abs);
    if gt(volatility_20d, 0.03) && gt(abs_change, 3.0) {
        RiskLevel::HighRisk
    } else if gt(volatility_20d, 0.02) || gt(abs_change, 2.0) {
        RiskLevel::MediumRisk
    } else {
        RiskLevel::LowRisk
    }
}

pub fn volume_significance(volume: f64, avg_volume_20d: Option<f64>) -> VolumeSignificance {
    let Some(avg) = avg_volume_20d else {
        return VolumeSignificance::NormalVolume;
    };
    if volume > 2.0 * avg {
        VolumeSignificance::ExceptionalVolume
    } else if volume > 1.5 * avg {
        VolumeSignificance::HighVolume
    } else if volume < 0.5 * avg {
        VolumeSignificance::LowVolume
    } else {
        VolumeSignificance::NormalVolume
    }
}
