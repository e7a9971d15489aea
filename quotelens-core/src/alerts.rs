//! Threshold alerts raised on a single bar.
//!
//! Detection only: nothing here sends notifications. Alerts are attached to
//! the annotated record and left for the caller to route.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classify::labels;
use crate::domain::IndicatorFrame;

labels!(AlertKind {
    PriceChange => "price_change",
    VolumeSpike => "volume_spike",
    RsiOverbought => "rsi_overbought",
    RsiOversold => "rsi_oversold",
    HighVolatility => "high_volatility",
});

labels!(Severity {
    High => "high",
    Medium => "medium",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub severity: Severity,
    /// Observed value that crossed the threshold.
    pub value: f64,
    pub threshold: f64,
}

/// Alert thresholds. Percent values are ×100, volatility is a fraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    /// |price_change_1d_percent| above this raises `price_change`.
    pub price_change_percent: f64,
    /// |price_change_1d_percent| above this makes `price_change` high severity.
    pub price_change_high_percent: f64,
    /// volume_ratio above this raises `volume_spike`.
    pub volume_spike_ratio: f64,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    pub volatility: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            price_change_percent: 5.0,
            price_change_high_percent: 10.0,
            volume_spike_ratio: 2.0,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            volatility: 0.02,
        }
    }
}

/// Why a threshold set was refused.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThresholdError {
    #[error("alert threshold {field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("price_change_high_percent ({high}) must be >= price_change_percent ({low})")]
    PriceChangeOrder { low: f64, high: f64 },

    #[error("rsi_oversold ({oversold}) must be below rsi_overbought ({overbought})")]
    RsiOrder { oversold: f64, overbought: f64 },

    #[error("volume_spike_ratio must be positive, got {0}")]
    NonPositiveVolumeSpike(f64),

    #[error("volatility threshold must be non-negative, got {0}")]
    NegativeVolatility(f64),
}

impl AlertThresholds {
    /// Reject threshold sets that could never fire sensibly.
    pub fn check(&self) -> Result<(), ThresholdError> {
        for (field, value) in [
            ("price_change_percent", self.price_change_percent),
            ("price_change_high_percent", self.price_change_high_percent),
            ("volume_spike_ratio", self.volume_spike_ratio),
            ("rsi_overbought", self.rsi_overbought),
            ("rsi_oversold", self.rsi_oversold),
            ("volatility", self.volatility),
        ] {
            if !value.is_finite() {
                return Err(ThresholdError::NonFinite { field, value });
            }
        }
        if self.price_change_high_percent < self.price_change_percent {
            return Err(ThresholdError::PriceChangeOrder {
                low: self.price_change_percent,
                high: self.price_change_high_percent,
            });
        }
        if self.rsi_oversold >= self.rsi_overbought {
            return Err(ThresholdError::RsiOrder {
                oversold: self.rsi_oversold,
                overbought: self.rsi_overbought,
            });
        }
        if self.volume_spike_ratio <= 0.0 {
            return Err(ThresholdError::NonPositiveVolumeSpike(self.volume_spike_ratio));
        }
        if self.volatility < 0.0 {
            return Err(ThresholdError::NegativeVolatility(self.volatility));
        }
        Ok(())
    }
}

pub fn detect_alerts(frame: &IndicatorFrame, t: &AlertThresholds) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if let Some(pc) = frame.price_change_1d_percent {
        if pc.abs() > t.price_change_percent {
            alerts.push(Alert {
                kind: AlertKind::PriceChange,
                severity: if pc.abs() > t.price_change_high_percent {
                    Severity::High
                } else {
                    Severity::Medium
                },
                value: pc,
                threshold: t.price_change_percent,
            });
        }
    }

    if frame.volume_ratio > t.volume_spike_ratio {
        alerts.push(Alert {
            kind: AlertKind::VolumeSpike,
            severity: Severity::Medium,
            value: frame.volume_ratio,
            threshold: t.volume_spike_ratio,
        });
    }

    if let Some(rsi) = frame.rsi_14 {
        if rsi > t.rsi_overbought {
            alerts.push(Alert {
                kind: AlertKind::RsiOverbought,
                severity: Severity::Medium,
                value: rsi,
                threshold: t.rsi_overbought,
            });
        } else if rsi < t.rsi_oversold {
            alerts.push(Alert {
                kind: AlertKind::RsiOversold,
                severity: Severity::Medium,
                value: rsi,
                threshold: t.rsi_oversold,
            });
        }
    }

    if let Some(vol) = frame.volatility_20d {
        if vol > t.volatility {
            alerts.push(Alert {
                kind: AlertKind::HighVolatility,
                severity: Severity::Medium,
                value: vol,
                threshold: t.volatility,
            });
        }
    }

    alerts
}
