//! Bar, the fundamental market data unit, and its validation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unvalidated input row as supplied by the ingestion side.
///
/// Every field that can be missing in a CSV export is optional here.
/// `Bar::try_from(RawBar)` is the only path from external data into the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub symbol: Option<String>,
    pub trading_date: Option<NaiveDate>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adjusted_close: f64,
    pub volume: i64,
}

/// OHLCV bar for a single symbol on a single trading day.
///
/// Construct through [`Bar::new`] or `TryFrom<RawBar>`; both enforce the
/// structural invariants so downstream code never sees a malformed bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub trading_date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adjusted_close: f64,
    pub volume: u64,
}

/// A bar that failed its structural invariant.
///
/// Every variant carries enough context (symbol, date, violated rule) for the
/// caller to log and skip the row.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("missing symbol (trading_date={trading_date:?})")]
    MissingSymbol { trading_date: Option<NaiveDate> },

    #[error("{symbol}: missing trading_date")]
    MissingDate { symbol: String },

    #[error("{symbol} {trading_date}: {field} is not a finite number")]
    NonFinitePrice {
        symbol: String,
        trading_date: NaiveDate,
        field: &'static str,
    },

    #[error("{symbol} {trading_date}: close must be positive (got {close})")]
    NonPositiveClose {
        symbol: String,
        trading_date: NaiveDate,
        close: f64,
    },

    #[error("{symbol} {trading_date}: {field} must be positive (got {value})")]
    NonPositivePrice {
        symbol: String,
        trading_date: NaiveDate,
        field: &'static str,
        value: f64,
    },

    #[error("{symbol} {trading_date}: high {high} is below low {low}")]
    HighBelowLow {
        symbol: String,
        trading_date: NaiveDate,
        high: f64,
        low: f64,
    },

    #[error("{symbol} {trading_date}: high {high} is below max(open, close) {body_top}")]
    HighBelowBody {
        symbol: String,
        trading_date: NaiveDate,
        high: f64,
        body_top: f64,
    },

    #[error("{symbol} {trading_date}: low {low} is above min(open, close) {body_bottom}")]
    LowAboveBody {
        symbol: String,
        trading_date: NaiveDate,
        low: f64,
        body_bottom: f64,
    },

    #[error("{symbol} {trading_date}: low must be non-negative (got {low})")]
    NegativeLow {
        symbol: String,
        trading_date: NaiveDate,
        low: f64,
    },

    #[error("{symbol} {trading_date}: volume must be non-negative (got {volume})")]
    NegativeVolume {
        symbol: String,
        trading_date: NaiveDate,
        volume: i64,
    },

    #[error("bar for {got} routed to the {expected} engine ({trading_date})")]
    SymbolMismatch {
        expected: String,
        got: String,
        trading_date: NaiveDate,
    },

    #[error("{symbol} {trading_date}: duplicate trading_date")]
    DuplicateDate {
        symbol: String,
        trading_date: NaiveDate,
    },

    #[error("{symbol} {trading_date}: out of order (previous bar was {previous})")]
    OutOfOrder {
        symbol: String,
        trading_date: NaiveDate,
        previous: NaiveDate,
    },
}

impl ValidationError {
    /// Short machine-readable name of the violated rule.
    pub fn rule(&self) -> &'static str {
        match self {
            Self::MissingSymbol { .. } => "missing_symbol",
            Self::MissingDate { .. } => "missing_date",
            Self::NonFinitePrice { .. } => "non_finite_price",
            Self::NonPositiveClose { .. } => "non_positive_close",
            Self::NonPositivePrice { .. } => "non_positive_price",
            Self::HighBelowLow { .. } => "high_below_low",
            Self::HighBelowBody { .. } => "high_below_body",
            Self::LowAboveBody { .. } => "low_above_body",
            Self::NegativeLow { .. } => "negative_low",
            Self::NegativeVolume { .. } => "negative_volume",
            Self::SymbolMismatch { .. } => "symbol_mismatch",
            Self::DuplicateDate { .. } => "duplicate_date",
            Self::OutOfOrder { .. } => "out_of_order",
        }
    }
}

impl Bar {
    /// Build a bar and check its invariants.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: impl Into<String>,
        trading_date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        adjusted_close: f64,
        volume: u64,
    ) -> Result<Self, ValidationError> {
        let bar = Self {
            symbol: symbol.into(),
            trading_date,
            open,
            high,
            low,
            close,
            adjusted_close,
            volume,
        };
        bar.validate()?;
        Ok(bar)
    }

    /// Check high ≥ max(open, close) ≥ min(open, close) ≥ low ≥ 0 and close > 0.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let symbol = || self.symbol.clone();
        let trading_date = self.trading_date;

        if self.symbol.trim().is_empty() {
            return Err(ValidationError::MissingSymbol {
                trading_date: Some(trading_date),
            });
        }

        for (field, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("adjusted_close", self.adjusted_close),
        ] {
            if !value.is_finite() {
                return Err(ValidationError::NonFinitePrice {
                    symbol: symbol(),
                    trading_date,
                    field,
                });
            }
        }

        if self.close <= 0.0 {
            return Err(ValidationError::NonPositiveClose {
                symbol: symbol(),
                trading_date,
                close: self.close,
            });
        }
        // daily_change_percent divides by open
        if self.open <= 0.0 {
            return Err(ValidationError::NonPositivePrice {
                symbol: symbol(),
                trading_date,
                field: "open",
                value: self.open,
            });
        }
        if self.adjusted_close <= 0.0 {
            return Err(ValidationError::NonPositivePrice {
                symbol: symbol(),
                trading_date,
                field: "adjusted_close",
                value: self.adjusted_close,
            });
        }
        if self.high < self.low {
            return Err(ValidationError::HighBelowLow {
                symbol: symbol(),
                trading_date,
                high: self.high,
                low: self.low,
            });
        }
        let body_top = self.open.max(self.close);
        if self.high < body_top {
            return Err(ValidationError::HighBelowBody {
                symbol: symbol(),
                trading_date,
                high: self.high,
                body_top,
            });
        }
        let body_bottom = self.open.min(self.close);
        if self.low > body_bottom {
            return Err(ValidationError::LowAboveBody {
                symbol: symbol(),
                trading_date,
                low: self.low,
                body_bottom,
            });
        }
        if self.low < 0.0 {
            return Err(ValidationError::NegativeLow {
                symbol: symbol(),
                trading_date,
                low: self.low,
            });
        }
        Ok(())
    }
}

impl TryFrom<RawBar> for Bar {
    type Error = ValidationError;

    fn try_from(raw: RawBar) -> Result<Self, Self::Error> {
        let symbol = match raw.symbol {
            Some(s) if !s.trim().is_empty() => s.trim().to_string(),
            _ => {
                return Err(ValidationError::MissingSymbol {
                    trading_date: raw.trading_date,
                })
            }
        };
        let Some(trading_date) = raw.trading_date else {
            return Err(ValidationError::MissingDate { symbol });
        };
        let volume = u64::try_from(raw.volume).map_err(|_| ValidationError::NegativeVolume {
            symbol: symbol.clone(),
            trading_date,
            volume: raw.volume,
        })?;

        Bar::new(
            symbol,
            trading_date,
            raw.open,
            raw.high,
            raw.low,
            raw.close,
            raw.adjusted_close,
            volume,
        )
    }
}
