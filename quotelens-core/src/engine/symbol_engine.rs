//! Per-symbol engine: validation gate in front of `SymbolState`.
//!
//! A bar is validated (structure, symbol, date order) before it touches the
//! rolling state. A rejected bar is skipped entirely: later bars are computed
//! as if it had never been supplied.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::alerts::{detect_alerts, AlertThresholds};
use crate::classify::classify;
use crate::domain::{AnnotatedRecord, Bar, ValidationError};
use crate::signals::generate_signal;

use super::state::SymbolState;

/// A bar that did not enter the sequence, with its position in the input.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub index: usize,
    pub error: ValidationError,
}

/// Output of one symbol's run: annotated records in input order, plus the
/// bars that were rejected along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolOutput {
    pub symbol: String,
    pub records: Vec<AnnotatedRecord>,
    pub rejections: Vec<Rejection>,
}

#[derive(Debug, Clone)]
pub struct SymbolEngine {
    state: SymbolState,
    thresholds: AlertThresholds,
}

impl SymbolEngine {
    pub fn new(symbol: impl Into<String>, thresholds: AlertThresholds) -> Self {
        Self {
            state: SymbolState::new(symbol),
            thresholds,
        }
    }

    pub fn symbol(&self) -> &str {
        self.state.symbol()
    }

    pub fn state(&self) -> &SymbolState {
        &self.state
    }

    /// Check that `bar` can be appended to this symbol's sequence.
    fn admit(&self, bar: &Bar) -> Result<(), ValidationError> {
        bar.validate()?;
        if bar.symbol != self.state.symbol() {
            return Err(ValidationError::SymbolMismatch {
                expected: self.state.symbol().to_string(),
                got: bar.symbol.clone(),
                trading_date: bar.trading_date,
            });
        }
        if let Some(previous) = self.state.last_date() {
            if bar.trading_date == previous {
                return Err(ValidationError::DuplicateDate {
                    symbol: bar.symbol.clone(),
                    trading_date: bar.trading_date,
                });
            }
            if bar.trading_date < previous {
                return Err(ValidationError::OutOfOrder {
                    symbol: bar.symbol.clone(),
                    trading_date: bar.trading_date,
                    previous,
                });
            }
        }
        Ok(())
    }

    /// Annotate one bar. On error the state is left untouched.
    pub fn process(
        &mut self,
        bar: &Bar,
        processed_at: DateTime<Utc>,
    ) -> Result<AnnotatedRecord, ValidationError> {
        self.admit(bar)?;
        let indicators = self.state.step(bar);
        let classification = classify(bar, &indicators);
        let signal = generate_signal(&indicators, &classification);
        let alerts = detect_alerts(&indicators, &self.thresholds);
        Ok(AnnotatedRecord {
            bar: bar.clone(),
            indicators,
            classification,
            signal,
            alerts,
            processed_at,
        })
    }

    /// Annotate an ordered sequence, collecting rejections instead of stopping.
    pub fn process_all<'a>(
        mut self,
        bars: impl IntoIterator<Item = &'a Bar>,
        processed_at: DateTime<Utc>,
    ) -> SymbolOutput {
        let mut records = Vec::new();
        let mut rejections = Vec::new();

        for (index, bar) in bars.into_iter().enumerate() {
            match self.process(bar, processed_at) {
                Ok(record) => records.push(record),
                Err(error) => {
                    warn!(
                        symbol = %self.symbol(),
                        trading_date = %bar.trading_date,
                        rule = error.rule(),
                        "rejected bar: {error}"
                    );
                    rejections.push(Rejection { index, error });
                }
            }
        }

        debug!(
            symbol = %self.symbol(),
            records = records.len(),
            rejected = rejections.len(),
            "symbol processed"
        );

        SymbolOutput {
            symbol: self.state.symbol().to_string(),
            records,
            rejections,
        }
    }
}

/// Group bars by symbol, keeping first-seen symbol order and per-symbol
/// input order.
pub fn group_by_symbol(bars: impl IntoIterator<Item = Bar>) -> Vec<(String, Vec<Bar>)> {
    let mut groups: Vec<(String, Vec<Bar>)> = Vec::new();
    let mut slot: HashMap<String, usize> = HashMap::new();
    for bar in bars {
        let i = *slot.entry(bar.symbol.clone()).or_insert_with(|| {
            groups.push((bar.symbol.clone(), Vec::new()));
            groups.len() - 1
        });
        groups[i].1.push(bar);
    }
    groups
}

/// Run a mixed-symbol sequence, one engine per symbol.
///
/// Rejection indices refer to positions within that symbol's sub-sequence.
pub fn process_series(
    bars: impl IntoIterator<Item = Bar>,
    thresholds: &AlertThresholds,
    processed_at: DateTime<Utc>,
) -> Vec<SymbolOutput> {
    group_by_symbol(bars)
        .into_iter()
        .map(|(symbol, bars)| {
            SymbolEngine::new(symbol, *thresholds).process_all(&bars, processed_at)
        })
        .collect()
}
