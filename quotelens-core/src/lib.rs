//! QuoteLens Core: streaming technical indicators, classifications and signals.
//!
//! This crate is the pure engine:
//! - Domain types (raw and validated bars, indicator frames, annotated records)
//! - Bounded rolling windows, RSI, Bollinger bands, EMA/MACD
//! - Ordered threshold cascades for classification
//! - First-match trading signals with confidence
//! - Threshold alerts
//! - Per-symbol state machine with a validation gate
//!
//! No I/O happens here; loading and exporting live in `quotelens-runner`.

pub mod alerts;
pub mod classify;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod signals;

pub use alerts::{detect_alerts, Alert, AlertKind, AlertThresholds, Severity, ThresholdError};
pub use classify::{classify, Classification};
pub use domain::{AnnotatedRecord, Bar, IndicatorFrame, RawBar, ValidationError};
pub use engine::{process_series, Rejection, SymbolEngine, SymbolOutput, SymbolState};
pub use signals::{generate_signal, Signal, SignalConfidence, TradingSignal};
