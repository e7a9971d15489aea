//! Domain types for QuoteLens

pub mod bar;
pub mod record;

pub use bar::{Bar, RawBar, ValidationError};
pub use record::{AnnotatedRecord, CandleColor, IndicatorFrame};
