//! Indicator & signal engine.
//!
//! Each symbol gets its own `SymbolState` (rolling windows) behind a
//! `SymbolEngine` (validation gate). Per bar:
//!
//! 1. Validate: structure, symbol, strictly ascending date
//! 2. Step: push the bar into the windows, read indicators
//! 3. Classify: ordered threshold cascades
//! 4. Signal: first-match trading signal plus confidence
//! 5. Alerts: threshold breaches
//!
//! Symbols share nothing, so callers may run them on separate threads.

pub mod state;
pub mod symbol_engine;

pub use state::SymbolState;
pub use symbol_engine::{group_by_symbol, process_series, Rejection, SymbolEngine, SymbolOutput};
