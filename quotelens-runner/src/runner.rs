//! Batch runner: wires together loading, the per-symbol engines, and export.
//!
//! Two entry points:
//! - `run_batch()`: takes pre-loaded bars, no I/O. Used by tests and benches.
//! - `run_pipeline()`: loads the configured input, runs, writes the output
//!   and manifest. Used by the CLI.
//!
//! Symbols share nothing, so each one runs on its own rayon task. Results
//! are sorted by symbol afterwards, which makes parallel and sequential runs
//! produce identical output.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug_span, info, info_span};

use quotelens_core::domain::AnnotatedRecord;
use quotelens_core::{AlertThresholds, SymbolEngine, SymbolOutput, TradingSignal};

use crate::config::{ConfigError, PipelineConfig};
use crate::data_loader::{load_bars_file, LoadError, LoadedBars, RowRejection, SymbolBars};
use crate::export::{write_output, ExportError, RunManifest};

/// Errors from a full pipeline run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("export error: {0}")]
    Export(#[from] ExportError),
}

/// Complete result of one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    pub processed_at: DateTime<Utc>,
    /// One entry per symbol, sorted by symbol.
    pub outputs: Vec<SymbolOutput>,
    /// Load-time and sequence rejections, sorted by input row.
    pub rejections: Vec<RowRejection>,
    pub rows_read: u64,
    /// BLAKE3 over every accepted bar, in output order.
    pub dataset_hash: String,
}

impl BatchResult {
    /// All annotated records, symbol by symbol.
    pub fn records(&self) -> impl Iterator<Item = &AnnotatedRecord> + '_ {
        self.outputs.iter().flat_map(|o| o.records.iter())
    }

    pub fn record_count(&self) -> usize {
        self.outputs.iter().map(|o| o.records.len()).sum()
    }

    /// Count of records per trading signal. Every signal appears, even at 0.
    pub fn signal_histogram(&self) -> BTreeMap<String, usize> {
        let mut histogram: BTreeMap<String, usize> = TradingSignal::ALL
            .iter()
            .map(|s| (s.as_str().to_string(), 0))
            .collect();
        for record in self.records() {
            *histogram
                .entry(record.signal.trading_signal.as_str().to_string())
                .or_default() += 1;
        }
        histogram
    }

    pub fn alert_count(&self) -> usize {
        self.records().map(|r| r.alerts.len()).sum()
    }
}

/// Run every symbol's engine over pre-loaded bars.
pub fn run_batch(
    loaded: LoadedBars,
    thresholds: &AlertThresholds,
    processed_at: DateTime<Utc>,
    parallel: bool,
) -> BatchResult {
    let span = info_span!("batch", symbols = loaded.symbols.len(), parallel);
    let _enter = span.enter();

    let work = |group: &SymbolBars| run_symbol(group, thresholds, processed_at);
    let mut results: Vec<(SymbolOutput, Vec<RowRejection>)> = if parallel {
        loaded.symbols.par_iter().map(work).collect()
    } else {
        loaded.symbols.iter().map(work).collect()
    };
    results.sort_by(|a, b| a.0.symbol.cmp(&b.0.symbol));

    let mut rejections = loaded.rejections;
    let mut outputs = Vec::with_capacity(results.len());
    for (output, sequence_rejections) in results {
        rejections.extend(sequence_rejections);
        outputs.push(output);
    }
    rejections.sort_by_key(|r| r.row);

    let dataset_hash = compute_dataset_hash(&outputs);
    let result = BatchResult {
        processed_at,
        outputs,
        rejections,
        rows_read: loaded.rows_read,
        dataset_hash,
    };

    info!(
        records = result.record_count(),
        rejected = result.rejections.len(),
        alerts = result.alert_count(),
        "batch complete"
    );
    result
}

fn run_symbol(
    group: &SymbolBars,
    thresholds: &AlertThresholds,
    processed_at: DateTime<Utc>,
) -> (SymbolOutput, Vec<RowRejection>) {
    let _span = debug_span!("symbol", symbol = %group.symbol, bars = group.bars.len()).entered();

    let output = SymbolEngine::new(group.symbol.clone(), *thresholds)
        .process_all(&group.bars, processed_at);

    // Map in-sequence positions back to input rows
    let rejections = output
        .rejections
        .iter()
        .filter_map(|r| {
            let bar = group.bars.get(r.index)?;
            Some(RowRejection {
                row: group.rows.get(r.index).copied().unwrap_or_default(),
                symbol: Some(bar.symbol.clone()),
                trading_date: Some(bar.trading_date),
                reason: r.error.clone().into(),
            })
        })
        .collect();

    (output, rejections)
}

/// Load, run and export as described by `config`.
pub fn run_pipeline(
    config: &PipelineConfig,
    processed_at: DateTime<Utc>,
) -> Result<RunManifest, RunError> {
    config.check()?;
    let delimiter = config.input.delimiter_byte()?;
    let loaded = load_bars_file(&config.input.path, delimiter)?;
    let result = run_batch(loaded, &config.alerts, processed_at, config.run.parallel);
    let manifest = write_output(&result, &config.output)?;
    Ok(manifest)
}

/// Compute a deterministic BLAKE3 hash over all accepted bars.
///
/// Covers symbol, date and every OHLCV value in output order, so it is
/// identical for parallel and sequential runs of the same input.
pub fn compute_dataset_hash(outputs: &[SymbolOutput]) -> String {
    let mut hasher = blake3::Hasher::new();

    for output in outputs {
        hasher.update(output.symbol.as_bytes());
        for record in &output.records {
            let bar = &record.bar;
            hasher.update(bar.trading_date.to_string().as_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.adjusted_close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
        }
    }

    hasher.finalize().to_hex().to_string()
}
