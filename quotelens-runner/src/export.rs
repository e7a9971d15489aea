//! Output boundary: annotated records as CSV or JSONL, plus a run manifest.
//!
//! CSV has one column per record field. Missing indicators are empty cells,
//! labels are snake_case, alerts are a `;`-joined list of kinds.
//! JSONL carries the full record per line (`null` for missing values, alerts
//! as objects).
//!
//! The manifest (`<output>.manifest.json`) includes a `schema_version` field.
//! Unknown versions are rejected on load.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use quotelens_core::domain::AnnotatedRecord;

use crate::config::{OutputConfig, OutputFormat};
use crate::runner::BatchResult;

/// Current schema version for persisted manifests.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("write failed: {0}")]
    Write(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported schema version {found} (max supported: {max})")]
    UnsupportedSchema { found: u32, max: u32 },
}

/// CSV header, in column order.
pub const CSV_COLUMNS: [&str; 41] = [
    "symbol",
    "trading_date",
    "open",
    "high",
    "low",
    "close",
    "adjusted_close",
    "volume",
    "daily_change",
    "daily_change_percent",
    "daily_range",
    "daily_range_percent",
    "volume_millions",
    "candle_color",
    "price_change_1d_percent",
    "price_change_5d_percent",
    "ma_5",
    "ma_20",
    "ma_50",
    "volume_ma_20",
    "volume_ratio",
    "volatility_20d",
    "rsi_14",
    "bb_upper",
    "bb_middle",
    "bb_lower",
    "bb_position",
    "macd",
    "macd_signal",
    "macd_histogram",
    "trend_direction",
    "rsi_signal",
    "volatility_level",
    "volume_classification",
    "daily_performance",
    "trend_strength",
    "risk_level",
    "volume_significance",
    "trading_signal",
    "signal_confidence",
    "alerts",
];

fn opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn csv_row(r: &AnnotatedRecord) -> Vec<String> {
    let b = &r.bar;
    let f = &r.indicators;
    let c = &r.classification;
    let alerts: Vec<&str> = r.alerts.iter().map(|a| a.kind.as_str()).collect();
    vec![
        b.symbol.clone(),
        b.trading_date.to_string(),
        b.open.to_string(),
        b.high.to_string(),
        b.low.to_string(),
        b.close.to_string(),
        b.adjusted_close.to_string(),
        b.volume.to_string(),
        f.daily_change.to_string(),
        f.daily_change_percent.to_string(),
        f.daily_range.to_string(),
        f.daily_range_percent.to_string(),
        f.volume_millions.to_string(),
        f.candle_color.as_str().to_string(),
        opt(f.price_change_1d_percent),
        opt(f.price_change_5d_percent),
        opt(f.ma_5),
        opt(f.ma_20),
        opt(f.ma_50),
        opt(f.volume_ma_20),
        f.volume_ratio.to_string(),
        opt(f.volatility_20d),
        opt(f.rsi_14),
        opt(f.bb_upper),
        opt(f.bb_middle),
        opt(f.bb_lower),
        opt(f.bb_position),
        opt(f.macd),
        opt(f.macd_signal),
        opt(f.macd_histogram),
        c.trend_direction.as_str().to_string(),
        c.rsi_signal.as_str().to_string(),
        c.volatility_level.as_str().to_string(),
        c.volume_classification.as_str().to_string(),
        c.daily_performance
            .map(|d| d.as_str().to_string())
            .unwrap_or_default(),
        c.trend_strength.as_str().to_string(),
        c.risk_level.as_str().to_string(),
        c.volume_significance.as_str().to_string(),
        r.signal.trading_signal.as_str().to_string(),
        r.signal.signal_confidence.as_str().to_string(),
        alerts.join(";"),
    ]
}

/// Write records as CSV with a header row.
///
/// `processed_at` is the same for every record of a run, so it is appended as
/// the last column rather than repeated in the fixed header list.
pub fn export_csv<'a, W: Write>(
    records: impl IntoIterator<Item = &'a AnnotatedRecord>,
    writer: W,
) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut header: Vec<&str> = CSV_COLUMNS.to_vec();
    header.push("processed_at");
    wtr.write_record(&header)?;

    for record in records {
        let mut row = csv_row(record);
        row.push(
            record
                .processed_at
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        );
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write records as JSON Lines, one object per record.
pub fn export_jsonl<'a, W: Write>(
    records: impl IntoIterator<Item = &'a AnnotatedRecord>,
    mut writer: W,
) -> Result<(), ExportError> {
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Summary of one run, written next to the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub processed_at: DateTime<Utc>,
    pub dataset_hash: String,
    pub output_path: String,
    pub format: OutputFormat,
    pub rows_read: u64,
    pub symbol_count: usize,
    pub record_count: usize,
    pub rejection_count: usize,
    pub alert_count: usize,
    pub signal_histogram: BTreeMap<String, usize>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl RunManifest {
    pub fn from_result(result: &BatchResult, output: &OutputConfig) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            processed_at: result.processed_at,
            dataset_hash: result.dataset_hash.clone(),
            output_path: output.path.display().to_string(),
            format: output.format,
            rows_read: result.rows_read,
            symbol_count: result.outputs.len(),
            record_count: result.record_count(),
            rejection_count: result.rejections.len(),
            alert_count: result.alert_count(),
            signal_histogram: result.signal_histogram(),
        }
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a manifest, rejecting unknown schema versions.
    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        let manifest: Self = serde_json::from_str(json)?;
        if manifest.schema_version > SCHEMA_VERSION {
            return Err(ExportError::UnsupportedSchema {
                found: manifest.schema_version,
                max: SCHEMA_VERSION,
            });
        }
        Ok(manifest)
    }
}

/// `out.csv` -> `out.csv.manifest.json`
pub fn manifest_path(output: &Path) -> PathBuf {
    let mut name = OsString::from(output.as_os_str());
    name.push(".manifest.json");
    PathBuf::from(name)
}

fn create(path: &Path) -> Result<BufWriter<File>, ExportError> {
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    File::create(path).map(BufWriter::new).map_err(io_err)
}

/// Write a batch to the configured output, plus its manifest if enabled.
pub fn write_output(result: &BatchResult, output: &OutputConfig) -> Result<RunManifest, ExportError> {
    let writer = create(&output.path)?;
    match output.format {
        OutputFormat::Csv => export_csv(result.records(), writer)?,
        OutputFormat::Jsonl => export_jsonl(result.records(), writer)?,
    }

    let manifest = RunManifest::from_result(result, output);
    if output.manifest {
        let path = manifest_path(&output.path);
        let mut file = create(&path)?;
        file.write_all(manifest.to_json()?.as_bytes())?;
        file.flush()?;
    }

    info!(
        path = %output.path.display(),
        format = %output.format,
        records = manifest.record_count,
        "output written"
    );
    Ok(manifest)
}
