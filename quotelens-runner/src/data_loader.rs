//! Bar loading from CSV for the runner.
//!
//! The input file has one row per (symbol, trading day):
//!
//! ```text
//! symbol,trading_date,open,high,low,close,adjusted_close,volume
//! AAPL,2024-01-02,187.15,188.44,183.89,185.64,184.94,82488700
//! ```
//!
//! Each row is parsed into a `RawBar` and converted into a `Bar`. Rows that
//! fail either step are recorded as rejections with their line number and
//! never reach the engine. Accepted bars are grouped by symbol in first-seen
//! order, keeping file order within a symbol.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info, warn};

use quotelens_core::domain::{Bar, RawBar, ValidationError};

/// Columns every input file must carry.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "symbol",
    "trading_date",
    "open",
    "high",
    "low",
    "close",
    "adjusted_close",
    "volume",
];

/// Errors that stop a load outright. Bad rows are rejections, not errors.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("input is missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

/// Why a row did not become a bar.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RejectReason {
    #[error("unparseable row: {0}")]
    Parse(String),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

impl RejectReason {
    pub fn rule(&self) -> &'static str {
        match self {
            Self::Parse(_) => "unparseable_row",
            Self::Invalid(e) => e.rule(),
        }
    }
}

/// A rejected input row. `row` is the 1-based line number in the file
/// (the header is line 1).
#[derive(Debug, Clone, PartialEq)]
pub struct RowRejection {
    pub row: u64,
    pub symbol: Option<String>,
    pub trading_date: Option<NaiveDate>,
    pub reason: RejectReason,
}

/// Accepted bars for one symbol, with the line each bar came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolBars {
    pub symbol: String,
    pub bars: Vec<Bar>,
    pub rows: Vec<u64>,
}

/// Result of loading an input file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedBars {
    /// Per-symbol bars in first-seen symbol order.
    pub symbols: Vec<SymbolBars>,
    pub rejections: Vec<RowRejection>,
    /// Data rows read, accepted or not.
    pub rows_read: u64,
}

impl LoadedBars {
    pub fn bar_count(&self) -> usize {
        self.symbols.iter().map(|s| s.bars.len()).sum()
    }

    /// Group already-built bars, numbering them as if they were rows of a
    /// file with a header.
    pub fn from_bars(bars: impl IntoIterator<Item = Bar>) -> Self {
        let mut loaded = Self::default();
        let mut slot: HashMap<String, usize> = HashMap::new();
        for bar in bars {
            loaded.rows_read += 1;
            let row = loaded.rows_read + 1;
            loaded.push(&mut slot, bar, row);
        }
        loaded
    }

    fn push(&mut self, slot: &mut HashMap<String, usize>, bar: Bar, row: u64) {
        let i = *slot.entry(bar.symbol.clone()).or_insert_with(|| {
            self.symbols.push(SymbolBars {
                symbol: bar.symbol.clone(),
                bars: Vec::new(),
                rows: Vec::new(),
            });
            self.symbols.len() - 1
        });
        self.symbols[i].bars.push(bar);
        self.symbols[i].rows.push(row);
    }
}

/// Load bars from any CSV reader.
pub fn load_bars_csv<R: Read>(reader: R, delimiter: u8) -> Result<LoadedBars, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !headers.iter().any(|h| h == **c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::MissingColumns(missing));
    }

    let mut loaded = LoadedBars::default();
    let mut slot: HashMap<String, usize> = HashMap::new();

    for result in rdr.records() {
        loaded.rows_read += 1;
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                let row = e.position().map(|p| p.line()).unwrap_or(loaded.rows_read + 1);
                reject(&mut loaded, row, None, None, RejectReason::Parse(e.to_string()));
                continue;
            }
        };
        let row = record.position().map(|p| p.line()).unwrap_or(loaded.rows_read + 1);

        let raw: RawBar = match record.deserialize(Some(&headers)) {
            Ok(raw) => raw,
            Err(e) => {
                let symbol = field(&headers, &record, "symbol");
                let trading_date = field(&headers, &record, "trading_date")
                    .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok());
                reject(&mut loaded, row, symbol, trading_date, RejectReason::Parse(e.to_string()));
                continue;
            }
        };

        let symbol = raw.symbol.clone();
        let trading_date = raw.trading_date;
        match Bar::try_from(raw) {
            Ok(bar) => loaded.push(&mut slot, bar, row),
            Err(e) => reject(&mut loaded, row, symbol, trading_date, e.into()),
        }
    }

    debug!(
        rows = loaded.rows_read,
        symbols = loaded.symbols.len(),
        rejected = loaded.rejections.len(),
        "csv loaded"
    );
    Ok(loaded)
}

/// Load bars from a CSV file on disk.
pub fn load_bars_file(path: &Path, delimiter: u8) -> Result<LoadedBars, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let loaded = load_bars_csv(std::io::BufReader::new(file), delimiter)?;
    info!(
        path = %path.display(),
        bars = loaded.bar_count(),
        symbols = loaded.symbols.len(),
        rejected = loaded.rejections.len(),
        "input loaded"
    );
    Ok(loaded)
}

/// Date-order check per symbol, mirroring the engine's sequence gate.
///
/// Used by `validate` to report duplicate and out-of-order rows without
/// computing any indicators.
pub fn check_sequences(loaded: &LoadedBars) -> Vec<RowRejection> {
    let mut found = Vec::new();
    for group in &loaded.symbols {
        let mut last: Option<NaiveDate> = None;
        for (bar, &row) in group.bars.iter().zip(&group.rows) {
            let error = match last {
                Some(previous) if bar.trading_date == previous => {
                    Some(ValidationError::DuplicateDate {
                        symbol: bar.symbol.clone(),
                        trading_date: bar.trading_date,
                    })
                }
                Some(previous) if bar.trading_date < previous => Some(ValidationError::OutOfOrder {
                    symbol: bar.symbol.clone(),
                    trading_date: bar.trading_date,
                    previous,
                }),
                _ => None,
            };
            match error {
                Some(e) => found.push(RowRejection {
                    row,
                    symbol: Some(bar.symbol.clone()),
                    trading_date: Some(bar.trading_date),
                    reason: e.into(),
                }),
                None => last = Some(bar.trading_date),
            }
        }
    }
    found.sort_by_key(|r| r.row);
    found
}

/// Write bars in the input format, e.g. for synthetic fixtures.
pub fn write_bars_csv<W: Write>(bars: &[Bar], writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for bar in bars {
        wtr.serialize(bar)?;
    }
    wtr.flush()?;
    Ok(())
}

fn field(headers: &csv::StringRecord, record: &csv::StringRecord, name: &str) -> Option<String> {
    let i = headers.iter().position(|h| h == name)?;
    record.get(i).filter(|v| !v.is_empty()).map(str::to_string)
}

fn reject(
    loaded: &mut LoadedBars,
    row: u64,
    symbol: Option<String>,
    trading_date: Option<NaiveDate>,
    reason: RejectReason,
) {
    warn!(row, symbol = symbol.as_deref().unwrap_or(""), rule = reason.rule(), "rejected row: {reason}");
    loaded.rejections.push(RowRejection {
        row,
        symbol,
        trading_date,
        reason,
    });
}
