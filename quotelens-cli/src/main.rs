//! QuoteLens CLI: annotate daily bars with indicators, labels and signals.
//!
//! Commands:
//! - `run`: annotate a CSV of bars from a TOML config or `--input`/`--output`
//! - `validate`: report rows that would be rejected, without computing anything
//! - `synthetic`: write a seeded random-walk CSV in the input format

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use quotelens_runner::{
    check_sequences, delimiter_byte, generate_synthetic_bars, load_bars_file, run_pipeline,
    write_bars_csv, OutputFormat, PipelineConfig, RowRejection, RunManifest,
};

#[derive(Parser)]
#[command(
    name = "quotelens",
    version,
    about = "QuoteLens CLI: streaming technical indicators and trading signals"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Annotate a CSV of daily bars.
    Run {
        /// Path to a TOML pipeline config.
        #[arg(long, conflicts_with_all = ["input", "output"])]
        config: Option<PathBuf>,

        /// Input CSV (symbol,trading_date,open,high,low,close,adjusted_close,volume).
        #[arg(long)]
        input: Option<PathBuf>,

        /// Output file.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: csv or jsonl. Overrides the config file.
        #[arg(long)]
        format: Option<OutputFormat>,

        /// Process symbols one at a time instead of on the thread pool.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Skip writing `<output>.manifest.json`.
        #[arg(long, default_value_t = false)]
        no_manifest: bool,
    },
    /// Check an input CSV and list every row that would be rejected.
    Validate {
        /// Input CSV.
        #[arg(long)]
        input: PathBuf,

        /// Field delimiter.
        #[arg(long, default_value_t = ',')]
        delimiter: char,
    },
    /// Write synthetic bars in the input format.
    Synthetic {
        /// Symbols to generate (repeatable).
        #[arg(long = "symbol", required = true)]
        symbols: Vec<String>,

        /// Bars per symbol.
        #[arg(long, default_value_t = 252)]
        bars: usize,

        /// RNG seed.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// First trading date (YYYY-MM-DD).
        #[arg(long, default_value = "2024-01-02")]
        start: String,

        /// Output CSV.
        #[arg(long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            input,
            output,
            format,
            sequential,
            no_manifest,
        } => run_cmd(config, input, output, format, sequential, no_manifest),
        Commands::Validate { input, delimiter } => validate_cmd(&input, delimiter),
        Commands::Synthetic {
            symbols,
            bars,
            seed,
            start,
            output,
        } => synthetic_cmd(&symbols, bars, seed, &start, &output),
    }
}

/// Logs go to stderr. `RUST_LOG` sets the filter (default `info`);
/// `QUOTELENS_LOG_FORMAT=json` switches to structured JSON lines.
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("QUOTELENS_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn run_cmd(
    config_path: Option<PathBuf>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    format: Option<OutputFormat>,
    sequential: bool,
    no_manifest: bool,
) -> Result<()> {
    let mut config = match (config_path, input, output) {
        (Some(path), _, _) => PipelineConfig::from_file(&path)
            .with_context(|| format!("loading config {}", path.display()))?,
        (None, Some(input), Some(output)) => PipelineConfig::new(input, output),
        (None, _, _) => bail!("either --config or both --input and --output are required"),
    };

    if let Some(format) = format {
        config.output.format = format;
    }
    if sequential {
        config.run.parallel = false;
    }
    if no_manifest {
        config.output.manifest = false;
    }

    let manifest = run_pipeline(&config, Utc::now())?;
    print_summary(&manifest);
    Ok(())
}

fn print_summary(m: &RunManifest) {
    println!("Records:    {}", m.record_count);
    println!("Symbols:    {}", m.symbol_count);
    println!("Rejected:   {}", m.rejection_count);
    println!("Alerts:     {}", m.alert_count);
    println!("Dataset:    {}", m.dataset_hash);
    println!("Signals:");
    for (signal, count) in &m.signal_histogram {
        println!("  {signal:<12} {count}");
    }
    println!("Output:     {} ({})", m.output_path, m.format);
}

fn validate_cmd(input: &Path, delimiter: char) -> Result<()> {
    let loaded = load_bars_file(input, delimiter_byte(delimiter)?)?;

    let mut rejections: Vec<RowRejection> = loaded.rejections.clone();
    rejections.extend(check_sequences(&loaded));
    rejections.sort_by_key(|r| r.row);

    for r in &rejections {
        println!(
            "row {:>6}  {:<20} {:<10} {}",
            r.row,
            r.reason.rule(),
            r.symbol.as_deref().unwrap_or("-"),
            r.reason
        );
    }
    println!(
        "{} rows, {} symbols, {} rejected",
        loaded.rows_read,
        loaded.symbols.len(),
        rejections.len()
    );

    if !rejections.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

fn synthetic_cmd(
    symbols: &[String],
    bars: usize,
    seed: u64,
    start: &str,
    output: &Path,
) -> Result<()> {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d")
        .with_context(|| format!("invalid --start date '{start}'"))?;

    let mut all = Vec::with_capacity(symbols.len() * bars);
    for (i, symbol) in symbols.iter().enumerate() {
        all.extend(generate_synthetic_bars(symbol, start, bars, seed.wrapping_add(i as u64)));
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let file = std::fs::File::create(output)
        .with_context(|| format!("creating {}", output.display()))?;
    write_bars_csv(&all, std::io::BufWriter::new(file))?;

    info!(path = %output.display(), bars = all.len(), "synthetic bars written");
    Ok(())
}
