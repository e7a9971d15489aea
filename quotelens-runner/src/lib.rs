//! QuoteLens Runner: batch orchestration around the core engine.
//!
//! This crate builds on `quotelens-core` to provide:
//! - TOML pipeline configuration
//! - CSV loading with per-row rejection reporting
//! - Parallel per-symbol runs on rayon
//! - CSV / JSONL export and a run manifest
//! - Seeded synthetic data

pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;
pub mod synthetic;

pub use config::{
    delimiter_byte, ConfigError, InputConfig, OutputConfig, OutputFormat, PipelineConfig,
    RunOptions,
};
pub use data_loader::{
    check_sequences, load_bars_csv, load_bars_file, write_bars_csv, LoadError, LoadedBars,
    RejectReason, RowRejection, SymbolBars,
};
pub use export::{export_csv, export_jsonl, manifest_path, write_output, ExportError, RunManifest};
pub use runner::{compute_dataset_hash, run_batch, run_pipeline, BatchResult, RunError};
pub use synthetic::generate_synthetic_bars;

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<PipelineConfig>();
        assert_sync::<PipelineConfig>();
    }

    #[test]
    fn loaded_bars_are_send_sync() {
        assert_send::<LoadedBars>();
        assert_sync::<LoadedBars>();
        assert_send::<SymbolBars>();
        assert_sync::<SymbolBars>();
    }

    #[test]
    fn batch_result_is_send_sync() {
        assert_send::<BatchResult>();
        assert_sync::<BatchResult>();
        assert_send::<RunManifest>();
        assert_sync::<RunManifest>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
    }
}
