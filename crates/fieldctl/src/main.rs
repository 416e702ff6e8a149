//! `fieldctl`: encrypts or decrypts one column of values, one per line.
//!
//! Usage: `fieldctl encode|decode < input > output`
//!
//! Startup sequence:
//! 1. Load and validate [`Config`](config::Config) from environment variables.
//! 2. Initialise structured JSON logging on stderr.
//! 3. Build the codec and the field adapter for the configured column.
//! 4. Stream stdin through the adapter, one JSON record per line on stdout.

mod config;
mod pipe;

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use fieldcrypt::{BlockCipherCodec, FieldAdapter};
use tracing::info;

fn main() -> Result<()> {
    let direction: pipe::Direction = std::env::args()
        .nth(1)
        .context("usage: fieldctl encode|decode")?
        .parse()?;

    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = config::Config::from_env().map_err(|e| {
        eprintln!("ERROR: fieldctl configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    fieldcrypt::telemetry::init(&cfg.log_level)?;
    info!(config = ?cfg, "fieldctl starting");

    // -----------------------------------------------------------------------
    // 3. Codec and field adapter
    // -----------------------------------------------------------------------
    let codec = BlockCipherCodec::new(&cfg.codec_config()).context("failed to build codec")?;
    let adapter = FieldAdapter::new(cfg.field_spec(), Arc::new(codec))
        .context("invalid field declaration")?;

    // -----------------------------------------------------------------------
    // 4. Pipe
    // -----------------------------------------------------------------------
    let summary = pipe::run(&adapter, direction, io::stdin().lock(), io::stdout().lock())?;
    if summary.failed > 0 {
        anyhow::bail!("{} of {} lines failed", summary.failed, summary.processed);
    }
    Ok(())
}
