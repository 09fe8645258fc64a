//! HR analysis binary.
//!
//! Runs the full pipeline once with every stage's diagnostics enabled and
//! writes them to stdout. Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin hr-analysis
//!
//! # Explicit configuration file
//! HR_ANALYSIS_CONFIG=./hr_analysis.toml cargo run --bin hr-analysis
//! ```
//!
//! # Environment Variables
//!
//! - `HR_ANALYSIS_CONFIG`: Path of the TOML configuration file (optional)
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::path::PathBuf;

use anyhow::Context;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use hr_analysis::config::CONFIG_ENV_VAR;
use hr_analysis::io::default_fetcher;
use hr_analysis::output::stdout_presenter;
use hr_analysis::{HrPipeline, PipelineConfig};

fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let explicit = env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
    let mut config = PipelineConfig::load_or_default(explicit.as_deref())
        .context("failed to load configuration")?;
    config.output.verbose = true;

    info!("Data directory: {}", config.sources.data_dir.display());

    let fetcher = default_fetcher(config.fetch.timeout())?;
    let mut presenter = stdout_presenter(&config.output);
    let mut pipeline = HrPipeline::new(&config, presenter.as_mut());

    let merged = pipeline.run(fetcher.as_ref()).context("HR pipeline failed")?;
    info!("Done: {} employees in the merged table", merged.height());

    Ok(())
}
