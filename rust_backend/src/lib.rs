//! HR analysis pipeline.
//!
//! Loads two office rosters and an HR table from XML, keys them by employee,
//! joins them, and answers a fixed set of questions with grouped statistics
//! and pivot tables.
//!
//! # Modules
//!
//! - [`config`]: TOML configuration with defaults for every setting
//! - [`error`]: Error type shared by all stages
//! - [`io`]: Raw-file cache, network fetchers and table loading
//! - [`parsing`]: Record-oriented XML parsing into DataFrames
//! - [`pipeline`]: Indexer, merger, reporter, aggregator and the stage runner
//! - [`output`]: Presenters for stage diagnostics
//! - [`schema`]: Column names and shape checks

pub mod config;
pub mod error;
pub mod io;
pub mod output;
pub mod parsing;
pub mod pipeline;
pub mod schema;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use pipeline::HrPipeline;
