//! Presentation of stage diagnostics.
//!
//! Pipeline stages return structured values; this module turns them into
//! text. Display settings live in an explicit [`FormatConfig`] handed to each
//! presenter rather than in process-wide state.
//!
//! # Modules
//!
//! - [`literal`]: Python-literal value model and rendering
//! - [`presenter`]: Swappable sinks (Python text, JSON lines, log records)

pub mod literal;
pub mod presenter;

use serde::{Deserialize, Serialize};

pub use literal::{Literal, ToLiteral};
pub use presenter::{stdout_presenter, JsonPresenter, LogPresenter, Presenter, PythonPresenter};

/// Rendering style of diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Python `repr` text, one value per line
    #[default]
    Python,
    /// One JSON object per line
    Json,
    /// `log::info!` records
    Log,
}

/// Display settings for presenters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatConfig {
    /// Emit stage diagnostics at all
    pub verbose: bool,
    pub format: OutputFormat,
    /// Truncate sequences and mappings longer than this
    pub max_items: Option<usize>,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            verbose: true,
            format: OutputFormat::default(),
            max_items: None,
        }
    }
}
