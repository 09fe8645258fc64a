//! Pipeline configuration file support.
//!
//! Every section is optional. An empty file yields the `../Data` cache
//! directory, the three Dropbox sources, a 60 second fetch timeout,
//! permissive key handling and Python-literal output.
//!
//! ```toml
//! [sources]
//! data_dir = "../Data"
//!
//! [sources.hr]
//! file_name = "hr_data.xml"
//! url = "https://example.org/hr_data.xml"
//!
//! [fetch]
//! timeout_secs = 30
//!
//! [indexing]
//! key_policy = "strict"
//!
//! [output]
//! format = "json"
//! max_items = 20
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{PipelineError, PipelineResult};
use crate::output::FormatConfig;
use crate::pipeline::aggregator::AggregatorConfig;
use crate::pipeline::indexer::KeyPolicy;
use crate::pipeline::reporter::ReporterConfig;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV_VAR: &str = "HR_ANALYSIS_CONFIG";

const DEFAULT_FILE_NAME: &str = "hr_analysis.toml";

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub sources: SourceConfig,
    pub fetch: FetchSettings,
    pub indexing: IndexingSettings,
    pub reporter: ReporterConfig,
    pub aggregator: AggregatorConfig,
    pub output: FormatConfig,
}

/// Location of the raw-file cache and of the three remote sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub data_dir: PathBuf,
    pub office_a: Source,
    pub office_b: Source,
    pub hr: Source,
}

/// One raw table: its cached file name and the URL it is fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Source {
    pub file_name: String,
    pub url: String,
}

/// HTTP fetch settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchSettings {
    pub timeout_secs: u64,
}

/// Key construction settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexingSettings {
    pub key_policy: KeyPolicy,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("../Data")
}

fn default_timeout_secs() -> u64 {
    60
}

impl Source {
    pub fn new(file_name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            url: url.into(),
        }
    }
}

impl SourceConfig {
    /// Sources under `data_dir` with the default file names and URLs.
    pub fn in_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Sources in fixed order: office A, office B, HR.
    pub fn ordered(&self) -> [&Source; 3] {
        [&self.office_a, &self.office_b, &self.hr]
    }

    /// Full path of a source's cached file.
    pub fn path_of(&self, source: &Source) -> PathBuf {
        self.data_dir.join(&source.file_name)
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            office_a: Source::new(
                "A_office_data.xml",
                "https://www.dropbox.com/s/jpeknyzx57c4jb2/A_office_data.xml?dl=1",
            ),
            office_b: Source::new(
                "B_office_data.xml",
                "https://www.dropbox.com/s/hea0tbhir64u9t5/B_office_data.xml?dl=1",
            ),
            hr: Source::new(
                "hr_data.xml",
                "https://www.dropbox.com/s/u6jzqqg1byajy0s/hr_data.xml?dl=1",
            ),
        }
    }
}

impl FetchSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl PipelineConfig {
    /// Parse configuration from TOML text.
    ///
    /// Errors name the offending field path, e.g. `fetch.timeout_secs`.
    pub fn from_toml_str(content: &str) -> PipelineResult<Self> {
        let deserializer = toml::Deserializer::new(content);
        serde_path_to_error::deserialize(deserializer).map_err(|e| {
            PipelineError::Configuration(format!(
                "Failed to parse config at '{}': {}",
                e.path(),
                e.inner()
            ))
        })
    }

    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            PipelineError::Configuration(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml_str(&content)
    }

    /// Load configuration from the first standard location that exists.
    ///
    /// Searches for `hr_analysis.toml` in:
    /// 1. Current directory
    /// 2. `rust_backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> PipelineResult<Option<Self>> {
        let search_paths = [
            PathBuf::from(DEFAULT_FILE_NAME),
            PathBuf::from("rust_backend").join(DEFAULT_FILE_NAME),
            PathBuf::from("..").join(DEFAULT_FILE_NAME),
        ];

        for path in search_paths {
            if path.exists() {
                log::info!("Using configuration file {}", path.display());
                return Self::from_file(&path).map(Some);
            }
        }

        Ok(None)
    }

    /// Resolve the configuration for a run.
    ///
    /// An explicit path (usually from [`CONFIG_ENV_VAR`]) must exist; without
    /// one the standard locations are searched, falling back to defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> PipelineResult<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match Self::from_default_location()? {
            Some(config) => Ok(config),
            None => {
                log::debug!("No {} found, using defaults", DEFAULT_FILE_NAME);
                Ok(Self::default())
            }
        }
    }
}
