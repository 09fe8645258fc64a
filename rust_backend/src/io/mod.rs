//! Source acquisition: downloading, caching and loading the raw tables.
//!
//! # Example
//!
//! ```no_run
//! use hr_analysis::config::SourceConfig;
//! use hr_analysis::io::{default_fetcher, HrDataLoader};
//! use std::time::Duration;
//!
//! let sources = SourceConfig::default();
//! let fetcher = default_fetcher(Duration::from_secs(60)).expect("HTTP client");
//! let raw = HrDataLoader::new(&sources, fetcher.as_ref())
//!     .load()
//!     .expect("Failed to load");
//! println!("HR rows: {}", raw.hr.height());
//! ```

pub mod checksum;
pub mod fetch;
pub mod loaders;


#[cfg(feature = "remote-fetch")]
pub use fetch::HttpFetcher;
pub use fetch::{default_fetcher, Fetcher, OfflineFetcher};
pub use loaders::{load_raw_tables, HrDataLoader, RawTables};
