use log::{debug, info};
use polars::prelude::*;
use std::fs;

use crate::config::{Source, SourceConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::io::checksum::calculate_checksum;
use crate::io::fetch::Fetcher;
use crate::parsing::xml_parser;

/// The three raw tables, in the fixed order office A, office B, HR.
#[derive(Debug, Clone)]
pub struct RawTables {
    pub office_a: DataFrame,
    pub office_b: DataFrame,
    pub hr: DataFrame,
}

/// Loads the HR source tables, downloading them into the cache directory
/// when none of them is present.
pub struct HrDataLoader<'a> {
    sources: &'a SourceConfig,
    fetcher: &'a dyn Fetcher,
}

impl<'a> HrDataLoader<'a> {
    pub fn new(sources: &'a SourceConfig, fetcher: &'a dyn Fetcher) -> Self {
        Self { sources, fetcher }
    }

    /// Make sure the cache directory exists and holds the source files.
    ///
    /// The presence check is all-or-nothing: if any one of the three files
    /// exists nothing is downloaded, even when the others are missing.
    ///
    /// # Returns
    /// `true` when the files were downloaded by this call.
    pub fn ensure_local_copies(&self) -> PipelineResult<bool> {
        let data_dir = &self.sources.data_dir;
        fs::create_dir_all(data_dir).map_err(|e| PipelineError::io(data_dir, e))?;

        let any_present = self
            .sources
            .ordered()
            .iter()
            .any(|source| self.sources.path_of(source).exists());
        if any_present {
            debug!("Source files present in {}, skipping download", data_dir.display());
            return Ok(false);
        }

        for source in self.sources.ordered() {
            self.download(source)?;
        }
        Ok(true)
    }

    fn download(&self, source: &Source) -> PipelineResult<()> {
        info!("{} loading.", source.file_name);
        let payload = self.fetcher.fetch(&source.url)?;

        let path = self.sources.path_of(source);
        fs::write(&path, &payload).map_err(|e| PipelineError::io(&path, e))?;
        info!(
            "Loaded {} ({} bytes, sha256 {})",
            source.file_name,
            payload.len(),
            calculate_checksum(&payload)
        );
        Ok(())
    }

    /// Parse the three cached files without touching the network.
    pub fn read_local(&self) -> PipelineResult<RawTables> {
        let [office_a, office_b, hr] = self.sources.ordered();
        Ok(RawTables {
            office_a: self.parse(office_a)?,
            office_b: self.parse(office_b)?,
            hr: self.parse(hr)?,
        })
    }

    fn parse(&self, source: &Source) -> PipelineResult<DataFrame> {
        let df = xml_parser::parse_records_file(&self.sources.path_of(source))?;
        debug!("{}: {} rows", source.file_name, df.height());
        Ok(df)
    }

    /// Download if needed, then parse all three tables.
    pub fn load(&self) -> PipelineResult<RawTables> {
        self.ensure_local_copies()?;
        self.read_local()
    }
}

/// Convenience function to fetch (if needed) and load the raw tables.
pub fn load_raw_tables(sources: &SourceConfig, fetcher: &dyn Fetcher) -> PipelineResult<RawTables> {
    HrDataLoader::new(sources, fetcher).load()
}
