//! The five-stage HR pipeline.
//!
//! # Modules
//!
//! - [`indexer`]: Composite keys for office rosters, HR keyed by employee id
//! - [`merger`]: Office union joined with HR
//! - [`reporter`]: Fixed questions over the merged table
//! - [`aggregator`]: Grouped statistics and pivots
//! - [`pivot`]: Generic pivot-table engine
//! - [`frame`]: Typed column access shared by the stages
//!
//! [`HrPipeline`] chains the stages. Each stage method takes an `output`
//! flag; when set, the stage's answers go to the [`Presenter`]. Stages after
//! the merge hand the merged table back unchanged.

pub mod aggregator;
pub mod frame;
pub mod indexer;
pub mod merger;
pub mod pivot;
pub mod reporter;

use polars::prelude::DataFrame;

use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::io::{load_raw_tables, Fetcher, RawTables};
use crate::output::{Presenter, ToLiteral};

pub use aggregator::{aggregate, AggregatorConfig, Aggregates, GroupStats, GroupSummary};
pub use frame::Key;
pub use indexer::{composite_key, index_tables, IndexedTables, KeyPolicy, Office};
pub use merger::{merge, merge_report, MergeReport};
pub use pivot::{pivot_table, AggFunc, PivotSpec, PivotTable};
pub use reporter::{ReporterAnswers, ReporterConfig};

/// Runs the stages against one configuration and presenter.
pub struct HrPipeline<'a> {
    config: &'a PipelineConfig,
    presenter: &'a mut dyn Presenter,
}

impl<'a> HrPipeline<'a> {
    pub fn new(config: &'a PipelineConfig, presenter: &'a mut dyn Presenter) -> Self {
        Self { config, presenter }
    }

    /// Fetch the raw files if the cache is empty, then parse them.
    pub fn load(&mut self, fetcher: &dyn Fetcher) -> PipelineResult<RawTables> {
        load_raw_tables(&self.config.sources, fetcher)
    }

    pub fn index(&mut self, raw: &RawTables, output: bool) -> PipelineResult<IndexedTables> {
        let tables = index_tables(raw, self.config.indexing.key_policy)?;
        if output {
            let report = tables.report()?;
            self.presenter.emit("index", "office A", &report.office_a.to_literal())?;
            self.presenter.emit("index", "office B", &report.office_b.to_literal())?;
            self.presenter.emit("index", "HR", &report.hr.to_literal())?;
        }
        Ok(tables)
    }

    pub fn merge(&mut self, tables: &IndexedTables, output: bool) -> PipelineResult<DataFrame> {
        let merged = merge(tables)?;
        if output {
            let report = merge_report(&merged)?;
            self.presenter.emit("merge", "index", &report.index.to_literal())?;
            self.presenter.emit("merge", "columns", &report.columns.to_literal())?;
        }
        Ok(merged)
    }

    pub fn report(&mut self, merged: DataFrame, output: bool) -> PipelineResult<DataFrame> {
        if output {
            let answers = reporter::answer(&merged, &self.config.reporter)?;
            let [top, total, evaluations] = answers.literals();
            self.presenter.emit("report", "top departments by hours", &top)?;
            self.presenter.emit("report", "projects of department and salary", &total)?;
            self.presenter.emit("report", "evaluations", &evaluations)?;
        }
        Ok(merged)
    }

    pub fn summarize(&mut self, merged: DataFrame, output: bool) -> PipelineResult<DataFrame> {
        let summary = aggregator::group_summary(&merged, &self.config.aggregator)?;
        if output {
            self.presenter.emit("summarize", "group summary", &summary.to_literal())?;
        }
        Ok(merged)
    }

    pub fn pivot(&mut self, merged: DataFrame, output: bool) -> PipelineResult<DataFrame> {
        let decimals = self.config.aggregator.decimals;
        let hours = aggregator::hours_by_department(&merged, decimals)?;
        let scores = aggregator::scores_by_tenure(&merged, decimals)?;
        if output {
            let inversions = aggregator::salary_hours_inversions(&hours)?;
            let gap = aggregator::promotion_evaluation_gap(&scores)?;
            self.presenter.emit("pivot", "salary hours inversions", &inversions.to_literal())?;
            self.presenter.emit("pivot", "promotion evaluation gap", &gap.to_literal())?;
        }
        Ok(merged)
    }

    /// Run every stage in order and return the merged table.
    ///
    /// Stage output follows [`crate::output::FormatConfig::verbose`].
    pub fn run(&mut self, fetcher: &dyn Fetcher) -> PipelineResult<DataFrame> {
        let output = self.config.output.verbose;

        let raw = self.load(fetcher)?;
        let tables = self.index(&raw, output)?;
        let merged = self.merge(&tables, output)?;
        let merged = self.report(merged, output)?;
        let merged = self.summarize(merged, output)?;
        let merged = self.pivot(merged, output)?;

        log::info!("Pipeline finished with {} merged employees", merged.height());
        Ok(merged)
    }
}
