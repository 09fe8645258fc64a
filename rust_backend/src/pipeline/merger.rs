//! Office union and HR join.

use polars::prelude::*;
use std::collections::HashSet;

use crate::error::{PipelineError, PipelineResult};
use crate::output::{Literal, ToLiteral};
use crate::pipeline::frame::index_values;
use crate::pipeline::indexer::IndexedTables;
use crate::schema::{value_columns, KEY_COLUMN, OFFICE_ID};

/// Index and column names of the merged table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub index: Vec<Option<String>>,
    pub columns: Vec<String>,
}

/// Stack office A on office B.
///
/// Columns are the union of both rosters (a column missing from one side is
/// null there) and differing dtypes are widened. Duplicate keys are kept.
pub fn union_offices(tables: &IndexedTables) -> PipelineResult<DataFrame> {
    let args = UnionArgs {
        to_supertypes: true,
        rechunk: true,
        ..Default::default()
    };
    let stacked = concat_lf_diagonal(
        [tables.office_a.clone().lazy(), tables.office_b.clone().lazy()],
        args,
    )?
    .collect()?;
    Ok(stacked)
}

/// Union the offices, inner-join HR on the key, drop the office-local id and
/// sort by key.
///
/// Only employees present on both sides survive. Keys sort as strings, so
/// `A10` precedes `A9`; equal keys keep their input order and null keys sort
/// last.
pub fn merge(tables: &IndexedTables) -> PipelineResult<DataFrame> {
    let offices = union_offices(tables)?;

    let office_columns: HashSet<String> = value_columns(&offices).into_iter().collect();
    let overlap: Vec<String> = value_columns(&tables.hr)
        .into_iter()
        .filter(|name| office_columns.contains(name))
        .collect();
    if !overlap.is_empty() {
        return Err(PipelineError::Shape(format!(
            "columns overlap between offices and HR: {}",
            overlap.join(", ")
        )));
    }

    let mut args = JoinArgs::new(JoinType::Inner);
    args.maintain_order = MaintainOrderJoin::Left;

    let joined = offices
        .lazy()
        .join(
            tables.hr.clone().lazy(),
            [col(KEY_COLUMN)],
            [col(KEY_COLUMN)],
            args,
        )
        .collect()?;

    let merged = joined.drop(OFFICE_ID)?.sort(
        [KEY_COLUMN],
        SortMultipleOptions::default()
            .with_maintain_order(true)
            .with_nulls_last(true),
    )?;

    log::info!(
        "Merged {} office rows with {} HR rows into {} employees",
        tables.office_a.height() + tables.office_b.height(),
        tables.hr.height(),
        merged.height()
    );
    Ok(merged)
}

/// Index and column lists of a merged table.
pub fn merge_report(merged: &DataFrame) -> PipelineResult<MergeReport> {
    Ok(MergeReport {
        index: index_values(merged)?,
        columns: value_columns(merged),
    })
}

impl ToLiteral for MergeReport {
    fn to_literal(&self) -> Literal {
        Literal::List(vec![self.index.to_literal(), self.columns.to_literal()])
    }
}
