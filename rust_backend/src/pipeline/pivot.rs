//! Cross-tabulation of the merged table.
//!
//! [`pivot_table`] groups by an index column and one or more column-key
//! columns, aggregates value columns, and lays the results out as a grid:
//!
//! - rows and column keys are sorted; value names are sorted
//! - aggregate functions keep the order they are given in
//! - a column path is `(agg?, value?, column keys...)`, where the agg and value
//!   levels appear only when more than one agg or value is requested
//! - groups with a null key are dropped; missing cells are `None`; columns
//!   with no value at all are dropped

use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{PipelineError, PipelineResult};
use crate::output::{Literal, ToLiteral};
use crate::pipeline::frame::{float_values, key_values, round_to, Key};
use crate::schema::require_columns;

/// Aggregate function applied to each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggFunc {
    Max,
    Mean,
    Median,
    Min,
    /// Sample standard deviation (n - 1)
    Std,
    Sum,
}

impl AggFunc {
    pub fn name(self) -> &'static str {
        match self {
            AggFunc::Max => "max",
            AggFunc::Mean => "mean",
            AggFunc::Median => "median",
            AggFunc::Min => "min",
            AggFunc::Std => "std",
            AggFunc::Sum => "sum",
        }
    }

    fn expr(self, value: &str) -> Expr {
        let value = col(value);
        match self {
            AggFunc::Max => value.max(),
            AggFunc::Mean => value.mean(),
            AggFunc::Median => value.median(),
            AggFunc::Min => value.min(),
            AggFunc::Std => value.std(1),
            AggFunc::Sum => value.sum(),
        }
    }
}

/// Shape of a pivot: which columns index, label and fill the grid.
#[derive(Debug, Clone, Copy)]
pub struct PivotSpec<'a> {
    pub index: &'a str,
    pub columns: &'a [&'a str],
    pub values: &'a [&'a str],
    pub aggs: &'a [AggFunc],
}

/// A pivot grid with sorted row keys and hierarchical column paths.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    pub index: Vec<Key>,
    pub columns: Vec<Vec<Key>>,
    // One vector per column, aligned with `index`
    cells: Vec<Vec<Option<f64>>>,
}

/// Build a pivot table, rounding every cell to `decimals` places.
pub fn pivot_table(df: &DataFrame, spec: &PivotSpec<'_>, decimals: u32) -> PipelineResult<PivotTable> {
    let group_keys: Vec<&str> = std::iter::once(spec.index)
        .chain(spec.columns.iter().copied())
        .collect();
    let mut required = group_keys.clone();
    required.extend(spec.values.iter().copied());
    require_columns(df, "merged", &required)?;

    let mut values: Vec<&str> = spec.values.to_vec();
    values.sort_unstable();

    let mut lazy = df.clone().lazy();
    for key in &group_keys {
        lazy = lazy.filter(col(*key).is_not_null());
    }

    let mut outputs = Vec::new();
    let mut exprs = Vec::new();
    for (agg_pos, agg) in spec.aggs.iter().enumerate() {
        for (value_pos, value) in values.iter().enumerate() {
            let alias = format!("__pivot_{}_{}", agg_pos, value_pos);
            exprs.push(agg.expr(value).cast(DataType::Float64).alias(alias.as_str()));
            outputs.push((*agg, *value, alias));
        }
    }

    let grouped = lazy
        .group_by(group_keys.iter().map(|key| col(*key)).collect::<Vec<_>>())
        .agg(exprs)
        .collect()?;

    let row_keys = key_values(&grouped, spec.index)?;
    let column_keys = spec
        .columns
        .iter()
        .map(|name| key_values(&grouped, name))
        .collect::<PipelineResult<Vec<_>>>()?;

    let mut rows = BTreeSet::new();
    // Per aggregate function: column path -> row -> value
    let mut per_agg: Vec<BTreeMap<Vec<Key>, BTreeMap<Key, f64>>> =
        vec![BTreeMap::new(); spec.aggs.len()];

    for (agg_pos, (agg, value, alias)) in outputs.iter().enumerate() {
        let agg_index = agg_pos / values.len();
        let cells = float_values(&grouped, alias)?;

        for (group, cell) in cells.into_iter().enumerate() {
            let (Some(row), Some(cell)) = (row_keys[group].clone(), cell) else {
                continue;
            };
            let Some(labels) = column_keys
                .iter()
                .map(|keys| keys[group].clone())
                .collect::<Option<Vec<Key>>>()
            else {
                continue;
            };

            let mut path = Vec::with_capacity(labels.len() + 2);
            if spec.aggs.len() > 1 {
                path.push(Key::str(agg.name()));
            }
            if values.len() > 1 {
                path.push(Key::str(*value));
            }
            path.extend(labels);

            rows.insert(row.clone());
            per_agg[agg_index]
                .entry(path)
                .or_default()
                .insert(row, round_to(cell, decimals));
        }
    }

    let index: Vec<Key> = rows.into_iter().collect();
    let mut columns = Vec::new();
    let mut cells = Vec::new();
    for by_path in per_agg {
        for (path, by_row) in by_path {
            cells.push(index.iter().map(|row| by_row.get(row).copied()).collect());
            columns.push(path);
        }
    }

    Ok(PivotTable {
        index,
        columns,
        cells,
    })
}

impl PivotTable {
    pub fn height(&self) -> usize {
        self.index.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Cells of one column, aligned with [`PivotTable::index`].
    pub fn column(&self, path: &[Key]) -> PipelineResult<&[Option<f64>]> {
        self.columns
            .iter()
            .position(|candidate| candidate.as_slice() == path)
            .map(|pos| self.cells[pos].as_slice())
            .ok_or_else(|| {
                let path: Vec<String> = path.iter().map(Key::to_string).collect();
                PipelineError::Shape(format!("pivot has no column ({})", path.join(", ")))
            })
    }

    pub fn get(&self, row: &Key, path: &[Key]) -> Option<f64> {
        let row = self.index.iter().position(|candidate| candidate == row)?;
        self.column(path).ok()?[row]
    }

    /// Keep the rows whose mask entry is true.
    pub fn filter_rows(&self, mask: &[bool]) -> PivotTable {
        let keep: Vec<usize> = (0..self.height())
            .filter(|&row| mask.get(row).copied().unwrap_or(false))
            .collect();

        PivotTable {
            index: keep.iter().map(|&row| self.index[row].clone()).collect(),
            columns: self.columns.clone(),
            cells: self
                .cells
                .iter()
                .map(|column| keep.iter().map(|&row| column[row]).collect())
                .collect(),
        }
    }
}

/// Row-wise `left < right`; a missing value compares false.
pub fn less_than(left: &[Option<f64>], right: &[Option<f64>]) -> Vec<bool> {
    left.iter()
        .zip(right)
        .map(|pair| matches!(pair, (Some(l), Some(r)) if l < r))
        .collect()
}

impl ToLiteral for PivotTable {
    /// `{column: {row: value}}`, the layout of a pandas `to_dict()`.
    fn to_literal(&self) -> Literal {
        let entries = self
            .columns
            .iter()
            .zip(&self.cells)
            .map(|(path, cells)| {
                let key = match path.as_slice() {
                    [single] => single.to_literal(),
                    _ => Literal::Tuple(path.iter().map(ToLiteral::to_literal).collect()),
                };
                let by_row = self
                    .index
                    .iter()
                    .zip(cells)
                    .map(|(row, cell)| (row.to_literal(), Literal::float_or_nan(*cell)))
                    .collect();
                (key, Literal::Dict(by_row))
            })
            .collect();
        Literal::Dict(entries)
    }
}
