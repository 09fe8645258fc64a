//! Fixed ad-hoc questions over the merged table.
//!
//! Every function here is read-only: the merged table is never modified.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};
use crate::output::{Literal, ToLiteral};
use crate::pipeline::frame::{float_values, index_values, int_values, string_values};
use crate::schema::{
    require_columns, DEPARTMENT, LAST_EVALUATION, MONTHLY_HOURS, PROJECTS, SALARY, SATISFACTION,
};

/// Parameters of the reporter's questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReporterConfig {
    /// How many of the longest-working employees to list
    pub top_n: usize,
    pub department: String,
    pub salary: String,
    pub lookup_keys: Vec<String>,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            top_n: 10,
            department: "IT".to_string(),
            salary: "low".to_string(),
            lookup_keys: vec!["A4".to_string(), "B7064".to_string(), "A3033".to_string()],
        }
    }
}

/// Sum of `number_project`, typed like the column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectTotal {
    Int(i64),
    Float(f64),
}

/// Answers computed by [`answer`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReporterAnswers {
    /// Departments of the top employees by monthly hours
    pub top_departments: Vec<Option<String>>,
    /// Projects of the configured department and salary tier
    pub project_total: ProjectTotal,
    /// `[last_evaluation, satisfaction_level]` per looked-up key
    pub evaluations: Vec<[Option<f64>; 2]>,
}

/// Departments of the `n` employees with the most monthly hours.
///
/// The sort is stable, so employees with equal hours keep their order in
/// the merged table; missing hours sort last.
pub fn top_departments_by_hours(df: &DataFrame, n: usize) -> PipelineResult<Vec<Option<String>>> {
    require_columns(df, "merged", &[MONTHLY_HOURS, DEPARTMENT])?;

    let top = df
        .sort(
            [MONTHLY_HOURS],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_maintain_order(true)
                .with_nulls_last(true),
        )?
        .head(Some(n));
    string_values(&top, DEPARTMENT)
}

/// Total `number_project` of employees in `department` on `salary`; 0 when
/// nobody matches.
///
/// A float column is summed as floats, so fractional counts are not
/// truncated.
pub fn project_total(
    df: &DataFrame,
    department: &str,
    salary: &str,
) -> PipelineResult<ProjectTotal> {
    require_columns(df, "merged", &[DEPARTMENT, SALARY, PROJECTS])?;

    let departments = string_values(df, DEPARTMENT)?;
    let salaries = string_values(df, SALARY)?;
    let matches: Vec<bool> = departments
        .iter()
        .zip(&salaries)
        .map(|(d, s)| d.as_deref() == Some(department) && s.as_deref() == Some(salary))
        .collect();

    if df.column(PROJECTS)?.dtype().is_float() {
        let total = float_values(df, PROJECTS)?
            .into_iter()
            .zip(&matches)
            .filter(|(_, matched)| **matched)
            .filter_map(|(p, _)| p)
            .sum();
        return Ok(ProjectTotal::Float(total));
    }

    let total = int_values(df, PROJECTS)?
        .into_iter()
        .zip(&matches)
        .filter(|(_, matched)| **matched)
        .filter_map(|(p, _)| p)
        .sum();
    Ok(ProjectTotal::Int(total))
}

/// `[last_evaluation, satisfaction_level]` of each key, in the order given.
///
/// A key that appears more than once yields one pair per row. A key that is
/// absent fails with [`PipelineError::KeyNotFound`].
pub fn lookup_evaluations(df: &DataFrame, keys: &[String]) -> PipelineResult<Vec<[Option<f64>; 2]>> {
    require_columns(df, "merged", &[LAST_EVALUATION, SATISFACTION])?;

    let index = index_values(df)?;
    let evaluations = float_values(df, LAST_EVALUATION)?;
    let satisfaction = float_values(df, SATISFACTION)?;

    let mut pairs = Vec::with_capacity(keys.len());
    for key in keys {
        let before = pairs.len();
        for (row, _) in index
            .iter()
            .enumerate()
            .filter(|(_, k)| k.as_deref() == Some(key.as_str()))
        {
            pairs.push([evaluations[row], satisfaction[row]]);
        }
        if pairs.len() == before {
            return Err(PipelineError::KeyNotFound(key.clone()));
        }
    }
    Ok(pairs)
}

/// Answer all reporter questions.
pub fn answer(df: &DataFrame, config: &ReporterConfig) -> PipelineResult<ReporterAnswers> {
    Ok(ReporterAnswers {
        top_departments: top_departments_by_hours(df, config.top_n)?,
        project_total: project_total(df, &config.department, &config.salary)?,
        evaluations: lookup_evaluations(df, &config.lookup_keys)?,
    })
}

impl ToLiteral for ProjectTotal {
    fn to_literal(&self) -> Literal {
        match self {
            ProjectTotal::Int(total) => Literal::Int(*total),
            ProjectTotal::Float(total) => Literal::Float(*total),
        }
    }
}

impl ReporterAnswers {
    /// The three answers as separate printable values.
    pub fn literals(&self) -> [Literal; 3] {
        let evaluations = self
            .evaluations
            .iter()
            .map(|[evaluation, satisfaction]| {
                Literal::List(vec![
                    Literal::float_or_nan(*evaluation),
                    Literal::float_or_nan(*satisfaction),
                ])
            })
            .collect();

        [
            self.top_departments.to_literal(),
            self.project_total.to_literal(),
            Literal::List(evaluations),
        ]
    }
}
