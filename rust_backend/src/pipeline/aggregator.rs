//! Grouped statistics and pivot tables over the merged table.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::PipelineResult;
use crate::output::{Literal, ToLiteral};
use crate::pipeline::frame::{float_values, int_values, key_values, round_to, Key};
use crate::pipeline::pivot::{less_than, pivot_table, AggFunc, PivotSpec, PivotTable};
use crate::schema::{
    require_columns, DEPARTMENT, LAST_EVALUATION, LEFT, MONTHLY_HOURS, PROJECTS, PROMOTION,
    SALARY, SATISFACTION, TENURE, WORK_ACCIDENT,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AggregatorConfig {
    /// Decimal places of every aggregate
    pub decimals: u32,
    /// Project count above which an employee is counted as overloaded
    pub project_threshold: i64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            decimals: 2,
            project_threshold: 5,
        }
    }
}

/// Statistics of one `left` group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStats {
    pub left: Key,
    pub median_projects: Option<f64>,
    pub projects_over_threshold: i64,
    pub mean_tenure: Option<f64>,
    pub median_tenure: Option<f64>,
    pub accident_rate: Option<f64>,
    pub mean_evaluation: Option<f64>,
    /// Sample standard deviation; `None` for a single-row group
    pub evaluation_std: Option<f64>,
}

/// Per-group statistics, groups sorted by `left`.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub groups: Vec<GroupStats>,
}

/// Everything the aggregator derives from the merged table.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregates {
    pub summary: GroupSummary,
    pub hours_by_department: PivotTable,
    pub scores_by_tenure: PivotTable,
}

pub fn group_summary(df: &DataFrame, config: &AggregatorConfig) -> PipelineResult<GroupSummary> {
    require_columns(
        df,
        "merged",
        &[LEFT, PROJECTS, TENURE, WORK_ACCIDENT, LAST_EVALUATION],
    )?;

    let grouped = df
        .clone()
        .lazy()
        .filter(col(LEFT).is_not_null())
        .group_by([col(LEFT)])
        .agg([
            col(PROJECTS).median().cast(DataType::Float64).alias("projects_median"),
            col(PROJECTS)
                .gt(lit(config.project_threshold))
                .sum()
                .cast(DataType::Int64)
                .alias("projects_over"),
            col(TENURE).mean().alias("tenure_mean"),
            col(TENURE).median().cast(DataType::Float64).alias("tenure_median"),
            col(WORK_ACCIDENT).mean().alias("accident_mean"),
            col(LAST_EVALUATION).mean().alias("evaluation_mean"),
            col(LAST_EVALUATION).std(1).alias("evaluation_std"),
        ])
        .collect()?;

    let keys = key_values(&grouped, LEFT)?;
    let rounded = |name: &str| -> PipelineResult<Vec<Option<f64>>> {
        Ok(float_values(&grouped, name)?
            .into_iter()
            .map(|value| value.map(|v| round_to(v, config.decimals)))
            .collect())
    };
    let median_projects = rounded("projects_median")?;
    let over = int_values(&grouped, "projects_over")?;
    let mean_tenure = rounded("tenure_mean")?;
    let median_tenure = rounded("tenure_median")?;
    let accident_rate = rounded("accident_mean")?;
    let mean_evaluation = rounded("evaluation_mean")?;
    let evaluation_std = rounded("evaluation_std")?;

    let mut groups: Vec<GroupStats> = keys
        .into_iter()
        .enumerate()
        .filter_map(|(row, key)| {
            key.map(|left| GroupStats {
                left,
                median_projects: median_projects[row],
                projects_over_threshold: over[row].unwrap_or(0),
                mean_tenure: mean_tenure[row],
                median_tenure: median_tenure[row],
                accident_rate: accident_rate[row],
                mean_evaluation: mean_evaluation[row],
                evaluation_std: evaluation_std[row],
            })
        })
        .collect();
    groups.sort_by(|a, b| a.left.cmp(&b.left));

    Ok(GroupSummary { groups })
}

/// Median monthly hours per department, by `(left, salary)`.
pub fn hours_by_department(df: &DataFrame, decimals: u32) -> PipelineResult<PivotTable> {
    pivot_table(
        df,
        &PivotSpec {
            index: DEPARTMENT,
            columns: &[LEFT, SALARY],
            values: &[MONTHLY_HOURS],
            aggs: &[AggFunc::Median],
        },
        decimals,
    )
}

/// Max, mean and min of evaluation and satisfaction per tenure, by promotion.
pub fn scores_by_tenure(df: &DataFrame, decimals: u32) -> PipelineResult<PivotTable> {
    pivot_table(
        df,
        &PivotSpec {
            index: TENURE,
            columns: &[PROMOTION],
            values: &[SATISFACTION, LAST_EVALUATION],
            aggs: &[AggFunc::Max, AggFunc::Mean, AggFunc::Min],
        },
        decimals,
    )
}

pub fn aggregate(df: &DataFrame, config: &AggregatorConfig) -> PipelineResult<Aggregates> {
    Ok(Aggregates {
        summary: group_summary(df, config)?,
        hours_by_department: hours_by_department(df, config.decimals)?,
        scores_by_tenure: scores_by_tenure(df, config.decimals)?,
    })
}

/// Departments where staying high earners work fewer hours than staying
/// medium earners, or leaving low earners fewer than leaving high earners.
pub fn salary_hours_inversions(hours: &PivotTable) -> PipelineResult<PivotTable> {
    let stayed_high = hours.column(&[Key::Int(0), Key::str("high")])?;
    let stayed_medium = hours.column(&[Key::Int(0), Key::str("medium")])?;
    let left_low = hours.column(&[Key::Int(1), Key::str("low")])?;
    let left_high = hours.column(&[Key::Int(1), Key::str("high")])?;

    let mask: Vec<bool> = less_than(stayed_high, stayed_medium)
        .into_iter()
        .zip(less_than(left_low, left_high))
        .map(|(a, b)| a || b)
        .collect();
    Ok(hours.filter_rows(&mask))
}

/// Tenures where promoted employees have a lower mean evaluation than the
/// rest.
pub fn promotion_evaluation_gap(scores: &PivotTable) -> PipelineResult<PivotTable> {
    let mean_evaluation = |promoted: i64| {
        scores.column(&[Key::str("mean"), Key::str(LAST_EVALUATION), Key::Int(promoted)])
    };
    let mask = less_than(mean_evaluation(1)?, mean_evaluation(0)?);
    Ok(scores.filter_rows(&mask))
}

impl ToLiteral for GroupSummary {
    /// `{(column, statistic): {left: value}}`, the layout of a pandas
    /// `groupby().agg().to_dict()`.
    fn to_literal(&self) -> Literal {
        let float_stat = |column: &str, stat: &str, pick: fn(&GroupStats) -> Option<f64>| {
            let by_group = self
                .groups
                .iter()
                .map(|group| (group.left.to_literal(), Literal::float_or_nan(pick(group))))
                .collect();
            (stat_key(column, stat), Literal::Dict(by_group))
        };
        let over_threshold = self
            .groups
            .iter()
            .map(|group| (group.left.to_literal(), Literal::Int(group.projects_over_threshold)))
            .collect();

        Literal::Dict(vec![
            float_stat(PROJECTS, "median", |g| g.median_projects),
            (stat_key(PROJECTS, "count_bigger_5"), Literal::Dict(over_threshold)),
            float_stat(TENURE, "mean", |g| g.mean_tenure),
            float_stat(TENURE, "median", |g| g.median_tenure),
            float_stat(WORK_ACCIDENT, "mean", |g| g.accident_rate),
            float_stat(LAST_EVALUATION, "mean", |g| g.mean_evaluation),
            float_stat(LAST_EVALUATION, "std", |g| g.evaluation_std),
        ])
    }
}

fn stat_key(column: &str, stat: &str) -> Literal {
    Literal::Tuple(vec![Literal::str(column), Literal::str(stat)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::schema::KEY_COLUMN;

    fn merged() -> DataFrame {
        df!(
            KEY_COLUMN => ["A1", "A2", "A3", "B1", "B2", "B3"],
            SATISFACTION => [0.4, 0.8, 0.6, 0.1, 0.9, 0.5],
            LAST_EVALUATION => [0.5, 0.9, 0.7, 0.8, 0.5, 0.4],
            PROJECTS => [3i64, 6, 2, 7, 4, 6],
            MONTHLY_HOURS => [150i64, 250, 200, 300, 120, 180],
            TENURE => [3i64, 4, 3, 5, 3, 4],
            WORK_ACCIDENT => [0i64, 1, 0, 0, 1, 0],
            LEFT => [0i64, 0, 0, 1, 1, 1],
            PROMOTION => [0i64, 1, 0, 0, 1, 0],
            DEPARTMENT => ["IT", "IT", "sales", "IT", "sales", "IT"],
            SALARY => ["high", "medium", "low", "low", "high", "high"]
        )
        .unwrap()
    }

    #[test]
    fn test_group_summary_two_groups() {
        let summary = group_summary(&merged(), &AggregatorConfig::default()).unwrap();
        assert_eq!(summary.groups.len(), 2);

        let stayed = &summary.groups[0];
        assert_eq!(stayed.left, Key::Int(0));
        assert_eq!(stayed.median_projects, Some(3.0));
        assert_eq!(stayed.projects_over_threshold, 1);
        assert_eq!(stayed.mean_tenure, Some(3.33));
        assert_eq!(stayed.median_tenure, Some(3.0));
        assert_eq!(stayed.accident_rate, Some(0.33));
        assert_eq!(stayed.mean_evaluation, Some(0.7));
        assert_eq!(stayed.evaluation_std, Some(0.2));

        let left = &summary.groups[1];
        assert_eq!(left.left, Key::Int(1));
        assert_eq!(left.projects_over_threshold, 2);
        assert_eq!(left.median_projects, Some(6.0));
    }

    #[test]
    fn test_group_summary_literal_order() {
        let summary = group_summary(&merged(), &AggregatorConfig::default()).unwrap();
        let text = summary.to_literal().render(None);
        assert!(text.starts_with(
            "{('number_project', 'median'): {0: 3.0, 1: 6.0}, ('number_project', 'count_bigger_5'): {0: 1, 1: 2}, "
        ));
        assert!(text.ends_with("('last_evaluation', 'std'): {0: 0.2, 1: 0.21}}"));
    }

    #[test]
    fn test_single_row_group_has_no_std() {
        let df = merged().head(Some(4));
        let summary = group_summary(&df, &AggregatorConfig::default()).unwrap();
        assert!(summary.groups[1].evaluation_std.map_or(true, f64::is_nan));
        assert!(summary.to_literal().render(None).ends_with("{0: 0.2, 1: nan}}"));
    }

    #[test]
    fn test_threshold_is_configurable() {
        let config = AggregatorConfig {
            project_threshold: 3,
            ..AggregatorConfig::default()
        };
        let summary = group_summary(&merged(), &config).unwrap();
        assert_eq!(summary.groups[0].projects_over_threshold, 1);
        assert_eq!(summary.groups[1].projects_over_threshold, 3);
    }

    #[test]
    fn test_hours_pivot_and_inversions() {
        let hours = hours_by_department(&merged(), 2).unwrap();
        assert_eq!(hours.index, vec![Key::str("IT"), Key::str("sales")]);
        assert_eq!(
            hours.columns,
            vec![
                vec![Key::Int(0), Key::str("high")],
                vec![Key::Int(0), Key::str("low")],
                vec![Key::Int(0), Key::str("medium")],
                vec![Key::Int(1), Key::str("high")],
                vec![Key::Int(1), Key::str("low")],
            ]
        );

        // IT: stayed high 150 < stayed medium 250
        let inversions = salary_hours_inversions(&hours).unwrap();
        assert_eq!(inversions.index, vec![Key::str("IT")]);
    }

    #[test]
    fn test_inversions_need_every_column() {
        let df = merged();
        let high = df.column(SALARY).unwrap().str().unwrap().equal("high");
        let df = df.filter(&high).unwrap();
        let hours = hours_by_department(&df, 2).unwrap();
        assert!(matches!(
            salary_hours_inversions(&hours),
            Err(PipelineError::Shape(_))
        ));
    }

    #[test]
    fn test_scores_pivot_paths_and_gap() {
        let scores = scores_by_tenure(&merged(), 2).unwrap();
        assert_eq!(scores.index, vec![Key::Int(3), Key::Int(4), Key::Int(5)]);
        assert_eq!(
            scores.columns[0],
            vec![Key::str("max"), Key::str(LAST_EVALUATION), Key::Int(0)]
        );
        assert_eq!(
            scores.get(&Key::Int(3), &[Key::str("mean"), Key::str(SATISFACTION), Key::Int(0)]),
            Some(0.5)
        );

        // Tenure 3: promoted 0.5 against 0.6; tenure 5 has nobody promoted
        let gap = promotion_evaluation_gap(&scores).unwrap();
        assert_eq!(gap.index, vec![Key::Int(3)]);
        assert_eq!(gap.width(), scores.width());
    }

    #[test]
    fn test_aggregate_leaves_table_unchanged() {
        let df = merged();
        let before = df.clone();
        let aggregates = aggregate(&df, &AggregatorConfig::default()).unwrap();
        assert_eq!(aggregates.summary.groups.len(), 2);
        assert!(df.equals_missing(&before));
    }
}
