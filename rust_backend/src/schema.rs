//! Column names of the office and HR tables.
//!
//! The source XML files use these names verbatim, including the mixed
//! capitalisation (`Department`, `Work_accident`).

use polars::prelude::*;

use crate::error::{PipelineError, PipelineResult};

/// Index column shared by every table once keys are assigned.
pub const KEY_COLUMN: &str = "employee_id";
/// Office-local employee id, unique only within one office.
pub const OFFICE_ID: &str = "employee_office_id";

pub const SATISFACTION: &str = "satisfaction_level";
pub const LAST_EVALUATION: &str = "last_evaluation";
pub const PROJECTS: &str = "number_project";
pub const MONTHLY_HOURS: &str = "average_monthly_hours";
pub const TENURE: &str = "time_spend_company";
pub const WORK_ACCIDENT: &str = "Work_accident";
pub const PROMOTION: &str = "promotion_last_5years";
pub const DEPARTMENT: &str = "Department";
pub const SALARY: &str = "salary";
pub const LEFT: &str = "left";

/// Fail with [`PipelineError::MissingColumn`] unless `df` has every column.
pub fn require_columns(df: &DataFrame, table: &str, columns: &[&str]) -> PipelineResult<()> {
    let present = column_names(df);
    for column in columns {
        if !present.iter().any(|name| name == column) {
            return Err(PipelineError::MissingColumn {
                table: table.to_string(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

/// Column names in frame order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

/// Column names in frame order, without the key column.
pub fn value_columns(df: &DataFrame) -> Vec<String> {
    column_names(df)
        .into_iter()
        .filter(|name| name != KEY_COLUMN)
        .collect()
}
