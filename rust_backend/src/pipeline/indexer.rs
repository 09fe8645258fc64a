//! Composite-key assignment.
//!
//! Office rosters reuse local ids (office A and office B can both have an
//! employee `4`), so each office row is keyed by its office letter followed
//! by the local id: `A4`, `B4`. The HR table is keyed by its own
//! `employee_id`, which already uses that form.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{PipelineError, PipelineResult};
use crate::io::RawTables;
use crate::output::{Literal, ToLiteral};
use crate::pipeline::frame::index_values;
use crate::schema::{require_columns, KEY_COLUMN, OFFICE_ID};

/// The two office rosters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Office {
    A,
    B,
}

impl Office {
    pub fn tag(self) -> char {
        match self {
            Office::A => 'A',
            Office::B => 'B',
        }
    }

    fn table_name(self) -> &'static str {
        match self {
            Office::A => "office A",
            Office::B => "office B",
        }
    }
}

/// How key collisions are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyPolicy {
    /// Keep duplicate and null keys as they are
    #[default]
    Permissive,
    /// Fail on a duplicate or null key
    Strict,
}

/// The three tables keyed by `employee_id` (the first column of each).
#[derive(Debug, Clone)]
pub struct IndexedTables {
    pub office_a: DataFrame,
    pub office_b: DataFrame,
    pub hr: DataFrame,
}

/// Ordered index values of each table, in the order A, B, HR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexReport {
    pub office_a: Vec<Option<String>>,
    pub office_b: Vec<Option<String>>,
    pub hr: Vec<Option<String>>,
}

/// Composite key of an office-local id.
pub fn composite_key(office: Office, local_id: impl std::fmt::Display) -> String {
    format!("{}{}", office.tag(), local_id)
}

/// Key an office table by composite key.
///
/// The key replaces any existing key column, so indexing an already-indexed
/// table gives the same index. `employee_office_id` is kept.
pub fn index_office(df: &DataFrame, office: Office) -> PipelineResult<DataFrame> {
    require_columns(df, office.table_name(), &[OFFICE_ID])?;

    let ids = df.column(OFFICE_ID)?.cast(&DataType::String)?;
    let keys: Vec<Option<String>> = ids
        .str()?
        .into_iter()
        .map(|id| id.map(|id| composite_key(office, id)))
        .collect();

    with_key_first(df, Series::new(KEY_COLUMN.into(), keys))
}

/// Key the HR table by its `employee_id` column.
pub fn index_hr(df: &DataFrame) -> PipelineResult<DataFrame> {
    require_columns(df, "HR", &[KEY_COLUMN])?;

    let keys = df
        .column(KEY_COLUMN)?
        .cast(&DataType::String)?
        .as_materialized_series()
        .clone();
    with_key_first(df, keys)
}

fn with_key_first(df: &DataFrame, keys: Series) -> PipelineResult<DataFrame> {
    let mut df = df.clone();
    if df.get_column_index(KEY_COLUMN).is_some() {
        df.drop_in_place(KEY_COLUMN)?;
    }
    df.insert_column(0, keys)?;
    Ok(df)
}

/// Key all three tables.
///
/// Under [`KeyPolicy::Strict`] a null key, a key repeated within a table or
/// a key shared by both offices fails with the offending key.
pub fn index_tables(raw: &RawTables, policy: KeyPolicy) -> PipelineResult<IndexedTables> {
    let tables = IndexedTables {
        office_a: index_office(&raw.office_a, Office::A)?,
        office_b: index_office(&raw.office_b, Office::B)?,
        hr: index_hr(&raw.hr)?,
    };

    if policy == KeyPolicy::Strict {
        tables.validate()?;
    }

    log::debug!(
        "Indexed {} + {} office rows, {} HR rows",
        tables.office_a.height(),
        tables.office_b.height(),
        tables.hr.height()
    );
    Ok(tables)
}

impl IndexedTables {
    /// Re-run key assignment on already-indexed tables.
    pub fn reindex(&self, policy: KeyPolicy) -> PipelineResult<IndexedTables> {
        index_tables(
            &RawTables {
                office_a: self.office_a.clone(),
                office_b: self.office_b.clone(),
                hr: self.hr.clone(),
            },
            policy,
        )
    }

    pub fn report(&self) -> PipelineResult<IndexReport> {
        Ok(IndexReport {
            office_a: index_values(&self.office_a)?,
            office_b: index_values(&self.office_b)?,
            hr: index_values(&self.hr)?,
        })
    }

    fn validate(&self) -> PipelineResult<()> {
        let mut office_union = HashSet::new();
        for (table, df) in [("office A", &self.office_a), ("office B", &self.office_b)] {
            let mut seen = HashSet::new();
            for key in index_values(df)? {
                let key = key.ok_or_else(|| PipelineError::NullKey {
                    table: table.to_string(),
                })?;
                if !seen.insert(key.clone()) {
                    return Err(PipelineError::DuplicateKey {
                        table: table.to_string(),
                        key,
                    });
                }
                if !office_union.insert(key.clone()) {
                    return Err(PipelineError::DuplicateKey {
                        table: "office union".to_string(),
                        key,
                    });
                }
            }
        }

        let mut seen = HashSet::new();
        for key in index_values(&self.hr)? {
            let key = key.ok_or_else(|| PipelineError::NullKey {
                table: "HR".to_string(),
            })?;
            if !seen.insert(key.clone()) {
                return Err(PipelineError::DuplicateKey {
                    table: "HR".to_string(),
                    key,
                });
            }
        }
        Ok(())
    }
}

impl ToLiteral for IndexReport {
    fn to_literal(&self) -> Literal {
        Literal::List(vec![
            self.office_a.to_literal(),
            self.office_b.to_literal(),
            self.hr.to_literal(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_tables() -> RawTables {
        RawTables {
            office_a: df!(
                OFFICE_ID => [4i64, 3033, 125],
                "number_project" => [2i64, 6, 3]
            )
            .unwrap(),
            office_b: df!(
                OFFICE_ID => [7064i64, 4],
                "number_project" => [5i64, 4]
            )
            .unwrap(),
            hr: df!(
                KEY_COLUMN => ["A4", "B7064", "A3033", "B4"],
                "left" => [0i64, 1, 0, 0]
            )
            .unwrap(),
        }
    }

    #[test]
    fn test_composite_key() {
        assert_eq!(composite_key(Office::A, 125), "A125");
        assert_eq!(composite_key(Office::B, 4), "B4");
        assert_ne!(composite_key(Office::A, 4), composite_key(Office::B, 4));
    }

    #[test]
    fn test_index_office_puts_key_first() {
        let df = index_office(&raw_tables().office_a, Office::A).unwrap();
        let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec![KEY_COLUMN, OFFICE_ID, "number_project"]);
        assert_eq!(
            index_values(&df).unwrap(),
            vec![Some("A4".to_string()), Some("A3033".to_string()), Some("A125".to_string())]
        );
    }

    #[test]
    fn test_index_hr_casts_numeric_ids() {
        let hr = df!(KEY_COLUMN => [10i64, 20]).unwrap();
        let df = index_hr(&hr).unwrap();
        assert_eq!(df.column(KEY_COLUMN).unwrap().dtype(), &DataType::String);
        assert_eq!(
            index_values(&df).unwrap(),
            vec![Some("10".to_string()), Some("20".to_string())]
        );
    }

    #[test]
    fn test_report_order_a_b_hr() {
        let tables = index_tables(&raw_tables(), KeyPolicy::Permissive).unwrap();
        let report = tables.report().unwrap();
        assert_eq!(
            report.to_literal().render(None),
            "[['A4', 'A3033', 'A125'], ['B7064', 'B4'], ['A4', 'B7064', 'A3033', 'B4']]"
        );
    }

    #[test]
    fn test_reindex_is_idempotent() {
        let once = index_tables(&raw_tables(), KeyPolicy::Permissive).unwrap();
        let twice = once.reindex(KeyPolicy::Permissive).unwrap();
        assert_eq!(once.report().unwrap(), twice.report().unwrap());
        assert_eq!(once.office_a.width(), twice.office_a.width());
        assert_eq!(once.hr.width(), twice.hr.width());
    }

    #[test]
    fn test_null_local_id_gives_null_key() {
        let mut raw = raw_tables();
        raw.office_b = df!(OFFICE_ID => [Some(1i64), None]).unwrap();

        let tables = index_tables(&raw, KeyPolicy::Permissive).unwrap();
        assert_eq!(
            index_values(&tables.office_b).unwrap(),
            vec![Some("B1".to_string()), None]
        );

        let err = index_tables(&raw, KeyPolicy::Strict).unwrap_err();
        assert!(matches!(err, PipelineError::NullKey { .. }));
    }

    #[test]
    fn test_duplicates_pass_permissive_fail_strict() {
        let mut raw = raw_tables();
        raw.office_a = df!(OFFICE_ID => [4i64, 4]).unwrap();

        let tables = index_tables(&raw, KeyPolicy::Permissive).unwrap();
        assert_eq!(tables.office_a.height(), 2);

        match index_tables(&raw, KeyPolicy::Strict).unwrap_err() {
            PipelineError::DuplicateKey { table, key } => {
                assert_eq!(table, "office A");
                assert_eq!(key, "A4");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_strict_rejects_duplicate_hr_ids() {
        let mut raw = raw_tables();
        raw.hr = df!(KEY_COLUMN => ["A4", "A4"]).unwrap();
        assert!(matches!(
            index_tables(&raw, KeyPolicy::Strict),
            Err(PipelineError::DuplicateKey { .. })
        ));
    }

    #[test]
    fn test_missing_office_id_is_shape_error() {
        let mut raw = raw_tables();
        raw.office_a = df!("number_project" => [1i64]).unwrap();
        assert!(matches!(
            index_tables(&raw, KeyPolicy::Permissive),
            Err(PipelineError::MissingColumn { .. })
        ));
    }
}
