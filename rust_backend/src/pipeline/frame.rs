//! Typed access to DataFrame columns.
//!
//! Stages read whole columns out of polars frames as plain Rust vectors;
//! these helpers do the casting and the null handling in one place.

use polars::prelude::*;
use std::cmp::Ordering;
use std::fmt;

use crate::error::PipelineResult;
use crate::output::{Literal, ToLiteral};
use crate::schema::KEY_COLUMN;

/// A grouping or pivot key.
///
/// Integer and float keys order by numeric value, so a float tenure column
/// sorts `2.5` before `3.0`. Booleans sort before numbers, numbers before
/// strings.
#[derive(Debug, Clone)]
pub enum Key {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Key {
    pub fn str(value: impl Into<String>) -> Self {
        Key::Str(value.into())
    }

    fn rank(&self) -> u8 {
        match self {
            Key::Bool(_) => 0,
            Key::Int(_) | Key::Float(_) => 1,
            Key::Str(_) => 2,
        }
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Key::Bool(a), Key::Bool(b)) => a.cmp(b),
            (Key::Int(a), Key::Int(b)) => a.cmp(b),
            (Key::Float(a), Key::Float(b)) => a.total_cmp(b),
            (Key::Int(a), Key::Float(b)) => (*a as f64).total_cmp(b),
            (Key::Float(a), Key::Int(b)) => a.total_cmp(&(*b as f64)),
            (Key::Str(a), Key::Str(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Key {}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Str(value) => write!(f, "{}", value),
            other => write!(f, "{}", other.to_literal()),
        }
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

impl From<f64> for Key {
    fn from(value: f64) -> Self {
        Key::Float(value)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(value.to_string())
    }
}

impl ToLiteral for Key {
    fn to_literal(&self) -> Literal {
        match self {
            Key::Bool(value) => Literal::Bool(*value),
            Key::Int(value) => Literal::Int(*value),
            Key::Float(value) => Literal::Float(*value),
            Key::Str(value) => Literal::Str(value.clone()),
        }
    }
}

/// Column values as optional strings.
pub fn string_values(df: &DataFrame, name: &str) -> PipelineResult<Vec<Option<String>>> {
    let column = df.column(name)?.cast(&DataType::String)?;
    Ok(column
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

/// Column values as optional floats.
pub fn float_values(df: &DataFrame, name: &str) -> PipelineResult<Vec<Option<f64>>> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    Ok(column.f64()?.into_iter().collect())
}

/// Column values as optional integers.
pub fn int_values(df: &DataFrame, name: &str) -> PipelineResult<Vec<Option<i64>>> {
    let column = df.column(name)?.cast(&DataType::Int64)?;
    Ok(column.i64()?.into_iter().collect())
}

/// Column values as optional booleans.
pub fn bool_values(df: &DataFrame, name: &str) -> PipelineResult<Vec<Option<bool>>> {
    let column = df.column(name)?.cast(&DataType::Boolean)?;
    Ok(column.bool()?.into_iter().collect())
}

/// Column values as grouping keys, typed by the column's dtype.
pub fn key_values(df: &DataFrame, name: &str) -> PipelineResult<Vec<Option<Key>>> {
    let dtype = df.column(name)?.dtype().clone();

    let keys = if dtype == DataType::Boolean {
        bool_values(df, name)?
            .into_iter()
            .map(|value| value.map(Key::Bool))
            .collect()
    } else if dtype.is_integer() {
        int_values(df, name)?
            .into_iter()
            .map(|value| value.map(Key::Int))
            .collect()
    } else if dtype.is_float() {
        float_values(df, name)?
            .into_iter()
            .map(|value| value.map(Key::Float))
            .collect()
    } else {
        string_values(df, name)?
            .into_iter()
            .map(|value| value.map(Key::Str))
            .collect()
    };
    Ok(keys)
}

/// Row keys of an indexed table.
pub fn index_values(df: &DataFrame) -> PipelineResult<Vec<Option<String>>> {
    string_values(df, KEY_COLUMN)
}

/// Round half to even at `decimals` places, as numpy's `around` does.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round_ties_even() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_ordering() {
        let mut keys = vec![
            Key::str("b"),
            Key::Float(10.0),
            Key::Int(3),
            Key::str("a"),
            Key::Float(2.5),
            Key::Bool(true),
            Key::Int(-1),
            Key::Bool(false),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                Key::Bool(false),
                Key::Bool(true),
                Key::Int(-1),
                Key::Float(2.5),
                Key::Int(3),
                Key::Float(10.0),
                Key::str("a"),
                Key::str("b")
            ]
        );
        assert_eq!(Key::Int(3), Key::Float(3.0));
    }

    #[test]
    fn test_key_literals() {
        assert_eq!(Key::Float(3.0).to_literal().render(None), "3.0");
        assert_eq!(Key::Float(2.5).to_string(), "2.5");
        assert_eq!(Key::Int(3).to_string(), "3");
        assert_eq!(Key::Bool(true).to_literal().render(None), "True");
        assert_eq!(Key::str("IT").to_literal().render(None), "'IT'");
    }

    #[test]
    fn test_key_values_follow_dtype() {
        let df = df!(
            "left" => [Some(1i64), None, Some(0)],
            "tenure" => [3.0, 2.5, 4.0],
            "salary" => ["low", "high", "low"],
            "promoted" => [true, false, true]
        )
        .unwrap();

        assert_eq!(
            key_values(&df, "left").unwrap(),
            vec![Some(Key::Int(1)), None, Some(Key::Int(0))]
        );
        assert_eq!(
            key_values(&df, "tenure").unwrap(),
            vec![Some(Key::Float(3.0)), Some(Key::Float(2.5)), Some(Key::Float(4.0))]
        );
        assert!(matches!(key_values(&df, "tenure").unwrap()[0], Some(Key::Float(_))));
        assert_eq!(
            key_values(&df, "salary").unwrap(),
            vec![Some(Key::str("low")), Some(Key::str("high")), Some(Key::str("low"))]
        );
        assert_eq!(
            key_values(&df, "promoted").unwrap(),
            vec![Some(Key::Bool(true)), Some(Key::Bool(false)), Some(Key::Bool(true))]
        );
    }

    #[test]
    fn test_numeric_casts() {
        let df = df!("hours" => [Some(150i64), None]).unwrap();
        assert_eq!(float_values(&df, "hours").unwrap(), vec![Some(150.0), None]);
        assert_eq!(int_values(&df, "hours").unwrap(), vec![Some(150), None]);
        assert_eq!(
            string_values(&df, "hours").unwrap(),
            vec![Some("150".to_string()), None]
        );
    }

    #[test]
    fn test_round_half_even() {
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(0.135, 2), 0.14);
        assert_eq!(round_to(2.0 / 3.0, 2), 0.67);
        assert_eq!(round_to(4.0, 2), 4.0);
    }
}
