//! Python-literal rendering of diagnostic values.
//!
//! Diagnostics are printed the way Python's `repr` prints `list`, `dict`
//! and scalar values; [`Literal`] models those values and renders that text.

use std::fmt::{self, Write as _};

use serde_json::{Map, Number, Value};

/// A printable diagnostic value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Literal>),
    Tuple(Vec<Literal>),
    Dict(Vec<(Literal, Literal)>),
}

/// Conversion of pipeline results into printable values.
pub trait ToLiteral {
    fn to_literal(&self) -> Literal;
}

impl Literal {
    pub fn str(value: impl Into<String>) -> Self {
        Literal::Str(value.into())
    }

    /// `Float`, or `nan` for a missing value.
    pub fn float_or_nan(value: Option<f64>) -> Self {
        Literal::Float(value.unwrap_or(f64::NAN))
    }

    pub fn list<T: ToLiteral>(items: &[T]) -> Self {
        Literal::List(items.iter().map(ToLiteral::to_literal).collect())
    }

    /// Render as Python source text, truncating sequences longer than
    /// `max_items` with `...`.
    pub fn render(&self, max_items: Option<usize>) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = self.write_repr(&mut out, max_items);
        out
    }

    fn write_repr(&self, out: &mut String, max_items: Option<usize>) -> fmt::Result {
        match self {
            Literal::None => out.write_str("None"),
            Literal::Bool(true) => out.write_str("True"),
            Literal::Bool(false) => out.write_str("False"),
            Literal::Int(value) => write!(out, "{value}"),
            Literal::Float(value) => out.write_str(&float_repr(*value)),
            Literal::Str(value) => out.write_str(&str_repr(value)),
            Literal::List(items) => write_sequence(out, "[", "]", items, max_items, false),
            Literal::Tuple(items) => {
                write_sequence(out, "(", ")", items, max_items, items.len() == 1)
            }
            Literal::Dict(entries) => {
                out.write_char('{')?;
                let shown = limit(entries.len(), max_items);
                for (i, (key, value)) in entries.iter().take(shown).enumerate() {
                    if i > 0 {
                        out.write_str(", ")?;
                    }
                    key.write_repr(out, max_items)?;
                    out.write_str(": ")?;
                    value.write_repr(out, max_items)?;
                }
                if shown < entries.len() {
                    out.write_str(", ...")?;
                }
                out.write_char('}')
            }
        }
    }

    /// Convert to JSON. Tuples become arrays; dictionary keys are rendered
    /// as their Python text unless they already are strings.
    pub fn to_json(&self) -> Value {
        match self {
            Literal::None => Value::Null,
            Literal::Bool(value) => Value::Bool(*value),
            Literal::Int(value) => Value::from(*value),
            Literal::Float(value) => Number::from_f64(*value)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Literal::Str(value) => Value::String(value.clone()),
            Literal::List(items) | Literal::Tuple(items) => {
                Value::Array(items.iter().map(Literal::to_json).collect())
            }
            Literal::Dict(entries) => {
                let mut map = Map::new();
                for (key, value) in entries {
                    let key = match key {
                        Literal::Str(s) => s.clone(),
                        other => other.render(None),
                    };
                    map.insert(key, value.to_json());
                }
                Value::Object(map)
            }
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(None))
    }
}

fn limit(len: usize, max_items: Option<usize>) -> usize {
    max_items.map_or(len, |max| len.min(max))
}

fn write_sequence(
    out: &mut String,
    open: &str,
    close: &str,
    items: &[Literal],
    max_items: Option<usize>,
    trailing_comma: bool,
) -> fmt::Result {
    out.write_str(open)?;
    let shown = limit(items.len(), max_items);
    for (i, item) in items.iter().take(shown).enumerate() {
        if i > 0 {
            out.write_str(", ")?;
        }
        item.write_repr(out, max_items)?;
    }
    if shown < items.len() {
        out.write_str(", ...")?;
    }
    if trailing_comma {
        out.write_char(',')?;
    }
    out.write_str(close)
}

/// Python `repr` of a float: shortest round-trip digits, always with a
/// fractional part or exponent, scientific outside `[1e-4, 1e16)`.
fn float_repr(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let formatted = format!("{value:e}");
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) => {
                let exponent: i32 = exponent.parse().unwrap_or(0);
                let sign = if exponent < 0 { '-' } else { '+' };
                format!("{mantissa}e{sign}{:02}", exponent.abs())
            }
            None => formatted,
        };
    }

    let formatted = format!("{value}");
    if formatted.contains('.') {
        formatted
    } else {
        format!("{formatted}.0")
    }
}

/// Python `repr` of a string: single quotes unless the text contains a
/// single quote and no double quote.
fn str_repr(value: &str) -> String {
    let quote = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

impl ToLiteral for Literal {
    fn to_literal(&self) -> Literal {
        self.clone()
    }
}

impl ToLiteral for i64 {
    fn to_literal(&self) -> Literal {
        Literal::Int(*self)
    }
}

impl ToLiteral for f64 {
    fn to_literal(&self) -> Literal {
        Literal::Float(*self)
    }
}

impl ToLiteral for String {
    fn to_literal(&self) -> Literal {
        Literal::Str(self.clone())
    }
}

impl ToLiteral for &str {
    fn to_literal(&self) -> Literal {
        Literal::Str((*self).to_string())
    }
}

impl<T: ToLiteral> ToLiteral for Option<T> {
    fn to_literal(&self) -> Literal {
        self.as_ref().map_or(Literal::None, ToLiteral::to_literal)
    }
}

impl<T: ToLiteral> ToLiteral for Vec<T> {
    fn to_literal(&self) -> Literal {
        Literal::list(self)
    }
}
