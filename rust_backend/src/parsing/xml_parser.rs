use polars::prelude::*;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{PipelineError, PipelineResult};

/// Parse a record-oriented XML file into a Polars DataFrame.
///
/// The children of the root element are rows. A row's attributes and the
/// text of its child elements are its fields. Elements nested deeper than a
/// field are ignored, as is any text they hold.
pub fn parse_records_file(path: &Path) -> PipelineResult<DataFrame> {
    let bytes = std::fs::read(path).map_err(|e| PipelineError::io(path, e))?;
    parse_records_bytes(&bytes, &path.display().to_string())
}

/// Parse record-oriented XML held in memory; `source_name` labels errors.
pub fn parse_records_bytes(bytes: &[u8], source_name: &str) -> PipelineResult<DataFrame> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| PipelineError::format(source_name, format!("invalid UTF-8: {}", e)))?;
    parse_records_str(text, source_name)
}

/// Parse record-oriented XML text into a DataFrame.
pub fn parse_records_str(xml: &str, source_name: &str) -> PipelineResult<DataFrame> {
    let table = read_records(xml, source_name)?;
    log::debug!(
        "Parsed {} rows x {} columns from {}",
        table.rows.len(),
        table.columns.len(),
        source_name
    );
    table.into_dataframe()
}

// Element depths while reading: root, row, field
const ROOT_DEPTH: usize = 1;
const ROW_DEPTH: usize = 2;
const FIELD_DEPTH: usize = 3;

fn read_records(xml: &str, source_name: &str) -> PipelineResult<RecordTable> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut table = RecordTable::default();
    let mut depth = 0usize;
    let mut seen_root = false;
    let mut field: Option<(String, String)> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            PipelineError::format(
                source_name,
                format!("at byte {}: {}", reader.buffer_position(), e),
            )
        })?;

        match event {
            Event::Start(element) => {
                depth += 1;
                match depth {
                    ROOT_DEPTH => {
                        if seen_root {
                            return Err(PipelineError::format(
                                source_name,
                                "multiple root elements",
                            ));
                        }
                        seen_root = true;
                    }
                    ROW_DEPTH => {
                        table.start_row();
                        table.set_attributes(&element, source_name)?;
                    }
                    FIELD_DEPTH => field = Some((local_name(&element), String::new())),
                    _ => {}
                }
            }
            Event::Empty(element) => match depth + 1 {
                ROOT_DEPTH => {
                    if seen_root {
                        return Err(PipelineError::format(source_name, "multiple root elements"));
                    }
                    seen_root = true;
                }
                ROW_DEPTH => {
                    table.start_row();
                    table.set_attributes(&element, source_name)?;
                }
                FIELD_DEPTH => table.set(&local_name(&element), None),
                _ => {}
            },
            Event::Text(text) if depth == FIELD_DEPTH => {
                let text = text
                    .unescape()
                    .map_err(|e| PipelineError::format(source_name, e))?;
                if let Some((_, value)) = field.as_mut() {
                    value.push_str(&text);
                }
            }
            Event::CData(data) if depth == FIELD_DEPTH => {
                if let Some((_, value)) = field.as_mut() {
                    value.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(_) => {
                if depth == FIELD_DEPTH {
                    if let Some((name, value)) = field.take() {
                        let value = value.trim();
                        table.set(&name, (!value.is_empty()).then(|| value.to_string()));
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(PipelineError::format(source_name, "no root element"));
    }
    if depth != 0 {
        return Err(PipelineError::format(source_name, "unexpected end of document"));
    }

    Ok(table)
}

fn local_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
}

/// Rows of optional string fields with columns in first-seen order.
#[derive(Default)]
struct RecordTable {
    columns: Vec<String>,
    positions: HashMap<String, usize>,
    rows: Vec<Vec<Option<String>>>,
}

impl RecordTable {
    fn start_row(&mut self) {
        self.rows.push(Vec::new());
    }

    fn set(&mut self, name: &str, value: Option<String>) {
        let position = match self.positions.get(name) {
            Some(&position) => position,
            None => {
                self.columns.push(name.to_string());
                self.positions.insert(name.to_string(), self.columns.len() - 1);
                self.columns.len() - 1
            }
        };

        if let Some(row) = self.rows.last_mut() {
            if row.len() <= position {
                row.resize(position + 1, None);
            }
            row[position] = value;
        }
    }

    fn set_attributes(&mut self, element: &BytesStart<'_>, source_name: &str) -> PipelineResult<()> {
        for attribute in element.attributes() {
            let attribute = attribute.map_err(|e| PipelineError::format(source_name, e))?;
            let name = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(|e| PipelineError::format(source_name, e))?;
            let value = value.trim();
            self.set(&name, (!value.is_empty()).then(|| value.to_string()));
        }
        Ok(())
    }

    fn into_dataframe(self) -> PipelineResult<DataFrame> {
        let RecordTable { columns, rows, .. } = self;

        let mut series = Vec::with_capacity(columns.len());
        for (position, name) in columns.iter().enumerate() {
            let values: Vec<Option<String>> = rows
                .iter()
                .map(|row| row.get(position).cloned().flatten())
                .collect();
            series.push(Column::from(infer_series(name, values)));
        }

        Ok(DataFrame::new(series)?)
    }
}

/// Build a series with the narrowest of Int64, Float64 or String that holds
/// every non-null value.
fn infer_series(name: &str, values: Vec<Option<String>>) -> Series {
    let present = || values.iter().flatten();

    if present().next().is_some() && present().all(|v| v.parse::<i64>().is_ok()) {
        let ints: Vec<Option<i64>> = values
            .iter()
            .map(|v| v.as_deref().and_then(|v| v.parse().ok()))
            .collect();
        return Series::new(name.into(), ints);
    }

    if present().next().is_some() && present().all(|v| v.parse::<f64>().is_ok()) {
        let floats: Vec<Option<f64>> = values
            .iter()
            .map(|v| v.as_deref().and_then(|v| v.parse().ok()))
            .collect();
        return Series::new(name.into(), floats);
    }

    Series::new(name.into(), values)
}
