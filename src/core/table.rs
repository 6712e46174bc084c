use crate::domain::model::{Breakdown, Table};
use crate::utils::error::{EtlError, Result};
use std::collections::HashMap;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub fn encode_csv(table: &Table) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&table.headers)?;

    for row in &table.rows {
        writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
    }

    writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))
}

/// Reads a headed CSV. Short rows are padded, blank cells become `None`.
pub fn decode_csv(data: &[u8]) -> Result<Table> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row = (0..headers.len())
            .map(|i| {
                record
                    .get(i)
                    .map(str::trim)
                    .filter(|cell| !cell.is_empty())
                    .map(str::to_string)
            })
            .collect();
        rows.push(row);
    }

    Ok(Table { headers, rows })
}

/// Column-name access over a decoded table.
pub struct TableReader<'a> {
    table: &'a Table,
    index: HashMap<&'a str, usize>,
}

impl<'a> TableReader<'a> {
    pub fn new(table: &'a Table) -> Self {
        let mut index = HashMap::new();
        for (position, header) in table.headers.iter().enumerate() {
            index.entry(header.as_str()).or_insert(position);
        }
        Self { table, index }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn rows(&self) -> impl Iterator<Item = RowView<'_>> {
        self.table.rows.iter().map(move |cells| RowView {
            index: &self.index,
            headers: &self.table.headers,
            cells,
        })
    }
}

pub struct RowView<'a> {
    index: &'a HashMap<&'a str, usize>,
    headers: &'a [String],
    cells: &'a [Option<String>],
}

impl RowView<'_> {
    pub fn get(&self, name: &str) -> Option<&str> {
        let position = *self.index.get(name)?;
        self.cells.get(position)?.as_deref()
    }

    pub fn text(&self, name: &str) -> String {
        self.get(name).unwrap_or_default().to_string()
    }

    pub fn owned(&self, name: &str) -> Option<String> {
        self.get(name).map(str::to_string)
    }

    pub fn count(&self, name: &str) -> Option<u64> {
        let raw = self.get(name)?;
        let parsed = parse_count(raw);
        if parsed.is_none() {
            tracing::warn!(column = name, value = raw, "ignoring non-numeric count");
        }
        parsed
    }

    /// Whether the table has any `<prefix><label>` column, filled or not.
    pub fn has_prefixed_column(&self, prefix: &str) -> bool {
        self.headers
            .iter()
            .any(|h| h.len() > prefix.len() && h.starts_with(prefix))
    }

    /// Collects `<prefix><label>` columns into a breakdown. Blank cells are skipped,
    /// an explicit `0` is kept.
    pub fn breakdown(&self, prefix: &str) -> Breakdown {
        let mut breakdown = Breakdown::new();
        for (position, header) in self.headers.iter().enumerate() {
            let Some(label) = header.strip_prefix(prefix) else {
                continue;
            };
            if label.is_empty() {
                continue;
            }
            let Some(raw) = self.cells.get(position).and_then(|c| c.as_deref()) else {
                continue;
            };
            match parse_count(raw) {
                Some(count) => {
                    breakdown.insert(label.to_string(), count);
                }
                None => {
                    tracing::warn!(column = %header, value = raw, "ignoring non-numeric breakdown cell");
                }
            }
        }
        breakdown
    }
}

/// Counts written by other tools may come out as `12.0`.
pub fn parse_count(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<u64>() {
        return Some(value);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Some(value.round() as u64),
        _ => None,
    }
}

pub fn cell<T: ToString>(value: Option<T>) -> Option<String> {
    value.map(|v| v.to_string())
}

pub fn text_cell(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
