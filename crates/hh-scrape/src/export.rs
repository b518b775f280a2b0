use std::path::Path;

use crate::query::SearchQuery;
use crate::types::Listing;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV write failed: {0}")]
    CsvError(#[from] csv::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Header plus one row per record. Rows keep their natural length; only the
/// header is extended with "Skill N" labels up to the widest row, so the
/// emitted CSV is ragged on purpose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn build<T: Listing>(listings: &[T]) -> Table {
        let mut rows = Vec::with_capacity(listings.len() + 1);
        rows.push(T::columns().iter().map(|c| c.to_string()).collect());
        rows.extend(listings.iter().map(Listing::to_row));

        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let fixed = rows[0].len();
        for ordinal in 1..=width.saturating_sub(fixed) {
            rows[0].push(format!("Skill {ordinal}"));
        }

        Table { rows }
    }

    pub fn header(&self) -> &[String] {
        &self.rows[0]
    }

    pub fn data_rows(&self) -> &[Vec<String>] {
        &self.rows[1..]
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.rows[0].len()
    }
}

pub fn write_csv(table: &Table, path: &Path) -> Result<(), ExportError> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_path(path)?;
    for row in table.rows() {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Default export filename derived from the search: kind, then the text term
/// and the area/role codes that produced the batch.
pub fn export_filename(kind: &str, query: &SearchQuery) -> String {
    let mut name = format!("export_{kind}");
    if !query.text.is_empty() {
        name.push('_');
        name.push_str(&slug(&query.text));
    }
    if !query.areas.is_empty() {
        name.push_str("_a");
        name.push_str(&join_codes(query.areas.iter()));
    }
    if !query.roles.is_empty() {
        name.push_str("_r");
        name.push_str(&join_codes(query.roles.iter()));
    }
    name.push_str(".csv");
    name
}

fn slug(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

fn join_codes<'a>(codes: impl Iterator<Item = &'a u32>) -> String {
    codes
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join("-")
}
