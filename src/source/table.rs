use std::collections::HashMap;

use crate::prelude::*;

/// CSV row keyed by the header.
#[must_use]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawRow(HashMap<String, String>);

impl RawRow {
    /// Get the cell of the column, treating blank cells as absent.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.0.get(column).map(|cell| cell.trim()).filter(|cell| !cell.is_empty())
    }

    /// Get the first non-blank cell among the columns, in their order.
    #[must_use]
    pub fn first_of(&self, columns: &[&str]) -> Option<&str> {
        columns.iter().find_map(|column| self.get(column))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRow {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iterator: T) -> Self {
        Self(iterator.into_iter().map(|(column, cell)| (column.into(), cell.into())).collect())
    }
}

/// Parse the CSV text with a header row.
///
/// Blank lines are skipped, ragged rows are tolerated: missing trailing cells are simply absent.
pub fn parse_table(text: &str) -> Result<Vec<RawRow>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let headers = reader.headers().context("failed to read the header")?.clone();
    reader
        .records()
        .map(|record| -> Result<RawRow> {
            let record = record.context("failed to read a record")?;
            Ok(headers.iter().zip(record.iter()).collect())
        })
        .collect()
}
