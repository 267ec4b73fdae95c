use std::iter::once;

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::{
    core::observation::{DATETIME_COLUMN, Metric, Observation},
    prelude::*,
};

/// Render the rows as CSV: the header, then one line per row, joined with `\n`.
///
/// Gaps are empty fields. Fields with a comma, a quote or a line break get quoted.
#[instrument(skip_all, fields(n_rows = observations.len()))]
pub fn to_csv(observations: &[&Observation]) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());
    writer.write_record(once(DATETIME_COLUMN).chain(Metric::EXPORT_ORDER.map(Metric::column)))?;
    for observation in observations {
        writer.write_record(once(observation.label.clone()).chain(Metric::EXPORT_ORDER.map(
            |metric| metric.of(observation).map(|value| value.to_string()).unwrap_or_default(),
        )))?;
    }
    let mut bytes = writer.into_inner().map_err(csv::IntoInnerError::into_error)?;
    if bytes.last() == Some(&b'\n') {
        bytes.pop();
    }
    Ok(String::from_utf8(bytes)?)
}
