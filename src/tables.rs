use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{
    core::{
        observation::{DATETIME_COLUMN, Metric, Observation},
        series::{Chart, Line},
        stats::Kpis,
    },
    render::Summary,
};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table
}

fn value_cell(value: Option<f64>) -> Cell {
    match value {
        Some(value) => Cell::new(format!("{value:.2}")).set_alignment(CellAlignment::Right),
        None => Cell::new("—").set_alignment(CellAlignment::Center).add_attribute(Attribute::Dim),
    }
}

pub fn build_chart_table(chart: &Chart) -> Table {
    let mut table = new_table();
    table.set_header(
        std::iter::once(Cell::new(&chart.title).add_attribute(Attribute::Bold)).chain(
            chart.series.iter().map(|series| match series.line {
                Line::Solid => Cell::new(&series.name),
                Line::Dashed => Cell::new(&series.name).add_attribute(Attribute::Italic),
            }),
        ),
    );
    for (index, category) in chart.categories.iter().enumerate() {
        table.add_row(
            std::iter::once(Cell::new(category).add_attribute(Attribute::Dim)).chain(
                chart
                    .series
                    .iter()
                    .map(|series| value_cell(series.values.get(index).copied().flatten())),
            ),
        );
    }
    table
}

pub fn build_observations_table(observations: &[&Observation]) -> Table {
    let mut table = new_table();
    table.set_header(
        std::iter::once(DATETIME_COLUMN).chain(Metric::EXPORT_ORDER.map(Metric::column)),
    );
    for observation in observations {
        table.add_row(
            std::iter::once(Cell::new(&observation.label).add_attribute(Attribute::Dim))
                .chain(Metric::EXPORT_ORDER.map(|metric| value_cell(metric.of(observation)))),
        );
    }
    table
}

pub fn build_kpis_table(summary: &Summary) -> Table {
    let Kpis { n_rows, load, wind, pv, gas, soc } = &summary.kpis;

    let mut table = new_table();
    table.set_header(vec!["Indicator", "Value", ""]);
    table.add_row(vec![
        Cell::new("Data"),
        Cell::new(summary.first_label.as_deref().unwrap_or("—")),
        Cell::new(summary.last_label.as_deref().unwrap_or("—")),
    ]);
    table.add_row(vec![
        Cell::new("Window"),
        Cell::new(summary.start.as_deref().unwrap_or("—")),
        Cell::new(summary.end.as_deref().unwrap_or("—")),
    ]);
    table.add_row(vec![
        Cell::new("Rows"),
        Cell::new(n_rows).set_alignment(CellAlignment::Right),
        Cell::new(""),
    ]);
    for (name, stats) in [
        ("Load avg / max", load),
        ("Wind avg / max", wind),
        ("PV avg / max", pv),
        ("Gas avg / max", gas),
    ] {
        table.add_row(vec![
            Cell::new(name),
            value_cell(stats.map(|stats| stats.average)),
            value_cell(stats.map(|stats| stats.max)),
        ]);
    }
    table.add_row(vec![
        Cell::new("SOC min / max"),
        value_cell(soc.map(|stats| stats.min)),
        value_cell(soc.map(|stats| stats.max)),
    ]);
    table.add_row(vec![
        Cell::new("Plan"),
        match summary.plan_source.as_deref() {
            Some(source) => Cell::new(source).fg(Color::Green),
            None => Cell::new("none").fg(Color::DarkYellow),
        },
        Cell::new(""),
    ]);
    table.add_row(vec![
        Cell::new("Updated"),
        Cell::new(
            summary
                .last_updated
                .map_or_else(|| "—".to_owned(), |at| at.format("%Y-%m-%d %H:%M:%S").to_string()),
        ),
        Cell::new(""),
    ]);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::series::Series;

    #[test]
    fn chart_table_ok() {
        let chart = Chart::new("Test", vec!["a".to_owned(), "b".to_owned()])
            .with_series(Series::solid("Solid", vec![Some(1.0), None]))
            .with_series(Series::dashed("Dashed", vec![None, Some(2.5)]));
        let rendered = build_chart_table(&chart).to_string();
        assert!(rendered.contains("Solid"));
        assert!(rendered.contains("1.00"));
        assert!(rendered.contains("2.50"));
        assert_eq!(build_chart_table(&chart).row_iter().count(), 2);
    }

    #[test]
    fn kpis_table_shows_the_data_span() {
        let summary = Summary {
            first_label: Some("2024-01-01 00:00".to_owned()),
            last_label: Some("2024-01-02 23:00".to_owned()),
            start: None,
            end: None,
            metric: Metric::Load.label(),
            plan_source: None,
            last_updated: None,
            kpis: Kpis::collect(&[]),
            rows: Vec::new(),
        };
        let rendered = build_kpis_table(&summary).to_string();
        assert!(rendered.contains("2024-01-02 23:00"));
        assert!(rendered.contains("none"));
    }
}
