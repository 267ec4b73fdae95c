use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::{
    core::{
        coerce::Coerced,
        observation::DATETIME_COLUMN,
        series::{Chart, Series},
        time::parse_datetime,
    },
    prelude::*,
    source::RawRow,
};

/// Forecasted quantity.
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq, clap::ValueEnum)]
pub enum ForecastKind {
    #[default]
    Load,

    Wind,

    Pv,
}

impl ForecastKind {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Load => "output/Load_forecast_24h.csv",
            Self::Wind => "output/Wind_forecast_24h.csv",
            Self::Pv => "output/PV_forecast_24h.csv",
        }
    }

    /// Sibling file produced by the agent.
    #[must_use]
    pub const fn agent_path(self) -> &'static str {
        match self {
            Self::Load => "output/Load_forecast_24h_agent.csv",
            Self::Wind => "output/Wind_forecast_24h_agent.csv",
            Self::Pv => "output/PV_forecast_24h_agent.csv",
        }
    }

    #[must_use]
    pub const fn value_column(self) -> &'static str {
        match self {
            Self::Load => "Load_Forecast",
            Self::Wind => "Wind_Forecast",
            Self::Pv => "PV_Forecast",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Load => "Load forecast, MW",
            Self::Wind => "Wind forecast, MW",
            Self::Pv => "PV forecast, MW",
        }
    }
}

#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct ForecastPoint {
    pub timestamp: NaiveDateTime,
    pub label: String,
    pub value: Option<f64>,
}

impl ForecastPoint {
    fn from_raw(row: &RawRow, value_column: &str) -> Option<Self> {
        let label = row.get(DATETIME_COLUMN)?;
        Some(Self {
            timestamp: parse_datetime(label)?,
            label: label.to_owned(),
            value: Coerced::from_cell(row.get(value_column)).value(),
        })
    }
}

pub fn normalize(rows: &[RawRow], value_column: &str) -> Vec<ForecastPoint> {
    rows.iter().filter_map(|row| ForecastPoint::from_raw(row, value_column)).collect()
}

/// Align the overlay onto the primary labels.
///
/// Labels are matched verbatim, and a later duplicate overrides an earlier one.
/// Missing values are gaps.
#[must_use]
pub fn merge(primary: &[ForecastPoint], overlay: &[ForecastPoint]) -> Vec<Option<f64>> {
    let overlay: HashMap<&str, Option<f64>> =
        overlay.iter().map(|point| (point.label.as_str(), point.value)).collect();
    primary.iter().map(|point| overlay.get(point.label.as_str()).copied().flatten()).collect()
}

/// Forecast snapshot for the selected quantity.
#[must_use]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Forecast {
    pub kind: ForecastKind,
    pub primary: Vec<ForecastPoint>,
    pub overlay: Vec<ForecastPoint>,
}

impl Forecast {
    /// Primary trace solid, agent trace dashed and only when the agent produced anything.
    pub fn chart(&self) -> Chart {
        let categories = self.primary.iter().map(|point| point.label.clone()).collect();
        let chart = Chart::new(self.kind.label(), categories).with_series(Series::solid(
            "Forecast",
            self.primary.iter().map(|point| point.value).collect(),
        ));
        if self.overlay.is_empty() {
            chart
        } else {
            trace!(n_points = self.overlay.len(), "adding the agent overlay");
            chart.with_series(Series::dashed("Agent forecast", merge(&self.primary, &self.overlay)))
        }
    }
}
