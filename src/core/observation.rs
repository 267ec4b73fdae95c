use chrono::NaiveDateTime;
use serde::Serialize;

use crate::{
    core::{coerce::Coerced, time::parse_datetime},
    prelude::*,
    source::RawRow,
};

pub const DATETIME_COLUMN: &str = "Datetime";

/// Plotted observation quantity.
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq, clap::ValueEnum)]
pub enum Metric {
    #[default]
    Load,

    Wind,

    Pv,

    /// Dispatchable gas generation.
    Gas,

    /// Storage power: discharging is positive, charging is negative.
    StoragePower,

    /// Storage state of charge.
    StorageSoc,
}

impl Metric {
    /// Column order of the CSV export.
    pub const EXPORT_ORDER: [Self; 6] =
        [Self::Load, Self::Wind, Self::Pv, Self::StoragePower, Self::Gas, Self::StorageSoc];

    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Load => "Load_MW",
            Self::Wind => "Wind_MW",
            Self::Pv => "PV_MW",
            Self::Gas => "Gas_MW_Optimized",
            Self::StoragePower => "ES_MW_Optimized",
            Self::StorageSoc => "ES_SOC_Optimized",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Load => "Load, MW",
            Self::Wind => "Wind, MW",
            Self::Pv => "PV, MW",
            Self::Gas => "Gas, MW",
            Self::StoragePower => "Storage power, MW (discharge positive, charge negative)",
            Self::StorageSoc => "Storage SOC",
        }
    }

    #[must_use]
    pub fn of(self, observation: &Observation) -> Option<f64> {
        match self {
            Self::Load => observation.load,
            Self::Wind => observation.wind_power,
            Self::Pv => observation.pv_power,
            Self::Gas => observation.gas_power,
            Self::StoragePower => observation.storage_power,
            Self::StorageSoc => observation.storage_soc,
        }
    }
}

/// Canonical row of the primary data set.
#[must_use]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Observation {
    pub timestamp: NaiveDateTime,

    /// Original `Datetime` cell, used verbatim as the chart category.
    pub label: String,

    pub load: Option<f64>,
    pub wind_power: Option<f64>,
    pub pv_power: Option<f64>,
    pub gas_power: Option<f64>,
    pub storage_power: Option<f64>,
    pub storage_soc: Option<f64>,
}

impl Observation {
    /// Normalize the raw row, or [`None`] when its `Datetime` does not parse.
    pub fn from_raw(row: &RawRow) -> Option<Self> {
        let label = row.get(DATETIME_COLUMN)?;
        let timestamp = parse_datetime(label)?;
        let number = |metric: Metric| Coerced::from_cell(row.get(metric.column())).value();
        Some(Self {
            timestamp,
            label: label.to_owned(),
            load: number(Metric::Load),
            wind_power: number(Metric::Wind),
            pv_power: number(Metric::Pv),
            gas_power: number(Metric::Gas),
            storage_power: number(Metric::StoragePower),
            storage_soc: number(Metric::StorageSoc),
        })
    }
}

/// Normalize the raw rows preserving their order and dropping those with an unparseable `Datetime`.
#[instrument(skip_all, fields(n_rows = rows.len()))]
pub fn normalize(rows: &[RawRow]) -> Vec<Observation> {
    let observations: Vec<_> = rows.iter().filter_map(Observation::from_raw).collect();
    if observations.len() != rows.len() {
        debug!(n_dropped = rows.len() - observations.len(), "dropped rows without a valid timestamp");
    }
    observations
}

/// Get the most recently observed state of charge.
///
/// Rows without a finite SOC are skipped. On equal timestamps, the later row wins.
#[must_use]
pub fn latest_soc<'a>(observations: impl IntoIterator<Item = &'a Observation>) -> Option<f64> {
    observations
        .into_iter()
        .filter_map(|observation| Some((observation.timestamp, observation.storage_soc?)))
        .fold(None, |latest: Option<(NaiveDateTime, f64)>, (timestamp, soc)| match latest {
            Some((latest_timestamp, _)) if timestamp < latest_timestamp => latest,
            _ => Some((timestamp, soc)),
        })
        .map(|(_, soc)| soc)
}

#[cfg(test)]
pub(crate) fn observation(label: &str, load: Option<f64>, soc: Option<f64>) -> Observation {
    Observation {
        timestamp: parse_datetime(label).unwrap(),
        label: label.to_owned(),
        load,
        wind_power: None,
        pv_power: None,
        gas_power: None,
        storage_power: None,
        storage_soc: soc,
    }
}
