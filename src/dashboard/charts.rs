use itertools::Itertools;

use crate::{
    core::{
        observation::{Metric, Observation},
        plan::Plan,
        series::{Chart, Downsample, Series},
        window::Window,
    },
    dashboard::session::recent_span,
};

#[derive(Debug, clap::ValueEnum, enumset::EnumSetType)]
pub enum ChartId {
    /// Selected metric over the window.
    Main,

    /// Generation mix and storage power.
    Mix,

    /// Recent actual SOC followed by the planned one.
    Soc,

    Forecast,
}

impl ChartId {
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Mix => "mix",
            Self::Soc => "soc",
            Self::Forecast => "forecast",
        }
    }
}

fn categories(observations: &[&Observation]) -> Vec<String> {
    observations.iter().map(|observation| observation.label.clone()).collect()
}

fn values(observations: &[&Observation], metric: Metric) -> Vec<Option<f64>> {
    observations.iter().map(|observation| metric.of(observation)).collect()
}

pub fn main(observations: &[&Observation], metric: Metric, downsample: Downsample) -> Chart {
    Chart::new(metric.label(), categories(observations))
        .with_series(Series::solid(metric.column(), values(observations, metric)))
        .downsample(downsample)
}

pub fn mix(observations: &[&Observation], downsample: Downsample) -> Chart {
    [
        ("Wind_MW", Metric::Wind),
        ("PV_MW", Metric::Pv),
        ("Gas_MW", Metric::Gas),
        ("ES_MW", Metric::StoragePower),
        ("Load_MW", Metric::Load),
    ]
    .into_iter()
    .fold(
        Chart::new("Generation and storage power, MW", categories(observations)),
        |chart, (name, metric)| chart.with_series(Series::solid(name, values(observations, metric))),
    )
    .downsample(downsample)
}

/// Actual SOC over the trailing day, then the plan points strictly after the last actual one.
///
/// The two traces share the axis but never a category.
pub fn soc(observations: &[Observation], plan: &Plan, downsample: Downsample) -> Chart {
    let actual = Window::recent(observations, recent_span())
        .map(|window| window.select(observations))
        .unwrap_or_default()
        .into_iter()
        .sorted_by_key(|observation| observation.timestamp)
        .collect_vec();
    let planned = match actual.last() {
        Some(last) => {
            plan.points.iter().filter(|point| point.timestamp > last.timestamp).collect_vec()
        }
        None => plan.points.iter().collect_vec(),
    };

    let categories = actual
        .iter()
        .map(|observation| observation.label.clone())
        .chain(planned.iter().map(|point| point.label.clone()))
        .collect();
    let actual_values = actual
        .iter()
        .map(|observation| observation.storage_soc)
        .chain(planned.iter().map(|_| None))
        .collect();
    let planned_values = actual
        .iter()
        .map(|_| None)
        .chain(planned.iter().map(|point| Some(point.soc)))
        .collect();

    Chart::new("Storage plan SOC, MWh", categories)
        .with_series(Series::solid("Actual SOC (24h)", actual_values))
        .with_series(Series::solid("Planned SOC", planned_values))
        .downsample(downsample)
}
