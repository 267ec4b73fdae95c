use itertools::{Itertools, MinMaxResult};
use ordered_float::OrderedFloat;
use serde::Serialize;

use crate::core::observation::{Metric, Observation};

/// Summary of a single quantity over the finite values only.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Stats {
    pub min: f64,
    pub max: f64,
    pub average: f64,
}

impl Stats {
    /// [`None`] when there are no values at all.
    pub fn collect(values: impl IntoIterator<Item = Option<f64>>) -> Option<Self> {
        let values = values.into_iter().flatten().filter(|value| value.is_finite()).collect_vec();
        #[allow(clippy::cast_precision_loss)]
        let average = values.iter().sum::<f64>() / values.len() as f64;
        match values.into_iter().map(OrderedFloat).minmax() {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(value) => Some(Self { min: value.0, max: value.0, average }),
            MinMaxResult::MinMax(min, max) => Some(Self { min: min.0, max: max.0, average }),
        }
    }
}

/// Key indicators of the windowed rows.
#[must_use]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Kpis {
    pub n_rows: usize,
    pub load: Option<Stats>,
    pub wind: Option<Stats>,
    pub pv: Option<Stats>,
    pub gas: Option<Stats>,
    pub soc: Option<Stats>,
}

impl Kpis {
    pub fn collect(observations: &[&Observation]) -> Self {
        let of = |metric: Metric| Stats::collect(observations.iter().map(|row| metric.of(row)));
        Self {
            n_rows: observations.len(),
            load: of(Metric::Load),
            wind: of(Metric::Wind),
            pv: of(Metric::Pv),
            gas: of(Metric::Gas),
            soc: of(Metric::StorageSoc),
        }
    }
}
