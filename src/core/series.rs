use std::num::NonZeroUsize;

use serde::Serialize;

/// What the rendering sink draws: a category axis and parallel named series.
#[must_use]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Chart {
    pub title: String,
    pub categories: Vec<String>,
    pub series: Vec<Series>,
}

impl Chart {
    pub fn new(title: impl Into<String>, categories: Vec<String>) -> Self {
        Self { title: title.into(), categories, series: Vec::new() }
    }

    pub fn with_series(mut self, series: Series) -> Self {
        debug_assert_eq!(series.values.len(), self.categories.len(), "{}", series.name);
        self.series.push(series);
        self
    }

    /// Decimate the axis and every series synchronously.
    pub fn downsample(self, downsample: Downsample) -> Self {
        if downsample.stride(self.categories.len()) == 1 {
            return self;
        }
        Self {
            title: self.title,
            categories: downsample.apply(&self.categories),
            series: self
                .series
                .into_iter()
                .map(|series| Series { values: downsample.apply(&series.values), ..series })
                .collect(),
        }
    }
}

#[must_use]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Series {
    pub name: String,

    /// [`None`] is drawn as a gap.
    pub values: Vec<Option<f64>>,

    pub line: Line,
}

impl Series {
    pub fn solid(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self { name: name.into(), values, line: Line::Solid }
    }

    pub fn dashed(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self { name: name.into(), values, line: Line::Dashed }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Line {
    #[default]
    Solid,

    /// Agent-produced overlays.
    Dashed,
}

/// Fixed-stride decimation bounding the number of plotted points.
#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Downsample {
    pub cap: NonZeroUsize,
}

impl Downsample {
    pub const fn new(cap: NonZeroUsize) -> Self {
        Self { cap }
    }

    /// `ceil(n / cap)`, which is `1` when the series already fits.
    #[must_use]
    pub const fn stride(self, n_points: usize) -> usize {
        if n_points <= self.cap.get() { 1 } else { n_points.div_ceil(self.cap.get()) }
    }

    /// Strictly increasing indices of the kept points.
    pub fn indices(self, n_points: usize) -> impl Iterator<Item = usize> {
        (0..n_points).step_by(self.stride(n_points))
    }

    #[must_use]
    pub fn apply<T: Clone>(self, values: &[T]) -> Vec<T> {
        self.indices(values.len()).map(|index| values[index].clone()).collect()
    }
}
