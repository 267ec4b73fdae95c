use std::num::NonZeroUsize;

use clap::Parser;

use crate::{
    core::{forecast::ForecastKind, observation::Metric, series::Downsample},
    dashboard::session::Session,
    prelude::*,
    source::{self, Fetch},
};

#[derive(Parser)]
pub struct DataArgs {
    /// Data root: a local directory or an `http(s)://` base URL.
    #[clap(long = "data", env = "VPP_DATA", default_value = "data")]
    pub location: String,

    /// Primary observation file, relative to the data root.
    #[clap(long, env = "VPP_PRIMARY_FILE", default_value = "VPP一年优化数据.csv")]
    pub primary_file: String,

    /// Window start, for example `2024-01-01 00:00`. Defaults to 24 hours before the latest row.
    #[clap(long, env = "VPP_START")]
    pub start: Option<String>,

    /// Window end. Defaults to the latest row.
    #[clap(long, env = "VPP_END")]
    pub end: Option<String>,

    #[clap(long, env = "VPP_METRIC", value_enum, default_value_t)]
    pub metric: Metric,

    #[clap(long, env = "VPP_FORECAST", value_enum, default_value_t)]
    pub forecast: ForecastKind,

    /// Maximum number of points in the observation and SOC charts.
    #[clap(long, env = "VPP_DENSE_CAP", default_value = "2500")]
    pub dense_cap: NonZeroUsize,

    /// Maximum number of points in the forecast chart.
    #[clap(long, env = "VPP_SPARSE_CAP", default_value = "500")]
    pub sparse_cap: NonZeroUsize,
}

impl DataArgs {
    pub fn open(&self) -> Result<Box<dyn Fetch>> {
        source::open(&self.location)
    }

    pub const fn downsample_dense(&self) -> Downsample {
        Downsample::new(self.dense_cap)
    }

    pub const fn downsample_sparse(&self) -> Downsample {
        Downsample::new(self.sparse_cap)
    }

    /// Empty session with the selected metric and forecast.
    pub const fn session(&self) -> Session {
        Session::new(self.metric, self.forecast)
    }
}
