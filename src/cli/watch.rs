use std::{convert::Infallible, num::NonZeroUsize, path::PathBuf, rc::Rc, str::FromStr};

use clap::Parser;
use enumset::EnumSet;
use tokio::task::LocalSet;

use crate::{
    cli::data::DataArgs,
    dashboard::{Dashboard, charts::ChartId},
    prelude::*,
    render::{JsonSink, Sink, TerminalSink},
};

/// Where the charts go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Output {
    Terminal,

    /// Directory with a JSON file per chart.
    Json(PathBuf),
}

impl FromStr for Output {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(if value == "terminal" { Self::Terminal } else { Self::Json(PathBuf::from(value)) })
    }
}

#[derive(Parser)]
pub struct WatchArgs {
    #[clap(flatten)]
    data: DataArgs,

    #[clap(long, env = "VPP_REFRESH_INTERVAL", default_value = "1min")]
    interval: humantime::Duration,

    /// Render a single time and exit.
    #[clap(long)]
    once: bool,

    /// Charts to draw.
    #[clap(
        long,
        env = "VPP_CHARTS",
        value_enum,
        value_delimiter = ',',
        num_args = 1..,
        default_value = "main,mix,soc,forecast",
    )]
    charts: Vec<ChartId>,

    /// `terminal` or a directory to write JSON charts into.
    #[clap(long, env = "VPP_OUTPUT", default_value = "terminal")]
    output: Output,

    /// Maximum number of rows in the printed tables.
    #[clap(long, env = "VPP_TABLE_LIMIT", default_value = "200")]
    table_limit: NonZeroUsize,
}

impl WatchArgs {
    fn charts(&self) -> EnumSet<ChartId> {
        self.charts.iter().copied().collect()
    }

    fn sink(&self) -> Result<Box<dyn Sink>> {
        Ok(match &self.output {
            Output::Terminal => Box::new(TerminalSink::new(self.table_limit)),
            Output::Json(directory) => Box::new(JsonSink::new(directory.clone())?),
        })
    }

    #[instrument(skip_all, fields(data = %self.data.location))]
    pub async fn run(self) -> Result {
        let dashboard = Dashboard::builder()
            .source(self.data.open()?)
            .sink(self.sink()?)
            .primary_file(self.data.primary_file.as_str())
            .dense(self.data.downsample_dense())
            .sparse(self.data.downsample_sparse())
            .charts(self.charts())
            .table_limit(self.table_limit.get())
            .session(self.data.session().into())
            .build();
        dashboard
            .initialize(self.data.start.as_deref(), self.data.end.as_deref())
            .await
            .context("failed to load the observations")?;
        if self.once {
            return Ok(());
        }
        LocalSet::new().run_until(Rc::new(dashboard).watch(self.interval.into())).await
    }
}
