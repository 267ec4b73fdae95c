//! Rendering sinks.

use std::{fs, num::NonZeroUsize, path::PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::{
    core::{
        observation::Observation,
        series::{Chart, Downsample},
        stats::Kpis,
    },
    dashboard::charts::ChartId,
    prelude::*,
    tables::{build_chart_table, build_kpis_table, build_observations_table},
};

/// Everything besides the charts which is refreshed along with the observations.
#[must_use]
#[derive(Debug, Serialize)]
pub struct Summary<'a> {
    /// Label of the earliest loaded row.
    pub first_label: Option<String>,

    /// Label of the latest loaded row.
    pub last_label: Option<String>,

    pub start: Option<String>,
    pub end: Option<String>,
    pub metric: &'static str,
    pub plan_source: Option<String>,
    pub last_updated: Option<DateTime<Local>>,
    pub kpis: Kpis,

    /// Leading windowed rows.
    pub rows: Vec<&'a Observation>,
}

/// Accepts ready-to-draw charts. Rendering never suspends.
pub trait Sink {
    fn chart(&self, id: ChartId, chart: &Chart) -> Result;

    fn summary(&self, summary: &Summary) -> Result;
}

/// Prints the charts as tables, decimated down to the row limit.
pub struct TerminalSink {
    downsample: Downsample,
}

impl TerminalSink {
    pub const fn new(row_limit: NonZeroUsize) -> Self {
        Self { downsample: Downsample::new(row_limit) }
    }
}

impl Sink for TerminalSink {
    fn chart(&self, id: ChartId, chart: &Chart) -> Result {
        let chart = chart.clone().downsample(self.downsample);
        info!(chart = id.slug(), n_points = chart.categories.len(), "rendering…");
        println!("{}", build_chart_table(&chart));
        Ok(())
    }

    fn summary(&self, summary: &Summary) -> Result {
        println!("{}", build_kpis_table(summary));
        if !summary.rows.is_empty() {
            println!("{}", build_observations_table(&summary.rows));
        }
        Ok(())
    }
}

/// Writes `<chart>.json` and `summary.json` into the directory, replacing the previous ones.
pub struct JsonSink {
    directory: PathBuf,
}

impl JsonSink {
    #[instrument(skip_all, fields(directory = %directory.display()))]
    pub fn new(directory: PathBuf) -> Result<Self> {
        fs::create_dir_all(&directory)
            .with_context(|| format!("failed to create `{}`", directory.display()))?;
        Ok(Self { directory })
    }

    fn write(&self, name: &str, value: &impl Serialize) -> Result {
        let path = self.directory.join(format!("{name}.json"));
        let contents = serde_json::to_vec_pretty(value)?;
        fs::write(&path, contents).with_context(|| format!("failed to write `{}`", path.display()))?;
        debug!(path = %path.display(), "written");
        Ok(())
    }
}

impl Sink for JsonSink {
    fn chart(&self, id: ChartId, chart: &Chart) -> Result {
        self.write(id.slug(), chart)
    }

    fn summary(&self, summary: &Summary) -> Result {
        self.write("summary", summary)
    }
}

#[cfg(test)]
pub mod recording {
    use std::{cell::RefCell, rc::Rc};

    use super::*;

    /// Keeps the rendered charts for inspection.
    #[derive(Clone, Default)]
    pub struct RecordingSink {
        pub charts: Rc<RefCell<Vec<(ChartId, Chart)>>>,
        pub n_summaries: Rc<RefCell<usize>>,
    }

    impl RecordingSink {
        pub fn n_renders(&self, id: ChartId) -> usize {
            self.charts.borrow().iter().filter(|(rendered, _)| *rendered == id).count()
        }

        pub fn last(&self, id: ChartId) -> Option<Chart> {
            self.charts
                .borrow()
                .iter()
                .rev()
                .find(|(rendered, _)| *rendered == id)
                .map(|(_, chart)| chart.clone())
        }
    }

    impl Sink for RecordingSink {
        fn chart(&self, id: ChartId, chart: &Chart) -> Result {
            self.charts.borrow_mut().push((id, chart.clone()));
            Ok(())
        }

        fn summary(&self, _summary: &Summary) -> Result {
            *self.n_summaries.borrow_mut() += 1;
            Ok(())
        }
    }
}
