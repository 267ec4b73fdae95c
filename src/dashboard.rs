pub mod charts;
pub mod scheduler;
pub mod session;

use std::{
    cell::RefCell,
    future::Future,
    path::PathBuf,
    pin::pin,
    rc::Rc,
    str::FromStr,
    time::Duration,
};

use bon::Builder;
use enumset::EnumSet;
use itertools::Itertools;
use tokio::{
    io::{AsyncBufReadExt, BufReader, stdin},
    task::spawn_local,
    time::{Instant, MissedTickBehavior, interval_at},
};

use self::{charts::ChartId, scheduler::SingleFlight, session::Session};
use crate::{
    core::{
        forecast::{self, Forecast},
        observation::{self, Observation, latest_soc},
        plan::{CANDIDATES, Plan, load_freshest},
        series::Downsample,
        stats::Kpis,
        window::FullRange,
    },
    export::to_csv,
    prelude::*,
    render::{Sink, Summary},
    source::Fetch,
};

/// Working set of the dashboard: the latest good snapshots plus the session.
#[derive(Builder)]
pub struct Dashboard {
    source: Box<dyn Fetch>,
    sink: Box<dyn Sink>,

    /// Primary observation file, relative to the data root.
    #[builder(into)]
    primary_file: String,

    /// Decimation of the observation and SOC charts.
    dense: Downsample,

    /// Decimation of the forecast chart.
    sparse: Downsample,

    #[builder(default = EnumSet::all())]
    charts: EnumSet<ChartId>,

    /// Number of windowed rows passed along with the summary.
    #[builder(default = 200)]
    table_limit: usize,

    #[builder(default)]
    session: RefCell<Session>,

    #[builder(skip)]
    observations: RefCell<Vec<Observation>>,

    #[builder(skip)]
    plan: RefCell<Plan>,

    #[builder(skip)]
    forecast: RefCell<Forecast>,

    #[builder(skip = SingleFlight::new("observations"))]
    observations_guard: SingleFlight,

    #[builder(skip = SingleFlight::new("plan"))]
    plan_guard: SingleFlight,

    #[builder(skip = SingleFlight::new("forecast"))]
    forecast_guard: SingleFlight,
}

impl Dashboard {
    /// Load everything and render the first time.
    ///
    /// Only the observations are required, the plan and forecast may come later.
    #[instrument(skip_all)]
    pub async fn initialize(&self, start: Option<&str>, end: Option<&str>) -> Result {
        info!(path = %self.primary_file, "loading the observations…");
        let observations = self.fetch_observations().await?;
        {
            let mut session = self.session.borrow_mut();
            session.open_window(&observations, start, end);
            session.touch();
        }
        *self.observations.borrow_mut() = observations;
        self.render_observations()?;
        tokio::join!(self.refresh_plan(), self.refresh_forecast());
        Ok(())
    }

    /// Refresh the three snapshots on every tick until interrupted.
    ///
    /// Meanwhile, [instructions][Instruction] are read from stdin line by line.
    /// Expects [`Dashboard::initialize`] to have run, so the first tick fires one period later.
    pub async fn watch(self: Rc<Self>, period: Duration) -> Result {
        ensure!(!period.is_zero(), "the refresh interval must be positive");
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut interrupted = pin!(tokio::signal::ctrl_c());
        let mut lines = BufReader::new(stdin()).lines();
        let mut is_stdin_open = true;
        info!(period = %humantime::format_duration(period), "watching…");
        loop {
            tokio::select! {
                _ = interval.tick() => self.spawn_refreshes(),
                line = lines.next_line(), if is_stdin_open => match line {
                    Ok(Some(line)) if line.trim().is_empty() => {}
                    Ok(Some(line)) => {
                        if let Err(error) = self.execute_line(&line).await {
                            warn!("failed to execute `{}`: {error:#}", line.trim());
                        }
                    }
                    Ok(None) => {
                        debug!("stdin is closed");
                        is_stdin_open = false;
                    }
                    Err(error) => {
                        warn!("failed to read stdin: {error:#}");
                        is_stdin_open = false;
                    }
                },
                result = &mut interrupted => {
                    result.context("failed to listen for Ctrl-C")?;
                    info!("interrupted");
                    return Ok(());
                }
            }
        }
    }

    async fn execute_line(&self, line: &str) -> Result {
        self.execute(line.parse()?).await
    }

    pub async fn execute(&self, instruction: Instruction) -> Result {
        match instruction {
            Instruction::Reset => {
                info!("resetting the window and the metric…");
                self.reset()
            }
            Instruction::Export(path) => {
                let csv = self.export()?;
                tokio::fs::write(&path, csv)
                    .await
                    .with_context(|| format!("failed to write `{}`", path.display()))?;
                info!(path = %path.display(), "exported");
                Ok(())
            }
        }
    }

    /// Start all the cycles as independent local tasks.
    ///
    /// A cycle which is still running skips the tick.
    pub fn spawn_refreshes(self: &Rc<Self>) {
        let this = Rc::clone(self);
        spawn_local(async move { this.refresh_observations().await });
        let this = Rc::clone(self);
        spawn_local(async move { this.refresh_plan().await });
        let this = Rc::clone(self);
        spawn_local(async move { this.refresh_forecast().await });
    }

    pub async fn refresh_observations(&self) {
        Self::guarded(&self.observations_guard, self.reload_observations()).await;
    }

    pub async fn refresh_plan(&self) {
        Self::guarded(&self.plan_guard, self.reload_plan()).await;
    }

    pub async fn refresh_forecast(&self) {
        Self::guarded(&self.forecast_guard, self.reload_forecast()).await;
    }

    async fn guarded(guard: &SingleFlight, cycle: impl Future<Output = Result>) {
        if let Some(Err(error)) = guard.run(cycle).await {
            warn!(cycle = guard.name(), "refresh failed, keeping the last snapshot: {error:#}");
        }
    }

    async fn fetch_observations(&self) -> Result<Vec<Observation>> {
        let rows = self.source.load(&self.primary_file).await?;
        let observations = observation::normalize(&rows);
        info!(n_observations = observations.len(), "loaded the observations");
        Ok(observations)
    }

    #[instrument(skip_all)]
    async fn reload_observations(&self) -> Result {
        let observations = self.fetch_observations().await?;
        {
            let mut session = self.session.borrow_mut();
            session.reclamp(&observations);
            session.touch();
        }
        *self.observations.borrow_mut() = observations;
        self.render_observations()
    }

    /// Swap in the freshest plan, or an empty one when none of the candidates is usable.
    #[instrument(skip_all)]
    async fn reload_plan(&self) -> Result {
        let Some(candidate) = load_freshest(self.source.as_ref(), &CANDIDATES).await else {
            warn!("none of the plan candidates is available, clearing the plan");
            *self.plan.borrow_mut() = Plan::default();
            return self.render_soc();
        };
        let baseline = latest_soc(self.observations.borrow().iter());
        let plan = candidate.reconcile(baseline);
        info!(
            source = ?plan.source,
            origin = ?plan.origin,
            n_points = plan.points.len(),
            "reconciled the plan",
        );
        *self.plan.borrow_mut() = plan;
        self.render_soc()
    }

    #[instrument(skip_all)]
    async fn reload_forecast(&self) -> Result {
        let kind = self.session.borrow().forecast;
        let (primary, overlay) = tokio::join!(
            self.source.load(kind.path()),
            self.source.load_optional(kind.agent_path()),
        );
        let forecast = Forecast {
            kind,
            primary: forecast::normalize(&primary?, kind.value_column()),
            overlay: overlay
                .map(|rows| forecast::normalize(&rows, kind.value_column()))
                .unwrap_or_default(),
        };
        info!(n_primary = forecast.primary.len(), n_overlay = forecast.overlay.len(), "loaded");
        *self.forecast.borrow_mut() = forecast;
        self.render_forecast()
    }

    /// Main, mix and SOC charts along with the summary.
    pub fn render_observations(&self) -> Result {
        let observations = self.observations.borrow();
        let session = self.session.borrow();
        let selected = session.select(&observations);

        if self.charts.contains(ChartId::Main) {
            self.sink.chart(ChartId::Main, &charts::main(&selected, session.metric, self.dense))?;
        }
        if self.charts.contains(ChartId::Mix) {
            self.sink.chart(ChartId::Mix, &charts::mix(&selected, self.dense))?;
        }
        self.render_soc()?;

        let range = FullRange::scan(observations.iter());
        let summary = Summary {
            first_label: range.as_ref().map(|range| range.start_label.clone()),
            last_label: range.map(|range| range.end_label),
            start: session.window.map(|window| window.start_label()),
            end: session.window.map(|window| window.end_label()),
            metric: session.metric.label(),
            plan_source: self.plan.borrow().source.clone(),
            last_updated: session.last_updated,
            kpis: Kpis::collect(&selected),
            rows: selected.into_iter().take(self.table_limit).collect_vec(),
        };
        self.sink.summary(&summary)
    }

    fn render_soc(&self) -> Result {
        if !self.charts.contains(ChartId::Soc) {
            return Ok(());
        }
        let chart = charts::soc(&self.observations.borrow(), &self.plan.borrow(), self.dense);
        self.sink.chart(ChartId::Soc, &chart)
    }

    fn render_forecast(&self) -> Result {
        if !self.charts.contains(ChartId::Forecast) {
            return Ok(());
        }
        let chart = self.forecast.borrow().chart().downsample(self.sparse);
        self.sink.chart(ChartId::Forecast, &chart)
    }

    /// Back to the recent window and the default metric, then re-render.
    pub fn reset(&self) -> Result {
        self.session.borrow_mut().reset(&self.observations.borrow());
        self.render_observations()
    }

    /// Windowed observations as CSV.
    pub fn export(&self) -> Result<String> {
        to_csv(&self.session.borrow().select(&self.observations.borrow()))
    }

    /// Windowed observations in the source order.
    #[cfg(test)]
    fn selected(&self) -> Vec<Observation> {
        self.session.borrow().select(&self.observations.borrow()).into_iter().cloned().collect()
    }
}

/// Command typed while watching.
#[derive(Debug, PartialEq, Eq)]
pub enum Instruction {
    /// Back to the recent window and the default metric.
    Reset,

    /// Write the windowed rows as CSV into the file.
    Export(PathBuf),
}

impl FromStr for Instruction {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        match line.trim().split_once(char::is_whitespace) {
            None if line.trim() == "reset" => Ok(Self::Reset),
            Some(("export", path)) if !path.trim().is_empty() => {
                Ok(Self::Export(PathBuf::from(path.trim())))
            }
            _ => bail!("expected `reset` or `export <path>`"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use tokio::{sync::Notify, task::LocalSet};

    use super::*;
    use crate::{
        core::{forecast::ForecastKind, observation::Metric, plan::Origin},
        render::recording::RecordingSink,
        source::fake::FakeSource,
    };

    const PRIMARY: &str = "primary.csv";

    const OBSERVATIONS: &str = "\
        Datetime,Load_MW,Wind_MW,PV_MW,Gas_MW_Optimized,ES_MW_Optimized,ES_SOC_Optimized\n\
        2024-01-01 00:00,10,1,0,5,-2,40\n\
        2024-01-01 01:00,12,2,1,5,2,38\n\
        2024-01-01 02:00,14,3,2,5,1,37\n";

    fn dashboard(source: &Rc<FakeSource>, sink: &RecordingSink) -> Dashboard {
        Dashboard::builder()
            .source(Box::new(Rc::clone(source)))
            .sink(Box::new(sink.clone()))
            .primary_file(PRIMARY)
            .dense(Downsample::new(NonZeroUsize::new(2500).unwrap()))
            .sparse(Downsample::new(NonZeroUsize::new(500).unwrap()))
            .session(RefCell::new(Session::new(Metric::Load, ForecastKind::Load)))
            .build()
    }

    fn source() -> Rc<FakeSource> {
        Rc::new(
            FakeSource::default()
                .with_file(PRIMARY, OBSERVATIONS)
                .with_file(
                    "output/ES_decision_6h_agent.csv",
                    "Datetime,ES_Power\n2024-01-01 03:00,2\n2024-01-01 04:00,-1\n",
                )
                .with_file(
                    "output/Load_forecast_24h.csv",
                    "Datetime,Load_Forecast\n2024-01-01 03:00,15\n2024-01-01 04:00,16\n",
                ),
        )
    }

    #[tokio::test]
    async fn initialize_ok() -> Result {
        let source = source();
        let sink = RecordingSink::default();
        let dashboard = dashboard(&source, &sink);
        dashboard.initialize(None, None).await?;

        assert_eq!(sink.n_renders(ChartId::Main), 1);
        assert_eq!(sink.n_renders(ChartId::Mix), 1);
        assert_eq!(sink.n_renders(ChartId::Forecast), 1);
        assert_eq!(*sink.n_summaries.borrow(), 1);

        let plan = dashboard.plan.borrow().clone();
        assert_eq!(plan.source.as_deref(), Some("output/ES_decision_6h_agent.csv"));
        assert_eq!(plan.origin, Some(Origin::Derived));
        let socs = plan.points.iter().map(|point| point.soc).collect_vec();
        assert_eq!(socs, [35.0, 36.0]);

        let soc = sink.last(ChartId::Soc).unwrap();
        assert_eq!(soc.categories.len(), 5);
        assert_eq!(soc.series[1].values[3], Some(35.0));

        let forecast = sink.last(ChartId::Forecast).unwrap();
        assert_eq!(forecast.series.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn initialize_fails_without_observations() {
        let source = Rc::new(FakeSource::default());
        let dashboard = dashboard(&source, &RecordingSink::default());
        assert!(dashboard.initialize(None, None).await.is_err());
    }

    #[tokio::test]
    async fn initialize_survives_missing_plan_and_forecast() -> Result {
        let source = Rc::new(FakeSource::default().with_file(PRIMARY, OBSERVATIONS));
        let sink = RecordingSink::default();
        let dashboard = dashboard(&source, &sink);
        dashboard.initialize(None, None).await?;
        assert_eq!(sink.n_renders(ChartId::Main), 1);
        assert_eq!(sink.n_renders(ChartId::Forecast), 0);
        assert!(dashboard.plan.borrow().points.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn failed_refresh_keeps_the_last_good_snapshot() -> Result {
        let source = source();
        let sink = RecordingSink::default();
        let dashboard = dashboard(&source, &sink);
        dashboard.initialize(None, None).await?;

        source.remove(PRIMARY);
        source.remove("output/Load_forecast_24h.csv");
        dashboard.refresh_observations().await;
        dashboard.refresh_forecast().await;

        assert_eq!(dashboard.observations.borrow().len(), 3);
        assert_eq!(dashboard.forecast.borrow().primary.len(), 2);
        assert_eq!(sink.n_renders(ChartId::Main), 1);
        assert_eq!(sink.n_renders(ChartId::Forecast), 1);
        Ok(())
    }

    #[tokio::test]
    async fn unusable_plan_candidates_clear_the_plan() -> Result {
        let source = source();
        let sink = RecordingSink::default();
        let dashboard = dashboard(&source, &sink);
        dashboard.initialize(None, None).await?;
        assert_eq!(dashboard.plan.borrow().points.len(), 2);

        source.remove("output/ES_decision_6h_agent.csv");
        source.put("output/ES_decision_1h_agent.csv", "Datetime,ES_Power\nsoon,1\n");
        dashboard.refresh_plan().await;

        assert_eq!(*dashboard.plan.borrow(), Plan::default());
        let soc = sink.last(ChartId::Soc).unwrap();
        assert_eq!(soc.categories.len(), 3);
        assert!(soc.series[1].values.iter().all(Option::is_none));
        Ok(())
    }

    #[tokio::test]
    async fn refresh_keeps_the_window() -> Result {
        let source = source();
        let sink = RecordingSink::default();
        let dashboard = dashboard(&source, &sink);
        dashboard.initialize(Some("2024-01-01 01:00"), Some("2024-01-01 02:00")).await?;
        assert_eq!(dashboard.selected().len(), 2);

        source.put(
            PRIMARY,
            "Datetime,Load_MW\n2024-01-01 00:00,1\n2024-01-01 01:00,2\n2024-01-01 01:30,3\n",
        );
        dashboard.refresh_observations().await;
        let labels = dashboard.selected().into_iter().map(|row| row.label).collect_vec();
        assert_eq!(labels, ["2024-01-01 01:00", "2024-01-01 01:30"]);

        dashboard.execute(Instruction::Reset).await?;
        assert_eq!(dashboard.selected().len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn export_instruction_writes_the_window() -> Result {
        let source = source();
        let dashboard = dashboard(&source, &RecordingSink::default());
        dashboard.initialize(Some("2024-01-01 01:00"), None).await?;

        let directory = tempfile::tempdir()?;
        let path = directory.path().join("window.csv");
        let line = format!("export {}", path.display());
        dashboard.execute(line.parse()?).await?;

        let exported = std::fs::read_to_string(&path)?;
        let labels = exported.lines().skip(1).map(|line| &line[..16]).collect_vec();
        assert_eq!(labels, ["2024-01-01 01:00", "2024-01-01 02:00"]);
        Ok(())
    }

    #[test]
    fn instruction_ok() -> Result {
        assert_eq!(" reset ".parse::<Instruction>()?, Instruction::Reset);
        assert_eq!(
            "export  out/window.csv".parse::<Instruction>()?,
            Instruction::Export(PathBuf::from("out/window.csv")),
        );
        assert!("export".parse::<Instruction>().is_err());
        assert!("reset now".parse::<Instruction>().is_err());
        assert!("refresh".parse::<Instruction>().is_err());
        Ok(())
    }

    #[tokio::test]
    async fn forecast_overlay_is_dashed() -> Result {
        let source = source();
        source.put(
            "output/Load_forecast_24h_agent.csv",
            "Datetime,Load_Forecast\n2024-01-01 04:00,20\n",
        );
        let sink = RecordingSink::default();
        dashboard(&source, &sink).initialize(None, None).await?;
        let forecast = sink.last(ChartId::Forecast).unwrap();
        assert_eq!(forecast.series[1].values, [None, Some(20.0)]);
        Ok(())
    }

    #[tokio::test]
    async fn chart_selection_ok() -> Result {
        let source = source();
        let sink = RecordingSink::default();
        let dashboard = Dashboard::builder()
            .source(Box::new(Rc::clone(&source)))
            .sink(Box::new(sink.clone()))
            .primary_file(PRIMARY)
            .dense(Downsample::new(NonZeroUsize::new(2500).unwrap()))
            .sparse(Downsample::new(NonZeroUsize::new(500).unwrap()))
            .charts(ChartId::Soc | ChartId::Forecast)
            .build();
        dashboard.initialize(None, None).await?;
        assert_eq!(sink.n_renders(ChartId::Main), 0);
        assert_eq!(sink.n_renders(ChartId::Mix), 0);
        assert!(sink.n_renders(ChartId::Soc) >= 1);
        Ok(())
    }

    #[tokio::test]
    async fn overlapping_ticks_refresh_once() -> Result {
        let gate = Rc::new(Notify::new());
        let source = Rc::new(
            FakeSource::default().with_file(PRIMARY, OBSERVATIONS).with_gate(Rc::clone(&gate)),
        );
        let sink = RecordingSink::default();
        let dashboard = Rc::new(dashboard(&source, &sink));

        LocalSet::new()
            .run_until(async {
                dashboard.spawn_refreshes();
                dashboard.spawn_refreshes();
                tokio::task::yield_now().await;
                for _ in 0..16 {
                    gate.notify_one();
                    tokio::task::yield_now().await;
                }
            })
            .await;

        assert_eq!(source.n_fetches(PRIMARY), 1);
        assert_eq!(source.n_fetches("output/Load_forecast_24h.csv"), 1);
        Ok(())
    }
}
