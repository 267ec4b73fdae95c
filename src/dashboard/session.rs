use chrono::{DateTime, Local, TimeDelta};

use crate::core::{
    forecast::ForecastKind,
    observation::{Metric, Observation},
    time::parse_datetime,
    window::{FullRange, Window},
};

/// Length of the default window and of the actual SOC trace.
pub const RECENT_HOURS: i64 = 24;

#[must_use]
pub fn recent_span() -> TimeDelta {
    TimeDelta::hours(RECENT_HOURS)
}

/// User selections which survive the refreshes.
#[must_use]
#[derive(Clone, Debug, Default)]
pub struct Session {
    /// [`None`] until there is at least one observation.
    pub window: Option<Window>,

    pub metric: Metric,
    pub forecast: ForecastKind,
    pub last_updated: Option<DateTime<Local>>,
}

impl Session {
    pub const fn new(metric: Metric, forecast: ForecastKind) -> Self {
        Self { window: None, metric, forecast, last_updated: None }
    }

    /// Open the window from the user-entered bounds.
    ///
    /// An omitted bound defaults to the recent window, an unparseable one to the data span.
    pub fn open_window(
        &mut self,
        observations: &[Observation],
        start: Option<&str>,
        end: Option<&str>,
    ) {
        let (Some(range), Some(recent)) =
            (FullRange::scan(observations), Window::recent(observations, recent_span()))
        else {
            self.window = None;
            return;
        };
        let start = start.map_or(Some(recent.start), parse_datetime);
        let end = end.map_or(Some(recent.end), parse_datetime);
        self.window = Some(Window::clamp(start, end, range.span()));
    }

    /// Keep the selection but force it into the span of the fresh observations.
    ///
    /// Without observations there is nothing to clamp against, and the selection stays.
    pub fn reclamp(&mut self, observations: &[Observation]) {
        match (self.window, FullRange::scan(observations)) {
            (Some(window), Some(range)) => {
                self.window =
                    Some(Window::clamp(Some(window.start), Some(window.end), range.span()));
            }
            (None, Some(_)) => self.open_window(observations, None, None),
            (_, None) => {}
        }
    }

    /// Back to the recent window and the default metric.
    pub fn reset(&mut self, observations: &[Observation]) {
        self.metric = Metric::default();
        self.open_window(observations, None, None);
    }

    pub fn select<'a>(&self, observations: &'a [Observation]) -> Vec<&'a Observation> {
        self.window.map_or_else(Vec::new, |window| window.select(observations))
    }

    pub fn touch(&mut self) {
        self.last_updated = Some(Local::now());
    }
}
