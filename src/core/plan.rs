//! Storage plan reconciliation.
//!
//! Several optimization horizons produce competing plan files. Only the freshest one is shown,
//! and its state-of-charge trajectory is reconstructed from power when the file omits SOC.

use chrono::NaiveDateTime;
use futures_util::future::join_all;
use itertools::Itertools;

use crate::{
    core::{coerce::Coerced, observation::DATETIME_COLUMN, time::parse_datetime},
    prelude::*,
    source::{Fetch, RawRow},
};

/// Plan candidate files in declaration order, which breaks ties in freshness.
pub const CANDIDATES: [&str; 4] = [
    "output/ES_decision_24h_agent.csv",
    "output/ES_decision_12h_agent.csv",
    "output/ES_decision_6h_agent.csv",
    "output/ES_decision_1h_agent.csv",
];

/// Columns which report the state of charge, by priority.
pub const SOC_COLUMNS: [&str; 4] = ["SOC", "ES_SOC_Decision", "ES_SOC_Optimized", "ES_SOC"];

/// Columns which report the storage power, by priority. Discharging is positive.
pub const POWER_COLUMNS: [&str; 4] = ["ES_Power", "ES_MW_Decision", "ES_MW", "ES_MW_Optimized"];

/// Parsed plan file row.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct PlanRow {
    pub timestamp: NaiveDateTime,
    pub label: String,
    pub soc: Option<f64>,
    pub power: Option<f64>,
}

impl PlanRow {
    pub fn from_raw(row: &RawRow) -> Option<Self> {
        let label = row.get(DATETIME_COLUMN)?;
        Some(Self {
            timestamp: parse_datetime(label)?,
            label: label.to_owned(),
            soc: Coerced::from_cell(row.first_of(&SOC_COLUMNS)).value(),
            power: Coerced::from_cell(row.first_of(&POWER_COLUMNS)).value(),
        })
    }
}

/// Successfully loaded plan file with at least one timestamped row.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub path: String,
    pub rows: Vec<PlanRow>,
    pub latest: NaiveDateTime,
}

impl Candidate {
    /// Parse the candidate rows, or [`None`] if none of them has a valid timestamp.
    pub fn parse(path: impl Into<String>, rows: &[RawRow]) -> Option<Self> {
        let rows = rows.iter().filter_map(PlanRow::from_raw).collect_vec();
        let latest = rows.iter().map(|row| row.timestamp).max()?;
        Some(Self { path: path.into(), rows, latest })
    }

    /// Build the SOC trajectory to render.
    ///
    /// Reported SOC wins whenever any row has one, and then only those rows are used.
    /// Otherwise, the power is integrated from the baseline: positive power discharges.
    /// Without a baseline, the trajectory is empty.
    pub fn reconcile(self, baseline: Option<f64>) -> Plan {
        let origin = if self.rows.iter().any(|row| row.soc.is_some()) {
            Origin::Reported
        } else {
            Origin::Derived
        };
        let points = match origin {
            Origin::Reported => self
                .rows
                .into_iter()
                .filter_map(|row| Some(PlanPoint::new(row.timestamp, row.label, row.soc?)))
                .sorted_by_key(|point| point.timestamp)
                .collect(),
            Origin::Derived => match baseline {
                Some(baseline) => integrate(self.rows, baseline),
                None => {
                    warn!(path = %self.path, "no observed state of charge to start the plan from");
                    Vec::new()
                }
            },
        };
        Plan { source: Some(self.path), origin: Some(origin), points }
    }
}

/// `soc[i] = soc[i - 1] - power[i]`, seeded by the baseline, over the rows sorted by time.
fn integrate(rows: Vec<PlanRow>, baseline: f64) -> Vec<PlanPoint> {
    rows.into_iter()
        .filter_map(|row| Some((row.timestamp, row.label, row.power?)))
        .sorted_by_key(|(timestamp, _, _)| *timestamp)
        .scan(baseline, |soc, (timestamp, label, power)| {
            *soc -= power;
            Some(PlanPoint::new(timestamp, label, *soc))
        })
        .collect()
}

/// Pick the candidate with the latest timestamp, the earliest declared one on a tie.
pub fn select_freshest(candidates: impl IntoIterator<Item = Candidate>) -> Option<Candidate> {
    candidates.into_iter().reduce(|freshest, candidate| {
        if candidate.latest > freshest.latest { candidate } else { freshest }
    })
}

/// Load all the candidates concurrently and pick the freshest one.
///
/// Unavailable and unparseable candidates are skipped.
#[instrument(skip_all, fields(n_candidates = paths.len()))]
pub async fn load_freshest(source: &dyn Fetch, paths: &[&str]) -> Option<Candidate> {
    let loaded = join_all(paths.iter().map(|path| async move {
        let rows = source.load_optional(path).await?;
        let candidate = Candidate::parse(*path, &rows);
        if candidate.is_none() {
            debug!(path, "candidate has no timestamped rows");
        }
        candidate
    }))
    .await;
    let freshest = select_freshest(loaded.into_iter().flatten());
    if let Some(candidate) = &freshest {
        info!(path = %candidate.path, latest = %candidate.latest, "picked the plan");
    }
    freshest
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Origin {
    /// The file reports the state of charge.
    Reported,

    /// The state of charge is integrated from the reported power.
    Derived,
}

#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct PlanPoint {
    pub timestamp: NaiveDateTime,
    pub label: String,
    pub soc: f64,
}

impl PlanPoint {
    pub const fn new(timestamp: NaiveDateTime, label: String, soc: f64) -> Self {
        Self { timestamp, label, soc }
    }
}

/// Active storage plan.
#[must_use]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Plan {
    /// Path of the picked candidate.
    pub source: Option<String>,

    pub origin: Option<Origin>,

    pub points: Vec<PlanPoint>,
}
