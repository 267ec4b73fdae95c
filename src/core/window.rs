use std::fmt::{Debug, Formatter};

use chrono::{NaiveDateTime, TimeDelta};

use crate::core::{
    observation::Observation,
    time::{format_label, parse_datetime},
};

/// Time span of the whole observation set.
#[must_use]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FullRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,

    /// Original label of the earliest row.
    pub start_label: String,

    /// Original label of the latest row.
    pub end_label: String,
}

impl FullRange {
    /// Scan the rows once, or [`None`] when there are none.
    pub fn scan<'a>(observations: impl IntoIterator<Item = &'a Observation>) -> Option<Self> {
        let mut observations = observations.into_iter();
        let first = observations.next()?;
        let (mut earliest, mut latest) = (first, first);
        for observation in observations {
            if observation.timestamp < earliest.timestamp {
                earliest = observation;
            }
            if observation.timestamp > latest.timestamp {
                latest = observation;
            }
        }
        Some(Self {
            start: earliest.timestamp,
            end: latest.timestamp,
            start_label: label_or_formatted(earliest),
            end_label: label_or_formatted(latest),
        })
    }

    pub const fn span(&self) -> Window {
        Window::new(self.start, self.end)
    }
}

fn label_or_formatted(observation: &Observation) -> String {
    if observation.label.trim().is_empty() {
        format_label(observation.timestamp)
    } else {
        observation.label.clone()
    }
}

/// Inclusive time window.
#[must_use]
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct Window {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Debug for Window {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}..={:?}", self.start, self.end)
    }
}

impl Window {
    pub const fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Trailing window ending at the latest observation.
    ///
    /// The start saturates at the earliest representable instant.
    pub fn recent<'a>(
        observations: impl IntoIterator<Item = &'a Observation>,
        duration: TimeDelta,
    ) -> Option<Self> {
        let range = FullRange::scan(observations)?;
        let start = range.end.checked_sub_signed(duration).unwrap_or(NaiveDateTime::MIN);
        Some(Self::new(start, range.end))
    }

    /// Force the candidate bounds into the range, swapping them if they end up inverted.
    ///
    /// Missing bounds fall back to the respective ends of the range.
    pub fn clamp(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>, range: Self) -> Self {
        let start = start.map_or(range.start, |start| start.clamp(range.start, range.end));
        let end = end.map_or(range.end, |end| end.clamp(range.start, range.end));
        Self::new(start.min(end), start.max(end))
    }

    #[must_use]
    pub fn contains(self, timestamp: NaiveDateTime) -> bool {
        (self.start <= timestamp) && (timestamp <= self.end)
    }

    /// Select the rows inside the window, preserving their order.
    pub fn select<'a>(self, observations: &'a [Observation]) -> Vec<&'a Observation> {
        observations.iter().filter(|observation| self.contains(observation.timestamp)).collect()
    }

    #[must_use]
    pub fn start_label(self) -> String {
        format_label(self.start)
    }

    #[must_use]
    pub fn end_label(self) -> String {
        format_label(self.end)
    }
}

/// Select the rows between two user-entered labels, inclusive and preserving the order.
///
/// An unparseable bound leaves that side open.
pub fn select<'a>(observations: &'a [Observation], start: &str, end: &str) -> Vec<&'a Observation> {
    let start = parse_datetime(start).unwrap_or(NaiveDateTime::MIN);
    let end = parse_datetime(end).unwrap_or(NaiveDateTime::MAX);
    Window::new(start, end).select(observations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{observation::observation, time::at};

    fn rows() -> Vec<Observation> {
        vec![
            observation("2024-01-01 01:00", Some(12.0), None),
            observation("2024-01-01 00:00", Some(10.0), None),
            observation("2024-01-01 03:00", Some(14.0), None),
            observation("2024-01-01 02:00", Some(13.0), None),
        ]
    }

    fn span() -> Window {
        Window::new(at("2024-01-01 00:00"), at("2024-01-01 03:00"))
    }

    #[test]
    fn full_range_ok() {
        let range = FullRange::scan(&rows()).unwrap();
        assert_eq!(range.start, at("2024-01-01 00:00"));
        assert_eq!(range.end, at("2024-01-01 03:00"));
        assert_eq!(range.start_label, "2024-01-01 00:00");
        assert_eq!(range.end_label, "2024-01-01 03:00");
    }

    #[test]
    fn full_range_falls_back_to_formatted_label() {
        let mut rows = rows();
        rows[2].label = String::new();
        let range = FullRange::scan(&rows).unwrap();
        assert_eq!(range.end_label, "2024/1/1 3:00");
    }

    #[test]
    fn full_range_empty() {
        assert_eq!(FullRange::scan(std::iter::empty()), None);
    }

    #[test]
    fn recent_ok() {
        let window = Window::recent(&rows(), TimeDelta::hours(2)).unwrap();
        assert_eq!(window, Window::new(at("2024-01-01 01:00"), at("2024-01-01 03:00")));
        assert_eq!(window.start_label(), "2024/1/1 1:00");
    }

    #[test]
    fn recent_saturates_at_the_earliest_instant() {
        let rows = [Observation {
            timestamp: NaiveDateTime::MIN,
            ..observation("2024-01-01 00:00", None, None)
        }];
        let window = Window::recent(&rows, TimeDelta::hours(24)).unwrap();
        assert_eq!(window, Window::new(NaiveDateTime::MIN, NaiveDateTime::MIN));
    }

    #[test]
    fn select_concrete_scenario() {
        let rows = vec![
            observation("2024-01-01 00:00", Some(10.0), None),
            observation("2024-01-01 01:00", Some(12.0), None),
        ];
        let selected = select(&rows, "2024-01-01 00:00", "2024-01-01 00:30");
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].load, Some(10.0));
    }

    #[test]
    fn select_preserves_order() {
        let rows = rows();
        let labels: Vec<_> = select(&rows, "2024/1/1 1:00", "2024/1/1 2:00")
            .into_iter()
            .map(|observation| observation.label.as_str())
            .collect();
        assert_eq!(labels, ["2024-01-01 01:00", "2024-01-01 02:00"]);
    }

    #[test]
    fn select_unparseable_bounds_are_open() {
        let rows = rows();
        assert_eq!(select(&rows, "whenever", "").len(), 4);
        assert_eq!(select(&rows, "2024-01-01 02:00", "???").len(), 2);
    }

    #[test]
    fn clamp_inside_ok() {
        let start = at("2024-01-01 01:00");
        let end = at("2024-01-01 02:00");
        assert_eq!(Window::clamp(Some(start), Some(end), span()), Window::new(start, end));
    }

    #[test]
    fn clamp_swaps_inverted() {
        let start = at("2024-01-01 02:00");
        let end = at("2024-01-01 01:00");
        assert_eq!(Window::clamp(Some(start), Some(end), span()), Window::new(end, start));
    }

    #[test]
    fn clamp_out_of_range() {
        let window =
            Window::clamp(Some(at("2023-12-31 00:00")), Some(at("2024-02-01 00:00")), span());
        assert_eq!(window, span());

        let window =
            Window::clamp(Some(at("2024-05-01 00:00")), Some(at("2024-04-01 00:00")), span());
        assert_eq!(window, Window::new(span().end, span().end));
    }

    #[test]
    fn clamp_missing_bounds() {
        assert_eq!(Window::clamp(None, None, span()), span());
        let window =
            Window::clamp(parse_datetime("nope"), parse_datetime("2024-01-01 01:00"), span());
        assert_eq!(window, Window::new(span().start, at("2024-01-01 01:00")));
    }

    #[test]
    fn clamp_always_ordered_and_in_bounds() {
        let range = span();
        let mut candidates = vec![None];
        for minutes in (-120..=360).step_by(30) {
            candidates.push(Some(range.start + TimeDelta::minutes(minutes)));
        }
        for start in &candidates {
            for end in &candidates {
                let window = Window::clamp(*start, *end, range);
                assert!(range.start <= window.start, "{start:?} {end:?}");
                assert!(window.start <= window.end, "{start:?} {end:?}");
                assert!(window.end <= range.end, "{start:?} {end:?}");
            }
        }
    }
}
