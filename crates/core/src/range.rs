//! Time-range helpers shared by every other component.
//!
//! Ranges are half-open: `start` is inside, `end` is not. Selections that
//! touch at an edge therefore never count the same sample twice.

use std::ops::Range;

use profscope_protocol::{Milliseconds, PreviewSelection};
use serde::{Deserialize, Serialize};

use crate::model::Thread;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StartEndRange {
    pub start: Milliseconds,
    pub end: Milliseconds,
}

impl StartEndRange {
    pub fn new(start: Milliseconds, end: Milliseconds) -> Self {
        Self { start, end }
    }

    /// Zero-length range at the origin, used for threads with no data.
    pub fn empty() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Covers every finite time.
    pub fn unbounded() -> Self {
        Self::new(f64::NEG_INFINITY, f64::INFINITY)
    }

    pub fn length(&self) -> Milliseconds {
        (self.end - self.start).max(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, time: Milliseconds) -> bool {
        self.start <= time && time < self.end
    }

    pub fn clamp(&self, time: Milliseconds) -> Milliseconds {
        if time < self.start {
            self.start
        } else if time > self.end {
            self.end
        } else {
            time
        }
    }

    /// The overlap of two ranges, or `None` when they are disjoint.
    pub fn intersect(&self, other: &StartEndRange) -> Option<StartEndRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then(|| StartEndRange::new(start, end))
    }

    /// The smallest range covering both.
    pub fn union(&self, other: &StartEndRange) -> StartEndRange {
        StartEndRange::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Whether an interval `[start, end]` touches this range. Instant
    /// events (`end == start`) overlap when `start` is contained.
    pub fn overlaps(&self, start: Milliseconds, end: Milliseconds) -> bool {
        if end <= start {
            return self.contains(start);
        }
        start < self.end && end > self.start
    }
}

/// The range a selection restricts to, or `None` for "entire range".
pub fn selection_range(selection: &PreviewSelection) -> Option<StartEndRange> {
    selection
        .bounds()
        .map(|(start, end)| StartEndRange::new(start, end))
}

/// Indices of the samples whose time falls in `range`. `times` must be
/// non-decreasing, which validated sample tables guarantee.
pub fn sample_index_range(times: &[Milliseconds], range: &StartEndRange) -> Range<usize> {
    let start = times.partition_point(|&t| t < range.start);
    let end = times.partition_point(|&t| t < range.end);
    start..end.max(start)
}

/// The time span covered by a thread: from its first sample to one interval
/// past its last, widened to include its markers. A thread with neither
/// samples nor markers gets [`StartEndRange::empty`].
pub fn time_range_for_thread(thread: &Thread, interval: Milliseconds) -> StartEndRange {
    let mut start = f64::INFINITY;
    let mut end = f64::NEG_INFINITY;

    let times = thread.samples.times();
    if let (Some(first), Some(last)) = (times.first(), times.last()) {
        start = *first;
        end = last + interval;
    }

    for marker in thread.markers.iter() {
        start = start.min(marker.start);
        end = end.max(marker.end.unwrap_or(marker.start));
    }

    if start.is_finite() && end.is_finite() {
        StartEndRange::new(start, end)
    } else {
        StartEndRange::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ThreadBuilder;

    #[test]
    fn half_open_contains() {
        let r = StartEndRange::new(1.0, 3.0);
        assert!(r.contains(1.0));
        assert!(r.contains(2.999));
        assert!(!r.contains(3.0));
        assert!(!r.contains(0.5));
    }

    #[test]
    fn intersect_and_union() {
        let a = StartEndRange::new(0.0, 10.0);
        let b = StartEndRange::new(5.0, 15.0);
        assert_eq!(a.intersect(&b), Some(StartEndRange::new(5.0, 10.0)));
        assert_eq!(a.union(&b), StartEndRange::new(0.0, 15.0));

        let c = StartEndRange::new(10.0, 12.0);
        assert_eq!(a.intersect(&c), None);
    }

    #[test]
    fn clamp_and_length() {
        let r = StartEndRange::new(2.0, 4.0);
        assert!((r.clamp(1.0) - 2.0).abs() < f64::EPSILON);
        assert!((r.clamp(5.0) - 4.0).abs() < f64::EPSILON);
        assert!((r.clamp(3.0) - 3.0).abs() < f64::EPSILON);
        assert!((r.length() - 2.0).abs() < f64::EPSILON);
        assert!((StartEndRange::new(4.0, 2.0).length()).abs() < f64::EPSILON);
    }

    #[test]
    fn overlaps_intervals_and_instants() {
        let r = StartEndRange::new(10.0, 20.0);
        assert!(r.overlaps(5.0, 11.0));
        assert!(r.overlaps(19.0, 30.0));
        assert!(!r.overlaps(0.0, 10.0));
        assert!(!r.overlaps(20.0, 25.0));
        assert!(r.overlaps(10.0, 10.0));
        assert!(!r.overlaps(20.0, 20.0));
    }

    #[test]
    fn index_range_is_half_open() {
        let times = [0.0, 1.0, 1.0, 2.0, 3.0];
        let r = sample_index_range(&times, &StartEndRange::new(1.0, 3.0));
        assert_eq!(r, 1..4);
        let r = sample_index_range(&times, &StartEndRange::new(5.0, 6.0));
        assert!(r.is_empty());
    }

    #[test]
    fn selection_to_range() {
        assert_eq!(selection_range(&PreviewSelection::none()), None);
        assert_eq!(
            selection_range(&PreviewSelection::range(1.0, 2.0)),
            Some(StartEndRange::new(1.0, 2.0))
        );
    }

    #[test]
    fn thread_range_spans_samples_and_markers() {
        let mut builder = ThreadBuilder::new("Main");
        builder.sample(&["main"], 5.0);
        builder.sample(&["main"], 8.0);
        builder.marker("GCSlice", 2.0, Some(3.0), None);
        let thread = builder.build();
        let range = time_range_for_thread(&thread, 1.0);
        assert_eq!(range, StartEndRange::new(2.0, 9.0));
    }

    #[test]
    fn empty_thread_range() {
        let thread = ThreadBuilder::new("Empty").build();
        assert_eq!(time_range_for_thread(&thread, 1.0), StartEndRange::empty());
    }
}
