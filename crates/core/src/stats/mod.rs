pub mod gc;
pub mod pause;

use std::fmt;
use std::str::FromStr;

use profscope_protocol::{MarkerPayload, Milliseconds};
use serde::{Deserialize, Serialize};

use crate::model::{Marker, Thread};

pub use gc::{GcStats, MinorGcMarker, gc_stats};
pub use pause::PauseInfo;

/// Which markers count as pauses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerKind {
    /// Nursery collections that collected something.
    GcMinor,
    GcSlice,
    GcMajor,
    /// Markers with this exact name.
    Named(String),
}

impl MarkerKind {
    pub fn matches(&self, thread: &Thread, marker: &Marker<'_>) -> bool {
        match (self, marker.data) {
            (MarkerKind::GcMinor, Some(MarkerPayload::GcMinor { nursery })) => {
                nursery.as_ref().is_some_and(gc::is_real_collection)
            }
            (MarkerKind::GcSlice, Some(MarkerPayload::GcSlice { .. })) => true,
            (MarkerKind::GcMajor, Some(MarkerPayload::GcMajor { .. })) => true,
            (MarkerKind::Named(name), _) => thread
                .string_table
                .get(marker.name)
                .is_some_and(|s| s.as_str() == name),
            _ => false,
        }
    }
}

impl FromStr for MarkerKind {
    type Err = std::convert::Infallible;

    /// GC kinds by name (`gc-minor`, `GCMinor`, ...); anything else is a
    /// marker name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "gc-minor" | "GCMinor" => MarkerKind::GcMinor,
            "gc-slice" | "GCSlice" => MarkerKind::GcSlice,
            "gc-major" | "GCMajor" => MarkerKind::GcMajor,
            name => MarkerKind::Named(name.to_string()),
        })
    }
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerKind::GcMinor => f.write_str("Nursery collections"),
            MarkerKind::GcSlice => f.write_str("Major slices"),
            MarkerKind::GcMajor => f.write_str("Major collections"),
            MarkerKind::Named(name) => f.write_str(name),
        }
    }
}

/// Durations of the interval markers of `kind`. Instant markers have no
/// duration and are skipped.
pub fn pause_durations(thread: &Thread, kind: &MarkerKind) -> Vec<Milliseconds> {
    thread
        .markers
        .iter()
        .filter(|m| kind.matches(thread, m))
        .filter_map(|m| m.duration())
        .collect()
}

pub fn pause_info_for_kind(thread: &Thread, kind: &MarkerKind) -> PauseInfo {
    PauseInfo::from_durations(pause_durations(thread, kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ThreadBuilder;
    use profscope_protocol::{NurseryInfo, NurseryStatus};

    fn minor(status: NurseryStatus) -> Option<MarkerPayload> {
        Some(MarkerPayload::GcMinor {
            nursery: Some(NurseryInfo {
                status,
                reason: None,
                bytes_tenured: None,
                bytes_used: None,
                cur_capacity: None,
                lazy_capacity: None,
            }),
        })
    }

    fn thread() -> Thread {
        let mut b = ThreadBuilder::new("GeckoMain");
        b.marker("GCMinor", 0.0, Some(1.0), minor(NurseryStatus::Complete));
        b.marker("GCMinor", 2.0, Some(4.0), minor(NurseryStatus::Complete));
        b.marker("GCMinor", 5.0, Some(5.5), minor(NurseryStatus::NurseryEmpty));
        b.marker("Paint", 3.0, Some(6.0), None);
        b.marker("Paint", 7.0, None, None);
        b.build()
    }

    #[test]
    fn minor_kind_matches_gc_stats() {
        let t = thread();
        let info = pause_info_for_kind(&t, &MarkerKind::GcMinor);
        assert_eq!(info, gc_stats(&t.markers).minor_pauses);
        assert_eq!(info.number_of_pauses, 2);
    }

    #[test]
    fn named_kind_skips_instant_markers() {
        let info = pause_info_for_kind(&thread(), &MarkerKind::Named("Paint".into()));
        assert_eq!(info.number_of_pauses, 1);
        assert!((info.max_pause - 3.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_kind_gives_sentinel() {
        let info = pause_info_for_kind(&thread(), &MarkerKind::Named("CC".into()));
        assert!(!info.has_pauses());
        assert_eq!(pause_info_for_kind(&thread(), &MarkerKind::GcSlice), PauseInfo::none());
    }

    #[test]
    fn parse_kind() {
        assert_eq!("gc-minor".parse(), Ok(MarkerKind::GcMinor));
        assert_eq!("GCSlice".parse(), Ok(MarkerKind::GcSlice));
        assert_eq!("DOMEvent".parse(), Ok(MarkerKind::Named("DOMEvent".into())));
    }
}
