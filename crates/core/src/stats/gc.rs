use profscope_protocol::{MarkerPayload, Milliseconds, NurseryInfo, NurseryStatus};
use serde::Serialize;

use super::pause::PauseInfo;
use crate::model::MarkerTable;

/// A minor collection and its nursery report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinorGcMarker {
    pub start: Milliseconds,
    pub end: Option<Milliseconds>,
    pub nursery: NurseryInfo,
}

/// Garbage-collection summary for one thread's markers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GcStats {
    /// Nursery collections that actually ran.
    pub minor_pauses: PauseInfo,
    /// Incremental major-GC slices.
    pub slice_pauses: PauseInfo,
    pub all_pauses: PauseInfo,
    pub num_major: usize,
    pub minor_markers: Vec<MinorGcMarker>,
}

/// An empty nursery reports a marker but nothing was collected.
pub(crate) fn is_real_collection(nursery: &NurseryInfo) -> bool {
    nursery.status != NurseryStatus::NurseryEmpty
}

pub fn gc_stats(markers: &MarkerTable) -> GcStats {
    let mut minor = Vec::new();
    let mut slices = Vec::new();
    let mut num_major = 0;
    let mut minor_markers = Vec::new();

    for marker in markers.iter() {
        match marker.data {
            Some(MarkerPayload::GcMinor { nursery }) => {
                let Some(nursery) = nursery else {
                    continue;
                };
                minor_markers.push(MinorGcMarker {
                    start: marker.start,
                    end: marker.end,
                    nursery: nursery.clone(),
                });
                if !is_real_collection(nursery) {
                    continue;
                }
                if let Some(duration) = marker.duration() {
                    minor.push(duration);
                }
            }
            Some(MarkerPayload::GcSlice { .. }) => {
                if let Some(duration) = marker.duration() {
                    slices.push(duration);
                }
            }
            Some(MarkerPayload::GcMajor { .. }) => num_major += 1,
            _ => {}
        }
    }

    let all: Vec<Milliseconds> = minor.iter().chain(&slices).copied().collect();
    GcStats {
        minor_pauses: PauseInfo::from_durations(minor),
        slice_pauses: PauseInfo::from_durations(slices),
        all_pauses: PauseInfo::from_durations(all),
        num_major,
        minor_markers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use profscope_protocol::GcSliceTimings;

    fn nursery(status: NurseryStatus) -> Option<MarkerPayload> {
        Some(MarkerPayload::GcMinor {
            nursery: Some(NurseryInfo {
                status,
                reason: Some("OUT_OF_NURSERY".into()),
                bytes_tenured: Some(1024),
                bytes_used: Some(4096),
                cur_capacity: Some(1 << 20),
                lazy_capacity: None,
            }),
        })
    }

    fn slice() -> Option<MarkerPayload> {
        Some(MarkerPayload::GcSlice {
            timings: Some(GcSliceTimings {
                reason: Some("ALLOC_TRIGGER".into()),
                budget: Some("10ms".into()),
            }),
        })
    }

    #[test]
    fn splits_minor_and_slice_pauses() {
        let mut markers = MarkerTable::new();
        markers.push(0, 0.0, Some(1.0), None, nursery(NurseryStatus::Complete));
        markers.push(0, 5.0, Some(8.0), None, nursery(NurseryStatus::Complete));
        markers.push(0, 9.0, Some(9.5), None, nursery(NurseryStatus::NurseryEmpty));
        markers.push(1, 10.0, Some(12.0), None, slice());
        markers.push(2, 10.0, Some(20.0), None, Some(MarkerPayload::GcMajor { timings: None }));
        markers.push(3, 11.0, Some(11.5), None, Some(MarkerPayload::Unknown));

        let stats = gc_stats(&markers);
        assert_eq!(stats.minor_pauses.number_of_pauses, 2);
        assert!((stats.minor_pauses.total_paused - 4.0).abs() < 1e-9);
        assert_eq!(stats.slice_pauses.number_of_pauses, 1);
        assert_eq!(stats.all_pauses.number_of_pauses, 3);
        assert!((stats.all_pauses.total_paused - 6.0).abs() < 1e-9);
        assert_eq!(stats.num_major, 1);
        assert_eq!(stats.minor_markers.len(), 3);
    }

    #[test]
    fn instant_and_nursery_less_markers_add_no_pause() {
        let mut markers = MarkerTable::new();
        markers.push(0, 1.0, None, None, nursery(NurseryStatus::Complete));
        markers.push(0, 2.0, Some(3.0), None, Some(MarkerPayload::GcMinor { nursery: None }));
        let stats = gc_stats(&markers);
        assert!(!stats.minor_pauses.has_pauses());
        assert_eq!(stats.minor_markers.len(), 1);
    }

    #[test]
    fn no_markers_gives_sentinels() {
        let stats = gc_stats(&MarkerTable::new());
        assert_eq!(stats, GcStats::default());
        assert!(!stats.all_pauses.has_pauses());
    }
}
