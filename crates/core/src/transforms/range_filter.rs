use std::sync::Arc;

use crate::model::Thread;
use crate::range::{StartEndRange, sample_index_range};

/// Keep the samples with `start <= time < end` and the markers that overlap
/// `range`. Tables other than samples and markers are shared with `thread`.
pub fn filter_thread_to_range(thread: &Thread, range: &StartEndRange) -> Thread {
    let indices = sample_index_range(thread.samples.times(), range);
    let samples = if indices == (0..thread.samples.len()) {
        Arc::clone(&thread.samples)
    } else {
        Arc::new(thread.samples.slice(indices))
    };

    let markers = thread
        .markers
        .filter(|m| range.overlaps(m.start, m.end.unwrap_or(m.start)));

    Thread {
        samples,
        markers: Arc::new(markers),
        ..thread.clone()
    }
}
