use profscope_protocol::Milliseconds;
use serde::Serialize;

/// Summary of a set of pause durations.
///
/// `number_of_pauses == 0` is the "no pauses" sentinel; every other field is
/// then zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PauseInfo {
    pub number_of_pauses: usize,
    pub mean_pause: Milliseconds,
    /// Population standard deviation.
    pub std_dev: Milliseconds,
    pub median_pause: Milliseconds,
    pub p90_pause: Milliseconds,
    pub max_pause: Milliseconds,
    pub total_paused: Milliseconds,
}

impl PauseInfo {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn has_pauses(&self) -> bool {
        self.number_of_pauses > 0
    }

    pub fn from_durations(mut durations: Vec<Milliseconds>) -> Self {
        if durations.is_empty() {
            return Self::none();
        }
        durations.sort_by(f64::total_cmp);

        let n = durations.len();
        let total: f64 = durations.iter().sum();
        let mean = total / n as f64;
        let variance = durations.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n as f64;

        Self {
            number_of_pauses: n,
            mean_pause: mean,
            std_dev: variance.sqrt(),
            median_pause: median(&durations),
            p90_pause: percentile(&durations, 0.9),
            max_pause: durations[n - 1],
            total_paused: total,
        }
    }
}

fn median(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Linear interpolation between closest ranks, `rank = p * (n - 1)`.
/// `sorted` must be non-empty.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = p * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    sorted[lower] + fraction * (sorted[upper] - sorted[lower])
}
