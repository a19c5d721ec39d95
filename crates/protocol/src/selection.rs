use serde::{Deserialize, Serialize};

/// Time values on the profile's time axis.
pub type Milliseconds = f64;

/// The user's preview selection: a time window chosen by dragging over the
/// timeline, or "none" when both bounds are absent.
///
/// `is_modifying` is true while the drag is in progress. It does not change
/// which samples are selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewSelection {
    pub start: Option<Milliseconds>,
    pub end: Option<Milliseconds>,
    #[serde(default)]
    pub is_modifying: bool,
}

impl PreviewSelection {
    /// No selection: the entire range is in view.
    pub fn none() -> Self {
        Self::default()
    }

    /// A committed selection covering `start..end`.
    pub fn range(start: Milliseconds, end: Milliseconds) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            is_modifying: false,
        }
    }

    /// An in-progress drag covering `start..end`.
    pub fn modifying(start: Milliseconds, end: Milliseconds) -> Self {
        Self {
            is_modifying: true,
            ..Self::range(start, end)
        }
    }

    pub fn has_selection(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    /// The selected bounds, with a missing bound left open on its side.
    /// `None` means the entire range.
    pub fn bounds(&self) -> Option<(Milliseconds, Milliseconds)> {
        if !self.has_selection() {
            return None;
        }
        Some((
            self.start.unwrap_or(f64::NEG_INFINITY),
            self.end.unwrap_or(f64::INFINITY),
        ))
    }

    /// Whether two selections pick the same samples, ignoring the drag flag.
    pub fn same_bounds(&self, other: &PreviewSelection) -> bool {
        self.start == other.start && self.end == other.end
    }
}
