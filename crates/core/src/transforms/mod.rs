//! Thread filters. Each takes a thread and returns a derived thread that
//! shares every table it leaves unchanged.
//!
//! The pipeline order is fixed: range, user transforms, search,
//! implementation, invert.

pub mod implementation;
pub mod invert;
pub mod range_filter;
pub mod search;
pub mod stack_transforms;

use serde::{Deserialize, Serialize};

use crate::model::Thread;
use crate::range::StartEndRange;

pub use implementation::{
    ImplementationFilter, UnknownImplementation, collapse_frames, filter_thread_by_implementation,
};
pub use invert::invert_call_stack;
pub use range_filter::filter_thread_to_range;
pub use search::{filter_thread_to_search_string, search_terms};
pub use stack_transforms::{Transform, apply_transforms};

/// Per-thread filter inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSettings {
    /// Comma-separated search terms.
    pub search: String,
    pub implementation: ImplementationFilter,
    pub transforms: Vec<Transform>,
    pub invert: bool,
}

impl FilterSettings {
    pub fn is_empty(&self) -> bool {
        search_terms(&self.search).is_empty()
            && self.implementation == ImplementationFilter::Combined
            && self.transforms.is_empty()
            && !self.invert
    }
}

/// Run the whole pipeline. `range` is skipped when `None`.
pub fn apply_filters(
    thread: &Thread,
    range: Option<&StartEndRange>,
    settings: &FilterSettings,
) -> Thread {
    let mut thread = match range {
        Some(range) => filter_thread_to_range(thread, range),
        None => thread.clone(),
    };
    if settings.is_empty() {
        return thread;
    }
    thread = apply_transforms(&thread, &settings.transforms);
    thread = filter_thread_to_search_string(&thread, &settings.search);
    thread = filter_thread_by_implementation(&thread, settings.implementation);
    if settings.invert {
        thread = invert_call_stack(&thread);
    }
    thread
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CallTree, ThreadBuilder};

    #[test]
    fn default_settings_are_empty() {
        assert!(FilterSettings::default().is_empty());
        let settings = FilterSettings {
            search: "gc".into(),
            ..FilterSettings::default()
        };
        assert!(!settings.is_empty());
    }

    #[test]
    fn settings_deserialize_with_defaults() {
        let settings: FilterSettings =
            serde_json::from_str(r#"{"implementation":"js","invert":true}"#).expect("parse");
        assert_eq!(settings.implementation, ImplementationFilter::Js);
        assert!(settings.invert);
        assert!(settings.search.is_empty());
    }

    #[test]
    fn pipeline_runs_range_before_search() {
        let mut b = ThreadBuilder::new("Main");
        b.sample(&["main", "paint"], 0.0);
        b.sample(&["main", "paint"], 1.0);
        b.sample(&["main", "script"], 2.0);
        b.sample(&["main", "paint"], 3.0);
        let thread = b.build();

        let settings = FilterSettings {
            search: "paint".into(),
            invert: true,
            ..FilterSettings::default()
        };
        let filtered = apply_filters(&thread, Some(&StartEndRange::new(1.0, 3.0)), &settings);
        assert_eq!(filtered.sample_count(), 2);

        let tree = CallTree::from_thread(&filtered, 1.0);
        let names: Vec<String> = tree
            .roots()
            .iter()
            .filter_map(|&r| tree.node(r))
            .map(|n| n.name.to_string())
            .collect();
        // Equal totals: the frameless "(no stack)" bucket sorts first.
        assert_eq!(names, vec![crate::model::NO_STACK_NAME, "paint"]);
        assert!((tree.root_total() - 2.0).abs() < f64::EPSILON);
    }
}
