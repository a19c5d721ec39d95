use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{FrameIndex, StackIndex, StackTableBuilder, Thread};

/// Which frames count toward the call tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImplementationFilter {
    #[default]
    Combined,
    Js,
    Cpp,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown implementation filter '{0}' (expected combined, js or cpp)")]
pub struct UnknownImplementation(pub String);

impl FromStr for ImplementationFilter {
    type Err = UnknownImplementation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "combined" => Ok(Self::Combined),
            "js" => Ok(Self::Js),
            "cpp" => Ok(Self::Cpp),
            _ => Err(UnknownImplementation(s.to_string())),
        }
    }
}

impl fmt::Display for ImplementationFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Combined => "combined",
            Self::Js => "js",
            Self::Cpp => "cpp",
        })
    }
}

pub fn filter_thread_by_implementation(thread: &Thread, filter: ImplementationFilter) -> Thread {
    let funcs = &thread.func_table;
    match filter {
        ImplementationFilter::Combined => thread.clone(),
        ImplementationFilter::Js => collapse_frames(thread, |frame| {
            let func = thread.frame_func(frame);
            funcs.is_js(func) || funcs.relevant_for_js(func)
        }),
        ImplementationFilter::Cpp => {
            collapse_frames(thread, |frame| !funcs.is_js(thread.frame_func(frame)))
        }
    }
}

/// Rebuild the stack table without the frames `keep` rejects. A dropped
/// frame's children are re-parented to its nearest kept ancestor, so its
/// self time moves to that ancestor. Stacks with no kept frame map to no
/// stack.
pub fn collapse_frames(thread: &Thread, mut keep: impl FnMut(FrameIndex) -> bool) -> Thread {
    let stacks = &thread.stack_table;
    let mut builder = StackTableBuilder::with_capacity(stacks.len());
    let mut mapped: Vec<Option<StackIndex>> = Vec::with_capacity(stacks.len());

    for stack in 0..stacks.len() {
        let prefix = stacks.prefix(stack).and_then(|p| mapped[p]);
        let frame = stacks.frame(stack);
        let new_stack = if keep(frame) {
            Some(builder.index_for_stack(prefix, frame))
        } else {
            prefix
        };
        mapped.push(new_stack);
    }

    let samples = thread.samples.map_stacks(|stack| mapped[stack]);
    thread.with_stacks(builder.finish(), samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CallTree, ThreadBuilder};

    fn mixed_thread() -> Thread {
        let mut b = ThreadBuilder::new("Main");
        b.js_frame("onLoad");
        b.js_frame("render");
        b.sample(&["main", "onLoad", "js::Interpret", "render"], 0.0);
        b.sample(&["main", "onLoad", "js::Interpret"], 1.0);
        b.sample(&["main"], 2.0);
        b.build()
    }

    fn leaf_names(thread: &Thread) -> Vec<Option<String>> {
        thread
            .samples
            .stacks()
            .iter()
            .map(|s| s.map(|s| thread.frame_name(thread.stack_table.frame(s)).to_string()))
            .collect()
    }

    #[test]
    fn parse_filter_names() {
        assert_eq!("JS".parse(), Ok(ImplementationFilter::Js));
        assert_eq!("cpp".parse(), Ok(ImplementationFilter::Cpp));
        assert!("rust".parse::<ImplementationFilter>().is_err());
        assert_eq!(ImplementationFilter::default().to_string(), "combined");
    }

    #[test]
    fn js_only_collapses_native_frames() {
        let filtered = filter_thread_by_implementation(&mixed_thread(), ImplementationFilter::Js);
        assert_eq!(
            leaf_names(&filtered),
            vec![Some("render".to_string()), Some("onLoad".to_string()), None]
        );
        for s in 0..filtered.stack_table.len() {
            if let Some(p) = filtered.stack_table.prefix(s) {
                assert!(p < s);
            }
        }
    }

    #[test]
    fn cpp_only_moves_js_self_time_to_native_caller() {
        let filtered = filter_thread_by_implementation(&mixed_thread(), ImplementationFilter::Cpp);
        assert_eq!(
            leaf_names(&filtered),
            vec![
                Some("js::Interpret".to_string()),
                Some("js::Interpret".to_string()),
                Some("main".to_string())
            ]
        );
        let tree = CallTree::from_thread(&filtered, 1.0);
        assert!((tree.root_total() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn combined_is_identity() {
        let t = mixed_thread();
        let filtered = filter_thread_by_implementation(&t, ImplementationFilter::Combined);
        assert!(std::sync::Arc::ptr_eq(&t.stack_table, &filtered.stack_table));
    }
}
