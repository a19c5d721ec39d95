use serde::{Deserialize, Serialize};

use super::implementation::collapse_frames;
use crate::model::{FuncIndex, StackIndex, StackTableBuilder, Thread};

/// A user-applied transform, keyed by function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Transform {
    /// Remove the function from every stack; its self time goes to its
    /// caller.
    MergeFunction { func: FuncIndex },
    /// Null every sample whose stack contains the function.
    DropFunction { func: FuncIndex },
    /// Keep only samples containing the function, re-rooted at its
    /// root-most occurrence.
    FocusFunction { func: FuncIndex },
}

impl Transform {
    pub fn func(&self) -> FuncIndex {
        match *self {
            Transform::MergeFunction { func }
            | Transform::DropFunction { func }
            | Transform::FocusFunction { func } => func,
        }
    }

    pub fn apply(&self, thread: &Thread) -> Thread {
        match *self {
            Transform::MergeFunction { func } => merge_function(thread, func),
            Transform::DropFunction { func } => drop_function(thread, func),
            Transform::FocusFunction { func } => focus_function(thread, func),
        }
    }
}

pub fn apply_transforms(thread: &Thread, transforms: &[Transform]) -> Thread {
    transforms
        .iter()
        .fold(thread.clone(), |thread, transform| transform.apply(&thread))
}

pub fn merge_function(thread: &Thread, func: FuncIndex) -> Thread {
    collapse_frames(thread, |frame| thread.frame_func(frame) != func)
}

pub fn drop_function(thread: &Thread, func: FuncIndex) -> Thread {
    let stacks = &thread.stack_table;
    let mut contains = Vec::with_capacity(stacks.len());
    for stack in 0..stacks.len() {
        let inherited = stacks.prefix(stack).is_some_and(|p| contains[p]);
        contains.push(inherited || thread.stack_func(stack) == func);
    }
    let samples = thread
        .samples
        .map_stacks(|stack| (!contains[stack]).then_some(stack));
    thread.with_samples(samples)
}

pub fn focus_function(thread: &Thread, func: FuncIndex) -> Thread {
    let stacks = &thread.stack_table;
    let mut builder = StackTableBuilder::new();
    let mut focused: Vec<Option<StackIndex>> = Vec::with_capacity(stacks.len());

    for stack in 0..stacks.len() {
        let frame = stacks.frame(stack);
        let new_stack = match stacks.prefix(stack).and_then(|p| focused[p]) {
            Some(prefix) => Some(builder.index_for_stack(Some(prefix), frame)),
            None if thread.frame_func(frame) == func => Some(builder.index_for_stack(None, frame)),
            None => None,
        };
        focused.push(new_stack);
    }

    let samples = thread.samples.map_stacks(|stack| focused[stack]);
    thread.with_stacks(builder.finish(), samples)
}
