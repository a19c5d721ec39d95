use std::sync::Arc;

use profscope_protocol::{Milliseconds, SharedStr};

use super::markers::MarkerTable;
use super::tables::{
    FrameIndex, FrameTable, FuncIndex, FuncTable, SamplesTable, StackIndex, StackTable,
    StringTable,
};

/// One execution context and its tables.
///
/// Tables sit behind `Arc` so that derived threads share everything they
/// don't change: a range filter gets a new samples table and reuses the
/// stack, frame and func tables of its source. Nothing is mutated in place.
#[derive(Debug, Clone)]
pub struct Thread {
    pub name: String,
    pub process_type: Option<String>,
    pub pid: Option<String>,
    pub tid: Option<u64>,
    pub register_time: Milliseconds,
    pub unregister_time: Option<Milliseconds>,
    pub string_table: Arc<StringTable>,
    pub func_table: Arc<FuncTable>,
    pub frame_table: Arc<FrameTable>,
    pub stack_table: Arc<StackTable>,
    pub samples: Arc<SamplesTable>,
    pub markers: Arc<MarkerTable>,
}

impl Thread {
    /// Name of `func`, or an empty string for a dangling index.
    pub fn func_name(&self, func: FuncIndex) -> SharedStr {
        self.string_table
            .get(self.func_table.name(func))
            .cloned()
            .unwrap_or_else(|| SharedStr::from(""))
    }

    pub fn frame_func(&self, frame: FrameIndex) -> FuncIndex {
        self.frame_table.func(frame)
    }

    pub fn frame_name(&self, frame: FrameIndex) -> SharedStr {
        self.func_name(self.frame_func(frame))
    }

    pub fn stack_func(&self, stack: StackIndex) -> FuncIndex {
        self.frame_func(self.stack_table.frame(stack))
    }

    /// Function names of `stack`, root first.
    pub fn stack_names(&self, stack: StackIndex) -> Vec<SharedStr> {
        self.stack_table
            .frame_path(stack)
            .into_iter()
            .map(|frame| self.frame_name(frame))
            .collect()
    }

    /// Same thread with different samples.
    pub fn with_samples(&self, samples: SamplesTable) -> Thread {
        Thread {
            samples: Arc::new(samples),
            ..self.clone()
        }
    }

    /// Same thread with a rebuilt stack table and samples pointing into it.
    pub fn with_stacks(&self, stack_table: StackTable, samples: SamplesTable) -> Thread {
        Thread {
            stack_table: Arc::new(stack_table),
            samples: Arc::new(samples),
            ..self.clone()
        }
    }

    pub fn with_frame_table(&self, frame_table: FrameTable) -> Thread {
        Thread {
            frame_table: Arc::new(frame_table),
            ..self.clone()
        }
    }

    /// A thread with the same metadata and lookup tables but no samples and
    /// no markers.
    pub fn derive_empty(&self) -> Thread {
        Thread {
            samples: Arc::new(self.samples.derive_empty()),
            markers: Arc::new(self.markers.derive_empty()),
            ..self.clone()
        }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use crate::model::ThreadBuilder;

    #[test]
    fn derived_threads_share_untouched_tables() {
        let mut builder = ThreadBuilder::new("Main");
        builder.sample(&["main", "work"], 0.0);
        let thread = builder.build();

        let empty = thread.derive_empty();
        assert_eq!(empty.sample_count(), 0);
        assert!(empty.markers.is_empty());
        assert!(std::sync::Arc::ptr_eq(&empty.stack_table, &thread.stack_table));
        assert!(std::sync::Arc::ptr_eq(&empty.func_table, &thread.func_table));
        assert_eq!(empty.name, "Main");
    }

    #[test]
    fn stack_names_root_first() {
        let mut builder = ThreadBuilder::new("Main");
        let stack = builder.stack(&["main", "run", "gc"]);
        let thread = builder.build();
        let names: Vec<String> = thread
            .stack_names(stack)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(names, vec!["main", "run", "gc"]);
    }
}
