use std::collections::HashMap;
use std::sync::Arc;

use profscope_protocol::{MarkerPayload, Milliseconds};

use super::markers::MarkerTable;
use super::tables::{
    FrameIndex, FrameRow, FrameTable, FuncIndex, FuncRow, FuncTable, SamplesTable, StackIndex,
    StackTableBuilder, StringTable,
};
use super::thread::Thread;

/// Assembles a valid [`Thread`] from function-name paths.
///
/// Each distinct function name gets one func and one frame; stacks are
/// deduplicated. Samples must be added in time order.
///
/// ```
/// use profscope_core::model::ThreadBuilder;
///
/// let mut b = ThreadBuilder::new("GeckoMain");
/// b.sample(&["main", "js::RunScript"], 0.0);
/// b.idle_sample(1.0);
/// let thread = b.build();
/// assert_eq!(thread.sample_count(), 2);
/// ```
#[derive(Debug)]
pub struct ThreadBuilder {
    name: String,
    strings: StringTable,
    funcs: FuncTable,
    frames: FrameTable,
    frame_by_name: HashMap<String, FrameIndex>,
    stacks: StackTableBuilder,
    samples: SamplesTable,
    markers: MarkerTable,
}

impl ThreadBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            strings: StringTable::new(),
            funcs: FuncTable::new(),
            frames: FrameTable::new(),
            frame_by_name: HashMap::new(),
            stacks: StackTableBuilder::new(),
            samples: SamplesTable::new(),
            markers: MarkerTable::new(),
        }
    }

    /// Declare a JavaScript function. Must come before the first use of
    /// `name`, otherwise the existing native frame is returned.
    pub fn js_frame(&mut self, name: &str) -> FrameIndex {
        self.frame_with(name, true)
    }

    pub fn frame(&mut self, name: &str) -> FrameIndex {
        self.frame_with(name, false)
    }

    fn frame_with(&mut self, name: &str, is_js: bool) -> FrameIndex {
        if let Some(&frame) = self.frame_by_name.get(name) {
            return frame;
        }
        let name_index = self.strings.intern(name);
        let func = self.funcs.push(FuncRow {
            is_js,
            relevant_for_js: false,
            ..FuncRow::named(name_index)
        });
        let frame = self.frames.push(FrameRow::for_func(func));
        self.frame_by_name.insert(name.to_string(), frame);
        frame
    }

    pub fn func(&mut self, name: &str) -> FuncIndex {
        let frame = self.frame(name);
        self.frames.func(frame)
    }

    /// The stack for a root-first path of function names.
    ///
    /// An empty path has no stack; callers wanting an idle sample should use
    /// [`ThreadBuilder::idle_sample`].
    pub fn stack(&mut self, path: &[&str]) -> StackIndex {
        let mut prefix = None;
        let mut leaf = 0;
        for name in path {
            let frame = self.frame(name);
            leaf = self.stacks.index_for_stack(prefix, frame);
            prefix = Some(leaf);
        }
        leaf
    }

    pub fn sample(&mut self, path: &[&str], time: Milliseconds) -> &mut Self {
        let stack = (!path.is_empty()).then(|| self.stack(path));
        self.samples.push(stack, time, None);
        self
    }

    pub fn weighted_sample(&mut self, path: &[&str], time: Milliseconds, weight: f64) -> &mut Self {
        let stack = (!path.is_empty()).then(|| self.stack(path));
        self.samples.push(stack, time, Some(weight));
        self
    }

    pub fn idle_sample(&mut self, time: Milliseconds) -> &mut Self {
        self.samples.push(None, time, None);
        self
    }

    pub fn marker(
        &mut self,
        name: &str,
        start: Milliseconds,
        end: Option<Milliseconds>,
        data: Option<MarkerPayload>,
    ) -> &mut Self {
        let name = self.strings.intern(name);
        self.markers.push(name, start, end, None, data);
        self
    }

    pub fn build(self) -> Thread {
        Thread {
            name: self.name,
            process_type: None,
            pid: None,
            tid: None,
            register_time: 0.0,
            unregister_time: None,
            string_table: Arc::new(self.strings),
            func_table: Arc::new(self.funcs),
            frame_table: Arc::new(self.frames),
            stack_table: Arc::new(self.stacks.finish()),
            samples: Arc::new(self.samples),
            markers: Arc::new(self.markers),
        }
    }
}
