//! Columnar per-thread tables.
//!
//! Every table is a set of parallel columns indexed by a shared row id.
//! Tables reference each other by index, never by pointer, so the shape of
//! the stack forest is checkable with plain integer comparisons.

use std::collections::HashMap;

use profscope_protocol::{Milliseconds, SharedStr};

pub type StringIndex = usize;
pub type FuncIndex = usize;
pub type FrameIndex = usize;
pub type StackIndex = usize;
pub type CategoryIndex = usize;
pub type ResourceIndex = usize;
pub type IndexIntoSamples = usize;

/// Interned strings referenced by functions and markers.
#[derive(Debug, Clone, Default)]
pub struct StringTable {
    strings: Vec<SharedStr>,
    lookup: HashMap<SharedStr, StringIndex>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt an existing list of strings. Duplicates keep their own rows;
    /// lookups resolve to the first.
    pub fn from_strings(strings: Vec<SharedStr>) -> Self {
        let mut lookup = HashMap::with_capacity(strings.len());
        for (i, s) in strings.iter().enumerate() {
            lookup.entry(s.clone()).or_insert(i);
        }
        Self { strings, lookup }
    }

    pub fn intern(&mut self, s: &str) -> StringIndex {
        if let Some(&index) = self.lookup.get(s) {
            return index;
        }
        let index = self.strings.len();
        let shared = SharedStr::from(s);
        self.strings.push(shared.clone());
        self.lookup.insert(shared, index);
        index
    }

    pub fn get(&self, index: StringIndex) -> Option<&SharedStr> {
        self.strings.get(index)
    }

    pub fn index_of(&self, s: &str) -> Option<StringIndex> {
        self.lookup.get(s).copied()
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuncRow {
    pub name: StringIndex,
    pub is_js: bool,
    pub relevant_for_js: bool,
    pub resource: Option<ResourceIndex>,
    pub file_name: Option<StringIndex>,
}

impl FuncRow {
    pub fn named(name: StringIndex) -> Self {
        Self {
            name,
            is_js: false,
            relevant_for_js: false,
            resource: None,
            file_name: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FuncTable {
    name: Vec<StringIndex>,
    is_js: Vec<bool>,
    relevant_for_js: Vec<bool>,
    resource: Vec<Option<ResourceIndex>>,
    file_name: Vec<Option<StringIndex>>,
}

impl FuncTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            name: Vec::with_capacity(capacity),
            is_js: Vec::with_capacity(capacity),
            relevant_for_js: Vec::with_capacity(capacity),
            resource: Vec::with_capacity(capacity),
            file_name: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, row: FuncRow) -> FuncIndex {
        let index = self.name.len();
        self.name.push(row.name);
        self.is_js.push(row.is_js);
        self.relevant_for_js.push(row.relevant_for_js);
        self.resource.push(row.resource);
        self.file_name.push(row.file_name);
        index
    }

    pub fn row(&self, func: FuncIndex) -> Option<FuncRow> {
        Some(FuncRow {
            name: *self.name.get(func)?,
            is_js: self.is_js[func],
            relevant_for_js: self.relevant_for_js[func],
            resource: self.resource[func],
            file_name: self.file_name[func],
        })
    }

    pub fn name(&self, func: FuncIndex) -> StringIndex {
        self.name[func]
    }

    pub fn is_js(&self, func: FuncIndex) -> bool {
        self.is_js[func]
    }

    pub fn relevant_for_js(&self, func: FuncIndex) -> bool {
        self.relevant_for_js[func]
    }

    pub fn file_name(&self, func: FuncIndex) -> Option<StringIndex> {
        self.file_name[func]
    }

    pub fn len(&self) -> usize {
        self.name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    pub fn derive_empty(&self) -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRow {
    pub func: FuncIndex,
    pub category: Option<CategoryIndex>,
    /// Depth of this frame within an inlined call chain; 0 when not inlined.
    pub inline_depth: u32,
    pub line: Option<u32>,
    pub address: Option<u64>,
}

impl FrameRow {
    pub fn for_func(func: FuncIndex) -> Self {
        Self {
            func,
            category: None,
            inline_depth: 0,
            line: None,
            address: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FrameTable {
    func: Vec<FuncIndex>,
    category: Vec<Option<CategoryIndex>>,
    inline_depth: Vec<u32>,
    line: Vec<Option<u32>>,
    address: Vec<Option<u64>>,
}

impl FrameTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            func: Vec::with_capacity(capacity),
            category: Vec::with_capacity(capacity),
            inline_depth: Vec::with_capacity(capacity),
            line: Vec::with_capacity(capacity),
            address: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, row: FrameRow) -> FrameIndex {
        let index = self.func.len();
        self.func.push(row.func);
        self.category.push(row.category);
        self.inline_depth.push(row.inline_depth);
        self.line.push(row.line);
        self.address.push(row.address);
        index
    }

    pub fn row(&self, frame: FrameIndex) -> Option<FrameRow> {
        Some(FrameRow {
            func: *self.func.get(frame)?,
            category: self.category[frame],
            inline_depth: self.inline_depth[frame],
            line: self.line[frame],
            address: self.address[frame],
        })
    }

    pub fn func(&self, frame: FrameIndex) -> FuncIndex {
        self.func[frame]
    }

    pub fn funcs(&self) -> &[FuncIndex] {
        &self.func
    }

    pub fn categories(&self) -> &[Option<CategoryIndex>] {
        &self.category
    }

    pub fn len(&self) -> usize {
        self.func.len()
    }

    pub fn is_empty(&self) -> bool {
        self.func.is_empty()
    }

    pub fn derive_empty(&self) -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackRow {
    pub frame: FrameIndex,
    pub prefix: Option<StackIndex>,
}

/// The forest of call stacks. Root stacks have no prefix; every other
/// stack's prefix is its caller and always has a smaller index, so any walk
/// up the prefix chain terminates in at most `len()` steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackTable {
    frame: Vec<FrameIndex>,
    prefix: Vec<Option<StackIndex>>,
}

impl StackTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(&self, stack: StackIndex) -> Option<StackRow> {
        Some(StackRow {
            frame: *self.frame.get(stack)?,
            prefix: self.prefix[stack],
        })
    }

    pub fn frame(&self, stack: StackIndex) -> FrameIndex {
        self.frame[stack]
    }

    pub fn prefix(&self, stack: StackIndex) -> Option<StackIndex> {
        self.prefix[stack]
    }

    pub fn prefixes(&self) -> &[Option<StackIndex>] {
        &self.prefix
    }

    pub fn len(&self) -> usize {
        self.frame.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.is_empty()
    }

    /// Walk from `stack` to its root, leaf first.
    pub fn ancestors(&self, stack: StackIndex) -> Ancestors<'_> {
        Ancestors {
            table: self,
            next: Some(stack),
        }
    }

    /// Frames of `stack`, root first.
    pub fn frame_path(&self, stack: StackIndex) -> Vec<FrameIndex> {
        let mut path: Vec<FrameIndex> = self.ancestors(stack).map(|s| self.frame[s]).collect();
        path.reverse();
        path
    }

    pub fn depth(&self, stack: StackIndex) -> usize {
        self.ancestors(stack).count() - 1
    }

    pub fn derive_empty(&self) -> Self {
        Self::new()
    }
}

pub struct Ancestors<'a> {
    table: &'a StackTable,
    next: Option<StackIndex>,
}

impl Iterator for Ancestors<'_> {
    type Item = StackIndex;

    fn next(&mut self) -> Option<StackIndex> {
        let current = self.next?;
        self.next = self.table.prefix[current];
        Some(current)
    }
}

/// Builds a [`StackTable`], deduplicating stacks by `(prefix, frame)`.
#[derive(Debug, Default)]
pub struct StackTableBuilder {
    table: StackTable,
    index: HashMap<(Option<StackIndex>, FrameIndex), StackIndex>,
}

impl StackTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: StackTable {
                frame: Vec::with_capacity(capacity),
                prefix: Vec::with_capacity(capacity),
            },
            index: HashMap::with_capacity(capacity),
        }
    }

    /// The stack for `frame` called from `prefix`, created on first use.
    /// `prefix` must come from this builder.
    pub fn index_for_stack(&mut self, prefix: Option<StackIndex>, frame: FrameIndex) -> StackIndex {
        if let Some(&stack) = self.index.get(&(prefix, frame)) {
            return stack;
        }
        let stack = self.table.frame.len();
        self.table.frame.push(frame);
        self.table.prefix.push(prefix);
        self.index.insert((prefix, frame), stack);
        stack
    }

    /// Push a whole root-first frame path and return its leaf stack.
    pub fn index_for_path(&mut self, path: &[FrameIndex]) -> Option<StackIndex> {
        path.iter()
            .fold(None, |prefix, &frame| Some(self.index_for_stack(prefix, frame)))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn finish(self) -> StackTable {
        self.table
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRow {
    pub stack: Option<StackIndex>,
    pub time: Milliseconds,
    pub weight: f64,
}

/// Time-ordered samples. Without a weight column every sample weighs 1.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SamplesTable {
    stack: Vec<Option<StackIndex>>,
    time: Vec<Milliseconds>,
    weight: Option<Vec<f64>>,
}

impl SamplesTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble from columns that are already known to agree in length.
    pub(crate) fn from_columns(
        stack: Vec<Option<StackIndex>>,
        time: Vec<Milliseconds>,
        weight: Option<Vec<f64>>,
    ) -> Self {
        Self {
            stack,
            time,
            weight,
        }
    }

    pub fn push(&mut self, stack: Option<StackIndex>, time: Milliseconds, weight: Option<f64>) {
        if let Some(column) = self.weight.as_mut() {
            column.push(weight.unwrap_or(1.0));
        } else if let Some(w) = weight {
            let mut column = vec![1.0; self.stack.len()];
            column.push(w);
            self.weight = Some(column);
        }
        self.stack.push(stack);
        self.time.push(time);
    }

    pub fn row(&self, sample: IndexIntoSamples) -> Option<SampleRow> {
        Some(SampleRow {
            stack: *self.stack.get(sample)?,
            time: self.time[sample],
            weight: self.weight(sample),
        })
    }

    pub fn stack(&self, sample: IndexIntoSamples) -> Option<StackIndex> {
        self.stack[sample]
    }

    pub fn stacks(&self) -> &[Option<StackIndex>] {
        &self.stack
    }

    pub fn times(&self) -> &[Milliseconds] {
        &self.time
    }

    pub fn weight(&self, sample: IndexIntoSamples) -> f64 {
        self.weight.as_ref().map_or(1.0, |w| w[sample])
    }

    pub fn has_weights(&self) -> bool {
        self.weight.is_some()
    }

    pub fn total_weight(&self) -> f64 {
        match &self.weight {
            Some(w) => w.iter().sum(),
            None => self.stack.len() as f64,
        }
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = SampleRow> + '_ {
        (0..self.len()).map(|i| SampleRow {
            stack: self.stack[i],
            time: self.time[i],
            weight: self.weight(i),
        })
    }

    /// Copy of the rows in `range`.
    pub fn slice(&self, range: std::ops::Range<IndexIntoSamples>) -> Self {
        Self {
            stack: self.stack[range.clone()].to_vec(),
            time: self.time[range.clone()].to_vec(),
            weight: self.weight.as_ref().map(|w| w[range].to_vec()),
        }
    }

    /// Same times and weights with a replacement stack column.
    pub fn with_stacks(&self, stack: Vec<Option<StackIndex>>) -> Self {
        debug_assert_eq!(stack.len(), self.stack.len());
        Self {
            stack,
            time: self.time.clone(),
            weight: self.weight.clone(),
        }
    }

    /// Map every sample's stack through `f`, keeping times and weights.
    pub fn map_stacks(&self, mut f: impl FnMut(StackIndex) -> Option<StackIndex>) -> Self {
        self.with_stacks(self.stack.iter().map(|s| s.and_then(&mut f)).collect())
    }

    pub fn derive_empty(&self) -> Self {
        Self {
            stack: Vec::new(),
            time: Vec::new(),
            weight: self.weight.as_ref().map(|_| Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_dedupes_by_prefix_and_frame() {
        let mut b = StackTableBuilder::new();
        let a = b.index_for_stack(None, 0);
        let ab = b.index_for_stack(Some(a), 1);
        assert_eq!(b.index_for_stack(None, 0), a);
        assert_eq!(b.index_for_stack(Some(a), 1), ab);
        let other_root = b.index_for_stack(None, 1);
        assert_ne!(other_root, ab);
        assert_eq!(b.len(), 3);
    }

    #[test]
    fn prefix_always_earlier() {
        let mut b = StackTableBuilder::new();
        b.index_for_path(&[0, 1, 2]);
        b.index_for_path(&[0, 3]);
        b.index_for_path(&[4, 1, 2, 5]);
        let table = b.finish();
        for s in 0..table.len() {
            if let Some(p) = table.prefix(s) {
                assert!(p < s);
            }
            assert!(table.ancestors(s).count() <= table.len());
        }
    }

    #[test]
    fn frame_path_root_first() {
        let mut b = StackTableBuilder::new();
        let leaf = b.index_for_path(&[7, 8, 9]);
        let table = b.finish();
        let leaf = leaf.unwrap_or_default();
        assert_eq!(table.frame_path(leaf), vec![7, 8, 9]);
        assert_eq!(table.depth(leaf), 2);
        assert_eq!(StackTableBuilder::new().index_for_path(&[]), None);
    }

    #[test]
    fn weight_column_materializes_lazily() {
        let mut samples = SamplesTable::new();
        samples.push(Some(0), 0.0, None);
        samples.push(Some(0), 1.0, None);
        assert!(!samples.has_weights());
        assert!((samples.total_weight() - 2.0).abs() < f64::EPSILON);

        samples.push(None, 2.0, Some(3.0));
        assert!(samples.has_weights());
        assert!((samples.weight(0) - 1.0).abs() < f64::EPSILON);
        assert!((samples.total_weight() - 5.0).abs() < f64::EPSILON);
        assert_eq!(samples.row(2).map(|r| r.stack), Some(None));
    }

    #[test]
    fn slice_and_derive_empty() {
        let mut samples = SamplesTable::new();
        for i in 0..5 {
            samples.push(Some(i), i as f64, None);
        }
        let sliced = samples.slice(1..3);
        assert_eq!(sliced.stacks(), &[Some(1), Some(2)]);
        assert_eq!(sliced.times(), &[1.0, 2.0]);

        let empty = samples.derive_empty();
        assert!(empty.is_empty());
        assert!(empty.row(0).is_none());
    }

    #[test]
    fn string_table_interns() {
        let mut strings = StringTable::new();
        let a = strings.intern("main");
        let b = strings.intern("work");
        assert_eq!(strings.intern("main"), a);
        assert_ne!(a, b);
        assert_eq!(strings.get(b).map(SharedStr::as_str), Some("work"));
        assert_eq!(strings.index_of("work"), Some(b));
    }

    #[test]
    fn func_and_frame_rows() {
        let mut funcs = FuncTable::new();
        let f = funcs.push(FuncRow {
            is_js: true,
            ..FuncRow::named(0)
        });
        let mut frames = FrameTable::new();
        let fr = frames.push(FrameRow::for_func(f));
        assert!(funcs.is_js(f));
        assert_eq!(frames.func(fr), f);
        assert!(frames.row(1).is_none());
        assert!(funcs.row(1).is_none());
    }
}
