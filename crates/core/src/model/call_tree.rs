use std::cmp::Ordering;

use profscope_protocol::{Milliseconds, SharedStr};
use serde::Serialize;

use super::tables::{FrameIndex, FuncIndex, StackIndex};
use super::thread::Thread;

pub type CallNodeIndex = usize;

/// Name of the synthetic root collecting samples that have no stack.
pub const NO_STACK_NAME: &str = "(no stack)";

/// Aggregated call tree node.
///
/// Times are in sample weight (one per unweighted sample); multiply by
/// [`CallTree::interval`] for milliseconds.
#[derive(Debug, Clone, Serialize)]
pub struct CallNode {
    /// `None` only for the synthetic "(no stack)" root.
    pub frame: Option<FrameIndex>,
    pub func: Option<FuncIndex>,
    pub stack: Option<StackIndex>,
    pub name: SharedStr,
    pub parent: Option<CallNodeIndex>,
    pub depth: u32,
    /// Weight of samples whose leaf is exactly this node.
    pub self_time: f64,
    /// Self time of this node and all its descendants.
    pub total_time: f64,
    pub sample_count: usize,
    pub children: Vec<CallNodeIndex>,
}

/// Call tree built from a (filtered) thread.
#[derive(Debug, Clone, Serialize)]
pub struct CallTree {
    nodes: Vec<CallNode>,
    roots: Vec<CallNodeIndex>,
    interval: Milliseconds,
}

impl CallTree {
    pub fn new(interval: Milliseconds) -> Self {
        Self {
            nodes: Vec::new(),
            roots: Vec::new(),
            interval,
        }
    }

    /// Aggregate the samples of `thread` into a tree.
    ///
    /// Self weight is summed per stack in one pass over the samples. Totals
    /// are then propagated by walking the stack table backwards: a stack's
    /// prefix always has a smaller index, so every stack's total is final
    /// before it is added to its prefix. Each (stack, parent) edge is visited
    /// once, giving O(stacks + samples) overall.
    pub fn from_thread(thread: &Thread, interval: Milliseconds) -> Self {
        let stack_table = &thread.stack_table;
        let samples = &thread.samples;
        let stack_count = stack_table.len();

        let mut self_time = vec![0.0; stack_count];
        let mut count = vec![0usize; stack_count];
        let mut idle_time = 0.0;
        let mut idle_count = 0usize;

        for sample in samples.iter() {
            match sample.stack {
                Some(stack) => {
                    self_time[stack] += sample.weight;
                    count[stack] += 1;
                }
                None => {
                    idle_time += sample.weight;
                    idle_count += 1;
                }
            }
        }

        let mut total_time = self_time.clone();
        let mut total_count = count;
        for stack in (0..stack_count).rev() {
            if let Some(prefix) = stack_table.prefix(stack) {
                total_time[prefix] += total_time[stack];
                total_count[prefix] += total_count[stack];
            }
        }

        let mut tree = CallTree::new(interval);
        let mut node_of_stack: Vec<Option<CallNodeIndex>> = vec![None; stack_count];

        if idle_count > 0 {
            let index = tree.nodes.len();
            tree.nodes.push(CallNode {
                frame: None,
                func: None,
                stack: None,
                name: SharedStr::from(NO_STACK_NAME),
                parent: None,
                depth: 0,
                self_time: idle_time,
                total_time: idle_time,
                sample_count: idle_count,
                children: Vec::new(),
            });
            tree.roots.push(index);
        }

        // Forward order visits every prefix before its children.
        for stack in 0..stack_count {
            if total_count[stack] == 0 {
                continue;
            }
            let frame = stack_table.frame(stack);
            let parent = stack_table.prefix(stack).and_then(|p| node_of_stack[p]);
            let depth = parent.map_or(0, |p| tree.nodes[p].depth + 1);
            let index = tree.nodes.len();
            tree.nodes.push(CallNode {
                frame: Some(frame),
                func: Some(thread.frame_func(frame)),
                stack: Some(stack),
                name: thread.frame_name(frame),
                parent,
                depth,
                self_time: self_time[stack],
                total_time: total_time[stack],
                sample_count: total_count[stack],
                children: Vec::new(),
            });
            node_of_stack[stack] = Some(index);
            match parent {
                Some(p) => tree.nodes[p].children.push(index),
                None => tree.roots.push(index),
            }
        }

        tree.sort_children();
        tree
    }

    /// Heaviest first; ties by frame index, then stack index, which keeps
    /// the order stable with respect to insertion.
    fn sort_children(&mut self) {
        let nodes = &self.nodes;
        let order = |a: &CallNodeIndex, b: &CallNodeIndex| -> Ordering {
            let (a, b) = (&nodes[*a], &nodes[*b]);
            b.total_time
                .total_cmp(&a.total_time)
                .then_with(|| a.frame.cmp(&b.frame))
                .then_with(|| a.stack.cmp(&b.stack))
        };

        let mut roots = self.roots.clone();
        roots.sort_by(order);
        let sorted_children: Vec<Vec<CallNodeIndex>> = nodes
            .iter()
            .map(|n| {
                let mut c = n.children.clone();
                c.sort_by(order);
                c
            })
            .collect();

        self.roots = roots;
        for (node, children) in self.nodes.iter_mut().zip(sorted_children) {
            node.children = children;
        }
    }

    pub fn node(&self, index: CallNodeIndex) -> Option<&CallNode> {
        self.nodes.get(index)
    }

    pub fn nodes(&self) -> &[CallNode] {
        &self.nodes
    }

    pub fn roots(&self) -> &[CallNodeIndex] {
        &self.roots
    }

    pub fn children(&self, index: CallNodeIndex) -> &[CallNodeIndex] {
        self.nodes.get(index).map_or(&[], |n| &n.children)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn interval(&self) -> Milliseconds {
        self.interval
    }

    /// Sum of every root's total, including the "(no stack)" bucket. Equals
    /// the total weight of the samples the tree was built from.
    pub fn root_total(&self) -> f64 {
        self.roots.iter().map(|&r| self.nodes[r].total_time).sum()
    }

    /// Convert a weight to milliseconds.
    pub fn to_milliseconds(&self, weight: f64) -> Milliseconds {
        weight * self.interval
    }

    /// Call-node path of `index`: frames from the root. The "(no stack)"
    /// node has an empty path.
    pub fn path(&self, index: CallNodeIndex) -> Vec<FrameIndex> {
        let mut path = Vec::new();
        let mut current = self.nodes.get(index);
        while let Some(node) = current {
            if let Some(frame) = node.frame {
                path.push(frame);
            }
            current = node.parent.and_then(|p| self.nodes.get(p));
        }
        path.reverse();
        path
    }

    pub fn find_by_path(&self, path: &[FrameIndex]) -> Option<CallNodeIndex> {
        let (first, rest) = path.split_first()?;
        let mut current = *self
            .roots
            .iter()
            .find(|&&r| self.nodes[r].frame == Some(*first))?;
        for frame in rest {
            current = *self.nodes[current]
                .children
                .iter()
                .find(|&&c| self.nodes[c].frame == Some(*frame))?;
        }
        Some(current)
    }

    /// Node indices in display order: pre-order, heaviest sibling first.
    pub fn iter_depth_first(&self) -> DepthFirst<'_> {
        DepthFirst {
            tree: self,
            pending: self.roots.iter().rev().copied().collect(),
        }
    }
}

pub struct DepthFirst<'a> {
    tree: &'a CallTree,
    pending: Vec<CallNodeIndex>,
}

impl Iterator for DepthFirst<'_> {
    type Item = CallNodeIndex;

    fn next(&mut self) -> Option<CallNodeIndex> {
        let index = self.pending.pop()?;
        self.pending
            .extend(self.tree.children(index).iter().rev().copied());
        Some(index)
    }
}
