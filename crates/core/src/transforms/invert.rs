use crate::model::{StackIndex, StackTableBuilder, Thread};

/// Reverse every sampled stack so that leaf functions become roots.
///
/// Each distinct stack is reversed once; repeated samples of the same stack
/// reuse the result.
pub fn invert_call_stack(thread: &Thread) -> Thread {
    let stacks = &thread.stack_table;
    let mut builder = StackTableBuilder::with_capacity(stacks.len());
    let mut inverted: Vec<Option<StackIndex>> = vec![None; stacks.len()];

    let samples = thread.samples.map_stacks(|stack| {
        if let Some(done) = inverted[stack] {
            return Some(done);
        }
        let mut prefix = None;
        for ancestor in stacks.ancestors(stack) {
            prefix = Some(builder.index_for_stack(prefix, stacks.frame(ancestor)));
        }
        inverted[stack] = prefix;
        prefix
    });

    thread.with_stacks(builder.finish(), samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CallTree, FrameIndex, ThreadBuilder};

    fn thread() -> Thread {
        let mut b = ThreadBuilder::new("Main");
        b.sample(&["main", "a", "leaf"], 0.0);
        b.sample(&["main", "b", "leaf"], 1.0);
        b.sample(&["main", "b", "leaf"], 2.0);
        b.sample(&["main", "b"], 3.0);
        b.idle_sample(4.0);
        b.build()
    }

    fn triples(tree: &CallTree) -> Vec<(Vec<FrameIndex>, u64, u64)> {
        let mut out: Vec<_> = (0..tree.len())
            .filter_map(|i| {
                let node = tree.node(i)?;
                Some((tree.path(i), node.self_time as u64, node.total_time as u64))
            })
            .collect();
        out.sort();
        out
    }

    #[test]
    fn leaves_become_roots() {
        let inverted = invert_call_stack(&thread());
        let tree = CallTree::from_thread(&inverted, 1.0);
        let root = tree.node(tree.roots()[0]).expect("root");
        assert_eq!(root.name, "leaf");
        assert!((root.total_time - 3.0).abs() < f64::EPSILON);
        assert!((tree.root_total() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn repeated_stacks_share_one_inverted_stack() {
        let inverted = invert_call_stack(&thread());
        let stacks = inverted.samples.stacks();
        assert_eq!(stacks[1], stacks[2]);
        assert_eq!(stacks[4], None);
    }

    #[test]
    fn inverting_twice_restores_the_tree() {
        let original = thread();
        let twice = invert_call_stack(&invert_call_stack(&original));
        assert_eq!(
            triples(&CallTree::from_thread(&original, 1.0)),
            triples(&CallTree::from_thread(&twice, 1.0))
        );
    }
}
