//! Memoized derived data.
//!
//! Selectors are pure functions of a [`ProfileState`]. Each one declares the
//! [`DepKey`]s it reads, including those of the selectors it builds on, and
//! is recomputed only when one of their versions moved:
//!
//! ```text
//! Thread, CommittedRange ─▶ range_filtered
//!           + PreviewSelection ─▶ preview_filtered ─▶ gc_stats, pause_stats
//!                  + FilterSettings ─▶ filtered ─▶ call_tree
//! ```

pub mod memo;
pub mod state;

use std::sync::Arc;

use thiserror::Error;

use crate::error::ProfileError;
use crate::model::{CallTree, Thread, ThreadIndex};
use crate::range::selection_range;
use crate::stats::{GcStats, MarkerKind, PauseInfo, gc_stats, pause_info_for_kind};
use crate::transforms::{apply_filters, filter_thread_to_range};

pub use memo::{DepKey, Memo, Version, VersionTable};
pub use state::ProfileState;

/// A request the current profile cannot answer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("no thread with index {0}")]
    NoSuchThread(ThreadIndex),
    #[error("transform on thread {thread} refers to unknown function {func}")]
    InvalidTransform { thread: ThreadIndex, func: usize },
    #[error(transparent)]
    Profile(#[from] ProfileError),
}

/// How many times each selector has recomputed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectorStats {
    pub range_filtered: usize,
    pub preview_filtered: usize,
    pub filtered: usize,
    pub call_tree: usize,
    pub gc_stats: usize,
    pub pause_stats: usize,
}

#[derive(Debug)]
pub struct Selectors {
    range_filtered: Memo<ThreadIndex, Thread>,
    preview_filtered: Memo<ThreadIndex, Thread>,
    filtered: Memo<ThreadIndex, Thread>,
    call_tree: Memo<ThreadIndex, CallTree>,
    gc_stats: Memo<ThreadIndex, GcStats>,
    pause_stats: Memo<(ThreadIndex, MarkerKind), PauseInfo>,
}

impl Default for Selectors {
    fn default() -> Self {
        Self::new()
    }
}

impl Selectors {
    pub fn new() -> Self {
        Self {
            range_filtered: Memo::new("range_filtered_thread"),
            preview_filtered: Memo::new("preview_filtered_thread"),
            filtered: Memo::new("filtered_thread"),
            call_tree: Memo::new("call_tree"),
            gc_stats: Memo::new("preview_filtered_gc_stats"),
            pause_stats: Memo::new("pause_statistics"),
        }
    }

    /// Selectors bound to one thread of `state`.
    pub fn thread<'a>(
        &'a self,
        state: &'a ProfileState,
        index: ThreadIndex,
    ) -> Result<ThreadSelectors<'a>, QueryError> {
        state.check_thread(index)?;
        Ok(ThreadSelectors {
            selectors: self,
            state,
            index,
        })
    }

    pub fn selected<'a>(
        &'a self,
        state: &'a ProfileState,
    ) -> Result<ThreadSelectors<'a>, QueryError> {
        self.thread(state, state.selected_thread())
    }

    pub fn get_filtered_thread(
        &self,
        state: &ProfileState,
        thread: ThreadIndex,
    ) -> Result<Arc<Thread>, QueryError> {
        Ok(self.thread(state, thread)?.filtered_thread())
    }

    pub fn get_call_tree(
        &self,
        state: &ProfileState,
        thread: ThreadIndex,
    ) -> Result<Arc<CallTree>, QueryError> {
        Ok(self.thread(state, thread)?.call_tree())
    }

    pub fn get_pause_statistics(
        &self,
        state: &ProfileState,
        thread: ThreadIndex,
        kind: &MarkerKind,
    ) -> Result<Arc<PauseInfo>, QueryError> {
        Ok(self.thread(state, thread)?.pause_statistics(kind))
    }

    pub fn get_gc_stats(
        &self,
        state: &ProfileState,
        thread: ThreadIndex,
    ) -> Result<Arc<GcStats>, QueryError> {
        Ok(self.thread(state, thread)?.preview_filtered_gc_stats())
    }

    pub fn stats(&self) -> SelectorStats {
        SelectorStats {
            range_filtered: self.range_filtered.computations(),
            preview_filtered: self.preview_filtered.computations(),
            filtered: self.filtered.computations(),
            call_tree: self.call_tree.computations(),
            gc_stats: self.gc_stats.computations(),
            pause_stats: self.pause_stats.computations(),
        }
    }
}

/// The per-thread selector graph for one state snapshot.
#[derive(Debug, Clone, Copy)]
pub struct ThreadSelectors<'a> {
    selectors: &'a Selectors,
    state: &'a ProfileState,
    index: ThreadIndex,
}

impl ThreadSelectors<'_> {
    pub fn index(&self) -> ThreadIndex {
        self.index
    }

    fn source(&self) -> Arc<Thread> {
        Arc::clone(&self.state.profile().threads[self.index])
    }

    fn range_deps(&self) -> [DepKey; 2] {
        [DepKey::Thread(self.index), DepKey::CommittedRange]
    }

    fn preview_deps(&self) -> [DepKey; 3] {
        [
            DepKey::Thread(self.index),
            DepKey::CommittedRange,
            DepKey::PreviewSelection,
        ]
    }

    fn filter_deps(&self) -> [DepKey; 4] {
        [
            DepKey::Thread(self.index),
            DepKey::CommittedRange,
            DepKey::PreviewSelection,
            DepKey::FilterSettings(self.index),
        ]
    }

    /// The thread restricted to the committed range.
    pub fn range_filtered_thread(&self) -> Arc<Thread> {
        self.selectors.range_filtered.get_or_compute(
            self.index,
            &self.range_deps(),
            self.state.versions(),
            || {
                let source = self.source();
                if self.state.committed_ranges().is_empty() {
                    return source;
                }
                Arc::new(filter_thread_to_range(
                    &source,
                    &self.state.committed_range(),
                ))
            },
        )
    }

    /// The range-filtered thread further restricted to the preview
    /// selection, if there is one.
    pub fn preview_filtered_thread(&self) -> Arc<Thread> {
        self.selectors.preview_filtered.get_or_compute(
            self.index,
            &self.preview_deps(),
            self.state.versions(),
            || {
                let thread = self.range_filtered_thread();
                match selection_range(&self.state.preview_selection()) {
                    Some(range) => Arc::new(filter_thread_to_range(&thread, &range)),
                    None => thread,
                }
            },
        )
    }

    /// The preview-filtered thread with this thread's filter settings
    /// applied.
    pub fn filtered_thread(&self) -> Arc<Thread> {
        self.selectors.filtered.get_or_compute(
            self.index,
            &self.filter_deps(),
            self.state.versions(),
            || {
                let thread = self.preview_filtered_thread();
                match self.state.filter_settings(self.index) {
                    Some(settings) if !settings.is_empty() => {
                        Arc::new(apply_filters(&thread, None, settings))
                    }
                    _ => thread,
                }
            },
        )
    }

    pub fn call_tree(&self) -> Arc<CallTree> {
        self.selectors.call_tree.get_or_compute(
            self.index,
            &self.filter_deps(),
            self.state.versions(),
            || {
                let thread = self.filtered_thread();
                Arc::new(CallTree::from_thread(
                    &thread,
                    self.state.profile().interval(),
                ))
            },
        )
    }

    pub fn preview_filtered_gc_stats(&self) -> Arc<GcStats> {
        self.selectors.gc_stats.get_or_compute(
            self.index,
            &self.preview_deps(),
            self.state.versions(),
            || Arc::new(gc_stats(&self.preview_filtered_thread().markers)),
        )
    }

    pub fn pause_statistics(&self, kind: &MarkerKind) -> Arc<PauseInfo> {
        self.selectors.pause_stats.get_or_compute(
            (self.index, kind.clone()),
            &self.preview_deps(),
            self.state.versions(),
            || Arc::new(pause_info_for_kind(&self.preview_filtered_thread(), kind)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Profile, ProfileMeta, ThreadBuilder};
    use crate::transforms::FilterSettings;
    use profscope_protocol::PreviewSelection;

    fn state() -> ProfileState {
        let mut main = ThreadBuilder::new("GeckoMain");
        for t in 0..10 {
            let leaf = if t % 2 == 0 { "paint" } else { "script" };
            main.sample(&["main", leaf], t as f64);
        }
        main.marker("Paint", 2.0, Some(3.0), None);
        let mut worker = ThreadBuilder::new("DOM Worker");
        worker.sample(&["task"], 0.0);
        ProfileState::new(Profile::new(
            ProfileMeta::default(),
            vec![main.build(), worker.build()],
        ))
    }

    #[test]
    fn identical_inputs_do_not_recompute() {
        let state = state();
        let selectors = Selectors::new();
        let a = selectors.get_call_tree(&state, 0).expect("thread 0");
        let b = selectors.get_call_tree(&state, 0).expect("thread 0");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(selectors.stats().call_tree, 1);
        assert_eq!(selectors.stats().filtered, 1);
    }

    #[test]
    fn filter_change_recomputes_only_downstream() {
        let mut state = state();
        let selectors = Selectors::new();
        selectors.get_call_tree(&state, 0).expect("thread 0");
        selectors.get_gc_stats(&state, 0).expect("thread 0");

        state
            .update_filter_settings(0, |f| f.search = "paint".into())
            .expect("thread 0");
        let tree = selectors.get_call_tree(&state, 0).expect("thread 0");
        selectors.get_gc_stats(&state, 0).expect("thread 0");

        let stats = selectors.stats();
        assert_eq!(stats.call_tree, 2);
        assert_eq!(stats.filtered, 2);
        assert_eq!(stats.preview_filtered, 1);
        assert_eq!(stats.gc_stats, 1);
        assert!((tree.root_total() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn preview_selection_narrows_the_tree() {
        let mut state = state();
        let selectors = Selectors::new();
        state.set_preview_selection(PreviewSelection::range(2.0, 4.0));
        let tree = selectors.get_call_tree(&state, 0).expect("thread 0");
        assert!((tree.root_total() - 2.0).abs() < f64::EPSILON);

        // Releasing the drag with the same bounds reuses the tree.
        state.set_preview_selection(PreviewSelection::range(2.0, 4.0));
        let again = selectors.get_call_tree(&state, 0).expect("thread 0");
        assert!(Arc::ptr_eq(&tree, &again));
    }

    #[test]
    fn unfiltered_thread_is_shared_with_the_profile() {
        let state = state();
        let selectors = Selectors::new();
        let filtered = selectors.get_filtered_thread(&state, 1).expect("thread 1");
        assert!(Arc::ptr_eq(&filtered, &state.profile().threads[1]));
    }

    #[test]
    fn threads_are_cached_independently() {
        let mut state = state();
        let selectors = Selectors::new();
        selectors.get_call_tree(&state, 0).expect("thread 0");
        selectors.get_call_tree(&state, 1).expect("thread 1");
        state
            .set_filter_settings(
                1,
                FilterSettings {
                    invert: true,
                    ..FilterSettings::default()
                },
            )
            .expect("thread 1");
        selectors.get_call_tree(&state, 0).expect("thread 0");
        assert_eq!(selectors.stats().call_tree, 2);
    }

    #[test]
    fn empty_selection_gives_sentinels() {
        let mut state = state();
        let selectors = Selectors::new();
        state.set_preview_selection(PreviewSelection::range(100.0, 200.0));
        let tree = selectors.get_call_tree(&state, 0).expect("thread 0");
        assert!(tree.is_empty());
        let pauses = selectors
            .get_pause_statistics(&state, 0, &MarkerKind::Named("Paint".into()))
            .expect("thread 0");
        assert!(!pauses.has_pauses());
    }

    #[test]
    fn unknown_thread_is_a_query_error() {
        let state = state();
        let selectors = Selectors::new();
        assert_eq!(
            selectors.get_call_tree(&state, 7).map(|_| ()),
            Err(QueryError::NoSuchThread(7))
        );
    }
}
