use std::sync::Arc;

use log::debug;
use profscope_protocol::PreviewSelection;

use super::QueryError;
use super::memo::{DepKey, VersionTable};
use crate::model::{FrameTable, Profile, ThreadIndex};
use crate::range::StartEndRange;
use crate::transforms::FilterSettings;

/// The inputs every selector reads: a loaded profile plus the user's view
/// state. Each setter bumps the version of what it changed, and only when
/// the value actually changed.
#[derive(Debug, Clone)]
pub struct ProfileState {
    profile: Arc<Profile>,
    root_range: StartEndRange,
    committed_ranges: Vec<StartEndRange>,
    preview_selection: PreviewSelection,
    filter_settings: Vec<FilterSettings>,
    selected_thread: ThreadIndex,
    versions: VersionTable,
}

impl ProfileState {
    pub fn new(profile: impl Into<Arc<Profile>>) -> Self {
        let profile = profile.into();
        let thread_count = profile.thread_count();

        let mut versions = VersionTable::new();
        versions.bump(DepKey::CommittedRange);
        versions.bump(DepKey::PreviewSelection);
        for index in 0..thread_count {
            versions.bump(DepKey::Thread(index));
            versions.bump(DepKey::FilterSettings(index));
        }

        Self {
            root_range: profile.root_range(),
            profile,
            committed_ranges: Vec::new(),
            preview_selection: PreviewSelection::none(),
            filter_settings: vec![FilterSettings::default(); thread_count],
            selected_thread: 0,
            versions,
        }
    }

    pub fn profile(&self) -> &Arc<Profile> {
        &self.profile
    }

    pub fn versions(&self) -> &VersionTable {
        &self.versions
    }

    pub fn check_thread(&self, index: ThreadIndex) -> Result<(), QueryError> {
        if index < self.profile.thread_count() {
            Ok(())
        } else {
            Err(QueryError::NoSuchThread(index))
        }
    }

    /// Time span of the whole profile.
    pub fn root_range(&self) -> StartEndRange {
        self.root_range
    }

    /// The innermost committed range, or the root range when nothing is
    /// committed.
    pub fn committed_range(&self) -> StartEndRange {
        self.committed_ranges
            .last()
            .copied()
            .unwrap_or(self.root_range)
    }

    pub fn committed_ranges(&self) -> &[StartEndRange] {
        &self.committed_ranges
    }

    pub fn preview_selection(&self) -> PreviewSelection {
        self.preview_selection
    }

    pub fn filter_settings(&self, thread: ThreadIndex) -> Option<&FilterSettings> {
        self.filter_settings.get(thread)
    }

    pub fn selected_thread(&self) -> ThreadIndex {
        self.selected_thread
    }

    pub fn select_thread(&mut self, thread: ThreadIndex) -> Result<(), QueryError> {
        self.check_thread(thread)?;
        self.selected_thread = thread;
        Ok(())
    }

    /// Store the new selection. Dragging updates (`is_modifying` flips with
    /// the same bounds) keep the current version.
    pub fn set_preview_selection(&mut self, selection: PreviewSelection) {
        if !self.preview_selection.same_bounds(&selection) {
            self.versions.bump(DepKey::PreviewSelection);
        }
        self.preview_selection = selection;
    }

    /// Zoom into `range`, clamped to the current committed range. Clears
    /// the preview selection.
    pub fn push_committed_range(&mut self, range: StartEndRange) {
        let current = self.committed_range();
        let range = range
            .intersect(&current)
            .unwrap_or_else(|| StartEndRange::new(current.start, current.start));
        debug!("committing range {:?}", range);
        self.committed_ranges.push(range);
        self.versions.bump(DepKey::CommittedRange);
        self.set_preview_selection(PreviewSelection::none());
    }

    /// Zoom out until `depth` committed ranges remain.
    pub fn pop_committed_ranges(&mut self, depth: usize) {
        if depth >= self.committed_ranges.len() {
            return;
        }
        self.committed_ranges.truncate(depth);
        self.versions.bump(DepKey::CommittedRange);
        self.set_preview_selection(PreviewSelection::none());
    }

    /// Replace a thread's filter settings. Transforms must name functions
    /// that exist in that thread.
    pub fn set_filter_settings(
        &mut self,
        thread: ThreadIndex,
        settings: FilterSettings,
    ) -> Result<(), QueryError> {
        self.check_thread(thread)?;
        let func_count = self.profile.threads[thread].func_table.len();
        if let Some(bad) = settings.transforms.iter().find(|t| t.func() >= func_count) {
            return Err(QueryError::InvalidTransform {
                thread,
                func: bad.func(),
            });
        }
        if self.filter_settings[thread] != settings {
            self.filter_settings[thread] = settings;
            self.versions.bump(DepKey::FilterSettings(thread));
        }
        Ok(())
    }

    /// Edit a thread's filter settings in place.
    pub fn update_filter_settings(
        &mut self,
        thread: ThreadIndex,
        edit: impl FnOnce(&mut FilterSettings),
    ) -> Result<(), QueryError> {
        let mut settings = self
            .filter_settings
            .get(thread)
            .cloned()
            .ok_or(QueryError::NoSuchThread(thread))?;
        edit(&mut settings);
        self.set_filter_settings(thread, settings)
    }

    /// Install a symbolicated frame table for one thread.
    pub fn replace_frame_table(
        &mut self,
        thread: ThreadIndex,
        frame_table: FrameTable,
    ) -> Result<(), QueryError> {
        Arc::make_mut(&mut self.profile).replace_frame_table(thread, frame_table)?;
        self.versions.bump(DepKey::Thread(thread));
        Ok(())
    }
}
