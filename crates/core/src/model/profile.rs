use std::sync::Arc;

use profscope_protocol::Milliseconds;
use serde::{Deserialize, Serialize};

use super::tables::{CategoryIndex, FrameTable, FuncIndex};
use super::thread::Thread;
use crate::error::ProfileError;
use crate::range::{StartEndRange, time_range_for_thread};

pub type ThreadIndex = usize;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileMeta {
    /// Sampling interval.
    pub interval: Milliseconds,
    /// Absolute start time (ms since epoch); thread times are relative to it.
    pub start_time: Milliseconds,
    pub product: Option<String>,
    pub categories: Vec<Category>,
}

impl Default for ProfileMeta {
    fn default() -> Self {
        Self {
            interval: 1.0,
            start_time: 0.0,
            product: None,
            categories: Vec::new(),
        }
    }
}

/// A loaded profile: metadata plus immutable threads.
#[derive(Debug, Clone, Default)]
pub struct Profile {
    pub meta: ProfileMeta,
    pub threads: Vec<Arc<Thread>>,
}

impl Profile {
    pub fn new(meta: ProfileMeta, threads: Vec<Thread>) -> Self {
        Self {
            meta,
            threads: threads.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn thread(&self, index: ThreadIndex) -> Option<&Arc<Thread>> {
        self.threads.get(index)
    }

    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    pub fn interval(&self) -> Milliseconds {
        self.meta.interval
    }

    /// The union of every thread's time range, or
    /// [`StartEndRange::empty`] when no thread has data.
    pub fn root_range(&self) -> StartEndRange {
        self.threads
            .iter()
            .map(|t| time_range_for_thread(t, self.meta.interval))
            .filter(|r| !r.is_empty())
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(StartEndRange::empty)
    }

    /// Swap in a new frame table for one thread, e.g. after symbolication.
    /// The table is validated against the thread's func table and the
    /// declared categories first; on error the profile is unchanged.
    pub fn replace_frame_table(
        &mut self,
        index: ThreadIndex,
        frame_table: FrameTable,
    ) -> Result<(), ProfileError> {
        let thread = self
            .threads
            .get(index)
            .ok_or(ProfileError::NoSuchThread(index))?;

        if frame_table.len() < thread.frame_table.len() {
            return Err(ProfileError::ColumnLength {
                table: "frameTable",
                column: "func",
                expected: thread.frame_table.len(),
                actual: frame_table.len(),
            });
        }
        let func_count = thread.func_table.len();
        check_funcs(frame_table.funcs(), func_count)?;
        check_categories(frame_table.categories(), self.meta.categories.len())?;

        let replaced = thread.with_frame_table(frame_table);
        self.threads[index] = Arc::new(replaced);
        Ok(())
    }
}

fn check_funcs(funcs: &[FuncIndex], func_count: usize) -> Result<(), ProfileError> {
    match funcs.iter().position(|&f| f >= func_count) {
        Some(row) => Err(ProfileError::IndexOutOfBounds {
            table: "frameTable",
            column: "func",
            row,
            index: funcs[row],
            len: func_count,
        }),
        None => Ok(()),
    }
}

/// Categories are only checked when the profile declares some.
fn check_categories(
    categories: &[Option<CategoryIndex>],
    category_count: usize,
) -> Result<(), ProfileError> {
    if category_count == 0 {
        return Ok(());
    }
    let bad = categories
        .iter()
        .enumerate()
        .find_map(|(row, &c)| c.filter(|&c| c >= category_count).map(|c| (row, c)));
    match bad {
        Some((row, index)) => Err(ProfileError::IndexOutOfBounds {
            table: "frameTable",
            column: "category",
            row,
            index,
            len: category_count,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FrameRow, ThreadBuilder};

    fn two_thread_profile() -> Profile {
        let mut main = ThreadBuilder::new("GeckoMain");
        main.sample(&["main"], 10.0);
        main.sample(&["main"], 20.0);
        let mut worker = ThreadBuilder::new("DOM Worker");
        worker.sample(&["task"], 5.0);
        Profile::new(ProfileMeta::default(), vec![main.build(), worker.build()])
    }

    #[test]
    fn root_range_unions_threads() {
        let profile = two_thread_profile();
        assert_eq!(profile.root_range(), StartEndRange::new(5.0, 21.0));
    }

    #[test]
    fn empty_profile_range() {
        assert_eq!(Profile::default().root_range(), StartEndRange::empty());
    }

    #[test]
    fn replace_frame_table_swaps_one_thread() {
        let mut profile = two_thread_profile();
        let before = Arc::clone(&profile.threads[1]);

        let mut frames = FrameTable::new();
        frames.push(FrameRow {
            line: Some(42),
            ..FrameRow::for_func(0)
        });
        profile
            .replace_frame_table(0, frames)
            .expect("valid frame table");

        assert_eq!(profile.threads[0].frame_table.row(0).and_then(|r| r.line), Some(42));
        assert!(Arc::ptr_eq(&before, &profile.threads[1]));
    }

    #[test]
    fn replace_frame_table_rejects_bad_func() {
        let mut profile = two_thread_profile();
        let mut frames = FrameTable::new();
        frames.push(FrameRow::for_func(9));
        let err = profile.replace_frame_table(0, frames);
        assert!(matches!(
            err,
            Err(ProfileError::IndexOutOfBounds { column: "func", .. })
        ));
        assert_eq!(
            profile.replace_frame_table(5, FrameTable::new()),
            Err(ProfileError::NoSuchThread(5))
        );
    }

    #[test]
    fn replace_frame_table_rejects_undeclared_category() {
        let mut profile = two_thread_profile();
        profile.meta.categories = vec![Category {
            name: "JavaScript".to_string(),
            color: Some("yellow".to_string()),
        }];

        let mut frames = FrameTable::new();
        frames.push(FrameRow {
            category: Some(3),
            ..FrameRow::for_func(0)
        });
        assert_eq!(
            profile.replace_frame_table(0, frames),
            Err(ProfileError::IndexOutOfBounds {
                table: "frameTable",
                column: "category",
                row: 0,
                index: 3,
                len: 1,
            })
        );

        let mut frames = FrameTable::new();
        frames.push(FrameRow {
            category: Some(0),
            ..FrameRow::for_func(0)
        });
        assert!(profile.replace_frame_table(0, frames).is_ok());
    }
}
