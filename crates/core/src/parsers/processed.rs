use std::sync::Arc;

use log::{debug, info, warn};
use profscope_protocol::{
    RawFrameTable, RawFuncTable, RawMarkerTable, RawProfile, RawSamplesTable, RawStackTable,
    RawThread,
};
use thiserror::Error;

use crate::error::ProfileError;
use crate::model::{
    Category, FrameRow, FrameTable, FuncRow, FuncTable, MarkerTable, Profile, ProfileMeta,
    SamplesTable, StackIndex, StackTable, StackTableBuilder, StringTable, Thread,
};

#[derive(Debug, Error)]
pub enum ProcessedParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no threads found")]
    NoThreads,
    #[error("thread {index} ({name}): {source}")]
    Thread {
        index: usize,
        name: String,
        #[source]
        source: ProfileError,
    },
}

/// Parse a processed-profile JSON document into a validated `Profile`.
pub fn parse_processed_profile(data: &[u8]) -> Result<Profile, ProcessedParseError> {
    let raw: RawProfile = serde_json::from_slice(data)?;
    profile_from_raw(raw)
}

/// Convert and validate an already-deserialized profile.
pub fn profile_from_raw(raw: RawProfile) -> Result<Profile, ProcessedParseError> {
    if raw.threads.is_empty() {
        return Err(ProcessedParseError::NoThreads);
    }

    let category_count = raw.meta.categories.len();
    let meta = ProfileMeta {
        interval: raw.meta.interval,
        start_time: raw.meta.start_time,
        product: raw.meta.product,
        categories: raw
            .meta
            .categories
            .into_iter()
            .map(|c| Category {
                name: c.name,
                color: c.color,
            })
            .collect(),
    };

    let mut threads = Vec::with_capacity(raw.threads.len());
    for (index, raw_thread) in raw.threads.into_iter().enumerate() {
        let name = raw_thread.name.clone();
        match thread_from_raw(raw_thread, category_count) {
            Ok(thread) => threads.push(thread),
            Err(source) => {
                warn!("rejecting thread {index} ({name}): {source}");
                return Err(ProcessedParseError::Thread {
                    index,
                    name,
                    source,
                });
            }
        }
    }

    let sample_count: usize = threads.iter().map(Thread::sample_count).sum();
    info!(
        "loaded profile: {} threads, {} samples, interval {}ms",
        threads.len(),
        sample_count,
        meta.interval
    );
    Ok(Profile::new(meta, threads))
}

/// Validate one raw thread and build its tables.
///
/// Category indices are only checked when the profile declares categories.
/// Duplicate `(prefix, frame)` stacks are merged and samples re-pointed.
pub fn thread_from_raw(raw: RawThread, category_count: usize) -> Result<Thread, ProfileError> {
    let string_count = raw.string_table.len();
    let func_table = convert_funcs(&raw.func_table, string_count)?;
    let frame_table = convert_frames(&raw.frame_table, func_table.len(), category_count)?;
    let (stack_table, remap) = convert_stacks(&raw.stack_table, frame_table.len())?;
    let samples = convert_samples(raw.samples, &remap)?;
    let markers = convert_markers(raw.markers, string_count, category_count)?;

    Ok(Thread {
        name: raw.name,
        process_type: raw.process_type,
        pid: raw.pid,
        tid: raw.tid,
        register_time: raw.register_time,
        unregister_time: raw.unregister_time,
        string_table: Arc::new(StringTable::from_strings(raw.string_table)),
        func_table: Arc::new(func_table),
        frame_table: Arc::new(frame_table),
        stack_table: Arc::new(stack_table),
        samples: Arc::new(samples),
        markers: Arc::new(markers),
    })
}

fn check_len(
    table: &'static str,
    column: &'static str,
    actual: usize,
    expected: usize,
) -> Result<(), ProfileError> {
    if actual == expected {
        Ok(())
    } else {
        Err(ProfileError::ColumnLength {
            table,
            column,
            expected,
            actual,
        })
    }
}

/// Optional columns may be omitted entirely.
fn check_optional_len(
    table: &'static str,
    column: &'static str,
    actual: usize,
    expected: usize,
) -> Result<(), ProfileError> {
    if actual == 0 {
        return Ok(());
    }
    check_len(table, column, actual, expected)
}

fn check_index(
    table: &'static str,
    column: &'static str,
    row: usize,
    index: usize,
    len: usize,
) -> Result<(), ProfileError> {
    if index < len {
        Ok(())
    } else {
        Err(ProfileError::IndexOutOfBounds {
            table,
            column,
            row,
            index,
            len,
        })
    }
}

fn check_category(
    table: &'static str,
    row: usize,
    category: Option<usize>,
    category_count: usize,
) -> Result<(), ProfileError> {
    match category {
        Some(c) if category_count > 0 => check_index(table, "category", row, c, category_count),
        _ => Ok(()),
    }
}

fn convert_funcs(raw: &RawFuncTable, string_count: usize) -> Result<FuncTable, ProfileError> {
    const T: &str = "funcTable";
    let len = raw.length.unwrap_or(raw.name.len());
    check_len(T, "name", raw.name.len(), len)?;
    check_optional_len(T, "isJS", raw.is_js.len(), len)?;
    check_optional_len(T, "relevantForJS", raw.relevant_for_js.len(), len)?;
    check_optional_len(T, "resource", raw.resource.len(), len)?;
    check_optional_len(T, "fileName", raw.file_name.len(), len)?;

    let mut table = FuncTable::with_capacity(len);
    for row in 0..len {
        let name = raw.name[row];
        check_index(T, "name", row, name, string_count)?;
        let file_name = raw.file_name.get(row).copied().flatten();
        if let Some(file_name) = file_name {
            check_index(T, "fileName", row, file_name, string_count)?;
        }
        table.push(FuncRow {
            name,
            is_js: raw.is_js.get(row).copied().unwrap_or(false),
            relevant_for_js: raw.relevant_for_js.get(row).copied().unwrap_or(false),
            resource: raw.resource.get(row).copied().flatten(),
            file_name,
        });
    }
    Ok(table)
}

fn convert_frames(
    raw: &RawFrameTable,
    func_count: usize,
    category_count: usize,
) -> Result<FrameTable, ProfileError> {
    const T: &str = "frameTable";
    let len = raw.length.unwrap_or(raw.func.len());
    check_len(T, "func", raw.func.len(), len)?;
    check_optional_len(T, "category", raw.category.len(), len)?;
    check_optional_len(T, "inlineDepth", raw.inline_depth.len(), len)?;
    check_optional_len(T, "line", raw.line.len(), len)?;
    check_optional_len(T, "address", raw.address.len(), len)?;

    let mut table = FrameTable::with_capacity(len);
    for row in 0..len {
        let func = raw.func[row];
        check_index(T, "func", row, func, func_count)?;
        let category = raw.category.get(row).copied().flatten();
        check_category(T, row, category, category_count)?;
        table.push(FrameRow {
            func,
            category,
            inline_depth: raw.inline_depth.get(row).copied().unwrap_or(0),
            line: raw.line.get(row).copied().flatten(),
            address: raw.address.get(row).copied().flatten(),
        });
    }
    Ok(table)
}

/// Returns the deduplicated table and the raw-row → stack mapping.
fn convert_stacks(
    raw: &RawStackTable,
    frame_count: usize,
) -> Result<(StackTable, Vec<StackIndex>), ProfileError> {
    const T: &str = "stackTable";
    let len = raw.length.unwrap_or(raw.frame.len());
    check_len(T, "frame", raw.frame.len(), len)?;
    check_len(T, "prefix", raw.prefix.len(), len)?;

    let mut builder = StackTableBuilder::with_capacity(len);
    let mut remap = Vec::with_capacity(len);
    for row in 0..len {
        let frame = raw.frame[row];
        check_index(T, "frame", row, frame, frame_count)?;
        let prefix = match raw.prefix[row] {
            Some(prefix) if prefix >= row => {
                return Err(ProfileError::StackPrefixNotEarlier { stack: row, prefix });
            }
            Some(prefix) => Some(remap[prefix]),
            None => None,
        };
        remap.push(builder.index_for_stack(prefix, frame));
    }

    if builder.len() < len {
        debug!("merged {} duplicate stacks", len - builder.len());
    }
    Ok((builder.finish(), remap))
}

fn convert_samples(
    raw: RawSamplesTable,
    remap: &[StackIndex],
) -> Result<SamplesTable, ProfileError> {
    const T: &str = "samples";
    let len = raw.length.unwrap_or(raw.stack.len());
    check_len(T, "stack", raw.stack.len(), len)?;
    check_len(T, "time", raw.time.len(), len)?;
    if let Some(weight) = &raw.weight {
        check_len(T, "weight", weight.len(), len)?;
        if let Some((row, &weight)) = weight
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(ProfileError::NonFiniteWeight { row, weight });
        }
    }

    let mut previous = f64::NEG_INFINITY;
    for (row, &time) in raw.time.iter().enumerate() {
        if !time.is_finite() {
            return Err(ProfileError::NonFiniteTime { table: T, row });
        }
        if time < previous {
            return Err(ProfileError::SampleTimeDecreasing {
                sample: row,
                previous,
                time,
            });
        }
        previous = time;
    }

    let stacks = raw
        .stack
        .iter()
        .enumerate()
        .map(|(row, stack)| match *stack {
            Some(stack) => {
                check_index(T, "stack", row, stack, remap.len())?;
                Ok(Some(remap[stack]))
            }
            None => Ok(None),
        })
        .collect::<Result<Vec<_>, ProfileError>>()?;

    Ok(SamplesTable::from_columns(stacks, raw.time, raw.weight))
}

fn convert_markers(
    raw: RawMarkerTable,
    string_count: usize,
    category_count: usize,
) -> Result<MarkerTable, ProfileError> {
    const T: &str = "markers";
    let len = raw.length.unwrap_or(raw.name.len());
    check_len(T, "name", raw.name.len(), len)?;
    check_len(T, "startTime", raw.start_time.len(), len)?;
    check_optional_len(T, "endTime", raw.end_time.len(), len)?;
    check_optional_len(T, "category", raw.category.len(), len)?;
    check_optional_len(T, "data", raw.data.len(), len)?;

    let mut table = MarkerTable::new();
    let mut data = raw.data.into_iter();
    for row in 0..len {
        let name = raw.name[row];
        check_index(T, "name", row, name, string_count)?;
        let start = raw.start_time[row];
        if !start.is_finite() {
            return Err(ProfileError::NonFiniteTime { table: T, row });
        }
        let end = raw.end_time.get(row).copied().flatten();
        if let Some(end) = end {
            if !end.is_finite() {
                return Err(ProfileError::NonFiniteTime { table: T, row });
            }
            if end < start {
                return Err(ProfileError::MarkerEndBeforeStart {
                    marker: row,
                    start,
                    end,
                });
            }
        }
        let category = raw.category.get(row).copied().flatten();
        check_category(T, row, category, category_count)?;
        table.push(name, start, end, category, data.next().flatten());
    }
    Ok(table)
}
