pub mod format;
pub mod marker;
pub mod raw;
pub mod selection;
pub mod shared_str;

pub use marker::{GcMajorTimings, GcSliceTimings, MarkerPayload, NurseryInfo, NurseryStatus};
pub use raw::{
    RawCategory, RawFrameTable, RawFuncTable, RawMarkerTable, RawProfile, RawProfileMeta,
    RawSamplesTable, RawStackTable, RawThread,
};
pub use selection::{Milliseconds, PreviewSelection};
pub use shared_str::SharedStr;
