pub mod builder;
pub mod call_tree;
pub mod markers;
pub mod profile;
pub mod tables;
pub mod thread;

pub use builder::ThreadBuilder;
pub use call_tree::{CallNode, CallNodeIndex, CallTree, NO_STACK_NAME};
pub use markers::{IndexIntoMarkers, Marker, MarkerTable};
pub use profile::{Category, Profile, ProfileMeta, ThreadIndex};
pub use tables::{
    CategoryIndex, FrameIndex, FrameRow, FrameTable, FuncIndex, FuncRow, FuncTable,
    IndexIntoSamples, ResourceIndex, SampleRow, SamplesTable, StackIndex, StackRow, StackTable,
    StackTableBuilder, StringIndex, StringTable,
};
pub use thread::Thread;
