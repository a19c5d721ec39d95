//! Profile data model and derived-data engine.
//!
//! ```text
//!   RawProfile ──▶ parsers ──▶ Profile (validated, immutable tables)
//!                                 │
//!                                 ▼
//!   ProfileState ──▶ Selectors: range ─▶ preview ─▶ filters ─▶ CallTree
//!                                           └──────▶ GcStats / PauseInfo
//! ```

pub mod error;
pub mod model;
pub mod parsers;
pub mod range;
pub mod selectors;
pub mod stats;
pub mod transforms;

pub use error::ProfileError;
pub use model::{CallTree, Profile, Thread};
pub use range::StartEndRange;
pub use selectors::{ProfileState, QueryError, Selectors};
pub use stats::{GcStats, MarkerKind, PauseInfo};
pub use transforms::{FilterSettings, ImplementationFilter, Transform};
