use serde::{Deserialize, Serialize};

/// Marker payload, tagged by its `type` field.
///
/// Only the GC shapes are modeled in detail; the statistics aggregator
/// reads them. Any other discriminant deserializes to `Unknown` so that a
/// profile carrying marker types this engine does not know about still
/// loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MarkerPayload {
    #[serde(rename = "GCMinor")]
    GcMinor {
        #[serde(default)]
        nursery: Option<NurseryInfo>,
    },
    #[serde(rename = "GCMajor")]
    GcMajor {
        #[serde(default)]
        timings: Option<GcMajorTimings>,
    },
    #[serde(rename = "GCSlice")]
    GcSlice {
        #[serde(default)]
        timings: Option<GcSliceTimings>,
    },
    Text {
        name: String,
    },
    #[serde(other)]
    Unknown,
}

impl MarkerPayload {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::GcMinor { .. } => "GCMinor",
            Self::GcMajor { .. } => "GCMajor",
            Self::GcSlice { .. } => "GCSlice",
            Self::Text { .. } => "Text",
            Self::Unknown => "Unknown",
        }
    }
}

/// Outcome of a nursery collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NurseryStatus {
    Complete,
    /// The nursery had nothing to collect; the marker is not a real pause.
    NurseryEmpty,
    /// Any other status, kept verbatim.
    Other(String),
}

impl From<String> for NurseryStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "complete" => Self::Complete,
            "nursery empty" => Self::NurseryEmpty,
            _ => Self::Other(s),
        }
    }
}

impl From<NurseryStatus> for String {
    fn from(status: NurseryStatus) -> Self {
        match status {
            NurseryStatus::Complete => "complete".to_string(),
            NurseryStatus::NurseryEmpty => "nursery empty".to_string(),
            NurseryStatus::Other(s) => s,
        }
    }
}

/// Nursery memory figures attached to a `GCMinor` marker. Byte counts are
/// only present when the collection completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NurseryInfo {
    pub status: NurseryStatus,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub bytes_tenured: Option<u64>,
    #[serde(default)]
    pub bytes_used: Option<u64>,
    #[serde(default)]
    pub cur_capacity: Option<u64>,
    #[serde(default)]
    pub lazy_capacity: Option<u64>,
}

impl NurseryInfo {
    pub fn is_complete(&self) -> bool {
        self.status == NurseryStatus::Complete
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GcMajorTimings {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub slices: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GcSliceTimings {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub budget: Option<String>,
}
