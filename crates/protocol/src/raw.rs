use serde::{Deserialize, Serialize};

use crate::marker::MarkerPayload;
use crate::selection::Milliseconds;
use crate::shared_str::SharedStr;

/// The processed-profile input contract handed to the engine by the import
/// layer.
///
/// Every thread carries columnar tables: each table is a set of parallel
/// arrays indexed by a shared row id, with an optional explicit `length`.
/// Tables reference each other (and the string table) by integer index:
///
/// ```text
///   samples.stack ──▶ stackTable ──frame──▶ frameTable ──func──▶ funcTable
///                       │   ▲                                      │
///                       └───┘ prefix                         name  ▼
///                                                              stringTable
/// ```
///
/// Optional columns (`isJS`, `inlineDepth`, `weight`, …) may be omitted
/// entirely; an omitted column means "default for every row". The engine
/// validates this shape once, when a [`RawThread`] is converted into its
/// in-memory form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawProfile {
    #[serde(default)]
    pub meta: RawProfileMeta,
    #[serde(default)]
    pub threads: Vec<RawThread>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProfileMeta {
    /// Sampling interval in milliseconds.
    #[serde(default = "default_interval")]
    pub interval: Milliseconds,
    /// Absolute start time of the profile (ms since epoch).
    #[serde(default)]
    pub start_time: Milliseconds,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub categories: Vec<RawCategory>,
}

fn default_interval() -> Milliseconds {
    1.0
}

impl Default for RawProfileMeta {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            start_time: 0.0,
            product: None,
            categories: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCategory {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawThread {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub process_type: Option<String>,
    #[serde(default)]
    pub pid: Option<String>,
    #[serde(default)]
    pub tid: Option<u64>,
    #[serde(default)]
    pub register_time: Milliseconds,
    #[serde(default)]
    pub unregister_time: Option<Milliseconds>,
    #[serde(default)]
    pub string_table: Vec<SharedStr>,
    #[serde(default)]
    pub func_table: RawFuncTable,
    #[serde(default)]
    pub frame_table: RawFrameTable,
    #[serde(default)]
    pub stack_table: RawStackTable,
    #[serde(default)]
    pub samples: RawSamplesTable,
    #[serde(default)]
    pub markers: RawMarkerTable,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFuncTable {
    #[serde(default)]
    pub length: Option<usize>,
    pub name: Vec<usize>,
    #[serde(default, rename = "isJS")]
    pub is_js: Vec<bool>,
    #[serde(default, rename = "relevantForJS")]
    pub relevant_for_js: Vec<bool>,
    #[serde(default)]
    pub resource: Vec<Option<usize>>,
    #[serde(default)]
    pub file_name: Vec<Option<usize>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFrameTable {
    #[serde(default)]
    pub length: Option<usize>,
    pub func: Vec<usize>,
    #[serde(default)]
    pub category: Vec<Option<usize>>,
    #[serde(default)]
    pub inline_depth: Vec<u32>,
    #[serde(default)]
    pub line: Vec<Option<u32>>,
    #[serde(default)]
    pub address: Vec<Option<u64>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawStackTable {
    #[serde(default)]
    pub length: Option<usize>,
    pub frame: Vec<usize>,
    pub prefix: Vec<Option<usize>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSamplesTable {
    #[serde(default)]
    pub length: Option<usize>,
    pub stack: Vec<Option<usize>>,
    pub time: Vec<Milliseconds>,
    #[serde(default)]
    pub weight: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMarkerTable {
    #[serde(default)]
    pub length: Option<usize>,
    #[serde(default)]
    pub name: Vec<usize>,
    #[serde(default)]
    pub start_time: Vec<Milliseconds>,
    #[serde(default)]
    pub end_time: Vec<Option<Milliseconds>>,
    #[serde(default)]
    pub category: Vec<Option<usize>>,
    #[serde(default)]
    pub data: Vec<Option<MarkerPayload>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_minimal_thread() {
        let json = r#"{
            "meta": { "interval": 0.5 },
            "threads": [{
                "name": "GeckoMain",
                "stringTable": ["main", "work"],
                "funcTable": { "name": [0, 1] },
                "frameTable": { "func": [0, 1] },
                "stackTable": { "frame": [0, 1], "prefix": [null, 0] },
                "samples": { "stack": [1, null], "time": [0.0, 1.0] }
            }]
        }"#;
        let profile: RawProfile = serde_json::from_str(json).expect("deserialize");
        assert!((profile.meta.interval - 0.5).abs() < f64::EPSILON);
        let thread = &profile.threads[0];
        assert_eq!(thread.name, "GeckoMain");
        assert_eq!(thread.stack_table.prefix, vec![None, Some(0)]);
        assert_eq!(thread.samples.stack, vec![Some(1), None]);
        assert!(thread.samples.weight.is_none());
        assert!(thread.func_table.is_js.is_empty());
        assert_eq!(thread.markers.name.len(), 0);
    }

    #[test]
    fn meta_defaults_when_missing() {
        let profile: RawProfile = serde_json::from_str(r#"{"threads": []}"#).expect("deserialize");
        assert!((profile.meta.interval - 1.0).abs() < f64::EPSILON);
        assert!(profile.meta.product.is_none());
    }

    #[test]
    fn renamed_js_columns() {
        let json = r#"{ "name": [0], "isJS": [true], "relevantForJS": [false] }"#;
        let table: RawFuncTable = serde_json::from_str(json).expect("deserialize");
        assert_eq!(table.is_js, vec![true]);
        assert_eq!(table.relevant_for_js, vec![false]);
    }
}
