use std::sync::{Mutex, PoisonError};

use profscope_core::parsers::{ParseError, parse_auto};
use profscope_core::{MarkerKind, ProfileState, QueryError, Selectors};
use profscope_protocol::PreviewSelection;
use serde::Serialize;
use thiserror::Error;
use wasm_bindgen::prelude::*;

/// A loaded profile together with its view state and selector cache.
struct Session {
    state: ProfileState,
    selectors: Selectors,
}

static SESSIONS: Mutex<Vec<Session>> = Mutex::new(Vec::new());

#[derive(Debug, Error)]
enum BridgeError {
    #[error("invalid profile handle {0}")]
    InvalidHandle(usize),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn with_session<T>(
    handle: usize,
    f: impl FnOnce(&mut Session) -> Result<T, BridgeError>,
) -> Result<T, BridgeError> {
    let mut sessions = SESSIONS.lock().unwrap_or_else(PoisonError::into_inner);
    let session = sessions
        .get_mut(handle)
        .ok_or(BridgeError::InvalidHandle(handle))?;
    f(session)
}

fn to_json(value: &impl Serialize) -> Result<String, BridgeError> {
    Ok(serde_json::to_string(value)?)
}

fn load(data: &[u8]) -> Result<usize, BridgeError> {
    let profile = parse_auto(data)?;
    let mut sessions = SESSIONS.lock().unwrap_or_else(PoisonError::into_inner);
    sessions.push(Session {
        state: ProfileState::new(profile),
        selectors: Selectors::new(),
    });
    Ok(sessions.len() - 1)
}

fn call_tree(handle: usize, thread: usize) -> Result<String, BridgeError> {
    with_session(handle, |s| {
        to_json(&*s.selectors.get_call_tree(&s.state, thread)?)
    })
}

fn gc_stats(handle: usize, thread: usize) -> Result<String, BridgeError> {
    with_session(handle, |s| to_json(&*s.selectors.get_gc_stats(&s.state, thread)?))
}

/// Parse a processed profile (JSON). Returns a handle for later calls.
#[wasm_bindgen]
pub fn load_profile(data: &[u8]) -> Result<usize, JsError> {
    Ok(load(data)?)
}

#[wasm_bindgen]
pub fn thread_count(handle: usize) -> Result<usize, JsError> {
    Ok(with_session(handle, |s| {
        Ok(s.state.profile().thread_count())
    })?)
}

/// Set or clear (both bounds absent) the preview selection.
#[wasm_bindgen]
pub fn set_preview_selection(
    handle: usize,
    start: Option<f64>,
    end: Option<f64>,
    is_modifying: bool,
) -> Result<(), JsError> {
    Ok(with_session(handle, |s| {
        s.state.set_preview_selection(PreviewSelection {
            start,
            end,
            is_modifying,
        });
        Ok(())
    })?)
}

#[wasm_bindgen]
pub fn set_search(handle: usize, thread: usize, search: &str) -> Result<(), JsError> {
    Ok(with_session(handle, |s| {
        s.state
            .update_filter_settings(thread, |f| f.search = search.to_string())?;
        Ok(())
    })?)
}

/// Replace a thread's filter settings with a JSON `FilterSettings` object.
#[wasm_bindgen]
pub fn set_filter_settings(handle: usize, thread: usize, json: &str) -> Result<(), JsError> {
    Ok(with_session(handle, |s| {
        let settings = serde_json::from_str(json)?;
        s.state.set_filter_settings(thread, settings)?;
        Ok(())
    })?)
}

/// The filtered call tree as JSON.
#[wasm_bindgen]
pub fn call_tree_json(handle: usize, thread: usize) -> Result<String, JsError> {
    Ok(call_tree(handle, thread)?)
}

/// GC statistics for the preview selection as JSON.
#[wasm_bindgen]
pub fn gc_stats_json(handle: usize, thread: usize) -> Result<String, JsError> {
    Ok(gc_stats(handle, thread)?)
}

/// Pause statistics for one marker kind (`gc-minor`, `gc-slice`, or a
/// marker name) as JSON.
#[wasm_bindgen]
pub fn pause_statistics_json(handle: usize, thread: usize, kind: &str) -> Result<String, JsError> {
    let Ok(kind) = kind.parse::<MarkerKind>();
    Ok(with_session(handle, |s| {
        to_json(&*s.selectors.get_pause_statistics(&s.state, thread, &kind)?)
    })?)
}
