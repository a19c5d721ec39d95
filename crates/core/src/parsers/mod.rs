pub mod processed;

use crate::model::Profile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("processed profile: {0}")]
    Processed(#[from] processed::ProcessedParseError),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unable to detect format")]
    UnknownFormat,
}

/// Detect the profile format and parse it.
///
/// Only the processed-profile shape is understood: a JSON object whose
/// `threads` carry columnar `stackTable` / `samples` tables. Other formats
/// must be converted by the import layer first.
pub fn parse_auto(data: &[u8]) -> Result<Profile, ParseError> {
    let value: serde_json::Value = serde_json::from_slice(data)?;

    let looks_processed = value
        .get("threads")
        .and_then(|v| v.as_array())
        .is_some_and(|threads| {
            threads.is_empty()
                || threads
                    .iter()
                    .any(|t| t.get("stackTable").is_some() || t.get("samples").is_some())
        });

    if looks_processed {
        let raw = serde_json::from_value(value).map_err(processed::ProcessedParseError::from)?;
        return Ok(processed::profile_from_raw(raw)?);
    }

    Err(ParseError::UnknownFormat)
}
