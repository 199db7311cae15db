// Pull the content-pair JSON out of free-form model output.

use std::sync::OnceLock;

use newsangle_core::model::{ContentPair, BRANCH_COUNT};
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no JSON object found in model output")]
    NoJsonObject,

    #[error("model output is not valid content JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("expected {expected} content pairs, got {actual}")]
    WrongCount { expected: usize, actual: usize },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentEnvelope {
    content_pairs: Vec<ContentPair>,
}

fn json_object_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Greedy: first `{` through last `}`.
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("static regex is valid"))
}

/// The `{ ... }` span of `text`, from the first `{` to the last `}`.
///
/// This is a textual match, not a parser: braces are not balanced and
/// anything between the outermost braces is returned as-is.
pub fn extract_json_object(text: &str) -> Option<&str> {
    json_object_regex().find(text).map(|m| m.as_str())
}

/// Extract and validate the content pairs from raw model output.
///
/// Expected shape: `{ "contentPairs": [ { "branch", "facebookPost", "tweet" }, ... ] }`
/// with exactly [`BRANCH_COUNT`] entries.
pub fn parse_content_pairs(text: &str) -> Result<Vec<ContentPair>, ParseError> {
    let json = extract_json_object(text).ok_or(ParseError::NoJsonObject)?;
    let envelope: ContentEnvelope = serde_json::from_str(json)?;

    if envelope.content_pairs.len() != BRANCH_COUNT {
        return Err(ParseError::WrongCount {
            expected: BRANCH_COUNT,
            actual: envelope.content_pairs.len(),
        });
    }
    Ok(envelope.content_pairs)
}
