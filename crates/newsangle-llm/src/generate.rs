// Prompt -> completion -> validated content pairs.

use newsangle_core::model::{ContentPair, Stance};
use thiserror::Error;
use tracing::{info, warn};

use crate::client::{LlmClient, LlmError};
use crate::parse::{parse_content_pairs, ParseError};
use crate::prompt::build_generation_prompt;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Run one generation for `source_url` with the given stance.
///
/// Returns exactly 13 content pairs or an error; nothing partial.
pub async fn generate_content(
    client: &LlmClient,
    source_url: &str,
    stance: Stance,
) -> Result<Vec<ContentPair>, GenerateError> {
    let prompt = build_generation_prompt(source_url, stance);
    let completion = client.complete(&prompt).await?;

    match parse_content_pairs(&completion) {
        Ok(pairs) => {
            info!(source_url, %stance, pairs = pairs.len(), "generated content");
            Ok(pairs)
        }
        Err(e) => {
            warn!(
                source_url,
                %stance,
                completion_chars = completion.len(),
                error = %e,
                "model output failed validation"
            );
            Err(e.into())
        }
    }
}
