// Domain types: stance, branches, content pairs and generation jobs.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of content pairs every stored job carries, one per branch.
pub const BRANCH_COUNT: usize = 13;

/// The fixed branch list, in the order the model is asked to answer.
pub const BRANCHES: [&str; BRANCH_COUNT] = [
    "National",
    "Economy",
    "Healthcare",
    "Education",
    "Environment",
    "Defense",
    "Immigration",
    "Justice",
    "Labor",
    "Technology",
    "Foreign Affairs",
    "Agriculture",
    "Housing",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid stance `{0}`: expected PRO or ANTI")]
    InvalidStance(String),

    #[error("expected {expected} content pairs, got {actual}")]
    WrongPairCount { expected: usize, actual: usize },
}

// ---------------------------------------------------------------------------
// Stance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Stance {
    Pro,
    Anti,
}

impl Stance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stance::Pro => "PRO",
            Stance::Anti => "ANTI",
        }
    }
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stance {
    type Err = ModelError;

    /// Case-sensitive: only `PRO` and `ANTI` are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PRO" => Ok(Stance::Pro),
            "ANTI" => Ok(Stance::Anti),
            other => Err(ModelError::InvalidStance(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

/// One Facebook post and one tweet written for a single branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPair {
    pub branch: String,
    pub facebook_post: String,
    pub tweet: String,
}

/// A completed, validated generation. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationJob {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub source_url: String,
    pub stance: Stance,
    pub content_pairs: Vec<ContentPair>,
}

impl GenerationJob {
    /// Build a new job stamped with the current time and a fresh id.
    ///
    /// Rejects `content_pairs` unless it holds exactly [`BRANCH_COUNT`] entries.
    pub fn new(
        source_url: impl Into<String>,
        stance: Stance,
        content_pairs: Vec<ContentPair>,
    ) -> Result<Self, ModelError> {
        Self::new_at(Utc::now(), source_url, stance, content_pairs)
    }

    /// Same as [`GenerationJob::new`] with an explicit creation time.
    pub fn new_at(
        created_at: DateTime<Utc>,
        source_url: impl Into<String>,
        stance: Stance,
        content_pairs: Vec<ContentPair>,
    ) -> Result<Self, ModelError> {
        if content_pairs.len() != BRANCH_COUNT {
            return Err(ModelError::WrongPairCount {
                expected: BRANCH_COUNT,
                actual: content_pairs.len(),
            });
        }
        Ok(Self {
            id: generate_job_id(created_at),
            created_at,
            source_url: source_url.into(),
            stance,
            content_pairs,
        })
    }

    pub fn summary(&self) -> JobSummary {
        JobSummary {
            id: self.id.clone(),
            created_at: self.created_at,
            source_url: self.source_url.clone(),
            stance: self.stance,
        }
    }
}

/// History row: a job without its content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub source_url: String,
    pub stance: Stance,
}

/// Generate a job id from `now` plus random bits.
///
/// Format: `job_<unix-millis>_<8 hex chars>` (e.g. `job_1760800000000_3f9a0c12`).
pub fn generate_job_id(now: DateTime<Utc>) -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("job_{}_{}", now.timestamp_millis(), &random[..8])
}
