// Generation job repository on top of the key-value store.
//
// Key layout:
//   job:<id>          JSON-serialized GenerationJob
//   jobs:latest       id of the most recently saved job
//   jobs:by_created   sorted set, member = job id, score = createdAt (ms)

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::db::{Database, KvCommand};
use crate::model::{GenerationJob, JobSummary};

const LATEST_KEY: &str = "jobs:latest";
const BY_CREATED_KEY: &str = "jobs:by_created";

fn job_key(id: &str) -> String {
    format!("job:{id}")
}

/// Persist `job`: record, latest pointer and time index in one transaction.
pub fn save_job(db: &Database, job: &GenerationJob) -> Result<()> {
    let json = serde_json::to_string(job).context("failed to serialize generation job")?;
    db.exec(&[
        KvCommand::Set {
            key: job_key(&job.id),
            value: json,
        },
        KvCommand::Set {
            key: LATEST_KEY.to_string(),
            value: job.id.clone(),
        },
        KvCommand::ZAdd {
            key: BY_CREATED_KEY.to_string(),
            score: job.created_at.timestamp_millis() as f64,
            member: job.id.clone(),
        },
    ])
    .with_context(|| format!("failed to store job {}", job.id))?;
    debug!(job_id = %job.id, "stored generation job");
    Ok(())
}

/// Load one job by id. Returns `None` if no such job was stored.
pub fn get_job(db: &Database, id: &str) -> Result<Option<GenerationJob>> {
    let Some(json) = db.get(&job_key(id))? else {
        return Ok(None);
    };
    let job = serde_json::from_str(&json)
        .with_context(|| format!("failed to deserialize job {id}"))?;
    Ok(Some(job))
}

/// The job the latest pointer refers to, if any job was ever stored.
pub fn latest_job(db: &Database) -> Result<Option<GenerationJob>> {
    match db.get(LATEST_KEY)? {
        Some(id) => get_job(db, &id),
        None => Ok(None),
    }
}

/// Summaries of stored jobs, newest first. `limit = None` returns all of them.
///
/// Index entries whose record is missing are skipped.
pub fn list_jobs(db: &Database, limit: Option<usize>) -> Result<Vec<JobSummary>> {
    let stop = match limit {
        Some(0) => return Ok(Vec::new()),
        // Limits past i64::MAX cover the whole index.
        Some(n) => i64::try_from(n).map_or(-1, |n| n - 1),
        None => -1,
    };

    let ids = db.zrevrange(BY_CREATED_KEY, 0, stop)?;
    let mut summaries = Vec::with_capacity(ids.len());
    for id in ids {
        match get_job(db, &id)? {
            Some(job) => summaries.push(job.summary()),
            None => warn!(job_id = %id, "time index references a missing job record"),
        }
    }
    Ok(summaries)
}

/// Number of jobs in the time index.
pub fn job_count(db: &Database) -> Result<usize> {
    db.zcard(BY_CREATED_KEY)
}
