//! Asynchronous conversion jobs.
//!
//! [`JobRunner::submit`] records a job as `pending`, schedules it on a dedicated rayon pool and
//! returns immediately. The job moves to `processing`, then ends as `processed` (with the
//! conversion report as result) or `failed` (with the last error text). Each job is attempted up
//! to [`RetryPolicy::max_attempts`] times with a fixed delay in between. Exhausted retries only
//! mark the job failed.
//!
//! Job state lives behind the [`JobStore`] trait; [`InMemoryJobStore`] keeps it for the life of
//! the process.

mod store;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::error::{DatasetError, DatasetResult};
use crate::service::DatasetService;

pub use store::{InMemoryJobStore, JobStore};

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Processed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Processed | Self::Failed)
    }
}

/// Stored state of one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub status: JobStatus,
    /// Attempts started so far.
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobRecord {
    fn with_status(status: JobStatus, attempts: u32) -> Self {
        Self {
            status,
            attempts,
            result: None,
            error: None,
        }
    }
}

/// A request to convert one sheet of a raw upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionJob {
    pub job_id: String,
    pub source_key: String,
    pub sheet_name: String,
}

impl ConversionJob {
    pub fn new(
        job_id: impl Into<String>,
        source_key: impl Into<String>,
        sheet_name: impl Into<String>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            source_key: source_key.into(),
            sheet_name: sheet_name.into(),
        }
    }
}

/// Fixed-delay retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Must be > 0.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

impl From<&Settings> for RetryPolicy {
    fn from(settings: &Settings) -> Self {
        Self {
            max_attempts: settings.job_max_attempts,
            delay: settings.job_retry_delay(),
        }
    }
}

/// Runs conversion jobs on a bounded worker pool.
pub struct JobRunner {
    pool: ThreadPool,
    service: DatasetService,
    store: Arc<dyn JobStore>,
    retry: RetryPolicy,
}

impl fmt::Debug for JobRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobRunner")
            .field("threads", &self.pool.current_num_threads())
            .field("retry", &self.retry)
            .finish()
    }
}

impl JobRunner {
    /// Create a runner with `threads` workers.
    pub fn new(
        service: DatasetService,
        store: Arc<dyn JobStore>,
        retry: RetryPolicy,
        threads: usize,
    ) -> DatasetResult<Self> {
        if retry.max_attempts == 0 {
            return Err(DatasetError::invalid("max_attempts must be > 0"));
        }
        if threads == 0 {
            return Err(DatasetError::invalid("threads must be > 0"));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("dataset-job-{i}"))
            .build()
            .map_err(|e| DatasetError::invalid(format!("failed to build job pool: {e}")))?;
        Ok(Self {
            pool,
            service,
            store,
            retry,
        })
    }

    /// Create a runner using the service's retry and thread settings.
    pub fn from_settings(service: DatasetService, store: Arc<dyn JobStore>) -> DatasetResult<Self> {
        let retry = RetryPolicy::from(service.settings());
        let threads = service.settings().job_threads;
        Self::new(service, store, retry, threads)
    }

    /// Record the job as pending and schedule it. Returns without waiting for the job.
    pub fn submit(&self, job: ConversionJob) -> DatasetResult<()> {
        self.store
            .set(&job.job_id, JobRecord::with_status(JobStatus::Pending, 0))?;
        tracing::info!(
            job = %job.job_id,
            source = %job.source_key,
            sheet = %job.sheet_name,
            "job queued"
        );

        let service = self.service.clone();
        let store = Arc::clone(&self.store);
        let retry = self.retry;
        self.pool.spawn(move || {
            run_job(&service, store.as_ref(), retry, &job);
        });
        Ok(())
    }

    /// Run a job on the calling thread and return its final record.
    pub fn run_blocking(&self, job: &ConversionJob) -> JobRecord {
        run_job(&self.service, self.store.as_ref(), self.retry, job)
    }

    /// Current state of a job, if known.
    pub fn status(&self, job_id: &str) -> DatasetResult<Option<JobRecord>> {
        self.store.get(job_id)
    }
}

fn run_job(
    service: &DatasetService,
    store: &dyn JobStore,
    retry: RetryPolicy,
    job: &ConversionJob,
) -> JobRecord {
    let mut last_error = String::new();
    for attempt in 1..=retry.max_attempts {
        record(store, &job.job_id, JobRecord::with_status(JobStatus::Processing, attempt));

        let outcome = service
            .convert(&job.source_key, &job.sheet_name)
            .and_then(|report| Ok(serde_json::to_value(report)?));
        match outcome {
            Ok(result) => {
                tracing::info!(job = %job.job_id, attempt, "job processed");
                let done = JobRecord {
                    result: Some(result),
                    ..JobRecord::with_status(JobStatus::Processed, attempt)
                };
                record(store, &job.job_id, done.clone());
                return done;
            }
            Err(e) => {
                tracing::warn!(
                    job = %job.job_id,
                    attempt,
                    max_attempts = retry.max_attempts,
                    error = %e,
                    "job attempt failed"
                );
                last_error = e.to_string();
                if attempt < retry.max_attempts && !retry.delay.is_zero() {
                    std::thread::sleep(retry.delay);
                }
            }
        }
    }

    tracing::error!(job = %job.job_id, error = %last_error, "job failed after retries");
    let failed = JobRecord {
        error: Some(last_error),
        ..JobRecord::with_status(JobStatus::Failed, retry.max_attempts)
    };
    record(store, &job.job_id, failed.clone());
    failed
}

fn record(store: &dyn JobStore, job_id: &str, rec: JobRecord) {
    if let Err(e) = store.set(job_id, rec) {
        tracing::error!(job = %job_id, error = %e, "failed to record job state");
    }
}
