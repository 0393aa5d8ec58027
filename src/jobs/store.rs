use std::collections::HashMap;
use std::sync::RwLock;

use super::JobRecord;
use crate::error::{DatasetError, DatasetResult};

/// Key-value store for job state, keyed by job id.
pub trait JobStore: Send + Sync {
    /// Create or replace the record of `job_id`.
    fn set(&self, job_id: &str, record: JobRecord) -> DatasetResult<()>;

    /// Current record of `job_id`, or `None` if the id was never submitted.
    fn get(&self, job_id: &str) -> DatasetResult<Option<JobRecord>>;
}

/// Process-local [`JobStore`]. State is lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    records: RwLock<HashMap<String, JobRecord>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobStore for InMemoryJobStore {
    fn set(&self, job_id: &str, record: JobRecord) -> DatasetResult<()> {
        self.records
            .write()
            .map_err(|_| DatasetError::storage("job store lock poisoned"))?
            .insert(job_id.to_string(), record);
        Ok(())
    }

    fn get(&self, job_id: &str) -> DatasetResult<Option<JobRecord>> {
        Ok(self
            .records
            .read()
            .map_err(|_| DatasetError::storage("job store lock poisoned"))?
            .get(job_id)
            .cloned())
    }
}
