//! Runtime settings.
//!
//! [`Settings::default`] covers the common case. [`Settings::from_env`] layers `DATASET_*`
//! environment variables on top of the defaults (e.g. `DATASET_PROCESSED_BUCKET`,
//! `DATASET_JOB_RETRY_DELAY_MS`).

use std::path::PathBuf;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Serialized};
use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, DatasetResult};

/// Environment variable prefix read by [`Settings::from_env`].
pub const ENV_PREFIX: &str = "DATASET_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Bucket holding uploaded source files.
    pub raw_bucket: String,
    /// Bucket holding converted Parquet artifacts.
    pub processed_bucket: String,
    /// Root directory used by [`crate::storage::FsObjectStore`].
    pub storage_root: PathBuf,
    /// Delimited-text rows sampled for schema inference.
    pub csv_infer_schema_rows: usize,
    /// Spreadsheet rows scanned when looking for the header row.
    pub header_scan_rows: usize,
    /// Maximum groups returned by an aggregation.
    pub group_cap: usize,
    /// Maximum distinct values returned for a column.
    pub unique_cap: usize,
    /// Attempts per asynchronous conversion job.
    pub job_max_attempts: u32,
    /// Fixed delay between job attempts.
    pub job_retry_delay_ms: u64,
    /// Worker threads for the asynchronous job pool.
    pub job_threads: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            raw_bucket: "raw-datasets".to_string(),
            processed_bucket: "processed-datasets".to_string(),
            storage_root: PathBuf::from("./data"),
            csv_infer_schema_rows: 10_000,
            header_scan_rows: 1_000,
            group_cap: 200,
            unique_cap: 100,
            job_max_attempts: 3,
            job_retry_delay_ms: 5_000,
            job_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

impl Settings {
    /// Defaults overridden by `DATASET_*` environment variables.
    pub fn from_env() -> DatasetResult<Self> {
        Self::from_figment(
            Figment::from(Serialized::defaults(Self::default())).merge(Env::prefixed(ENV_PREFIX)),
        )
    }

    /// Extract settings from an arbitrary provider stack.
    pub fn from_figment(figment: Figment) -> DatasetResult<Self> {
        let settings: Self = figment
            .extract()
            .map_err(|e| DatasetError::invalid(format!("invalid settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn job_retry_delay(&self) -> Duration {
        Duration::from_millis(self.job_retry_delay_ms)
    }

    fn validate(&self) -> DatasetResult<()> {
        if self.job_max_attempts == 0 {
            return Err(DatasetError::invalid("invalid settings: job_max_attempts must be > 0"));
        }
        if self.job_threads == 0 {
            return Err(DatasetError::invalid("invalid settings: job_threads must be > 0"));
        }
        if self.raw_bucket.trim().is_empty() || self.processed_bucket.trim().is_empty() {
            return Err(DatasetError::invalid("invalid settings: bucket names must not be empty"));
        }
        Ok(())
    }
}
