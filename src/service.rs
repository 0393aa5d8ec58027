//! Service facade: one entry point per external operation.
//!
//! Each operation has a typed form returning [`DatasetResult`] and is wrapped into a
//! [`Payload`] by the `*_payload` helpers, which is what an HTTP layer serializes:
//!
//! ```json
//! {"status": "success", "sheets": ["Sheet1"], "engine": "csv"}
//! {"status": "error", "message": "Column 'x' not found"}
//! ```
//!
//! When an observer is configured, every operation reports `on_success` with a row count,
//! `on_failure` with a computed severity, and `on_alert` when that severity reaches the
//! configured threshold.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::artifact::{read_artifact, read_column, write_artifact};
use crate::config::Settings;
use crate::error::DatasetResult;
use crate::ingestion::{
    ConversionReport, ConvertOptions, SheetMetadata, convert_source, scan_source,
};
use crate::observability::{
    Operation, OperationContext, OperationStats, PipelineObserver, Severity, severity_for_error,
};
use crate::processing::round2;
use crate::query::{
    AggregateRequest, Aggregation, Page, ViewRequest, aggregate, unique_values, view,
};
use crate::storage::ObjectStore;

/// Outcome wrapper serialized as `{"status": "success", ...}` or
/// `{"status": "error", "message": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Payload<T> {
    Success(T),
    Error { message: String },
}

impl<T> From<DatasetResult<T>> for Payload<T> {
    fn from(result: DatasetResult<T>) -> Self {
        match result {
            Ok(v) => Self::Success(v),
            Err(e) => Self::Error { message: e.to_string() },
        }
    }
}

impl<T> Payload<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// A raw upload as listed for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawFile {
    pub filename: String,
    /// Size in MiB, rounded to two decimal places.
    pub size_mb: f64,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawFileList {
    pub files: Vec<RawFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UniqueValues {
    pub values: Vec<String>,
}

/// Stateless operations over an object store.
///
/// Cheap to clone; clones share the store and observer.
#[derive(Clone)]
pub struct DatasetService {
    store: Arc<dyn ObjectStore>,
    settings: Settings,
    observer: Option<Arc<dyn PipelineObserver>>,
    alert_at_or_above: Severity,
}

impl fmt::Debug for DatasetService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetService")
            .field("settings", &self.settings)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl DatasetService {
    pub fn new(store: Arc<dyn ObjectStore>, settings: Settings) -> Self {
        Self {
            store,
            settings,
            observer: None,
            alert_at_or_above: Severity::Critical,
        }
    }

    /// Report outcomes to `observer`, alerting at or above `alert_at_or_above`.
    pub fn with_observer(
        mut self,
        observer: Arc<dyn PipelineObserver>,
        alert_at_or_above: Severity,
    ) -> Self {
        self.observer = Some(observer);
        self.alert_at_or_above = alert_at_or_above;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// List every object in the raw bucket.
    pub fn list_raw_files(&self) -> DatasetResult<RawFileList> {
        let bucket = &self.settings.raw_bucket;
        let result = self.store.list(bucket).map(|objects| RawFileList {
            files: objects
                .into_iter()
                .map(|o| RawFile {
                    filename: o.key,
                    size_mb: round2(o.size as f64 / (1024.0 * 1024.0)),
                    last_modified: o.last_modified,
                })
                .collect(),
        });
        self.report(Operation::ListRawFiles, bucket, result, |l| l.files.len())
    }

    /// List the sheets of a raw upload. Delimited-text uploads are not fetched.
    pub fn scan(&self, source_key: &str) -> DatasetResult<SheetMetadata> {
        let result = scan_source(source_key, || {
            self.store.get(&self.settings.raw_bucket, source_key)
        });
        self.report(Operation::Scan, source_key, result, |m| m.sheets.len())
    }

    /// Convert one sheet of a raw upload and store the artifact in the processed bucket.
    ///
    /// Re-running overwrites the same artifact.
    pub fn convert(&self, source_key: &str, sheet_name: &str) -> DatasetResult<ConversionReport> {
        let result = self.convert_inner(source_key, sheet_name);
        if let (Ok(report), Some(obs)) = (&result, &self.observer) {
            if let Some(note) = &report.sheet_fallback {
                obs.on_warning(&ctx(Operation::Convert, source_key), note);
            }
        }
        self.report(Operation::Convert, source_key, result, |r| r.rows)
    }

    fn convert_inner(&self, source_key: &str, sheet_name: &str) -> DatasetResult<ConversionReport> {
        let bytes = self.store.get(&self.settings.raw_bucket, source_key)?;
        let options = ConvertOptions::from(&self.settings);
        let conversion = convert_source(&bytes, source_key, sheet_name, &options)?;
        let encoded = write_artifact(&conversion.dataset)?;
        self.store.put(
            &self.settings.processed_bucket,
            &conversion.report.processed_file,
            encoded,
        )?;
        Ok(conversion.report)
    }

    /// Filter, sort and paginate an artifact.
    pub fn view(&self, artifact: &str, request: &ViewRequest) -> DatasetResult<Page> {
        let result = self.load(artifact).and_then(|ds| view(ds, request));
        self.report(Operation::View, artifact, result, |p| p.data.len())
    }

    /// Group-aggregate an artifact.
    pub fn aggregate(
        &self,
        artifact: &str,
        request: &AggregateRequest,
    ) -> DatasetResult<Aggregation> {
        let result = self
            .load(artifact)
            .and_then(|ds| aggregate(&ds, request, self.settings.group_cap));
        self.report(Operation::Aggregate, artifact, result, |a| a.data.len())
    }

    /// Distinct values of one artifact column, reading only that column.
    pub fn unique_values(&self, artifact: &str, column: &str) -> DatasetResult<UniqueValues> {
        let result = self
            .store
            .get(&self.settings.processed_bucket, artifact)
            .and_then(|bytes| read_column(bytes, column))
            .map(|(_, values)| UniqueValues {
                values: unique_values(values, self.settings.unique_cap),
            });
        self.report(Operation::UniqueValues, artifact, result, |u| u.values.len())
    }

    pub fn list_raw_files_payload(&self) -> Payload<RawFileList> {
        self.list_raw_files().into()
    }

    pub fn scan_payload(&self, source_key: &str) -> Payload<SheetMetadata> {
        self.scan(source_key).into()
    }

    pub fn convert_payload(&self, source_key: &str, sheet_name: &str) -> Payload<ConversionReport> {
        self.convert(source_key, sheet_name).into()
    }

    pub fn view_payload(&self, artifact: &str, request: &ViewRequest) -> Payload<Page> {
        self.view(artifact, request).into()
    }

    pub fn aggregate_payload(
        &self,
        artifact: &str,
        request: &AggregateRequest,
    ) -> Payload<Aggregation> {
        self.aggregate(artifact, request).into()
    }

    pub fn unique_values_payload(&self, artifact: &str, column: &str) -> Payload<UniqueValues> {
        self.unique_values(artifact, column).into()
    }

    fn load(&self, artifact: &str) -> DatasetResult<crate::types::DataSet> {
        let bytes = self.store.get(&self.settings.processed_bucket, artifact)?;
        read_artifact(bytes)
    }

    fn report<T>(
        &self,
        operation: Operation,
        target: &str,
        result: DatasetResult<T>,
        rows: impl FnOnce(&T) -> usize,
    ) -> DatasetResult<T> {
        if let Some(obs) = self.observer.as_ref() {
            let ctx = ctx(operation, target);
            match &result {
                Ok(v) => obs.on_success(&ctx, OperationStats { rows: rows(v) }),
                Err(e) => {
                    let sev = severity_for_error(e);
                    obs.on_failure(&ctx, sev, e);
                    if sev >= self.alert_at_or_above {
                        obs.on_alert(&ctx, sev, e);
                    }
                }
            }
        }
        result
    }
}

fn ctx(operation: Operation, target: &str) -> OperationContext {
    OperationContext {
        operation,
        target: target.to_string(),
    }
}
