//! Outcome reporting for service operations.
//!
//! Every operation run through [`crate::service::DatasetService`] reports to an optional
//! [`PipelineObserver`]: `on_success` with row stats, `on_failure` with a computed severity, and
//! `on_alert` when that severity meets the configured threshold. Degraded-but-successful paths
//! (e.g. a sheet-name fallback) go to `on_warning`.

use std::error::Error as StdError;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing_subscriber::EnvFilter;

use crate::error::DatasetError;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (operation failed).
    Error,
    /// Critical error (storage or other infrastructure failures).
    Critical,
}

/// Operation being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListRawFiles,
    Scan,
    Convert,
    View,
    Aggregate,
    UniqueValues,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ListRawFiles => "list_raw_files",
            Self::Scan => "scan",
            Self::Convert => "convert",
            Self::View => "view",
            Self::Aggregate => "aggregate",
            Self::UniqueValues => "unique_values",
        };
        f.write_str(s)
    }
}

/// Context about an operation attempt.
#[derive(Debug, Clone)]
pub struct OperationContext {
    pub operation: Operation,
    /// Source key or artifact name the operation ran against.
    pub target: String,
}

/// Minimal stats reported on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationStats {
    /// Rows produced (converted rows, page rows, groups, or distinct values).
    pub rows: usize,
}

/// Observer interface for operation outcomes.
pub trait PipelineObserver: Send + Sync {
    /// Called when an operation succeeds.
    fn on_success(&self, _ctx: &OperationContext, _stats: OperationStats) {}

    /// Called when an operation succeeds on a degraded path.
    fn on_warning(&self, _ctx: &OperationContext, _message: &str) {}

    /// Called when an operation fails.
    fn on_failure(&self, _ctx: &OperationContext, _severity: Severity, _error: &DatasetError) {}

    /// Called when a failure meets an alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &OperationContext, severity: Severity, error: &DatasetError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn PipelineObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn PipelineObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl PipelineObserver for CompositeObserver {
    fn on_success(&self, ctx: &OperationContext, stats: OperationStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_warning(&self, ctx: &OperationContext, message: &str) {
        for o in &self.observers {
            o.on_warning(ctx, message);
        }
    }

    fn on_failure(&self, ctx: &OperationContext, severity: Severity, error: &DatasetError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &OperationContext, severity: Severity, error: &DatasetError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Emits operation outcomes as `tracing` events.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_success(&self, ctx: &OperationContext, stats: OperationStats) {
        tracing::info!(
            operation = %ctx.operation,
            target = %ctx.target,
            rows = stats.rows,
            "operation ok"
        );
    }

    fn on_warning(&self, ctx: &OperationContext, message: &str) {
        tracing::warn!(operation = %ctx.operation, target = %ctx.target, "{message}");
    }

    fn on_failure(&self, ctx: &OperationContext, severity: Severity, error: &DatasetError) {
        tracing::error!(
            operation = %ctx.operation,
            target = %ctx.target,
            severity = ?severity,
            error = %error,
            "operation failed"
        );
    }

    fn on_alert(&self, ctx: &OperationContext, severity: Severity, error: &DatasetError) {
        tracing::error!(
            operation = %ctx.operation,
            target = %ctx.target,
            severity = ?severity,
            error = %error,
            alert = true,
            "operation failed"
        );
    }
}

/// Appends operation events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{} {line}", Utc::now().to_rfc3339());
        }
    }
}

impl PipelineObserver for FileObserver {
    fn on_success(&self, ctx: &OperationContext, stats: OperationStats) {
        self.append_line(&format!(
            "ok op={} target={} rows={}",
            ctx.operation, ctx.target, stats.rows
        ));
    }

    fn on_warning(&self, ctx: &OperationContext, message: &str) {
        self.append_line(&format!(
            "warn op={} target={} msg={message}",
            ctx.operation, ctx.target
        ));
    }

    fn on_failure(&self, ctx: &OperationContext, severity: Severity, error: &DatasetError) {
        self.append_line(&format!(
            "fail severity={severity:?} op={} target={} err={error}",
            ctx.operation, ctx.target
        ));
    }

    fn on_alert(&self, ctx: &OperationContext, severity: Severity, error: &DatasetError) {
        self.append_line(&format!(
            "ALERT severity={severity:?} op={} target={} err={error}",
            ctx.operation, ctx.target
        ));
    }
}

/// Classify an error for observer callbacks.
pub fn severity_for_error(e: &DatasetError) -> Severity {
    match e {
        DatasetError::StorageIo { .. } | DatasetError::Io(_) => Severity::Critical,
        DatasetError::Parquet(err) => {
            if error_chain_contains_io(err) {
                Severity::Critical
            } else {
                Severity::Error
            }
        }
        DatasetError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => Severity::Critical,
            _ => Severity::Error,
        },
        DatasetError::SheetNotFound { .. } => Severity::Warning,
        _ => Severity::Error,
    }
}

fn error_chain_contains_io(e: &(dyn StdError + 'static)) -> bool {
    let mut cur: Option<&(dyn StdError + 'static)> = Some(e);
    while let Some(err) = cur {
        if err.is::<std::io::Error>() {
            return true;
        }
        cur = err.source();
    }
    false
}

/// Install a `tracing` fmt subscriber filtered by `RUST_LOG`, or `default_filter` when unset.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
