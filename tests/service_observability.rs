use std::sync::{Arc, Mutex};

use dataset_analytics::DatasetError;
use dataset_analytics::config::Settings;
use dataset_analytics::observability::{
    CompositeObserver, Operation, OperationContext, OperationStats, PipelineObserver, Severity,
};
use dataset_analytics::query::AggregateRequest;
use dataset_analytics::service::DatasetService;
use dataset_analytics::storage::{MemoryObjectStore, ObjectStore};

#[derive(Default)]
struct RecordingObserver {
    successes: Mutex<Vec<(Operation, usize)>>,
    failures: Mutex<Vec<Severity>>,
    alerts: Mutex<Vec<Severity>>,
}

impl PipelineObserver for RecordingObserver {
    fn on_success(&self, ctx: &OperationContext, stats: OperationStats) {
        self.successes.lock().unwrap().push((ctx.operation, stats.rows));
    }

    fn on_failure(&self, _ctx: &OperationContext, severity: Severity, _error: &DatasetError) {
        self.failures.lock().unwrap().push(severity);
    }

    fn on_alert(&self, _ctx: &OperationContext, severity: Severity, _error: &DatasetError) {
        self.alerts.lock().unwrap().push(severity);
    }
}

fn observed(threshold: Severity) -> (DatasetService, Arc<RecordingObserver>) {
    let store = Arc::new(MemoryObjectStore::new());
    store
        .put("raw-datasets", "people.csv", b"id,name\n1,Ada\n2,Grace\n".to_vec())
        .unwrap();
    let obs = Arc::new(RecordingObserver::default());
    let service =
        DatasetService::new(store, Settings::default()).with_observer(obs.clone(), threshold);
    (service, obs)
}

#[test]
fn observer_receives_failure_and_alert_on_missing_object() {
    let (service, obs) = observed(Severity::Critical);

    // Missing object -> StorageIo -> Critical
    let _ = service.convert("does_not_exist.csv", "Sheet1").unwrap_err();

    assert_eq!(*obs.failures.lock().unwrap(), vec![Severity::Critical]);
    assert_eq!(*obs.alerts.lock().unwrap(), vec![Severity::Critical]);
}

#[test]
fn observer_receives_failure_without_alert_for_missing_column() {
    let (service, obs) = observed(Severity::Critical);
    let artifact = service.convert("people.csv", "Sheet1").unwrap().processed_file;

    let _ = service
        .aggregate(&artifact, &AggregateRequest::new("definitely_missing", "count", "id"))
        .unwrap_err();

    assert_eq!(*obs.failures.lock().unwrap(), vec![Severity::Error]);
    assert!(obs.alerts.lock().unwrap().is_empty());
}

#[test]
fn lower_threshold_alerts_on_ordinary_errors() {
    let (service, obs) = observed(Severity::Error);
    let artifact = service.convert("people.csv", "Sheet1").unwrap().processed_file;

    let _ = service.unique_values(&artifact, "nope").unwrap_err();

    assert_eq!(*obs.alerts.lock().unwrap(), vec![Severity::Error]);
}

#[test]
fn successes_carry_row_counts() {
    let (service, obs) = observed(Severity::Critical);
    let artifact = service.convert("people.csv", "Sheet1").unwrap().processed_file;
    service.unique_values(&artifact, "name").unwrap();
    service.scan("people.csv").unwrap();

    assert_eq!(
        *obs.successes.lock().unwrap(),
        vec![(Operation::Convert, 2), (Operation::UniqueValues, 2), (Operation::Scan, 1)]
    );
    assert!(obs.failures.lock().unwrap().is_empty());
}

#[test]
fn composite_observer_fans_out() {
    let a = Arc::new(RecordingObserver::default());
    let b = Arc::new(RecordingObserver::default());
    let composite = Arc::new(CompositeObserver::new(vec![a.clone(), b.clone()]));
    let service = DatasetService::new(Arc::new(MemoryObjectStore::new()), Settings::default())
        .with_observer(composite, Severity::Critical);

    let _ = service.view("missing.parquet", &Default::default()).unwrap_err();

    for obs in [a, b] {
        assert_eq!(*obs.failures.lock().unwrap(), vec![Severity::Critical]);
        assert_eq!(*obs.alerts.lock().unwrap(), vec![Severity::Critical]);
    }
}
