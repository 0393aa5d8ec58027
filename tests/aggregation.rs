use std::sync::Arc;

use serde_json::{Value as JsonValue, json};

use dataset_analytics::DatasetError;
use dataset_analytics::config::Settings;
use dataset_analytics::query::AggregateRequest;
use dataset_analytics::service::DatasetService;
use dataset_analytics::storage::{MemoryObjectStore, ObjectStore};

fn converted(csv: &str) -> (DatasetService, String) {
    let store = Arc::new(MemoryObjectStore::new());
    store.put("raw-datasets", "data.csv", csv.as_bytes().to_vec()).unwrap();
    let service = DatasetService::new(store, Settings::default());
    let artifact = service.convert("data.csv", "Sheet1").unwrap().processed_file;
    (service, artifact)
}

fn rows(agg: &dataset_analytics::query::Aggregation) -> Vec<JsonValue> {
    agg.data.iter().cloned().map(JsonValue::Object).collect()
}

#[test]
fn sum_over_text_amounts_skips_non_numbers() {
    let (service, artifact) = converted("region,amount\nA,10\nA,5\nB,x\n");
    let agg = service
        .aggregate(&artifact, &AggregateRequest::new("region", "sum", "amount"))
        .unwrap();
    assert_eq!(rows(&agg), vec![json!({"region": "A", "sum_amount": 15.0})]);
    assert_eq!(agg.x_key, "region");
    assert_eq!(agg.y_key, "sum_amount");
    assert_eq!(agg.columns, vec!["region", "sum_amount"]);
}

#[test]
fn groups_are_capped_and_sorted_descending() {
    let mut csv = String::from("id,amount\n");
    for i in 0..1_000 {
        csv.push_str(&format!("id-{i},{}\n", (i * 37) % 1_000));
    }
    let (service, artifact) = converted(&csv);

    let agg = service
        .aggregate(&artifact, &AggregateRequest::new("id", "sum", "amount"))
        .unwrap();
    assert_eq!(agg.data.len(), 200);
    let metrics: Vec<f64> = agg
        .data
        .iter()
        .map(|r| r["sum_amount"].as_f64().unwrap())
        .collect();
    assert!(metrics.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(metrics[0], 999.0);
}

#[test]
fn group_cap_follows_settings() {
    let store = Arc::new(MemoryObjectStore::new());
    store
        .put("raw-datasets", "d.csv", b"g,v\na,1\nb,2\nc,3\n".to_vec())
        .unwrap();
    let settings = Settings {
        group_cap: 2,
        ..Settings::default()
    };
    let service = DatasetService::new(store, settings);
    let artifact = service.convert("d.csv", "Sheet1").unwrap().processed_file;

    let agg = service
        .aggregate(&artifact, &AggregateRequest::new("g", "max", "v"))
        .unwrap();
    assert_eq!(
        rows(&agg),
        vec![json!({"g": "c", "max_v": 3}), json!({"g": "b", "max_v": 2})]
    );
}

#[test]
fn avg_rounds_to_two_places() {
    let (service, artifact) = converted("team,score\nx,1\nx,2\nx,2\ny,0.125\n");
    let agg = service
        .aggregate(&artifact, &AggregateRequest::new("team", "avg", "score"))
        .unwrap();
    assert_eq!(
        rows(&agg),
        vec![json!({"team": "x", "avg_score": 1.67}), json!({"team": "y", "avg_score": 0.13})]
    );
}

#[test]
fn count_counts_present_values() {
    let (service, artifact) = converted("team,note\nx,a\nx,\ny,b\ny,c\n");
    let agg = service
        .aggregate(&artifact, &AggregateRequest::new("team", "count", "note"))
        .unwrap();
    assert_eq!(
        rows(&agg),
        vec![json!({"team": "y", "count_note": 2}), json!({"team": "x", "count_note": 1})]
    );
}

#[test]
fn unknown_group_column_is_reported() {
    let (service, artifact) = converted("region,amount\nA,1\n");
    let err = service
        .aggregate(&artifact, &AggregateRequest::new("country", "sum", "amount"))
        .unwrap_err();
    assert!(matches!(err, DatasetError::ColumnNotFound { .. }));

    let payload = serde_json::to_value(
        service.aggregate_payload(&artifact, &AggregateRequest::new("country", "sum", "amount")),
    )
    .unwrap();
    assert_eq!(payload, json!({"status": "error", "message": "Column 'country' not found"}));
}

#[test]
fn invalid_operation_payload() {
    let (service, artifact) = converted("region,amount\nA,1\n");
    let payload = serde_json::to_value(
        service.aggregate_payload(&artifact, &AggregateRequest::new("region", "median", "amount")),
    )
    .unwrap();
    assert_eq!(payload, json!({"status": "error", "message": "Invalid operation"}));
}

#[test]
fn boolean_target_cannot_be_summed() {
    let (service, artifact) = converted("region,flag\nA,true\nB,false\n");
    let err = service
        .aggregate(&artifact, &AggregateRequest::new("region", "sum", "flag"))
        .unwrap_err();
    assert_eq!(err.to_string(), "Column 'flag' contains non-numbers.");
}
