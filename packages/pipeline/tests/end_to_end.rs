use std::sync::Arc;
use std::time::Duration;

use placemark_geocoder::registry::ServiceConfig;
use placemark_pipeline::{ProcessConfig, Service};
use placemark_table::Sheet;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_service_config(base_url: String) -> ServiceConfig {
    ServiceConfig {
        name: "test".to_string(),
        base_url,
        user_agent: "placemark-tests/0.1".to_string(),
        language: "en".to_string(),
        request_timeout_ms: 5000,
        max_attempts: 3,
        backoff_base_ms: 0,
        rate_limit_penalty_ms: 0,
    }
}

fn test_process_config() -> ProcessConfig {
    ProcessConfig {
        workers: 4,
        request_delay: Duration::ZERO,
        batch_pause: Duration::ZERO,
        ..ProcessConfig::default()
    }
}

fn stung_treng_body() -> serde_json::Value {
    serde_json::json!({
        "display_name": "Stung Treng, Stung Treng Province, Cambodia",
        "address": {
            "district": "Stung Treng",
            "state": "Stung Treng Province",
            "country": "Cambodia"
        }
    })
}

fn sheet_with_coords(cells: &[&str]) -> Sheet {
    let mut rows = vec![vec!["id".to_string(), "coords".to_string()]];
    for (i, cell) in cells.iter().enumerate() {
        rows.push(vec![(i + 1).to_string(), (*cell).to_string()]);
    }
    Sheet::from_rows(rows).unwrap()
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.unwrap_or_default().len()
}

#[tokio::test]
async fn near_duplicate_coordinates_hit_upstream_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stung_treng_body()))
        .mount(&server)
        .await;

    // Both rows quantize to the same 6-decimal cache key. One worker
    // keeps the rows sequential so the second is a guaranteed hit.
    let sheet = sheet_with_coords(&["13.7563,100.5018", "13.756300,100.501800"]);
    let config = ProcessConfig {
        workers: 1,
        ..test_process_config()
    };
    let mut service = Service::new(sheet, test_service_config(server.uri()), config);

    let summary = service.process(None, None).await.unwrap();

    assert_eq!(summary.resolved, 2);
    assert_eq!(summary.skipped, 0);
    assert_eq!(request_count(&server).await, 1);
    assert_eq!(service.sheet().cell(1, 2), service.sheet().cell(2, 2));
}

#[tokio::test]
async fn blank_coordinates_are_skipped_without_a_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stung_treng_body()))
        .mount(&server)
        .await;

    let sheet = sheet_with_coords(&["", "   ", "not-coordinates"]);
    let mut service = Service::new(sheet, test_service_config(server.uri()), test_process_config());

    let summary = service.process(None, None).await.unwrap();

    assert_eq!(summary.resolved, 0);
    assert_eq!(summary.skipped, 3);
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn resolved_rows_receive_address_district_and_province() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("lat", "13.536964"))
        .and(query_param("lon", "105.927722"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stung_treng_body()))
        .mount(&server)
        .await;

    let sheet = sheet_with_coords(&["13.536964,105.927722"]);
    let mut service = Service::new(sheet, test_service_config(server.uri()), test_process_config());

    let summary = service.process(None, None).await.unwrap();

    assert_eq!(summary.resolved, 1);
    assert_eq!(service.sheet().cell(0, 2), Some("Address"));
    assert_eq!(
        service.sheet().cell(1, 2),
        Some("Stung Treng, Stung Treng Province, Cambodia")
    );
    assert_eq!(service.sheet().cell(1, 3), Some("Stung Treng"));
    assert_eq!(service.sheet().cell(1, 4), Some("Stung Treng Province"));
}

#[tokio::test]
async fn every_row_yields_exactly_one_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stung_treng_body()))
        .mount(&server)
        .await;

    let sheet = sheet_with_coords(&[
        "13.7563,100.5018",
        "",
        "18.7883,98.9853",
        "garbage",
        "7.8804,98.3923",
    ]);
    let mut service = Service::new(sheet, test_service_config(server.uri()), test_process_config());

    let summary = service.process(None, None).await.unwrap();

    assert_eq!(summary.total_rows, 5);
    assert_eq!(summary.resolved + summary.skipped, 5);
    assert_eq!(summary.resolved, 3);
}

#[tokio::test]
async fn failed_rows_are_skipped_not_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let sheet = sheet_with_coords(&["13.7563,100.5018"]);
    let mut service = Service::new(sheet, test_service_config(server.uri()), test_process_config());

    let summary = service.process(None, None).await.unwrap();

    assert_eq!(summary.resolved, 0);
    assert_eq!(summary.skipped, 1);
    // Result columns exist but stay empty.
    assert_eq!(service.sheet().cell(1, 2), None);
}

#[tokio::test]
async fn batched_mode_writes_checkpoints() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stung_treng_body()))
        .mount(&server)
        .await;

    let sheet = sheet_with_coords(&[
        "13.7563,100.5018",
        "18.7883,98.9853",
        "7.8804,98.3923",
        "12.5657,104.9910",
    ]);
    let config = ProcessConfig {
        large_dataset_threshold: 2,
        batch_size: 2,
        ..test_process_config()
    };
    let mut service = Service::new(sheet, test_service_config(server.uri()), config);

    let dir = tempfile::tempdir().unwrap();
    let checkpoint = dir.path().join("input_temp.csv");
    let summary = service.process(Some(&checkpoint), None).await.unwrap();

    assert_eq!(summary.resolved, 4);
    let saved = Sheet::open(&checkpoint).unwrap();
    assert_eq!(saved.data_row_count(), 4);
    assert_eq!(
        saved.cell(4, 2),
        Some("Stung Treng, Stung Treng Province, Cambodia")
    );
}

#[tokio::test]
async fn checkpoint_failure_does_not_abort_the_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stung_treng_body()))
        .mount(&server)
        .await;

    let sheet = sheet_with_coords(&["13.7563,100.5018", "18.7883,98.9853", "7.8804,98.3923"]);
    let config = ProcessConfig {
        large_dataset_threshold: 2,
        batch_size: 2,
        ..test_process_config()
    };
    let mut service = Service::new(sheet, test_service_config(server.uri()), config);

    let unwritable = std::path::Path::new("/nonexistent-dir/checkpoint.csv");
    let summary = service.process(Some(unwritable), None).await.unwrap();

    assert_eq!(summary.resolved, 3);
    assert_eq!(summary.skipped, 0);
}

#[tokio::test]
async fn missing_coordinate_column_is_fatal() {
    let sheet = Sheet::from_rows(vec![
        vec!["id".to_string(), "name".to_string()],
        vec!["1".to_string(), "Bangkok".to_string()],
    ])
    .unwrap();
    let mut service = Service::new(
        sheet,
        test_service_config("http://localhost:1".to_string()),
        test_process_config(),
    );

    assert!(service.process(None, None).await.is_err());
}

// The shared Arc keeps the cache alive across sequential batches, so a
// coordinate seen in batch one never re-hits upstream in batch two.
#[tokio::test]
async fn cache_persists_across_batches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stung_treng_body()))
        .mount(&server)
        .await;

    let sheet = sheet_with_coords(&[
        "13.7563,100.5018",
        "18.7883,98.9853",
        "13.7563,100.5018",
        "18.7883,98.9853",
    ]);
    let config = ProcessConfig {
        large_dataset_threshold: 2,
        batch_size: 2,
        ..test_process_config()
    };
    let mut service = Service::new(sheet, test_service_config(server.uri()), config);

    let summary = service.process(None, None).await.unwrap();

    assert_eq!(summary.resolved, 4);
    assert_eq!(request_count(&server).await, 2);
}

#[tokio::test]
async fn progress_callback_reaches_total() {
    use std::sync::atomic::{AtomicU64, Ordering};

    struct CountingProgress {
        total: AtomicU64,
        count: AtomicU64,
    }

    impl placemark_pipeline::progress::ProgressCallback for CountingProgress {
        fn set_total(&self, total: u64) {
            self.total.store(total, Ordering::SeqCst);
        }
        fn inc(&self, delta: u64) {
            self.count.fetch_add(delta, Ordering::SeqCst);
        }
        fn set_message(&self, _message: String) {}
        fn finish(&self, _message: String) {}
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stung_treng_body()))
        .mount(&server)
        .await;

    let sheet = sheet_with_coords(&["13.7563,100.5018", "18.7883,98.9853"]);
    let mut service = Service::new(sheet, test_service_config(server.uri()), test_process_config());

    let counter = Arc::new(CountingProgress {
        total: AtomicU64::new(0),
        count: AtomicU64::new(0),
    });
    let reporter: Arc<dyn placemark_pipeline::progress::ProgressCallback> = counter.clone();
    service.process(None, Some(reporter)).await.unwrap();

    assert_eq!(counter.total.load(Ordering::SeqCst), 2);
    assert_eq!(counter.count.load(Ordering::SeqCst), 2);
}
