//! Probe integration tests against a local mock HTTP server.
//!
//! These drive the download and upload probes end to end through `run()`,
//! asserting the metric update contract for success and failure paths.

use std::sync::Arc;

use linkmon::metrics::Metrics;
use linkmon::payload::scratch_payload;
use linkmon::probes::{DownloadProbe, Probe, UploadProbe};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_server(route_method: &str, route_path: &str, response: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method(route_method))
        .and(path(route_path))
        .respond_with(response)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn download_success_records_size_and_duration() {
    let body = vec![0u8; 2048];
    let server = mock_server("GET", "/file", ResponseTemplate::new(200).set_body_bytes(body)).await;

    let metrics = Arc::new(Metrics::new().unwrap());
    let probe = DownloadProbe::new(format!("{}/file", server.uri()), metrics.clone()).unwrap();

    probe.run().await;

    assert_eq!(metrics.download_requests.get(), 1.0);
    assert_eq!(metrics.download_failures.get(), 0.0);
    assert_eq!(metrics.download_size.get(), 2048.0);
    assert_eq!(metrics.download_duration.get_sample_count(), 1);
}

#[tokio::test]
async fn download_http_error_counts_as_failure() {
    let server = mock_server("GET", "/file", ResponseTemplate::new(500)).await;

    let metrics = Arc::new(Metrics::new().unwrap());
    let probe = DownloadProbe::new(format!("{}/file", server.uri()), metrics.clone()).unwrap();

    probe.run().await;

    assert_eq!(metrics.download_requests.get(), 1.0);
    assert_eq!(metrics.download_failures.get(), 1.0);
    // Size gauge keeps its previous value on failure.
    assert_eq!(metrics.download_size.get(), 0.0);
    // The timing wrapper is unconditional.
    assert_eq!(metrics.download_duration.get_sample_count(), 1);
    assert!(metrics.download_duration.get_sample_sum() >= 0.0);
}

#[tokio::test]
async fn download_network_error_counts_as_failure() {
    // Nothing listens on this port.
    let metrics = Arc::new(Metrics::new().unwrap());
    let probe = DownloadProbe::new("http://127.0.0.1:1/file", metrics.clone()).unwrap();

    probe.run().await;

    assert_eq!(metrics.download_requests.get(), 1.0);
    assert_eq!(metrics.download_failures.get(), 1.0);
    assert_eq!(metrics.download_duration.get_sample_count(), 1);
}

#[tokio::test]
async fn repeated_download_failures_accumulate() {
    let metrics = Arc::new(Metrics::new().unwrap());
    let probe = DownloadProbe::new("http://127.0.0.1:1/file", metrics.clone()).unwrap();

    probe.run().await;
    probe.run().await;

    assert_eq!(metrics.download_requests.get(), 2.0);
    assert_eq!(metrics.download_failures.get(), 2.0);
    assert_eq!(metrics.download_duration.get_sample_count(), 2);
}

#[tokio::test]
async fn upload_success_reports_payload_size() {
    let server = mock_server("POST", "/upload", ResponseTemplate::new(200)).await;

    let metrics = Arc::new(Metrics::new().unwrap());
    let payload = scratch_payload(4096);
    let probe =
        UploadProbe::new(format!("{}/upload", server.uri()), payload, metrics.clone()).unwrap();

    probe.run().await;

    assert_eq!(metrics.upload_requests.get(), 1.0);
    assert_eq!(metrics.upload_failures.get(), 0.0);
    // The gauge reports the stored payload length, not the response.
    assert_eq!(metrics.upload_size.get(), 4096.0);
    assert_eq!(metrics.upload_duration.get_sample_count(), 1);
}

#[tokio::test]
async fn upload_http_error_counts_as_failure() {
    let server = mock_server("POST", "/upload", ResponseTemplate::new(503)).await;

    let metrics = Arc::new(Metrics::new().unwrap());
    let payload = scratch_payload(4096);
    let probe =
        UploadProbe::new(format!("{}/upload", server.uri()), payload, metrics.clone()).unwrap();

    probe.run().await;

    assert_eq!(metrics.upload_requests.get(), 1.0);
    assert_eq!(metrics.upload_failures.get(), 1.0);
    assert_eq!(metrics.upload_size.get(), 0.0);
    assert_eq!(metrics.upload_duration.get_sample_count(), 1);
}

#[tokio::test]
async fn success_after_failure_keeps_counters_monotonic() {
    let metrics = Arc::new(Metrics::new().unwrap());

    let failing = DownloadProbe::new("http://127.0.0.1:1/file", metrics.clone()).unwrap();
    failing.run().await;

    let server =
        mock_server("GET", "/file", ResponseTemplate::new(200).set_body_bytes(vec![1u8; 512]))
            .await;
    let working = DownloadProbe::new(format!("{}/file", server.uri()), metrics.clone()).unwrap();
    working.run().await;

    assert_eq!(metrics.download_requests.get(), 2.0);
    assert_eq!(metrics.download_failures.get(), 1.0);
    assert_eq!(metrics.download_size.get(), 512.0);
    assert_eq!(metrics.download_duration.get_sample_count(), 2);
}
