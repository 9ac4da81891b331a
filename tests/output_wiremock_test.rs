mod common;

use common::{ManualClock, RecordingSink, record};
use rask_http_output::domain::{Batch, OutputError, Payload, Secret};
use rask_http_output::output::HttpOutput;
use rask_http_output::sender::{Authentication, HttpMethod, OutputConfig, SerializerKind};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{basic_auth, body_json, body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NOW: i64 = 1_700_000_000;

struct Harness {
    output: HttpOutput,
    clock: Arc<ManualClock>,
    sink: Arc<RecordingSink>,
}

fn harness(config: OutputConfig) -> Harness {
    let clock = Arc::new(ManualClock::new(NOW));
    let sink = Arc::new(RecordingSink::default());
    let output = HttpOutput::with_capabilities(config, clock.clone(), sink.clone()).unwrap();
    Harness {
        output,
        clock,
        sink,
    }
}

fn config_for(server: &MockServer, route: &str) -> OutputConfig {
    OutputConfig::new(format!("{}{}", server.uri(), route))
}

fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/api/events")
}

#[tokio::test]
async fn test_form_record_is_posted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/events"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("message=hello+world&status=200"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(config_for(&server, "/api/events"));
    h.output
        .deliver(
            "app.access",
            Some(NOW),
            Payload::Record(record(json!({"message": "hello world", "status": 200}))),
        )
        .await
        .unwrap();

    assert_eq!(h.output.metrics().successes, 1);
    assert!(h.sink.messages().is_empty());
}

#[tokio::test]
async fn test_json_record_gets_time_injected() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/events"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"msg": "x", "time": "2023-11-14T22:13:20+00:00"})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server, "/api/events");
    config.serializer = SerializerKind::Json;
    config.http_method = HttpMethod::Put;

    let h = harness(config);
    h.output
        .deliver("t", Some(NOW), Payload::Record(record(json!({"msg": "x"}))))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_custom_headers_and_basic_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-api-key", "secret-key"))
        .and(header("x-shard", "7"))
        .and(basic_auth("alice", "wonderland"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server, "/api/events");
    config.custom_headers = r#"{"X-Api-Key": "secret-key", "X-Shard": 7}"#.to_string();
    config.authentication = Authentication::Basic;
    config.username = "alice".to_string();
    config.password = Secret::new("wonderland");

    let h = harness(config);
    h.output
        .deliver("t", Some(NOW), Payload::Record(record(json!({"a": "1"}))))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_tag_placeholder_in_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/logs/app.access"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(config_for(&server, "/logs/${tag}"));
    h.output
        .deliver("app.access", Some(NOW), Payload::Record(record(json!({"a": "1"}))))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_rate_limited_sends_are_dropped_silently() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let mut config = config_for(&server, "/api/events");
    config.rate_limit_msec = 1000;
    let h = harness(config);
    let payload = || Payload::Record(record(json!({"a": "1"})));

    h.output.deliver("t", Some(NOW), payload()).await.unwrap();

    h.clock.advance(Duration::from_millis(500));
    h.output.deliver("t", Some(NOW), payload()).await.unwrap();

    h.clock.advance(Duration::from_millis(600));
    h.output.deliver("t", Some(NOW), payload()).await.unwrap();

    assert_eq!(h.sink.infos(), vec!["Dropped request due to rate limiting".to_string()]);
    let metrics = h.output.metrics();
    assert_eq!(metrics.successes, 2);
    assert_eq!(metrics.skipped, 1);
}

#[tokio::test]
async fn test_recoverable_status_propagates_even_without_raise_on_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server, "/api/events");
    config.raise_on_error = false;
    let h = harness(config);

    let err = h
        .output
        .deliver("t", Some(NOW), Payload::Record(record(json!({"a": "1"}))))
        .await
        .unwrap_err();

    assert!(err.is_recoverable());
    assert_eq!(err.to_string(), "Recoverable response: 503 Service Unavailable busy");
    assert_eq!(h.output.metrics().recoverable_failures, 1);
}

#[tokio::test]
async fn test_unclassified_status_is_logged_not_raised() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(config_for(&server, "/api/events"));
    h.output
        .deliver("t", Some(NOW), Payload::Record(record(json!({"a": "1"}))))
        .await
        .unwrap();

    let expected = format!("failed to POST {}/api/events (404 Not Found nope)", server.uri());
    assert_eq!(h.sink.warnings(), vec![expected]);
    assert_eq!(h.output.metrics().rejected, 1);
}

#[tokio::test]
async fn test_redirect_is_classified_not_followed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/events"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/moved"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/moved"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let h = harness(config_for(&server, "/api/events"));
    h.output
        .deliver("t", Some(NOW), Payload::Record(record(json!({"a": "1"}))))
        .await
        .unwrap();

    let expected = format!("failed to POST {}/api/events (302 Found )", server.uri());
    assert_eq!(h.sink.warnings(), vec![expected]);
    let metrics = h.output.metrics();
    assert_eq!(metrics.rejected, 1);
    assert_eq!(metrics.successes, 0);
}

#[tokio::test]
async fn test_redirect_status_can_be_recoverable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/events"))
        .respond_with(ResponseTemplate::new(307).insert_header("Location", "/moved"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/moved"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = config_for(&server, "/api/events");
    config.recoverable_status_codes = [307].into_iter().collect();
    let h = harness(config);

    let err = h
        .output
        .deliver("t", Some(NOW), Payload::Record(record(json!({"a": "1"}))))
        .await
        .unwrap_err();
    match err {
        OutputError::Recoverable(summary) => assert_eq!(summary, "307 Temporary Redirect "),
        other => panic!("expected recoverable error, got {other:?}"),
    }
}

#[test]
fn test_disabled_tls_verification_is_reported_to_sink() {
    let mut config = OutputConfig::new("https://localhost:9443/api/events");
    config.ssl_no_verify = true;
    let h = harness(config);

    assert_eq!(
        h.sink.warnings(),
        vec!["TLS peer verification disabled for https://localhost:9443/api/events".to_string()]
    );
}

#[tokio::test]
async fn test_custom_recoverable_codes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let mut config = config_for(&server, "/api/events");
    config.recoverable_status_codes = [429, 503].into_iter().collect();
    let h = harness(config);

    let err = h
        .output
        .deliver("t", Some(NOW), Payload::Record(record(json!({"a": "1"}))))
        .await
        .unwrap_err();
    assert!(matches!(err, OutputError::Recoverable(_)));
}

#[tokio::test]
async fn test_transport_error_raised_when_configured() {
    let h = harness(OutputConfig::new(closed_port_url()));

    let err = h
        .output
        .deliver("t", Some(NOW), Payload::Record(record(json!({"a": "1"}))))
        .await
        .unwrap_err();

    assert!(err.is_transport());
    assert!(!err.is_recoverable());
    let warnings = h.sink.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].starts_with("HTTP POST http://127.0.0.1:"));
    assert!(warnings[0].contains("raised"));
    assert_eq!(h.output.metrics().transport_failures, 1);
}

#[tokio::test]
async fn test_transport_error_swallowed_without_raise_on_error() {
    let mut config = OutputConfig::new(closed_port_url());
    config.raise_on_error = false;
    let h = harness(config);

    h.output
        .deliver("t", Some(NOW), Payload::Record(record(json!({"a": "1"}))))
        .await
        .unwrap();
    assert_eq!(h.sink.warnings().len(), 1);
}

#[tokio::test]
async fn test_timeout_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let mut config = config_for(&server, "/api/events");
    config.timeout_secs = 1;
    let h = harness(config);

    let err = h
        .output
        .deliver("t", Some(NOW), Payload::Record(record(json!({"a": "1"}))))
        .await
        .unwrap_err();

    match err {
        OutputError::Transport { kind, method, .. } => {
            assert_eq!(kind, "timeout");
            assert_eq!(method, "POST");
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_bulk_request_sends_one_ndjson_body() {
    let server = MockServer::start().await;
    let expected_body = [
        r#"{"n":1,"time":"2023-11-14T22:13:20+00:00"}"#,
        r#"{"n":2,"time":"2023-11-14T22:13:21+00:00"}"#,
        r#"{"n":3,"time":"given"}"#,
    ]
    .join("\n");
    Mock::given(method("POST"))
        .and(header("content-type", "application/x-ndjson"))
        .and(body_string(expected_body))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server, "/bulk");
    config.serializer = SerializerKind::Json;
    config.bulk_request = true;
    let h = harness(config);

    let batch = Batch::from(vec![
        (Some(NOW), record(json!({"n": 1}))),
        (Some(NOW + 1), record(json!({"n": 2}))),
        (Some(NOW + 2), record(json!({"n": 3, "time": "given"}))),
    ]);
    h.output.deliver("t", None, Payload::Batch(batch)).await.unwrap();
    assert_eq!(h.output.metrics().attempts, 1);
}

#[tokio::test]
async fn test_bulk_url_time_uses_clock() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bulk/1800000000"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server, "/bulk/${time}");
    config.bulk_request = true;
    let h = harness(config);
    h.clock.set_unix(1_800_000_000);

    let batch = Batch::from(vec![(Some(NOW), record(json!({"n": 1})))]);
    h.output.deliver("t", Some(NOW), Payload::Batch(batch)).await.unwrap();
}

#[tokio::test]
async fn test_batch_without_bulk_sends_each_record() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&server)
        .await;

    let mut config = config_for(&server, "/api/events");
    config.serializer = SerializerKind::Json;
    let h = harness(config);

    let batch: Batch = (0..3)
        .map(|i| (Some(NOW + i), record(json!({"n": i}))))
        .collect();
    h.output.deliver("t", None, Payload::Batch(batch)).await.unwrap();
    assert_eq!(h.output.metrics().successes, 3);
}

#[tokio::test]
async fn test_batch_without_bulk_stops_at_first_recoverable_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(config_for(&server, "/api/events"));
    let batch: Batch = (0..3)
        .map(|i| (Some(NOW + i), record(json!({"n": i}))))
        .collect();

    let err = h.output.deliver("t", None, Payload::Batch(batch)).await.unwrap_err();
    assert!(err.is_recoverable());
}

#[test]
fn test_malformed_custom_headers_fail_construction() {
    let mut config = OutputConfig::new("http://localhost:9880/api/events");
    config.custom_headers = "{\"X-Key\": ".to_string();

    let err = HttpOutput::new(config).unwrap_err();
    assert!(matches!(err, OutputError::Configuration(_)));
}
