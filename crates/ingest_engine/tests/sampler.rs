use std::time::Duration;

use ingest_engine::{
    FailureKind, JobStatus, ReportedState, ReqwestSampler, SamplerSettings, StatusSampler,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sampler_for(server: &MockServer) -> ReqwestSampler {
    ReqwestSampler::new(SamplerSettings::new(format!("{}/status", server.uri()))).expect("client")
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[tokio::test]
async fn sampler_posts_ids_and_parses_statuses() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/status"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "backends": ["http://a", "http://b"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "http://a": {
                "total": 10,
                "encoded": 5,
                "percentage": 50.0,
                "state": "processing",
                "in_progress": true,
                "complete": false,
                "error": null
            },
            "http://b": {
                "total": 4,
                "encoded": 4,
                "percentage": 100,
                "state": "completed",
                "in_progress": false,
                "complete": true
            }
        })))
        .mount(&server)
        .await;

    let sampler = sampler_for(&server);
    let batch = sampler
        .sample(&ids(&["http://a", "http://b"]))
        .await
        .expect("sample ok");

    assert_eq!(
        batch["http://a"],
        JobStatus {
            total: 10,
            encoded: 5,
            percentage: 50.0,
            state: ReportedState::Processing,
            in_progress: true,
            complete: false,
            error: None,
        }
    );
    assert_eq!(batch["http://b"].state, ReportedState::Completed);
    assert!(batch["http://b"].complete);
}

#[tokio::test]
async fn unknown_ids_are_absent_not_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "http://a": { "state": "waiting", "total": 0 }
        })))
        .mount(&server)
        .await;

    let sampler = sampler_for(&server);
    let batch = sampler
        .sample(&ids(&["http://a", "http://ghost"]))
        .await
        .expect("sample ok");

    assert_eq!(batch.len(), 1);
    assert_eq!(batch["http://a"].state, ReportedState::Waiting);
    assert!(!batch.contains_key("http://ghost"));
}

#[tokio::test]
async fn sampler_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let sampler = sampler_for(&server);
    let err = sampler.sample(&ids(&["http://a"])).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(503));
}

#[tokio::test]
async fn sampler_fails_on_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let sampler = sampler_for(&server);
    let err = sampler.sample(&ids(&["http://a"])).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::MalformedBody);
}

#[tokio::test]
async fn sampler_times_out_on_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(json!({})),
        )
        .mount(&server)
        .await;

    let settings = SamplerSettings {
        request_timeout: Duration::from_millis(50),
        ..SamplerSettings::new(format!("{}/status", server.uri()))
    };
    let sampler = ReqwestSampler::new(settings).expect("client");
    let err = sampler.sample(&ids(&["http://a"])).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn sampler_rejects_too_large_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"http://a\": {}}"))
        .mount(&server)
        .await;

    let settings = SamplerSettings {
        max_body_bytes: 4,
        ..SamplerSettings::new(format!("{}/status", server.uri()))
    };
    let sampler = ReqwestSampler::new(settings).expect("client");
    let err = sampler.sample(&ids(&["http://a"])).await.unwrap_err();
    assert!(matches!(err.kind, FailureKind::TooLarge { max_bytes: 4, .. }));
}

#[tokio::test]
async fn invalid_status_url_is_reported() {
    let sampler = ReqwestSampler::new(SamplerSettings::new("not a url")).expect("client");
    let err = sampler.sample(&ids(&["http://a"])).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}

#[tokio::test]
async fn empty_job_set_skips_the_request() {
    let sampler =
        ReqwestSampler::new(SamplerSettings::new("http://127.0.0.1:9/never")).expect("client");
    let batch = sampler.sample(&[]).await.expect("empty batch");
    assert!(batch.is_empty());
}

#[tokio::test]
async fn one_sampler_serves_consecutive_polls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "http://a": { "state": "processing", "total": 10, "encoded": 2 }
        })))
        .expect(3)
        .mount(&server)
        .await;

    let sampler = sampler_for(&server);
    for _ in 0..3 {
        let batch = sampler.sample(&ids(&["http://a"])).await.expect("sample ok");
        assert_eq!(batch["http://a"].encoded, 2);
    }
}
