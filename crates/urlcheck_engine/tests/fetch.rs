use std::time::Duration;

use urlcheck_engine::{FailureKind, FetchSettings, Fetcher, ReqwestFetcher};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher(settings: FetchSettings) -> ReqwestFetcher {
    ReqwestFetcher::new(settings).expect("client builds")
}

#[tokio::test]
async fn fetcher_returns_decoded_body_without_location() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/doc"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<html>ok</html>", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let output = fetcher(FetchSettings::default())
        .fetch(&format!("{}/doc", server.uri()))
        .await
        .expect("fetch ok");
    assert_eq!(output.status, 200);
    assert_eq!(output.content, "<html>ok</html>");
    assert_eq!(output.location, None);
}

#[tokio::test]
async fn fetcher_surfaces_redirect_location_instead_of_following() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/from"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/to?x=1"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/to"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let output = fetcher(FetchSettings::default())
        .fetch(&format!("{}/from", server.uri()))
        .await
        .expect("fetch ok");
    assert_eq!(output.status, 302);
    assert_eq!(output.location, Some(format!("{}/to?x=1", server.uri())));
}

#[tokio::test]
async fn fetcher_treats_error_status_as_a_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
        .mount(&server)
        .await;

    let output = fetcher(FetchSettings::default())
        .fetch(&format!("{}/missing", server.uri()))
        .await
        .expect("fetch ok");
    assert_eq!(output.status, 404);
    assert_eq!(output.content, "gone");
}

#[tokio::test]
async fn fetcher_sends_configured_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("user-agent", "urlcheck-test/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("agent ok"))
        .mount(&server)
        .await;

    let settings = FetchSettings {
        user_agent: Some("urlcheck-test/1.0".to_string()),
        ..FetchSettings::default()
    };
    let output = fetcher(settings)
        .fetch(&format!("{}/", server.uri()))
        .await
        .expect("fetch ok");
    assert_eq!(output.content, "agent ok");
}

#[tokio::test]
async fn fetcher_times_out_on_slow_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let settings = FetchSettings {
        timeout: Duration::from_millis(100),
        ..FetchSettings::default()
    };
    let err = fetcher(settings)
        .fetch(&format!("{}/slow", server.uri()))
        .await
        .expect_err("should time out");
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn fetcher_rejects_oversized_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(256)))
        .mount(&server)
        .await;

    let settings = FetchSettings {
        max_bytes: 16,
        ..FetchSettings::default()
    };
    let err = fetcher(settings)
        .fetch(&format!("{}/big", server.uri()))
        .await
        .expect_err("should be too large");
    assert!(matches!(err.kind, FailureKind::TooLarge { max_bytes: 16, .. }));
}

#[tokio::test]
async fn fetcher_rejects_unparseable_url() {
    let err = fetcher(FetchSettings::default())
        .fetch("not a url")
        .await
        .expect_err("invalid url");
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}
