#![allow(clippy::unwrap_used)]
// Integration tests for `StoveClient` using wiremock.

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use firenet_api::{ControlUpdate, Error, SessionClient, StoveClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

const SUMMARY_PAGE: &str = r#"
<html><body>
    <div class="stove" data-stove='{"stoveId": "12345", "name": "Test Stove"}'></div>
    <a href="/logout">Logout</a>
</body></html>
"#;

async fn setup() -> (MockServer, StoveClient) {
    let server = MockServer::start().await;
    let session = SessionClient::new(
        Url::parse(&server.uri()).unwrap(),
        "test@example.com",
        SecretString::from("test_password".to_string()),
        TransportConfig::with_timeout(Duration::from_secs(5)),
    );
    (server, StoveClient::new(session))
}

fn login_ok() -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("set-cookie", "connect.sid=s%3Atest-session; Path=/")
        .set_body_string(r#"<a href="/logout">Logout</a>"#)
}

async fn mount_login(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/web/login"))
        .respond_with(login_ok())
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn stove_state() -> serde_json::Value {
    json!({
        "sensors": {
            "inputRoomTemperature": 21.2,
            "statusMainState": 4,
            "statusSubState": 0,
            "statusFrostStarted": false
        },
        "controls": {
            "targetTemperature": "22",
            "onOff": true
        }
    })
}

// ── discover_stoves() ───────────────────────────────────────────────

#[tokio::test]
async fn test_discover_stoves() {
    let (server, client) = setup().await;
    mount_login(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/web/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SUMMARY_PAGE))
        .mount(&server)
        .await;

    client.session().connect().await.unwrap();
    let stoves = client.discover_stoves().await.unwrap();

    assert_eq!(stoves.len(), 1);
    assert_eq!(stoves[0].stove_id, "12345");
    assert_eq!(stoves[0].name, "Test Stove");
}

#[tokio::test]
async fn test_discover_empty_page_is_discovery_error() {
    let (server, client) = setup().await;
    mount_login(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/web/summary"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"<a href="/logout">Logout</a>"#),
        )
        .mount(&server)
        .await;

    client.session().connect().await.unwrap();
    let result = client.discover_stoves().await;

    assert!(
        matches!(result, Err(Error::Discovery { .. })),
        "expected Discovery error, got: {result:?}"
    );
}

// ── fetch_state() ───────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_state() {
    let (server, client) = setup().await;
    mount_login(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/api/client/12345/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stove_state()))
        .mount(&server)
        .await;

    client.session().connect().await.unwrap();
    let payload = client.fetch_state("12345").await.unwrap();

    assert_eq!(payload.sensor("statusMainState"), Some(&json!(4)));
    assert_eq!(payload.control("targetTemperature"), Some(&json!("22")));
}

#[tokio::test]
async fn test_fetch_state_logs_in_lazily() {
    let (server, client) = setup().await;
    mount_login(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/api/client/12345/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stove_state()))
        .mount(&server)
        .await;

    let payload = client.fetch_state("12345").await.unwrap();
    assert_eq!(payload.control("onOff"), Some(&json!(true)));
    assert!(client.session().is_authenticated());
}

#[tokio::test]
async fn test_fetch_state_reauthenticates_once_on_expiry() {
    let (server, client) = setup().await;
    mount_login(&server, 2).await;

    Mock::given(method("GET"))
        .and(path("/api/client/12345/status"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/client/12345/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stove_state()))
        .mount(&server)
        .await;

    client.session().connect().await.unwrap();
    let payload = client.fetch_state("12345").await.unwrap();

    assert_eq!(payload.sensor("inputRoomTemperature"), Some(&json!(21.2)));
    assert_eq!(client.session().generation(), 2);
}

#[tokio::test]
async fn test_redirect_to_login_counts_as_expiry() {
    let (server, client) = setup().await;
    mount_login(&server, 2).await;

    Mock::given(method("GET"))
        .and(path("/api/client/12345/status"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/web/login"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/web/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<form>Login</form>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/client/12345/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stove_state()))
        .mount(&server)
        .await;

    client.session().connect().await.unwrap();
    let payload = client.fetch_state("12345").await.unwrap();
    assert_eq!(payload.sensor("statusMainState"), Some(&json!(4)));
}

#[tokio::test]
async fn test_repeated_rejection_is_authentication_error() {
    let (server, client) = setup().await;
    mount_login(&server, 2).await;

    Mock::given(method("GET"))
        .and(path("/api/client/12345/status"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    client.session().connect().await.unwrap();
    let result = client.fetch_state("12345").await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_fetch_state_malformed_body() {
    let (server, client) = setup().await;
    mount_login(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/api/client/12345/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    client.session().connect().await.unwrap();

    match client.fetch_state("12345").await {
        Err(Error::Deserialization { body, .. }) => assert_eq!(body, "<html>oops</html>"),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_state_timeout() {
    let server = MockServer::start().await;
    let session = SessionClient::new(
        Url::parse(&server.uri()).unwrap(),
        "test@example.com",
        SecretString::from("test_password".to_string()),
        TransportConfig::with_timeout(Duration::from_millis(300)),
    );
    let client = StoveClient::new(session);
    mount_login(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/api/client/12345/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(stove_state())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    client.session().connect().await.unwrap();
    let result = client.fetch_state("12345").await;

    assert!(
        matches!(result, Err(Error::Timeout { .. })),
        "expected Timeout error, got: {result:?}"
    );
}

// ── send_command() ──────────────────────────────────────────────────

#[tokio::test]
async fn test_send_command_posts_field_and_value() {
    let (server, client) = setup().await;
    mount_login(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/api/client/12345/controls"))
        .and(body_json(json!({ "field": "targetTemperature", "value": "23" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    client.session().connect().await.unwrap();
    let update = ControlUpdate {
        field: "targetTemperature".into(),
        value: json!("23"),
    };
    client.send_command("12345", &update).await.unwrap();
}

#[tokio::test]
async fn test_send_command_rejected_by_service() {
    let (server, client) = setup().await;
    mount_login(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/api/client/12345/controls"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid field"))
        .mount(&server)
        .await;

    client.session().connect().await.unwrap();
    let update = ControlUpdate {
        field: "onOff".into(),
        value: json!(false),
    };

    match client.send_command("12345", &update).await {
        Err(Error::Api { status, .. }) => assert_eq!(status, 400),
        other => panic!("expected Api error, got: {other:?}"),
    }
}
