#![allow(clippy::unwrap_used, clippy::float_cmp)]
// Integration tests for `Coordinator` using wiremock.

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use firenet_core::diagnostics::REDACTED;
use firenet_core::{Coordinator, CoordinatorConfig, CoordinatorState, CoreError, StatusText};

// ── Helpers ─────────────────────────────────────────────────────────

fn config_for(server: &MockServer) -> CoordinatorConfig {
    let mut config = CoordinatorConfig::new(
        "test@example.com",
        SecretString::from("test_password".to_string()),
    );
    config.base_url = Url::parse(&server.uri()).unwrap();
    config.refresh_interval = Duration::ZERO;
    config.timeout = Duration::from_secs(5);
    config
}

fn summary_page(stoves: &[(&str, &str)]) -> String {
    let entries: String = stoves
        .iter()
        .map(|(id, name)| {
            format!(r#"<div class="stove" data-stove='{{"stoveId": "{id}", "name": "{name}"}}'></div>"#)
        })
        .collect();
    format!(r#"<html><body>{entries}<a href="/logout">Logout</a></body></html>"#)
}

async fn mount_account(server: &MockServer, stoves: &[(&str, &str)]) {
    Mock::given(method("POST"))
        .and(path("/web/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "connect.sid=s%3Atest-session; Path=/")
                .set_body_string(r#"<a href="/logout">Logout</a>"#),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/web/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_string(summary_page(stoves)))
        .mount(server)
        .await;
}

fn fixture_state() -> Value {
    json!({
        "stoveID": "12345",
        "sensors": {
            "parameterFeedRateTotal": 150.5,
            "parameterRuntimePellets": 2500,
            "inputFlameTemperature": 85.5,
            "inputRoomTemperature": 21.2,
            "statusMainState": 4,
            "statusSubState": 0,
            "statusFrostStarted": false
        },
        "controls": {
            "targetTemperature": "22",
            "operatingMode": 0,
            "setBackTemperature": "18",
            "heatingTimesActiveForComfort": true,
            "onOff": true,
            "convectionFan1Active": true,
            "convectionFan1Level": 3,
            "convectionFan1Area": 0,
            "convectionFan2Active": false,
            "convectionFan2Level": 0,
            "convectionFan2Area": 0,
            "RoomPowerRequest": 2,
            "heatingPower": 75
        }
    })
}

fn idle_state(room: f64) -> Value {
    json!({
        "sensors": { "inputRoomTemperature": room, "statusMainState": 1 },
        "controls": { "onOff": false, "targetTemperature": "20" }
    })
}

async fn mount_state(server: &MockServer, stove_id: &str, response: ResponseTemplate, times: Option<u64>) {
    let mock = Mock::given(method("GET"))
        .and(path(format!("/api/client/{stove_id}/status")))
        .respond_with(response);
    let mock = match times {
        Some(n) => mock.up_to_n_times(n),
        None => mock,
    };
    mock.mount(server).await;
}

fn ok_json(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

// ── setup() ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_setup_discovers_stoves_in_order() {
    let server = MockServer::start().await;
    mount_account(&server, &[("222", "Kitchen"), ("111", "Living Room")]).await;

    let coordinator = Coordinator::new(config_for(&server));
    assert_eq!(coordinator.current_state(), CoordinatorState::Unconfigured);

    coordinator.setup().await.unwrap();

    let names: Vec<_> = coordinator
        .get_stoves()
        .iter()
        .map(|s| (s.get_id().to_owned(), s.get_name().to_owned()))
        .collect();
    assert_eq!(
        names,
        vec![
            ("222".to_owned(), "Kitchen".to_owned()),
            ("111".to_owned(), "Living Room".to_owned()),
        ]
    );
    assert_eq!(coordinator.current_state(), CoordinatorState::Ready);
    assert!(!coordinator.is_available());
    assert_eq!(coordinator.get_default_temperature(), 21.0);

    let stove = coordinator.get_stove("111").unwrap();
    assert_eq!(stove.get_stove_temperature(), None);
    assert_eq!(stove.get_stove_thermostat(), None);
}

#[tokio::test]
async fn test_setup_with_rejected_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/web/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Login failed"))
        .mount(&server)
        .await;

    let coordinator = Coordinator::new(config_for(&server));
    let result = coordinator.setup().await;

    assert!(
        matches!(result, Err(CoreError::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
    assert_eq!(coordinator.current_state(), CoordinatorState::Unconfigured);
    assert!(!coordinator.client().session().is_authenticated());
    assert!(coordinator.get_stoves().is_empty());
}

#[tokio::test]
async fn test_setup_without_stoves_is_discovery_error() {
    let server = MockServer::start().await;
    mount_account(&server, &[]).await;

    let coordinator = Coordinator::new(config_for(&server));
    let result = coordinator.setup().await;

    assert!(
        matches!(result, Err(CoreError::Discovery { .. })),
        "expected Discovery error, got: {result:?}"
    );
    assert_eq!(coordinator.current_state(), CoordinatorState::Unconfigured);
    assert!(!coordinator.client().session().is_authenticated());
}

// ── refresh() ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_refresh_before_setup() {
    let server = MockServer::start().await;
    let coordinator = Coordinator::new(config_for(&server));

    assert!(matches!(
        coordinator.refresh().await,
        Err(CoreError::NotConfigured)
    ));
}

#[tokio::test]
async fn test_fixture_scenario() {
    let server = MockServer::start().await;
    mount_account(&server, &[("12345", "Test Stove")]).await;
    mount_state(&server, "12345", ok_json(fixture_state()), None).await;

    let coordinator = Coordinator::new(config_for(&server));
    coordinator.setup().await.unwrap();
    coordinator.refresh().await.unwrap();

    let stove = coordinator.get_stove("12345").unwrap();
    assert_eq!(stove.get_stove_temperature(), Some(85.5));
    assert!(stove.is_stove_on());
    assert!(stove.is_stove_burning());
    assert_eq!(stove.get_status_text(), StatusText::Running);
    assert_eq!(stove.get_stove_thermostat(), Some(22.0));

    assert!(coordinator.last_update_success());
    assert!(coordinator.last_update_success_time().is_some());
    assert!(coordinator.is_available());
    assert_eq!(coordinator.current_state(), CoordinatorState::Ready);
}

#[tokio::test]
async fn test_failed_tick_leaves_every_stove_unchanged() {
    let server = MockServer::start().await;
    mount_account(&server, &[("1", "Hall"), ("2", "Cellar"), ("3", "Attic")]).await;

    // Tick 1: all succeed. Tick 2: stove 2 fails. Tick 3: all succeed again.
    mount_state(&server, "1", ok_json(idle_state(19.0)), Some(1)).await;
    mount_state(&server, "1", ok_json(idle_state(25.0)), None).await;
    mount_state(&server, "2", ok_json(idle_state(18.0)), Some(1)).await;
    mount_state(&server, "2", ResponseTemplate::new(500).set_body_string("boom"), Some(1)).await;
    mount_state(&server, "2", ok_json(idle_state(26.0)), None).await;
    mount_state(&server, "3", ok_json(idle_state(17.0)), Some(1)).await;
    mount_state(&server, "3", ok_json(idle_state(27.0)), None).await;

    let coordinator = Coordinator::new(config_for(&server));
    coordinator.setup().await.unwrap();

    coordinator.refresh().await.unwrap();
    let before: Vec<_> = coordinator
        .get_stoves()
        .iter()
        .map(|s| s.get_state().unwrap().to_value())
        .collect();
    let success_time = coordinator.last_update_success_time();

    let result = coordinator.refresh().await;
    assert!(
        matches!(result, Err(CoreError::Api { status: Some(500), .. })),
        "expected Api error, got: {result:?}"
    );

    let after: Vec<_> = coordinator
        .get_stoves()
        .iter()
        .map(|s| s.get_state().unwrap().to_value())
        .collect();
    assert_eq!(before, after);
    assert!(!coordinator.last_update_success());
    assert!(!coordinator.is_available());
    assert_eq!(coordinator.last_update_success_time(), success_time);
    assert!(coordinator.last_error().is_some());
    assert_eq!(coordinator.current_state(), CoordinatorState::Degraded);

    coordinator.refresh().await.unwrap();
    let rooms: Vec<_> = coordinator
        .get_stoves()
        .iter()
        .map(|s| s.get_room_temperature())
        .collect();
    assert_eq!(rooms, vec![Some(25.0), Some(26.0), Some(27.0)]);
    assert!(coordinator.last_update_success());
    assert_eq!(coordinator.last_error(), None);
    assert_eq!(coordinator.current_state(), CoordinatorState::Ready);
}

#[tokio::test]
async fn test_tick_timeout_degrades() {
    let server = MockServer::start().await;
    mount_account(&server, &[("12345", "Test Stove")]).await;
    mount_state(
        &server,
        "12345",
        ok_json(fixture_state()).set_delay(Duration::from_secs(3)),
        None,
    )
    .await;

    let mut config = config_for(&server);
    config.timeout = Duration::from_millis(300);
    let coordinator = Coordinator::new(config);
    coordinator.setup().await.unwrap();

    let result = coordinator.refresh().await;
    assert!(
        matches!(result, Err(CoreError::Timeout { .. })),
        "expected Timeout error, got: {result:?}"
    );
    assert_eq!(coordinator.current_state(), CoordinatorState::Degraded);
    assert!(!coordinator.get_stove("12345").unwrap().has_state());
}

#[tokio::test]
async fn test_expired_session_is_renewed_within_a_tick() {
    let server = MockServer::start().await;
    mount_account(&server, &[("12345", "Test Stove")]).await;
    mount_state(&server, "12345", ResponseTemplate::new(401), Some(1)).await;
    mount_state(&server, "12345", ok_json(fixture_state()), None).await;

    let coordinator = Coordinator::new(config_for(&server));
    coordinator.setup().await.unwrap();
    coordinator.refresh().await.unwrap();

    assert_eq!(coordinator.client().session().generation(), 2);
    assert!(coordinator.last_update_success());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_expiry_logs_in_once() {
    let server = MockServer::start().await;
    let stoves = [("1", "Hall"), ("2", "Cellar"), ("3", "Attic")];
    Mock::given(method("POST"))
        .and(path("/web/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "connect.sid=s%3Atest-session; Path=/")
                .set_body_string(r#"<a href="/logout">Logout</a>"#),
        )
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/web/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_string(summary_page(&stoves)))
        .mount(&server)
        .await;
    for (id, _) in stoves {
        mount_state(&server, id, ResponseTemplate::new(401), Some(1)).await;
        mount_state(&server, id, ok_json(idle_state(20.0)), None).await;
    }

    let coordinator = Coordinator::new(config_for(&server));
    coordinator.setup().await.unwrap();
    coordinator.refresh().await.unwrap();

    assert_eq!(coordinator.client().session().generation(), 2);
    assert!(coordinator.last_update_success());
    assert!(coordinator.get_stoves().iter().all(|s| s.has_state()));
}

// ── send_command() ──────────────────────────────────────────────────

#[tokio::test]
async fn test_send_command_confirms_with_fresh_state() {
    let server = MockServer::start().await;
    mount_account(&server, &[("12345", "Test Stove")]).await;
    mount_state(&server, "12345", ok_json(fixture_state()), Some(1)).await;

    let mut confirmed = fixture_state();
    confirmed["controls"]["targetTemperature"] = json!("23");
    mount_state(&server, "12345", ok_json(confirmed), None).await;

    Mock::given(method("POST"))
        .and(path("/api/client/12345/controls"))
        .and(body_json(json!({ "field": "targetTemperature", "value": "23" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = Coordinator::new(config_for(&server));
    coordinator.setup().await.unwrap();
    coordinator.refresh().await.unwrap();

    let stove = coordinator
        .send_command("12345", "targetTemperature", &json!(23))
        .await
        .unwrap();
    assert_eq!(stove.get_stove_thermostat(), Some(23.0));
    assert_eq!(stove.revision(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_slow_tick_does_not_overwrite_newer_command_state() {
    let server = MockServer::start().await;
    mount_account(&server, &[("12345", "Test Stove")]).await;
    // The tick's fetch is answered late with the old thermostat.
    mount_state(
        &server,
        "12345",
        ok_json(fixture_state()).set_delay(Duration::from_secs(1)),
        Some(1),
    )
    .await;
    let mut confirmed = fixture_state();
    confirmed["controls"]["targetTemperature"] = json!("23");
    mount_state(&server, "12345", ok_json(confirmed), None).await;
    Mock::given(method("POST"))
        .and(path("/api/client/12345/controls"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = Coordinator::new(config_for(&server));
    coordinator.setup().await.unwrap();

    let ticking = coordinator.clone();
    let tick = tokio::spawn(async move { ticking.refresh().await });
    tokio::time::sleep(Duration::from_millis(200)).await;

    let stove = coordinator
        .send_command("12345", "targetTemperature", &json!(23))
        .await
        .unwrap();
    assert_eq!(stove.get_stove_thermostat(), Some(23.0));

    tick.await.unwrap().unwrap();

    let stove = coordinator.get_stove("12345").unwrap();
    assert_eq!(stove.get_stove_thermostat(), Some(23.0));
    assert_eq!(stove.revision(), 1);
}

#[tokio::test]
async fn test_invalid_command_never_reaches_the_service() {
    let server = MockServer::start().await;
    mount_account(&server, &[("12345", "Test Stove")]).await;
    Mock::given(method("POST"))
        .and(path("/api/client/12345/controls"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let coordinator = Coordinator::new(config_for(&server));
    coordinator.setup().await.unwrap();

    let result = coordinator
        .send_command("12345", "heatingPower", &json!(150))
        .await;
    assert!(matches!(result, Err(CoreError::Validation { .. })));

    let result = coordinator
        .send_command("12345", "statusMainState", &json!(4))
        .await;
    assert!(matches!(result, Err(CoreError::Validation { .. })));
}

#[tokio::test]
async fn test_send_command_to_unknown_stove() {
    let server = MockServer::start().await;
    mount_account(&server, &[("12345", "Test Stove")]).await;

    let coordinator = Coordinator::new(config_for(&server));
    coordinator.setup().await.unwrap();

    let result = coordinator.send_command("999", "onOff", &json!(true)).await;
    assert!(matches!(result, Err(CoreError::StoveNotFound { .. })));
}

// ── teardown() ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_teardown_forgets_everything() {
    let server = MockServer::start().await;
    mount_account(&server, &[("12345", "Test Stove")]).await;
    mount_state(&server, "12345", ok_json(fixture_state()), None).await;

    let coordinator = Coordinator::new(config_for(&server));
    coordinator.setup().await.unwrap();
    coordinator.refresh().await.unwrap();

    coordinator.teardown().await;

    assert_eq!(coordinator.current_state(), CoordinatorState::Unconfigured);
    assert!(coordinator.get_stoves().is_empty());
    assert!(!coordinator.client().session().is_authenticated());
    assert!(matches!(
        coordinator.refresh().await,
        Err(CoreError::NotConfigured)
    ));
    assert!(matches!(
        coordinator.send_command("12345", "onOff", &json!(true)).await,
        Err(CoreError::NotConfigured)
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_teardown_cancels_an_in_flight_tick() {
    let server = MockServer::start().await;
    mount_account(&server, &[("12345", "Test Stove")]).await;
    mount_state(
        &server,
        "12345",
        ok_json(fixture_state()).set_delay(Duration::from_secs(5)),
        None,
    )
    .await;

    let mut config = config_for(&server);
    config.timeout = Duration::from_secs(10);
    let coordinator = Coordinator::new(config);
    coordinator.setup().await.unwrap();
    let stove = coordinator.get_stove("12345").unwrap();

    let ticking = coordinator.clone();
    let tick = tokio::spawn(async move { ticking.refresh().await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    tokio::time::timeout(Duration::from_secs(2), coordinator.teardown())
        .await
        .expect("teardown waited for the slow fetch");

    let result = tick.await.unwrap();
    assert!(
        matches!(result, Err(CoreError::NotConfigured)),
        "expected NotConfigured, got: {result:?}"
    );
    assert!(!stove.has_state());
    assert!(coordinator.get_stoves().is_empty());
    assert_eq!(coordinator.current_state(), CoordinatorState::Unconfigured);
    assert!(!coordinator.last_update_success());
}

#[tokio::test]
async fn test_background_polling() {
    let server = MockServer::start().await;
    mount_account(&server, &[("12345", "Test Stove")]).await;
    mount_state(&server, "12345", ok_json(fixture_state()), None).await;

    let mut config = config_for(&server);
    config.refresh_interval = Duration::from_millis(50);
    let coordinator = Coordinator::new(config);
    let mut state = coordinator.state();

    coordinator.setup().await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), async {
        while !coordinator.last_update_success() {
            state.changed().await.unwrap();
        }
    })
    .await
    .unwrap();

    let stove = coordinator.get_stove("12345").unwrap();
    assert_eq!(stove.get_status_text(), StatusText::Running);

    coordinator.teardown().await;
    assert_eq!(coordinator.current_state(), CoordinatorState::Unconfigured);
}

#[tokio::test]
async fn test_oneshot_tears_down() {
    let server = MockServer::start().await;
    mount_account(&server, &[("12345", "Test Stove")]).await;
    mount_state(&server, "12345", ok_json(fixture_state()), None).await;

    let (name, on) = Coordinator::oneshot(config_for(&server), |coordinator| async move {
        coordinator.refresh().await?;
        let stove = coordinator.get_stove("12345").unwrap();
        Ok((stove.get_name().to_owned(), stove.is_stove_on()))
    })
    .await
    .unwrap();

    assert_eq!(name, "Test Stove");
    assert!(on);
}

// ── diagnostics() ───────────────────────────────────────────────────

#[tokio::test]
async fn test_diagnostics_are_redacted() {
    let server = MockServer::start().await;
    mount_account(&server, &[("12345", "Test Stove")]).await;
    mount_state(&server, "12345", ok_json(fixture_state()), None).await;

    let coordinator = Coordinator::new(config_for(&server));
    coordinator.setup().await.unwrap();
    coordinator.refresh().await.unwrap();

    let report = serde_json::to_value(coordinator.diagnostics()).unwrap();

    assert_eq!(report["account"]["username"], json!(REDACTED));
    assert_eq!(report["coordinator"]["last_update_success"], json!(true));
    assert!(report["coordinator"]["last_update_time"].is_string());
    assert_eq!(report["coordinator"]["platforms"][4], json!("binary_sensor"));
    assert_eq!(report["stoves"][0]["name"], json!("Test Stove"));
    assert_eq!(report["stoves"][0]["state"]["stoveID"], json!(REDACTED));
    assert_eq!(
        report["stoves"][0]["state"]["sensors"]["inputFlameTemperature"],
        json!(85.5)
    );
    assert!(!report.to_string().contains("test@example.com"));
}
