//! Scheduler-level integration tests: startup pass, single-flight
//! deduplication, teardown discard, override supersession, and the polling
//! cadence.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use prospect_engine::{ApiClient, BeliefSource, SessionMonitor, can_scrape};

const LONG_INTERVAL: Duration = Duration::from_secs(3600);

async fn monitor_for(server: &MockServer, interval: Duration) -> SessionMonitor {
    SessionMonitor::spawn(ApiClient::new(&server.uri()).unwrap(), interval)
}

async fn mount_oracle(server: &MockServer, endpoint: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mount all three oracles agreeing the session is logged out.
async fn mount_denying_oracles(server: &MockServer) {
    mount_oracle(
        server,
        "/api/linkedin/verify-login",
        json!({"success": true, "logged_in": false, "driver_active": true}),
    )
    .await;
    mount_oracle(
        server,
        "/api/linkedin/login-status",
        json!({"logged_in": false}),
    )
    .await;
    mount_oracle(
        server,
        "/api/linkedin/check-status-file",
        json!({"success": true, "logged_in": false}),
    )
    .await;
}

async fn wait_until_settled(monitor: &SessionMonitor) {
    for _ in 0..200 {
        if monitor.current().source() != BeliefSource::Unknown {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("startup reconciliation pass never completed");
}

async fn verify_request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/api/linkedin/verify-login")
        .count()
}

#[tokio::test]
async fn startup_pass_populates_the_store() {
    let server = MockServer::start().await;
    mount_oracle(
        &server,
        "/api/linkedin/verify-login",
        json!({"success": true, "logged_in": true, "driver_active": true}),
    )
    .await;

    let monitor = monitor_for(&server, LONG_INTERVAL).await;
    wait_until_settled(&monitor).await;

    let belief = monitor.current();
    assert!(belief.logged_in());
    assert_eq!(belief.source(), BeliefSource::LiveVerify);
    assert!(can_scrape(&belief));
}

// Scenario: two triggers inside the in-flight window; the second is skipped
// and only one oracle fan-out happens.
#[tokio::test]
async fn concurrent_triggers_deduplicate() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/linkedin/verify-login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "logged_in": true, "driver_active": true}))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let monitor = monitor_for(&server, LONG_INTERVAL).await;
    wait_until_settled(&monitor).await;
    assert_eq!(verify_request_count(&server).await, 1);

    let (first, second) = tokio::join!(monitor.refresh(), monitor.refresh());
    assert!(first != second, "exactly one of the two triggers must run");
    assert_eq!(
        verify_request_count(&server).await,
        2,
        "the deduplicated trigger must not fan out"
    );
}

// Scenario: teardown while a pass is in flight. The result is discarded, the
// store keeps its last belief, and the timer is cancelled.
#[tokio::test]
async fn shutdown_discards_in_flight_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/linkedin/verify-login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "logged_in": true, "driver_active": true}))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let monitor = monitor_for(&server, Duration::from_millis(100)).await;
    let mut rx = monitor.subscribe();
    let before = monitor.current();

    // The startup pass is mid-flight on the delayed oracle.
    tokio::time::sleep(Duration::from_millis(50)).await;
    monitor.shutdown();

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(monitor.current(), before, "late result must be discarded");
    assert!(!rx.has_changed().unwrap(), "subscribers saw no update");
    assert!(!monitor.refresh().await, "no passes run after shutdown");
    assert_eq!(
        verify_request_count(&server).await,
        1,
        "the timer fired no further passes"
    );
}

#[tokio::test]
async fn force_override_applies_immediately_and_expires() {
    let server = MockServer::start().await;
    mount_denying_oracles(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/linkedin/force-login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "logged_in": true})),
        )
        .mount(&server)
        .await;

    let monitor = monitor_for(&server, LONG_INTERVAL).await;
    wait_until_settled(&monitor).await;
    assert!(!can_scrape(&monitor.current()));

    // Override flips the gate for the next read.
    let forced = monitor.force(true, "operator says logged in").await;
    assert!(forced.is_override());
    assert!(can_scrape(&monitor.current()));
    assert!(monitor.current().message().contains("until next check"));

    // The next completed pass supersedes it with oracle truth.
    assert!(monitor.refresh().await);
    let settled = monitor.current();
    assert!(!settled.logged_in(), "override must not pin the belief");
    assert!(!settled.is_override());
    assert_eq!(settled.source(), BeliefSource::StatusFile);
}

// The reset direction behaves symmetrically: applied immediately, then
// superseded by the oracles.
#[tokio::test]
async fn force_logged_out_is_symmetric() {
    let server = MockServer::start().await;
    mount_oracle(
        &server,
        "/api/linkedin/verify-login",
        json!({"success": true, "logged_in": true, "driver_active": true}),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/api/linkedin/force-login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "logged_in": false})),
        )
        .mount(&server)
        .await;

    let monitor = monitor_for(&server, LONG_INTERVAL).await;
    wait_until_settled(&monitor).await;
    assert!(can_scrape(&monitor.current()));

    let forced = monitor.force(false, "").await;
    assert!(!forced.logged_in());
    assert!(!can_scrape(&monitor.current()));

    assert!(monitor.refresh().await);
    assert!(monitor.current().logged_in(), "live oracle wins back");
    assert_eq!(monitor.current().source(), BeliefSource::LiveVerify);
}

#[tokio::test]
async fn override_without_service_ack_is_held_with_degraded_provenance() {
    let server = MockServer::start().await;
    mount_denying_oracles(&server).await;
    // No force-login mock: the write answers 404.

    let monitor = monitor_for(&server, LONG_INTERVAL).await;
    wait_until_settled(&monitor).await;

    let forced = monitor.force(true, "").await;
    assert!(forced.logged_in(), "override held locally despite failed write");
    assert!(forced.message().contains("not confirmed by service"));

    // Self-heals on the next cycle.
    assert!(monitor.refresh().await);
    assert!(!monitor.current().logged_in());
}

#[tokio::test]
async fn interval_keeps_polling() {
    let server = MockServer::start().await;
    mount_oracle(
        &server,
        "/api/linkedin/verify-login",
        json!({"success": true, "logged_in": true, "driver_active": true}),
    )
    .await;

    let monitor = monitor_for(&server, Duration::from_millis(100)).await;
    tokio::time::sleep(Duration::from_millis(450)).await;
    monitor.shutdown();

    assert!(
        verify_request_count(&server).await >= 3,
        "expected repeated passes on the fixed cadence"
    );
}

#[tokio::test]
async fn nudge_schedules_a_delayed_pass() {
    let server = MockServer::start().await;
    mount_oracle(
        &server,
        "/api/linkedin/verify-login",
        json!({"success": true, "logged_in": true, "driver_active": true}),
    )
    .await;

    let monitor = monitor_for(&server, LONG_INTERVAL).await;
    wait_until_settled(&monitor).await;
    let baseline = verify_request_count(&server).await;

    monitor.nudge_after(Duration::from_millis(50));
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(verify_request_count(&server).await, baseline + 1);
}

#[tokio::test]
async fn start_login_schedules_the_follow_up_check() {
    let server = MockServer::start().await;
    mount_denying_oracles(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/run-test-scraper"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "LinkedIn login script started successfully.",
        })))
        .mount(&server)
        .await;

    let monitor = monitor_for(&server, LONG_INTERVAL).await;
    wait_until_settled(&monitor).await;

    let message = monitor.start_login(None).await.unwrap();
    assert!(message.contains("started"));
    // The follow-up pass fires after POST_ACTION_DELAY; not awaited here.
}
