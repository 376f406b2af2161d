use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use kioskd::application::coordinator::SessionCoordinator;
use kioskd::domain::command::OutboundCommand;
use kioskd::domain::event::KioskEvent;
use kioskd::domain::ports::{CommandPublisher, LedgerHandle, PublisherHandle};
use kioskd::error::PublishError;
use kioskd::infrastructure::in_memory::InMemoryLedger;
use kioskd::infrastructure::nats::RecordingPublisher;
use kioskd::interfaces::http::{self, AppState};
use std::sync::Arc;
use tower::ServiceExt;

const OUTBOUND: &str = "kiosk.hardware.commands";

struct TestApp {
    router: Router,
    coordinator: Arc<SessionCoordinator>,
    publisher: Arc<RecordingPublisher>,
    ledger: LedgerHandle,
}

fn test_app() -> TestApp {
    let publisher = Arc::new(RecordingPublisher::new());
    let coordinator = Arc::new(SessionCoordinator::new(publisher.clone()));
    let ledger: LedgerHandle = Arc::new(InMemoryLedger::new());
    let router = http::router(AppState {
        coordinator: coordinator.clone(),
        ledger: ledger.clone(),
        publisher: publisher.clone(),
        outbound_subject: OUTBOUND.to_string(),
    });
    TestApp {
        router,
        coordinator,
        publisher,
        ledger,
    }
}

async fn get(router: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = router
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn post_json(router: &Router, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
    let response = router
        .clone()
        .oneshot(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_healthz() {
    let app = test_app();
    let response = app
        .router
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn test_state_starts_idle() {
    let app = test_app();
    let (status, json) = get(&app.router, "/state").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["page"], "main");
}

#[tokio::test]
async fn test_balance_without_session_is_conflict() {
    let app = test_app();
    let (status, json) = get(&app.router, "/balance").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "no active session");
}

#[tokio::test]
async fn test_balance_for_active_session() {
    let app = test_app();
    app.ledger.create(5001, "pass123", 100).await.unwrap();
    app.coordinator
        .transition(KioskEvent::CardRead(5001))
        .await
        .unwrap();

    let (status, json) = get(&app.router, "/balance").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["rf_id"], 5001);
    assert_eq!(json["balance"], 100);
}

#[tokio::test]
async fn test_balance_for_unprovisioned_card_is_not_found() {
    let app = test_app();
    app.coordinator
        .transition(KioskEvent::CardRead(777))
        .await
        .unwrap();

    let (status, _) = get(&app.router, "/balance").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_publish_forwards_button() {
    let app = test_app();
    let (status, json) =
        post_json(&app.router, "/publish", r#"{"button":"dispense","amount":50}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
    assert_eq!(json["published_to"], OUTBOUND);
    assert_eq!(json["button"], "dispense");
    assert_eq!(
        app.publisher.commands(),
        vec![OutboundCommand::Forward {
            action: "dispense".to_string(),
            data: 50,
        }]
    );
}

#[tokio::test]
async fn test_publish_refill_moves_to_awaiting_deposit() {
    let app = test_app();
    app.coordinator
        .transition(KioskEvent::CardRead(5001))
        .await
        .unwrap();

    let (status, _) = post_json(&app.router, "/publish", r#"{"button":"refill","amount":250}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.publisher.was_emitted("refill"));

    let (_, json) = get(&app.router, "/state").await;
    assert_eq!(json["page"], "put_money");
}

#[tokio::test]
async fn test_publish_rejects_negative_refill_amount() {
    let app = test_app();
    app.coordinator
        .transition(KioskEvent::CardRead(5001))
        .await
        .unwrap();

    let (status, json) =
        post_json(&app.router, "/publish", r#"{"button":"refill","amount":-250}"#).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"], "amount must be non-negative");

    // Neither the session nor the hardware saw the bad request.
    let snapshot = app.coordinator.snapshot().await;
    assert_eq!(snapshot.pending_amount, 0);
    let (_, json) = get(&app.router, "/state").await;
    assert_eq!(json["page"], "password");
    assert!(app.publisher.commands().is_empty());
}

#[tokio::test]
async fn test_index_ends_session_and_emits_end_work() {
    let app = test_app();
    app.coordinator
        .transition(KioskEvent::CardRead(5001))
        .await
        .unwrap();

    let (status, json) = get(&app.router, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["page"], "main");
    assert!(app.publisher.was_emitted("end_work"));

    let snapshot = app.coordinator.snapshot().await;
    assert_eq!(snapshot.active_user, None);
}

#[tokio::test]
async fn test_function_emits_new_work() {
    let app = test_app();
    let (status, json) = get(&app.router, "/function").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["page"], "main");
    assert_eq!(app.publisher.count_for_action("new_work"), 1);
}

#[tokio::test]
async fn test_password_resets_only_while_authenticating() {
    let app = test_app();
    app.coordinator
        .transition(KioskEvent::CardRead(5001))
        .await
        .unwrap();

    let (_, json) = get(&app.router, "/password").await;
    assert_eq!(json["page"], "main");

    // Outside the password page the route changes nothing.
    app.coordinator
        .transition(KioskEvent::CardRead(5001))
        .await
        .unwrap();
    app.coordinator
        .transition(KioskEvent::DepositCompleted(250))
        .await
        .unwrap();
    let (_, json) = get(&app.router, "/password").await;
    assert_eq!(json["page"], "succ_put");
}

struct FailingPublisher;

#[async_trait::async_trait]
impl CommandPublisher for FailingPublisher {
    async fn emit(&self, _command: &OutboundCommand) -> Result<(), PublishError> {
        Err(PublishError::PublishFailed {
            subject: OUTBOUND.to_string(),
            attempts: 3,
            reason: "broker offline".to_string(),
        })
    }
}

#[tokio::test]
async fn test_publish_failure_is_unavailable_and_state_stands() {
    let publisher: PublisherHandle = Arc::new(FailingPublisher);
    let coordinator = Arc::new(SessionCoordinator::new(publisher.clone()));
    let router = http::router(AppState {
        coordinator: coordinator.clone(),
        ledger: Arc::new(InMemoryLedger::new()),
        publisher,
        outbound_subject: OUTBOUND.to_string(),
    });

    coordinator
        .transition(KioskEvent::CardRead(5001))
        .await
        .unwrap();

    let (status, _) = get(&router, "/").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    // The session reset was applied before the publish failed.
    let (_, json) = get(&router, "/state").await;
    assert_eq!(json["page"], "main");
}
