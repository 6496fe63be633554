//! End-to-end smoke tests for the full dashviewd stack.
//!
//! Each test wires the complete application (demo virtual hub, real
//! subscription manager, real dispatcher task, real axum router) and
//! exercises it the way the composition root does — no TCP port is bound.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tokio::sync::mpsc;
use tower::ServiceExt;

use dashview_adapter_virtual::VirtualHub;
use dashview_adapter_ws_axum::state::AppState;
use dashview_adapter_ws_axum::{commands, router};
use dashview_app::subscriptions::SubscriptionManager;
use dashview_domain::event::StateChanged;
use dashview_domain::id::ConnectionId;

type DemoState = AppState<VirtualHub, Arc<VirtualHub>>;

/// Wire the demo hub, the manager, and the dispatcher task.
fn wired() -> (Arc<VirtualHub>, DemoState) {
    let hub = Arc::new(VirtualHub::with_demo_home());
    let manager = Arc::new(SubscriptionManager::new(Arc::clone(&hub), Arc::clone(&hub)));

    let dispatcher = Arc::clone(&manager);
    let events = hub.events();
    tokio::spawn(async move { dispatcher.dispatch_from(events).await });

    let state = AppState::new(manager, Arc::clone(&hub));
    (hub, state)
}

async fn connect(state: &DemoState) -> (ConnectionId, mpsc::Receiver<StateChanged>) {
    let conn = ConnectionId::new();
    let (tx, rx) = mpsc::channel(16);
    state.manager.register_connection(conn, tx).await;
    (conn, rx)
}

fn request(json: &str) -> dashview_adapter_ws_axum::protocol::Request {
    serde_json::from_str(json).expect("request frame should parse")
}

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let (_hub, state) = wired();
    let app = router::build(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn should_summarize_demo_home() {
    let (_hub, state) = wired();
    let (conn, _rx) = connect(&state).await;

    let response = commands::dispatch(&state, conn, request(r#"{"id":1,"type":"get_home_info"}"#)).await;

    assert_eq!(response["success"], true);
    let report = &response["result"];
    assert_eq!(report["complexity_score"], 4);
    assert_eq!(report["total_entities"], 9);
    assert_eq!(report["total_areas"], 3);
    assert_eq!(report["unassigned_entity_count"], 2);
    assert_eq!(report["areas"]["living_room"]["entity_count"], 3);
    // Humidity sensor inherits the bedroom through its device.
    assert_eq!(report["areas"]["bedroom"]["entity_count"], 2);
}

#[tokio::test]
async fn should_push_state_change_to_subscribed_connection() {
    let (hub, state) = wired();
    let (conn, mut rx) = connect(&state).await;

    let response = commands::dispatch(
        &state,
        conn,
        request(r#"{"id":2,"type":"subscribe_visible_entities","entities":["light.living_room"]}"#),
    )
    .await;
    assert_eq!(response["result"]["success"], true);

    hub.set_state(&"light.living_room".parse().unwrap(), "on")
        .await
        .unwrap();

    let event = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("state change should be delivered")
        .expect("channel should stay open");
    assert_eq!(event.entity_id.to_string(), "light.living_room");
    assert_eq!(event.new_state.unwrap().state, "on");
}

#[tokio::test]
async fn should_not_push_state_change_after_unsubscribe() {
    let (hub, state) = wired();
    let (conn, mut rx) = connect(&state).await;

    commands::dispatch(
        &state,
        conn,
        request(r#"{"id":3,"type":"subscribe_visible_entities","entities":["light.kitchen"]}"#),
    )
    .await;
    commands::dispatch(
        &state,
        conn,
        request(r#"{"id":4,"type":"unsubscribe_hidden_entities","entities":["light.kitchen"]}"#),
    )
    .await;

    // The watch is torn down, so the hub applies this silently.
    hub.set_state(&"light.kitchen".parse().unwrap(), "off")
        .await
        .unwrap();

    let outcome = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
    assert!(outcome.is_err(), "no event should be delivered");
    assert!(!hub.is_watched(&"light.kitchen".parse().unwrap()));
}

#[tokio::test]
async fn should_track_stats_across_update_subscriptions() {
    let (_hub, state) = wired();
    let (conn, _rx) = connect(&state).await;

    commands::dispatch(
        &state,
        conn,
        request(
            r#"{"id":5,"type":"update_subscriptions",
                "entities":["light.living_room","light.kitchen"]}"#,
        ),
    )
    .await;
    let response = commands::dispatch(
        &state,
        conn,
        request(r#"{"id":6,"type":"update_subscriptions","entities":["light.kitchen"]}"#),
    )
    .await;
    assert_eq!(response["result"]["unsubscribed"], serde_json::json!(["light.living_room"]));

    let stats = commands::dispatch(&state, conn, request(r#"{"id":7,"type":"get_subscription_stats"}"#)).await;
    assert_eq!(stats["result"]["total_connections"], 1);
    assert_eq!(stats["result"]["total_subscriptions"], 1);
    assert_eq!(stats["result"]["unique_entities_monitored"], 1);
}

#[tokio::test]
async fn should_derive_relationships_from_demo_home() {
    let (_hub, state) = wired();
    let (conn, _rx) = connect(&state).await;

    let response = commands::dispatch(
        &state,
        conn,
        request(
            r#"{"id":8,"type":"get_entity_relationships","entity_id":"light.living_room"}"#,
        ),
    )
    .await;

    let relationship = &response["result"]["relationship"];
    assert_eq!(relationship["area_id"], "living_room");
    assert_eq!(relationship["group"], "lighting");
    let related = response["result"]["related"].as_array().unwrap();
    // Shares the hue-bridge device with the kitchen light and the
    // living_room name prefix with the temperature sensor and the TV.
    assert!(related.contains(&serde_json::json!("light.kitchen")));
    assert!(related.contains(&serde_json::json!("sensor.living_room_temperature")));
}
