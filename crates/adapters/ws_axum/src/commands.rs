//! Command dispatch: one request frame in, one response frame out.

use serde::Serialize;
use serde_json::json;

use dashview_app::entity_mapper::DEFAULT_RELATED_DEPTH;
use dashview_app::ports::{AreaRegistry, DeviceRegistry, EntityRegistry, EntityWatcher};
use dashview_domain::id::{AreaKey, ConnectionId, EntityKey};

use crate::error::error_frame;
use crate::protocol::{Command, ErrorFrame, Request, ResultFrame};
use crate::state::AppState;

/// Execute one request on behalf of `conn` and build the response frame.
///
/// Every command produces exactly one response; failures come back as
/// `error` frames, never as a dropped request.
pub async fn dispatch<H, W>(
    state: &AppState<H, W>,
    conn: ConnectionId,
    request: Request,
) -> serde_json::Value
where
    H: EntityRegistry + DeviceRegistry + AreaRegistry + Send + Sync + 'static,
    W: EntityWatcher + Send + Sync + 'static,
{
    let id = request.id;
    match request.command {
        Command::GetHomeInfo => match state.analyzer.home_report().await {
            Ok(report) => to_result(id, report),
            Err(err) => error_frame(id, &err).into(),
        },
        Command::SubscribeVisibleEntities { entities } => {
            let (keys, mut failed) = split_keys(&entities);
            match state.manager.subscribe_to_entities(conn, &keys).await {
                Ok(results) => {
                    let mut subscribed = Vec::new();
                    for (key, ok) in results {
                        if ok {
                            subscribed.push(key.to_string());
                        } else {
                            failed.push(key.to_string());
                        }
                    }
                    ResultFrame::new(
                        id,
                        json!({
                            "success": failed.is_empty(),
                            "subscribed": subscribed,
                            "failed": failed,
                        }),
                    )
                    .into()
                }
                Err(err) => error_frame(id, &err).into(),
            }
        }
        Command::UnsubscribeHiddenEntities { entities } => {
            let (keys, mut failed) = split_keys(&entities);
            let results = state.manager.unsubscribe_from_entities(conn, &keys).await;
            let mut unsubscribed = Vec::new();
            for (key, ok) in results {
                if ok {
                    unsubscribed.push(key.to_string());
                } else {
                    failed.push(key.to_string());
                }
            }
            ResultFrame::new(
                id,
                json!({
                    "success": failed.is_empty(),
                    "unsubscribed": unsubscribed,
                    "failed": failed,
                }),
            )
            .into()
        }
        Command::GetAreaEntities { area_id } => match state.analyzer.analyze_areas().await {
            Ok(areas) => match area_id {
                Some(area_id) => match areas.get(&AreaKey::new(area_id.as_str())) {
                    Some(info) => to_result(id, info),
                    None => {
                        ErrorFrame::new(Some(id), "not_found", format!("area {area_id} not found"))
                            .into()
                    }
                },
                None => to_result(id, areas),
            },
            Err(err) => error_frame(id, &err).into(),
        },
        Command::UpdateSubscriptions { entities } => {
            let (keys, invalid) = split_keys(&entities);
            match state.manager.update_subscriptions(conn, &keys).await {
                Ok(delta) => {
                    let mut failed: Vec<String> =
                        delta.failed.iter().map(ToString::to_string).collect();
                    failed.extend(invalid);
                    ResultFrame::new(
                        id,
                        json!({
                            "subscribed": as_strings(&delta.subscribed),
                            "unsubscribed": as_strings(&delta.unsubscribed),
                            "failed": failed,
                        }),
                    )
                    .into()
                }
                Err(err) => error_frame(id, &err).into(),
            }
        }
        Command::GetEntityRelationships { entity_id } => match entity_id {
            Some(entity_id) => {
                let key: EntityKey = match entity_id.parse() {
                    Ok(key) => key,
                    Err(err) => {
                        return error_frame(id, &dashview_domain::error::DashviewError::from(err))
                            .into();
                    }
                };
                let relationship = match state.mapper.entity_relationships(&key).await {
                    Ok(Some(relationship)) => relationship,
                    Ok(None) => {
                        return ErrorFrame::new(
                            Some(id),
                            "not_found",
                            format!("entity {key} not found"),
                        )
                        .into();
                    }
                    Err(err) => return error_frame(id, &err).into(),
                };
                match state.mapper.find_related(&key, DEFAULT_RELATED_DEPTH).await {
                    Ok(related) => to_result(
                        id,
                        json!({
                            "relationship": relationship,
                            "related": related,
                        }),
                    ),
                    Err(err) => error_frame(id, &err).into(),
                }
            }
            None => {
                let relationships = match state.mapper.map_relationships().await {
                    Ok(relationships) => relationships,
                    Err(err) => return error_frame(id, &err).into(),
                };
                match state.mapper.group_by_function().await {
                    Ok(groups) => to_result(
                        id,
                        json!({
                            "relationships": relationships,
                            "groups": groups,
                        }),
                    ),
                    Err(err) => error_frame(id, &err).into(),
                }
            }
        },
        Command::GetSubscriptionStats => to_result(id, state.manager.stats().await),
    }
}

/// Partition raw entity id strings into parsed keys and invalid inputs.
fn split_keys(raw: &[String]) -> (Vec<EntityKey>, Vec<String>) {
    let mut keys = Vec::new();
    let mut invalid = Vec::new();
    for value in raw {
        match value.parse::<EntityKey>() {
            Ok(key) => keys.push(key),
            Err(_) => {
                tracing::warn!(entity = %value, "malformed entity id in request");
                invalid.push(value.clone());
            }
        }
    }
    (keys, invalid)
}

fn as_strings(keys: &[EntityKey]) -> Vec<String> {
    keys.iter().map(ToString::to_string).collect()
}

fn to_result(id: u64, payload: impl Serialize) -> serde_json::Value {
    match serde_json::to_value(payload) {
        Ok(value) => ResultFrame::new(id, value).into(),
        Err(err) => {
            tracing::error!(error = %err, "response serialization failed");
            ErrorFrame::new(Some(id), "internal_error", "response serialization failed").into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::sync::Arc;

    use tokio::sync::mpsc;

    use dashview_app::ports::WatchGuard;
    use dashview_app::subscriptions::SubscriptionManager;
    use dashview_domain::area::AreaRecord;
    use dashview_domain::device::DeviceRecord;
    use dashview_domain::entity::EntityRecord;
    use dashview_domain::error::DashviewError;
    use dashview_domain::id::DeviceKey;

    struct FixtureHub {
        entities: Vec<EntityRecord>,
        devices: Vec<DeviceRecord>,
        areas: Vec<AreaRecord>,
    }

    impl EntityRegistry for FixtureHub {
        fn get_entity(
            &self,
            key: &EntityKey,
        ) -> impl Future<Output = Result<Option<EntityRecord>, DashviewError>> + Send {
            let found = self.entities.iter().find(|e| &e.key == key).cloned();
            async { Ok(found) }
        }

        fn list_entities(
            &self,
        ) -> impl Future<Output = Result<Vec<EntityRecord>, DashviewError>> + Send {
            let all = self.entities.clone();
            async { Ok(all) }
        }
    }

    impl DeviceRegistry for FixtureHub {
        fn get_device(
            &self,
            key: &DeviceKey,
        ) -> impl Future<Output = Result<Option<DeviceRecord>, DashviewError>> + Send {
            let found = self.devices.iter().find(|d| &d.key == key).cloned();
            async { Ok(found) }
        }

        fn list_devices(
            &self,
        ) -> impl Future<Output = Result<Vec<DeviceRecord>, DashviewError>> + Send {
            let all = self.devices.clone();
            async { Ok(all) }
        }
    }

    impl AreaRegistry for FixtureHub {
        fn get_area(
            &self,
            key: &AreaKey,
        ) -> impl Future<Output = Result<Option<AreaRecord>, DashviewError>> + Send {
            let found = self.areas.iter().find(|a| &a.key == key).cloned();
            async { Ok(found) }
        }

        fn list_areas(
            &self,
        ) -> impl Future<Output = Result<Vec<AreaRecord>, DashviewError>> + Send {
            let all = self.areas.clone();
            async { Ok(all) }
        }
    }

    struct NoopWatcher;

    impl EntityWatcher for NoopWatcher {
        fn watch(&self, _key: &EntityKey) -> WatchGuard {
            WatchGuard::noop()
        }
    }

    fn fixture_state() -> AppState<FixtureHub, NoopWatcher> {
        let hub = Arc::new(FixtureHub {
            entities: vec![
                EntityRecord::builder()
                    .key("light.kitchen")
                    .area_id("kitchen")
                    .build()
                    .unwrap(),
                EntityRecord::builder()
                    .key("sensor.kitchen_temperature")
                    .area_id("kitchen")
                    .build()
                    .unwrap(),
            ],
            devices: vec![],
            areas: vec![
                AreaRecord::builder()
                    .key("kitchen")
                    .name("Kitchen")
                    .build()
                    .unwrap(),
            ],
        });
        let manager = Arc::new(SubscriptionManager::new(Arc::clone(&hub), NoopWatcher));
        AppState::new(manager, hub)
    }

    async fn connected(
        state: &AppState<FixtureHub, NoopWatcher>,
    ) -> (ConnectionId, mpsc::Receiver<dashview_domain::event::StateChanged>) {
        let conn = ConnectionId::new();
        let (tx, rx) = mpsc::channel(8);
        state.manager.register_connection(conn, tx).await;
        (conn, rx)
    }

    fn request(json: &str) -> Request {
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn should_answer_get_home_info_with_report() {
        let state = fixture_state();
        let (conn, _rx) = connected(&state).await;

        let response = dispatch(&state, conn, request(r#"{"id":1,"type":"get_home_info"}"#)).await;
        assert_eq!(response["type"], "result");
        assert_eq!(response["success"], true);
        assert_eq!(response["result"]["total_entities"], 2);
        assert_eq!(response["result"]["areas"]["kitchen"]["name"], "Kitchen");
    }

    #[tokio::test]
    async fn should_split_subscribe_results_into_lists() {
        let state = fixture_state();
        let (conn, _rx) = connected(&state).await;

        let response = dispatch(
            &state,
            conn,
            request(
                r#"{"id":2,"type":"subscribe_visible_entities",
                    "entities":["light.kitchen","light.ghost","not-an-id"]}"#,
            ),
        )
        .await;

        assert_eq!(response["result"]["success"], false);
        assert_eq!(response["result"]["subscribed"], json!(["light.kitchen"]));
        let failed = response["result"]["failed"].as_array().unwrap();
        assert!(failed.contains(&json!("light.ghost")));
        assert!(failed.contains(&json!("not-an-id")));
    }

    #[tokio::test]
    async fn should_report_success_when_all_subscribed() {
        let state = fixture_state();
        let (conn, _rx) = connected(&state).await;

        let response = dispatch(
            &state,
            conn,
            request(r#"{"id":3,"type":"subscribe_visible_entities","entities":["light.kitchen"]}"#),
        )
        .await;
        assert_eq!(response["result"]["success"], true);
        assert_eq!(response["result"]["failed"], json!([]));
    }

    #[tokio::test]
    async fn should_unsubscribe_previously_subscribed_entities() {
        let state = fixture_state();
        let (conn, _rx) = connected(&state).await;
        dispatch(
            &state,
            conn,
            request(r#"{"id":4,"type":"subscribe_visible_entities","entities":["light.kitchen"]}"#),
        )
        .await;

        let response = dispatch(
            &state,
            conn,
            request(
                r#"{"id":5,"type":"unsubscribe_hidden_entities",
                    "entities":["light.kitchen","sensor.kitchen_temperature"]}"#,
            ),
        )
        .await;
        assert_eq!(response["result"]["unsubscribed"], json!(["light.kitchen"]));
        assert_eq!(
            response["result"]["failed"],
            json!(["sensor.kitchen_temperature"])
        );
    }

    #[tokio::test]
    async fn should_return_single_area_breakdown() {
        let state = fixture_state();
        let (conn, _rx) = connected(&state).await;

        let response = dispatch(
            &state,
            conn,
            request(r#"{"id":6,"type":"get_area_entities","area_id":"kitchen"}"#),
        )
        .await;
        assert_eq!(response["result"]["name"], "Kitchen");
        assert_eq!(response["result"]["entity_count"], 2);
    }

    #[tokio::test]
    async fn should_error_for_unknown_area() {
        let state = fixture_state();
        let (conn, _rx) = connected(&state).await;

        let response = dispatch(
            &state,
            conn,
            request(r#"{"id":7,"type":"get_area_entities","area_id":"attic"}"#),
        )
        .await;
        assert_eq!(response["type"], "error");
        assert_eq!(response["error_code"], "not_found");
        assert_eq!(response["id"], 7);
    }

    #[tokio::test]
    async fn should_return_all_areas_when_area_id_omitted() {
        let state = fixture_state();
        let (conn, _rx) = connected(&state).await;

        let response = dispatch(&state, conn, request(r#"{"id":8,"type":"get_area_entities"}"#)).await;
        assert!(response["result"]["kitchen"].is_object());
        assert!(response["result"]["unassigned"].is_object());
    }

    #[tokio::test]
    async fn should_replace_subscriptions_on_update() {
        let state = fixture_state();
        let (conn, _rx) = connected(&state).await;
        dispatch(
            &state,
            conn,
            request(r#"{"id":9,"type":"subscribe_visible_entities","entities":["light.kitchen"]}"#),
        )
        .await;

        let response = dispatch(
            &state,
            conn,
            request(
                r#"{"id":10,"type":"update_subscriptions",
                    "entities":["sensor.kitchen_temperature","bogus"]}"#,
            ),
        )
        .await;
        assert_eq!(
            response["result"]["subscribed"],
            json!(["sensor.kitchen_temperature"])
        );
        assert_eq!(response["result"]["unsubscribed"], json!(["light.kitchen"]));
        assert_eq!(response["result"]["failed"], json!(["bogus"]));
    }

    #[tokio::test]
    async fn should_return_relationship_with_neighbourhood() {
        let state = fixture_state();
        let (conn, _rx) = connected(&state).await;

        let response = dispatch(
            &state,
            conn,
            request(r#"{"id":11,"type":"get_entity_relationships","entity_id":"light.kitchen"}"#),
        )
        .await;
        assert_eq!(
            response["result"]["relationship"]["group"],
            json!("lighting")
        );
        assert_eq!(
            response["result"]["related"],
            json!(["sensor.kitchen_temperature"])
        );
    }

    #[tokio::test]
    async fn should_error_for_malformed_relationship_entity_id() {
        let state = fixture_state();
        let (conn, _rx) = connected(&state).await;

        let response = dispatch(
            &state,
            conn,
            request(r#"{"id":12,"type":"get_entity_relationships","entity_id":"nodot"}"#),
        )
        .await;
        assert_eq!(response["type"], "error");
        assert_eq!(response["error_code"], "invalid_format");
    }

    #[tokio::test]
    async fn should_return_all_relationships_and_groups() {
        let state = fixture_state();
        let (conn, _rx) = connected(&state).await;

        let response = dispatch(
            &state,
            conn,
            request(r#"{"id":13,"type":"get_entity_relationships"}"#),
        )
        .await;
        assert!(response["result"]["relationships"]["light.kitchen"].is_object());
        assert_eq!(
            response["result"]["groups"]["lighting"],
            json!(["light.kitchen"])
        );
    }

    #[tokio::test]
    async fn should_report_subscription_stats() {
        let state = fixture_state();
        let (conn, _rx) = connected(&state).await;
        dispatch(
            &state,
            conn,
            request(r#"{"id":14,"type":"subscribe_visible_entities","entities":["light.kitchen"]}"#),
        )
        .await;

        let response =
            dispatch(&state, conn, request(r#"{"id":15,"type":"get_subscription_stats"}"#)).await;
        assert_eq!(response["result"]["total_connections"], 1);
        assert_eq!(response["result"]["total_subscriptions"], 1);
        assert_eq!(response["result"]["unique_entities_monitored"], 1);
    }
}
