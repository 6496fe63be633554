//! Wire protocol: inbound command frames and outbound envelopes.
//!
//! Every inbound frame is a JSON object with a numeric `id` and a `type`
//! tag; the remaining fields depend on the command. Outbound frames are
//! either a `result`, an `error` (both echoing the request id), or an
//! unsolicited `event` push.

use serde::{Deserialize, Serialize};
use serde_json::json;

use dashview_domain::event::StateChanged;

/// One inbound request frame.
#[derive(Debug, Deserialize)]
pub struct Request {
    /// Client-chosen correlation id, echoed in the response.
    pub id: u64,
    #[serde(flatten)]
    pub command: Command,
}

/// The command portion of a request frame.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Full home summary for initial dashboard layout.
    GetHomeInfo,
    /// Subscribe the connection to the listed entities.
    SubscribeVisibleEntities { entities: Vec<String> },
    /// Drop subscriptions for the listed entities.
    UnsubscribeHiddenEntities { entities: Vec<String> },
    /// One area breakdown, or all of them when `area_id` is omitted.
    GetAreaEntities {
        #[serde(default)]
        area_id: Option<String>,
    },
    /// Replace the connection's subscription set.
    UpdateSubscriptions { entities: Vec<String> },
    /// Relationship record(s); all entities when `entity_id` is omitted.
    GetEntityRelationships {
        #[serde(default)]
        entity_id: Option<String>,
    },
    /// Current subscription statistics.
    GetSubscriptionStats,
}

/// Successful response envelope.
#[derive(Debug, Serialize)]
pub struct ResultFrame {
    pub id: u64,
    pub r#type: &'static str,
    pub success: bool,
    pub result: serde_json::Value,
}

impl ResultFrame {
    #[must_use]
    pub fn new(id: u64, result: serde_json::Value) -> Self {
        Self {
            id,
            r#type: "result",
            success: true,
            result,
        }
    }
}

/// Error response envelope. `id` is absent when the frame could not even
/// be parsed far enough to extract one.
#[derive(Debug, Serialize)]
pub struct ErrorFrame {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub r#type: &'static str,
    pub error_code: &'static str,
    pub message: String,
}

impl ErrorFrame {
    #[must_use]
    pub fn new(id: Option<u64>, error_code: &'static str, message: impl Into<String>) -> Self {
        Self {
            id,
            r#type: "error",
            error_code,
            message: message.into(),
        }
    }
}

impl From<ResultFrame> for serde_json::Value {
    fn from(frame: ResultFrame) -> Self {
        json!({
            "id": frame.id,
            "type": frame.r#type,
            "success": frame.success,
            "result": frame.result,
        })
    }
}

impl From<ErrorFrame> for serde_json::Value {
    fn from(frame: ErrorFrame) -> Self {
        let mut value = json!({
            "type": frame.r#type,
            "error_code": frame.error_code,
            "message": frame.message,
        });
        if let (Some(id), Some(object)) = (frame.id, value.as_object_mut()) {
            object.insert("id".to_string(), json!(id));
        }
        value
    }
}

/// Unsolicited state-change push frame.
#[must_use]
pub fn event_frame(event: &StateChanged) -> serde_json::Value {
    json!({
        "type": "event",
        "event": {
            "event_type": "state_changed",
            "entity_id": event.entity_id,
            "old_state": event.old_state,
            "new_state": event.new_state,
        },
    })
}
