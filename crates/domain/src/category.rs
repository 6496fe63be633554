//! Dashboard taxonomies: coarse categories, function groups, priorities.
//!
//! Two classifications exist side by side. [`EntityCategory`] is the coarse
//! bucket used by the home summary (domain only). [`FunctionGroup`] is the
//! finer grouping used by the relationship mapper, refined by substrings of
//! the object id. Rules are ordered; the first match wins.

use serde::{Deserialize, Serialize};

use crate::id::EntityKey;

/// Coarse dashboard category, keyed purely by entity domain.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EntityCategory {
    Lights,
    Switches,
    Sensors,
    Climate,
    Media,
    Security,
    Other,
}

impl EntityCategory {
    /// Every category, in display order. The summary always reports all of
    /// them, including empty ones.
    pub const ALL: [Self; 7] = [
        Self::Lights,
        Self::Switches,
        Self::Sensors,
        Self::Climate,
        Self::Media,
        Self::Security,
        Self::Other,
    ];

    /// Classify by entity domain.
    #[must_use]
    pub fn from_domain(domain: &str) -> Self {
        match domain {
            "light" => Self::Lights,
            "switch" => Self::Switches,
            "sensor" | "binary_sensor" => Self::Sensors,
            "climate" => Self::Climate,
            "media_player" | "remote" => Self::Media,
            "lock" | "alarm_control_panel" | "camera" => Self::Security,
            _ => Self::Other,
        }
    }

    /// The lowercase wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lights => "lights",
            Self::Switches => "switches",
            Self::Sensors => "sensors",
            Self::Climate => "climate",
            Self::Media => "media",
            Self::Security => "security",
            Self::Other => "other",
        }
    }
}

/// Functional grouping used by the relationship mapper.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FunctionGroup {
    Lighting,
    Climate,
    Security,
    Media,
    Power,
    Presence,
    Energy,
    Cover,
    Scene,
    Automation,
    Control,
    Cleaning,
    Switch,
    Sensor,
    Other,
}

impl FunctionGroup {
    /// Classify an entity: domain first, refined by object-id substrings.
    ///
    /// The refinement rules are ordered; once a rule matches for a domain,
    /// later rules for that domain are unreachable.
    #[must_use]
    pub fn classify(key: &EntityKey) -> Self {
        let name = key.object_id().to_ascii_lowercase();
        match key.domain() {
            "light" => Self::Lighting,
            "switch" => {
                if contains_any(&name, &["light", "lamp", "led"]) {
                    Self::Lighting
                } else if contains_any(&name, &["fan", "vent"]) {
                    Self::Climate
                } else if contains_any(&name, &["plug", "outlet", "socket"]) {
                    Self::Power
                } else {
                    Self::Switch
                }
            }
            "climate" | "fan" => Self::Climate,
            "sensor" | "binary_sensor" => {
                if contains_any(&name, &["temp", "humidity", "pressure"]) {
                    Self::Climate
                } else if contains_any(&name, &["motion", "presence", "occupancy"]) {
                    Self::Presence
                } else if contains_any(&name, &["door", "window", "lock"]) {
                    Self::Security
                } else if contains_any(&name, &["power", "energy", "current", "voltage"]) {
                    Self::Energy
                } else {
                    Self::Sensor
                }
            }
            "lock" | "alarm_control_panel" | "camera" => Self::Security,
            "media_player" | "remote" | "tv" => Self::Media,
            "cover" => Self::Cover,
            "vacuum" => Self::Cleaning,
            "scene" => Self::Scene,
            "script" | "automation" => Self::Automation,
            "input_boolean" | "input_select" | "input_number" => Self::Control,
            _ => Self::Other,
        }
    }

    /// The lowercase wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lighting => "lighting",
            Self::Climate => "climate",
            Self::Security => "security",
            Self::Media => "media",
            Self::Power => "power",
            Self::Presence => "presence",
            Self::Energy => "energy",
            Self::Cover => "cover",
            Self::Scene => "scene",
            Self::Automation => "automation",
            Self::Control => "control",
            Self::Cleaning => "cleaning",
            Self::Switch => "switch",
            Self::Sensor => "sensor",
            Self::Other => "other",
        }
    }
}

/// Base display priority by domain; unknown domains default to 3.
fn base_priority(domain: &str) -> u8 {
    match domain {
        "alarm_control_panel" => 10,
        "lock" => 9,
        "light" | "climate" | "camera" => 8,
        "switch" | "scene" | "cover" => 7,
        "media_player" | "binary_sensor" | "fan" => 6,
        "script" | "sensor" | "vacuum" => 5,
        "automation" => 4,
        _ => 3,
    }
}

/// Display priority in `[0, 10]` for an entity.
///
/// Base priority by domain, then name-substring adjustments. The result is
/// clamped back into range after every adjustment, not only at the end, so
/// an entity at 10 that also matches a security word stays at 10 before the
/// helper penalty applies.
#[must_use]
pub fn entity_priority(key: &EntityKey) -> u8 {
    let name = key.object_id().to_ascii_lowercase();
    let mut priority = base_priority(key.domain());

    if contains_any(&name, &["main", "primary", "living", "kitchen"]) {
        priority = (priority + 1).min(10);
    }
    if contains_any(&name, &["door", "window", "motion", "alarm", "security"]) {
        priority = (priority + 1).min(10);
    }
    if contains_any(&name, &["helper", "utility", "test", "debug"]) {
        priority = priority.saturating_sub(2);
    }

    priority
}

fn contains_any(name: &str, words: &[&str]) -> bool {
    words.iter().any(|word| name.contains(word))
}
