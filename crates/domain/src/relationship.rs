//! Derived relationship record for one entity.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::category::FunctionGroup;
use crate::id::{AreaKey, DeviceKey, EntityKey};

/// Relationship record produced by the entity mapper.
///
/// `area_id` is the resolved area: the entity's own assignment, or the one
/// inherited from its device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRelationship {
    pub entity_id: EntityKey,
    pub area_id: Option<AreaKey>,
    pub device_id: Option<DeviceKey>,
    /// Entities sharing a device or a name-prefix token.
    pub related_entities: BTreeSet<EntityKey>,
    pub group: FunctionGroup,
    /// Display priority in `[0, 10]`.
    pub priority: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_serialize_related_entities_as_sorted_list() {
        let relationship = EntityRelationship {
            entity_id: "light.living_room".parse().unwrap(),
            area_id: Some(AreaKey::new("living_room")),
            device_id: None,
            related_entities: ["sensor.living_room_temp", "light.living_room_spots"]
                .into_iter()
                .map(|s| s.parse().unwrap())
                .collect(),
            group: FunctionGroup::Lighting,
            priority: 9,
        };

        let json = serde_json::to_value(&relationship).unwrap();
        assert_eq!(
            json["related_entities"],
            serde_json::json!(["light.living_room_spots", "sensor.living_room_temp"])
        );
        assert_eq!(json["group"], "lighting");
    }
}
