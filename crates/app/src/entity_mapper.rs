//! Entity mapper — derives relationships between entities from registry
//! structure and naming.
//!
//! Two entities are related when they share a device, or when one entity's
//! name-prefix token appears in the other's object id (`light.living_room`
//! relates to `sensor.living_room_temp`). Both edge kinds are traversable
//! when walking the neighbourhood of an entity.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use dashview_domain::category::{FunctionGroup, entity_priority};
use dashview_domain::device::DeviceRecord;
use dashview_domain::entity::EntityRecord;
use dashview_domain::error::DashviewError;
use dashview_domain::id::{AreaKey, DeviceKey, EntityKey};
use dashview_domain::relationship::EntityRelationship;

use crate::ports::{DeviceRegistry, EntityRegistry};

/// Default traversal depth for neighbourhood queries: direct relations plus
/// one hop through them.
pub const DEFAULT_RELATED_DEPTH: usize = 2;

/// Derives relationship records and functional groupings from the current
/// registry snapshot. Stateless; every call reads the registries afresh.
pub struct EntityMapper<E, D> {
    entities: E,
    devices: D,
}

impl<E, D> EntityMapper<E, D>
where
    E: EntityRegistry,
    D: DeviceRegistry,
{
    /// Create a mapper over the entity and device registry views.
    pub fn new(entities: E, devices: D) -> Self {
        Self { entities, devices }
    }

    /// Relationship records for every registered entity, keyed by entity.
    ///
    /// # Errors
    ///
    /// Returns a registry error when a snapshot fails.
    pub async fn map_relationships(
        &self,
    ) -> Result<BTreeMap<EntityKey, EntityRelationship>, DashviewError> {
        let graph = self.snapshot().await?;
        Ok(graph
            .entities
            .iter()
            .map(|entity| (entity.key.clone(), graph.relationship_for(entity)))
            .collect())
    }

    /// Relationship record for one entity; `None` when it is not
    /// registered.
    ///
    /// # Errors
    ///
    /// Returns a registry error when a snapshot fails.
    pub async fn entity_relationships(
        &self,
        key: &EntityKey,
    ) -> Result<Option<EntityRelationship>, DashviewError> {
        let graph = self.snapshot().await?;
        Ok(graph
            .entities
            .iter()
            .find(|entity| &entity.key == key)
            .map(|entity| graph.relationship_for(entity)))
    }

    /// Entities reachable from `key` within `depth` hops, the origin
    /// excluded. Unknown entities yield an empty set.
    ///
    /// # Errors
    ///
    /// Returns a registry error when a snapshot fails.
    pub async fn find_related(
        &self,
        key: &EntityKey,
        depth: usize,
    ) -> Result<BTreeSet<EntityKey>, DashviewError> {
        let graph = self.snapshot().await?;
        Ok(graph.reachable(key, depth))
    }

    /// All entities bucketed by function group, each bucket sorted. Every
    /// group with at least one member is present.
    ///
    /// # Errors
    ///
    /// Returns a registry error when the entity snapshot fails.
    pub async fn group_by_function(
        &self,
    ) -> Result<BTreeMap<FunctionGroup, Vec<EntityKey>>, DashviewError> {
        let entities = self.entities.list_entities().await?;
        let mut groups: BTreeMap<FunctionGroup, Vec<EntityKey>> = BTreeMap::new();
        for entity in &entities {
            groups
                .entry(FunctionGroup::classify(&entity.key))
                .or_default()
                .push(entity.key.clone());
        }
        for members in groups.values_mut() {
            members.sort();
        }
        Ok(groups)
    }

    async fn snapshot(&self) -> Result<RelationGraph, DashviewError> {
        let entities = self.entities.list_entities().await?;
        let devices = self.devices.list_devices().await?;
        Ok(RelationGraph::build(entities, devices))
    }
}

/// One consistent snapshot of the registries with precomputed adjacency.
struct RelationGraph {
    entities: Vec<EntityRecord>,
    device_areas: HashMap<DeviceKey, AreaKey>,
    adjacency: HashMap<EntityKey, BTreeSet<EntityKey>>,
}

impl RelationGraph {
    fn build(entities: Vec<EntityRecord>, devices: Vec<DeviceRecord>) -> Self {
        let device_areas: HashMap<DeviceKey, AreaKey> = devices
            .into_iter()
            .filter_map(|device| device.area_id.map(|area| (device.key, area)))
            .collect();

        let mut adjacency: HashMap<EntityKey, BTreeSet<EntityKey>> = HashMap::new();
        for (i, a) in entities.iter().enumerate() {
            for b in &entities[i + 1..] {
                if related(a, b) {
                    adjacency
                        .entry(a.key.clone())
                        .or_default()
                        .insert(b.key.clone());
                    adjacency
                        .entry(b.key.clone())
                        .or_default()
                        .insert(a.key.clone());
                }
            }
        }

        Self {
            entities,
            device_areas,
            adjacency,
        }
    }

    fn relationship_for(&self, entity: &EntityRecord) -> EntityRelationship {
        let area_id = entity.area_id.clone().or_else(|| {
            entity
                .device_id
                .as_ref()
                .and_then(|device| self.device_areas.get(device).cloned())
        });
        EntityRelationship {
            entity_id: entity.key.clone(),
            area_id,
            device_id: entity.device_id.clone(),
            related_entities: self
                .adjacency
                .get(&entity.key)
                .cloned()
                .unwrap_or_default(),
            group: FunctionGroup::classify(&entity.key),
            priority: entity_priority(&entity.key),
        }
    }

    /// Breadth-first walk up to `depth` hops, origin excluded.
    fn reachable(&self, origin: &EntityKey, depth: usize) -> BTreeSet<EntityKey> {
        let mut found = BTreeSet::new();
        let mut visited: HashSet<&EntityKey> = HashSet::from([origin]);
        let mut frontier: VecDeque<(&EntityKey, usize)> = VecDeque::from([(origin, 0)]);

        while let Some((key, dist)) = frontier.pop_front() {
            if dist == depth {
                continue;
            }
            let Some(neighbours) = self.adjacency.get(key) else {
                continue;
            };
            for neighbour in neighbours {
                if visited.insert(neighbour) {
                    found.insert(neighbour.clone());
                    frontier.push_back((neighbour, dist + 1));
                }
            }
        }
        found
    }
}

/// Edge rule: shared device, or one entity's prefix token occurring in the
/// other's object id.
fn related(a: &EntityRecord, b: &EntityRecord) -> bool {
    if let (Some(da), Some(db)) = (&a.device_id, &b.device_id) {
        if da == db {
            return true;
        }
    }
    b.key.object_id().contains(a.key.prefix_token())
        || a.key.object_id().contains(b.key.prefix_token())
}
