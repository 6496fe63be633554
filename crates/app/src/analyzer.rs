//! Home analyzer — complexity scoring and area/category breakdowns.
//!
//! Every query here recomputes from live registry snapshots; no analysis
//! result is cached, so a report always reflects the host as it is right
//! now. Entity → area resolution prefers the entity's own assignment and
//! falls back to the owning device's area.

use std::collections::{BTreeMap, HashMap, HashSet};

use dashview_domain::analysis::{AreaInfo, HomeReport};
use dashview_domain::area::AreaRecord;
use dashview_domain::category::EntityCategory;
use dashview_domain::device::DeviceRecord;
use dashview_domain::entity::EntityRecord;
use dashview_domain::error::DashviewError;
use dashview_domain::id::{AreaKey, DeviceKey, EntityKey};

use crate::ports::{AreaRegistry, DeviceRegistry, EntityRegistry};

/// Complexity score from registry counts, bounded to `[1, 10]`.
///
/// Each dimension contributes a small band value; the sum is capped at 10.
/// The bands are deliberately coarse so that adding one entity never moves
/// the score by more than one.
#[must_use]
pub fn complexity_score(
    entity_count: usize,
    area_count: usize,
    device_count: usize,
    domain_count: usize,
) -> u8 {
    let mut score: u8 = 0;

    score += if entity_count < 50 {
        1
    } else if entity_count < 150 {
        2
    } else {
        3
    };
    score += if area_count < 5 { 1 } else { 2 };
    score += if device_count < 20 { 1 } else { 2 };
    score += if domain_count < 10 {
        1
    } else if domain_count < 20 {
        2
    } else {
        3
    };

    score.min(10)
}

/// Computes dashboard-facing summaries of the home layout.
pub struct HomeAnalyzer<E, D, A> {
    entities: E,
    devices: D,
    areas: A,
}

impl<E, D, A> HomeAnalyzer<E, D, A>
where
    E: EntityRegistry,
    D: DeviceRegistry,
    A: AreaRegistry,
{
    /// Create an analyzer over the three registry views.
    pub fn new(entities: E, devices: D, areas: A) -> Self {
        Self {
            entities,
            devices,
            areas,
        }
    }

    /// Full home report: complexity score, totals, per-area breakdown, and
    /// category counts.
    ///
    /// # Errors
    ///
    /// Returns a registry error when any of the three snapshots fails.
    pub async fn home_report(&self) -> Result<HomeReport, DashviewError> {
        let entities = self.entities.list_entities().await?;
        let devices = self.devices.list_devices().await?;
        let areas = self.areas.list_areas().await?;

        let domains: HashSet<&str> = entities.iter().map(|e| e.key.domain()).collect();
        let complexity_score =
            complexity_score(entities.len(), areas.len(), devices.len(), domains.len());

        let area_infos = build_area_infos(&entities, &devices, &areas);
        let unassigned_entity_count = area_infos
            .get(&AreaKey::unassigned())
            .map_or(0, |info| info.entity_count);

        tracing::debug!(
            complexity_score,
            entities = entities.len(),
            areas = areas.len(),
            devices = devices.len(),
            "home report computed"
        );

        Ok(HomeReport {
            complexity_score,
            total_entities: entities.len(),
            total_areas: areas.len(),
            total_devices: devices.len(),
            areas: area_infos,
            entity_categories: categorize_entities(&entities),
            unassigned_entity_count,
        })
    }

    /// Per-area breakdown, keyed by area id, with a synthetic `unassigned`
    /// entry for entities outside every area.
    ///
    /// # Errors
    ///
    /// Returns a registry error when any of the three snapshots fails.
    pub async fn analyze_areas(&self) -> Result<BTreeMap<AreaKey, AreaInfo>, DashviewError> {
        let entities = self.entities.list_entities().await?;
        let devices = self.devices.list_devices().await?;
        let areas = self.areas.list_areas().await?;
        Ok(build_area_infos(&entities, &devices, &areas))
    }

    /// Plain area → entities grouping, without names or device counts.
    /// Entities outside every area land under the `unassigned` key.
    ///
    /// # Errors
    ///
    /// Returns a registry error when a snapshot fails.
    pub async fn group_entities_by_area(
        &self,
    ) -> Result<BTreeMap<AreaKey, Vec<EntityKey>>, DashviewError> {
        let entities = self.entities.list_entities().await?;
        let devices = self.devices.list_devices().await?;
        let device_areas = device_area_index(&devices);

        let mut grouped: BTreeMap<AreaKey, Vec<EntityKey>> = BTreeMap::new();
        for entity in &entities {
            let area = resolve_area(entity, &device_areas)
                .cloned()
                .unwrap_or_else(AreaKey::unassigned);
            grouped.entry(area).or_default().push(entity.key.clone());
        }
        for keys in grouped.values_mut() {
            keys.sort();
        }
        Ok(grouped)
    }

    /// Entities that resolve to no area, directly or through their device.
    ///
    /// # Errors
    ///
    /// Returns a registry error when a snapshot fails.
    pub async fn find_unassigned_entities(&self) -> Result<Vec<EntityKey>, DashviewError> {
        let entities = self.entities.list_entities().await?;
        let devices = self.devices.list_devices().await?;
        let device_areas = device_area_index(&devices);

        let mut unassigned: Vec<EntityKey> = entities
            .iter()
            .filter(|entity| resolve_area(entity, &device_areas).is_none())
            .map(|entity| entity.key.clone())
            .collect();
        unassigned.sort();
        Ok(unassigned)
    }

    /// Count entities per coarse category. All categories are present in
    /// the result, empty ones at zero.
    ///
    /// # Errors
    ///
    /// Returns a registry error when the entity snapshot fails.
    pub async fn categorize_entities(
        &self,
    ) -> Result<BTreeMap<EntityCategory, usize>, DashviewError> {
        let entities = self.entities.list_entities().await?;
        Ok(categorize_entities(&entities))
    }
}

/// Area of a device, indexed by device key.
fn device_area_index(devices: &[DeviceRecord]) -> HashMap<&DeviceKey, &AreaKey> {
    devices
        .iter()
        .filter_map(|device| device.area_id.as_ref().map(|area| (&device.key, area)))
        .collect()
}

/// Area an entity belongs to: its own assignment, else its device's.
fn resolve_area<'a>(
    entity: &'a EntityRecord,
    device_areas: &HashMap<&DeviceKey, &'a AreaKey>,
) -> Option<&'a AreaKey> {
    entity.area_id.as_ref().or_else(|| {
        entity
            .device_id
            .as_ref()
            .and_then(|device| device_areas.get(device).copied())
    })
}

fn build_area_infos(
    entities: &[EntityRecord],
    devices: &[DeviceRecord],
    areas: &[AreaRecord],
) -> BTreeMap<AreaKey, AreaInfo> {
    let device_areas = device_area_index(devices);

    let mut grouped: HashMap<AreaKey, Vec<EntityKey>> = HashMap::new();
    // Devices owning at least one unassigned entity.
    let mut unassigned_devices: HashSet<&DeviceKey> = HashSet::new();
    for entity in entities {
        match resolve_area(entity, &device_areas) {
            Some(area) => grouped.entry(area.clone()).or_default().push(entity.key.clone()),
            None => {
                grouped
                    .entry(AreaKey::unassigned())
                    .or_default()
                    .push(entity.key.clone());
                if let Some(device) = &entity.device_id {
                    unassigned_devices.insert(device);
                }
            }
        }
    }

    let mut infos = BTreeMap::new();
    for area in areas {
        let mut keys = grouped.remove(&area.key).unwrap_or_default();
        keys.sort();
        let device_count = devices
            .iter()
            .filter(|device| device.area_id.as_ref() == Some(&area.key))
            .count();
        infos.insert(
            area.key.clone(),
            AreaInfo {
                area_id: area.key.clone(),
                name: area.name.clone(),
                entity_count: keys.len(),
                entities: keys,
                device_count,
            },
        );
    }

    // Always present, even when empty, so clients can rely on the entry.
    let mut keys = grouped.remove(&AreaKey::unassigned()).unwrap_or_default();
    keys.sort();
    infos.insert(
        AreaKey::unassigned(),
        AreaInfo {
            area_id: AreaKey::unassigned(),
            name: "Unassigned".to_string(),
            entity_count: keys.len(),
            entities: keys,
            device_count: unassigned_devices.len(),
        },
    );

    infos
}

fn categorize_entities(entities: &[EntityRecord]) -> BTreeMap<EntityCategory, usize> {
    let mut counts: BTreeMap<EntityCategory, usize> =
        EntityCategory::ALL.iter().map(|c| (*c, 0)).collect();
    for entity in entities {
        *counts
            .entry(EntityCategory::from_domain(entity.key.domain()))
            .or_default() += 1;
    }
    counts
}
