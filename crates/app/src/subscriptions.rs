//! Subscription manager — per-connection entity subscriptions and
//! state-change fan-out.
//!
//! The manager keeps two mirror mappings (connection → entities,
//! entity → listeners) plus the per-connection delivery channels and the
//! per-entity host watch guards. All of that lives behind a single
//! [`RwLock`] so that check-then-act sequences (subscribe racing an
//! unregister, for example) cannot leave the mirrors diverged. Delivery to
//! connections happens outside the lock: a slow client send must not block
//! subscription operations.

use std::collections::{BTreeMap, HashMap, HashSet};

use tokio::sync::{RwLock, broadcast, mpsc};

use dashview_domain::analysis::SubscriptionStats;
use dashview_domain::error::DashviewError;
use dashview_domain::event::StateChanged;
use dashview_domain::id::{ConnectionId, EntityKey};

use crate::ports::{EntityRegistry, EntityWatcher, WatchGuard};

/// Result of an [`SubscriptionManager::update_subscriptions`] call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SubscriptionDelta {
    /// Entities newly subscribed by this call.
    pub subscribed: Vec<EntityKey>,
    /// Entities dropped by this call.
    pub unsubscribed: Vec<EntityKey>,
    /// Requested entities that could not be subscribed.
    pub failed: Vec<EntityKey>,
}

/// Everything the manager owns, guarded as one unit.
#[derive(Default)]
struct SubscriptionIndex {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    /// Mirror of the per-connection sets: entity → connections listening.
    /// An entry exists iff the entity has at least one listener.
    listeners: HashMap<EntityKey, HashSet<ConnectionId>>,
    /// One host watch per entity with at least one listener.
    watches: HashMap<EntityKey, WatchGuard>,
}

struct ConnectionEntry {
    sender: mpsc::Sender<StateChanged>,
    entities: HashSet<EntityKey>,
}

impl SubscriptionIndex {
    /// Remove a connection and every trace of it in the mirror mapping.
    /// No-op for unknown connections.
    fn remove_connection(&mut self, id: ConnectionId) {
        let Some(entry) = self.connections.remove(&id) else {
            return;
        };
        for key in &entry.entities {
            self.drop_listener(key, id);
        }
        tracing::debug!(connection = %id, "unregistered connection");
    }

    /// Remove one listener from an entity, pruning the empty set and the
    /// host watch when it was the last one.
    fn drop_listener(&mut self, key: &EntityKey, id: ConnectionId) {
        if let Some(listeners) = self.listeners.get_mut(key) {
            listeners.remove(&id);
            if listeners.is_empty() {
                self.listeners.remove(key);
                // Guard drop cancels the host-level watch.
                self.watches.remove(key);
            }
        }
    }
}

/// Tracks which dashboard connection watches which entities and fans out
/// state changes accordingly.
pub struct SubscriptionManager<R, W> {
    registry: R,
    watcher: W,
    inner: RwLock<SubscriptionIndex>,
}

impl<R, W> SubscriptionManager<R, W>
where
    R: EntityRegistry,
    W: EntityWatcher,
{
    /// Create a manager over the given registry view and watch port.
    pub fn new(registry: R, watcher: W) -> Self {
        Self {
            registry,
            watcher,
            inner: RwLock::new(SubscriptionIndex::default()),
        }
    }

    /// Register a connection and its delivery channel.
    ///
    /// Idempotent: re-registering an id replaces the channel but keeps any
    /// subscriptions the connection already holds.
    pub async fn register_connection(&self, id: ConnectionId, sender: mpsc::Sender<StateChanged>) {
        let mut inner = self.inner.write().await;
        inner
            .connections
            .entry(id)
            .and_modify(|entry| entry.sender = sender.clone())
            .or_insert_with(|| ConnectionEntry {
                sender,
                entities: HashSet::new(),
            });
        tracing::debug!(connection = %id, "registered connection");
    }

    /// Remove a connection, its subscriptions, and any host watches that
    /// only it was keeping alive. Safe to call for unknown ids.
    pub async fn unregister_connection(&self, id: ConnectionId) {
        let mut inner = self.inner.write().await;
        inner.remove_connection(id);
    }

    /// Subscribe a connection to the given entities.
    ///
    /// Returns a per-entity success map. Entities missing from the host
    /// registry are reported as `false` with no side effects; entities the
    /// connection already watches count as success. An unknown connection
    /// fails the whole batch.
    ///
    /// # Errors
    ///
    /// Returns a registry error if the host fails while checking entity
    /// existence.
    pub async fn subscribe_to_entities(
        &self,
        id: ConnectionId,
        entity_ids: &[EntityKey],
    ) -> Result<BTreeMap<EntityKey, bool>, DashviewError> {
        let mut inner = self.inner.write().await;

        if !inner.connections.contains_key(&id) {
            tracing::warn!(connection = %id, "subscribe from unregistered connection");
            return Ok(entity_ids.iter().map(|key| (key.clone(), false)).collect());
        }

        let mut results = BTreeMap::new();
        for key in entity_ids {
            if results.contains_key(key) {
                continue;
            }

            if self.registry.get_entity(key).await?.is_none() {
                tracing::warn!(entity = %key, "subscribe to unknown entity");
                results.insert(key.clone(), false);
                continue;
            }

            let newly_subscribed = {
                let Some(entry) = inner.connections.get_mut(&id) else {
                    // Connection presence was checked above and the write
                    // lock is held throughout.
                    continue;
                };
                entry.entities.insert(key.clone())
            };

            if newly_subscribed {
                let listeners = inner.listeners.entry(key.clone()).or_default();
                listeners.insert(id);
                if listeners.len() == 1 {
                    inner.watches.insert(key.clone(), self.watcher.watch(key));
                }
            }
            results.insert(key.clone(), true);
        }

        tracing::debug!(
            connection = %id,
            subscribed = results.values().filter(|ok| **ok).count(),
            "subscription request handled"
        );
        Ok(results)
    }

    /// Unsubscribe a connection from the given entities.
    ///
    /// Entities the connection was not watching report `false` (no-op, not
    /// an error); an unknown connection fails the whole batch.
    pub async fn unsubscribe_from_entities(
        &self,
        id: ConnectionId,
        entity_ids: &[EntityKey],
    ) -> BTreeMap<EntityKey, bool> {
        let mut inner = self.inner.write().await;

        if !inner.connections.contains_key(&id) {
            return entity_ids.iter().map(|key| (key.clone(), false)).collect();
        }

        let mut results = BTreeMap::new();
        for key in entity_ids {
            let removed = inner
                .connections
                .get_mut(&id)
                .is_some_and(|entry| entry.entities.remove(key));
            if removed {
                inner.drop_listener(key, id);
            }
            results.insert(key.clone(), removed);
        }
        results
    }

    /// Replace a connection's subscriptions with `new_entity_ids`.
    ///
    /// Expressed purely as subscribe(added) + unsubscribe(removed); there
    /// is no separate code path to drift from the two primitives.
    ///
    /// # Errors
    ///
    /// Returns a registry error if the host fails while checking entity
    /// existence.
    pub async fn update_subscriptions(
        &self,
        id: ConnectionId,
        new_entity_ids: &[EntityKey],
    ) -> Result<SubscriptionDelta, DashviewError> {
        let current = self.subscribed_entities(id).await;
        let target: HashSet<EntityKey> = new_entity_ids.iter().cloned().collect();

        let to_subscribe: Vec<EntityKey> = target.difference(&current).cloned().collect();
        let to_unsubscribe: Vec<EntityKey> = current.difference(&target).cloned().collect();

        let subscribe_results = self.subscribe_to_entities(id, &to_subscribe).await?;
        let unsubscribe_results = self.unsubscribe_from_entities(id, &to_unsubscribe).await;

        Ok(SubscriptionDelta {
            subscribed: filter_keys(&subscribe_results, true),
            unsubscribed: filter_keys(&unsubscribe_results, true),
            failed: filter_keys(&subscribe_results, false),
        })
    }

    /// Current subscription set of one connection (empty when unknown).
    pub async fn subscribed_entities(&self, id: ConnectionId) -> HashSet<EntityKey> {
        self.inner
            .read()
            .await
            .connections
            .get(&id)
            .map(|entry| entry.entities.clone())
            .unwrap_or_default()
    }

    /// Connections currently listening to one entity.
    pub async fn entity_listeners(&self, key: &EntityKey) -> HashSet<ConnectionId> {
        self.inner
            .read()
            .await
            .listeners
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// Deliver a state change to every connection listening to its entity,
    /// each exactly once.
    ///
    /// The listener set is snapshotted under the read lock; the sends
    /// themselves happen outside it and never block: a connection whose
    /// push buffer is full has stopped draining and is unregistered, same
    /// as one whose channel is closed, so a single stalled client cannot
    /// hold up delivery to the rest. No listeners means no work at all.
    pub async fn notify_entity_update(&self, event: StateChanged) {
        let targets: Vec<(ConnectionId, mpsc::Sender<StateChanged>)> = {
            let inner = self.inner.read().await;
            let Some(listeners) = inner.listeners.get(&event.entity_id) else {
                return;
            };
            listeners
                .iter()
                .filter_map(|id| {
                    inner
                        .connections
                        .get(id)
                        .map(|entry| (*id, entry.sender.clone()))
                })
                .collect()
        };

        let mut dead = Vec::new();
        for (id, sender) in targets {
            match sender.try_send(event.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(connection = %id, entity = %event.entity_id, "push buffer full, dropping connection");
                    dead.push(id);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::warn!(connection = %id, entity = %event.entity_id, "delivery channel closed, dropping connection");
                    dead.push(id);
                }
            }
        }
        for id in dead {
            self.unregister_connection(id).await;
        }
    }

    /// Consume state changes from an event bus receiver and fan them out.
    ///
    /// Runs until the bus is closed. A lagged receiver logs the number of
    /// skipped events and keeps going.
    pub async fn dispatch_from(&self, mut events: broadcast::Receiver<StateChanged>) {
        loop {
            match events.recv().await {
                Ok(event) => self.notify_entity_update(event).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "dispatcher lagged, state changes were dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    /// Derived statistics over the current index. There are no separate
    /// counters that could drift.
    pub async fn stats(&self) -> SubscriptionStats {
        let inner = self.inner.read().await;
        let total_connections = inner.connections.len();
        let total_subscriptions: usize = inner
            .connections
            .values()
            .map(|entry| entry.entities.len())
            .sum();
        let avg_subscriptions_per_connection = if total_connections == 0 {
            0.0
        } else {
            total_subscriptions as f64 / total_connections as f64
        };

        SubscriptionStats {
            total_connections,
            total_subscriptions,
            unique_entities_monitored: inner.listeners.len(),
            avg_subscriptions_per_connection,
        }
    }
}

fn filter_keys(results: &BTreeMap<EntityKey, bool>, wanted: bool) -> Vec<EntityKey> {
    results
        .iter()
        .filter(|(_, ok)| **ok == wanted)
        .map(|(key, _)| key.clone())
        .collect()
}
