//! The component store: per-kind tables plus a per-entity kind index.
//!
//! The store is the single owner of all component records. External systems
//! get references for the duration of one access (`get` / `get_mut`) — Rust's
//! borrow rules make the "no long-lived pointers into the store" contract
//! structural rather than documented.
//!
//! Invariant: for every entity, the kind set in the index equals the set of
//! kinds for which a record exists in the per-kind tables. The two structures
//! are re-checked after every mutation in debug builds; divergence is a
//! programming error and panics rather than being tolerated.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use sandbox_math::Transform2D;
use thiserror::Error;

use crate::component::{Component, ComponentKind, NavAgent, PhysicsRef, Renderable, StaticObstacle};
use crate::entity::Entity;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The entity was never created, or has already been removed. Fatal to
    /// the call, never to the store.
    #[error("entity {0} does not exist")]
    UnknownEntity(Entity),
}

/// Entity-component storage for the sandbox.
///
/// The index is a `BTreeMap`, so [`Store::query`] returns entities in
/// ascending id order — queries are deterministic between mutations, which
/// the tick loop relies on for reproducible agent update order.
#[derive(Debug, Default)]
pub struct Store {
    /// Last issued entity ID. IDs start at 1 (0 is [`Entity::INVALID`]) and
    /// are never reused, even after removal.
    last_id: u64,
    /// Per-entity set of present kinds.
    index: BTreeMap<Entity, BTreeSet<ComponentKind>>,
    /// Per-kind homogeneous tables keyed by entity.
    tables: HashMap<ComponentKind, HashMap<Entity, Component>>,
}

impl Store {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -- Entity lifecycle --

    /// Allocate a fresh, never-before-issued entity with no components.
    pub fn create_entity(&mut self) -> Entity {
        self.last_id += 1;
        let entity = Entity(self.last_id);
        self.index.insert(entity, BTreeSet::new());
        entity
    }

    /// Remove an entity and purge all its component records atomically.
    /// No-op if the entity was already removed.
    pub fn remove_entity(&mut self, entity: Entity) {
        if let Some(kinds) = self.index.remove(&entity) {
            for kind in kinds {
                if let Some(table) = self.tables.get_mut(&kind) {
                    table.remove(&entity);
                }
            }
        }
        self.debug_check_invariant();
    }

    /// Returns `true` if the entity has been created and not yet removed.
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.index.contains_key(&entity)
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.index.len()
    }

    // -- Component operations --

    /// Attach a record to an entity, overwriting any existing record of the
    /// same kind.
    ///
    /// # Errors
    ///
    /// [`StoreError::UnknownEntity`] if the entity was never created or has
    /// been removed.
    pub fn insert(&mut self, entity: Entity, component: Component) -> Result<(), StoreError> {
        let kinds = self
            .index
            .get_mut(&entity)
            .ok_or(StoreError::UnknownEntity(entity))?;
        let kind = component.kind();
        kinds.insert(kind);
        self.tables
            .entry(kind)
            .or_default()
            .insert(entity, component);
        self.debug_check_invariant();
        Ok(())
    }

    /// Remove a record if present; silently succeeds if absent or if the
    /// entity is gone.
    pub fn remove(&mut self, entity: Entity, kind: ComponentKind) {
        if let Some(table) = self.tables.get_mut(&kind) {
            table.remove(&entity);
        }
        if let Some(kinds) = self.index.get_mut(&entity) {
            kinds.remove(&kind);
        }
        self.debug_check_invariant();
    }

    /// Look up the record of `kind` on `entity`. O(1).
    #[must_use]
    pub fn get(&self, entity: Entity, kind: ComponentKind) -> Option<&Component> {
        self.tables.get(&kind)?.get(&entity)
    }

    /// Mutable lookup. The borrow ends the aliasing discussion: callers
    /// cannot hold this across structural mutations.
    #[must_use]
    pub fn get_mut(&mut self, entity: Entity, kind: ComponentKind) -> Option<&mut Component> {
        self.tables.get_mut(&kind)?.get_mut(&entity)
    }

    /// Returns `true` if `entity` is alive and holds a record of `kind`.
    #[must_use]
    pub fn has(&self, entity: Entity, kind: ComponentKind) -> bool {
        self.index
            .get(&entity)
            .is_some_and(|kinds| kinds.contains(&kind))
    }

    /// All entities currently holding **all** listed kinds, ascending by id.
    ///
    /// The result is a snapshot: mutating the store while iterating it is
    /// safe and will not be reflected in the returned sequence.
    #[must_use]
    pub fn query(&self, kinds: &[ComponentKind]) -> Vec<Entity> {
        self.index
            .iter()
            .filter(|(_, present)| kinds.iter().all(|k| present.contains(k)))
            .map(|(entity, _)| *entity)
            .collect()
    }

    // -- Typed accessors --
    //
    // Each table is homogeneous; a mismatched variant means the store's own
    // invariant is broken, so these panic instead of returning None.

    #[must_use]
    pub fn transform(&self, entity: Entity) -> Option<&Transform2D> {
        match self.get(entity, ComponentKind::Transform)? {
            Component::Transform(t) => Some(t),
            other => panic!("Transform table holds {}", other.kind()),
        }
    }

    #[must_use]
    pub fn transform_mut(&mut self, entity: Entity) -> Option<&mut Transform2D> {
        match self.get_mut(entity, ComponentKind::Transform)? {
            Component::Transform(t) => Some(t),
            other => panic!("Transform table holds {}", other.kind()),
        }
    }

    #[must_use]
    pub fn physics(&self, entity: Entity) -> Option<&PhysicsRef> {
        match self.get(entity, ComponentKind::Physics)? {
            Component::Physics(p) => Some(p),
            other => panic!("Physics table holds {}", other.kind()),
        }
    }

    #[must_use]
    pub fn physics_mut(&mut self, entity: Entity) -> Option<&mut PhysicsRef> {
        match self.get_mut(entity, ComponentKind::Physics)? {
            Component::Physics(p) => Some(p),
            other => panic!("Physics table holds {}", other.kind()),
        }
    }

    #[must_use]
    pub fn renderable(&self, entity: Entity) -> Option<&Renderable> {
        match self.get(entity, ComponentKind::Renderable)? {
            Component::Renderable(r) => Some(r),
            other => panic!("Renderable table holds {}", other.kind()),
        }
    }

    #[must_use]
    pub fn renderable_mut(&mut self, entity: Entity) -> Option<&mut Renderable> {
        match self.get_mut(entity, ComponentKind::Renderable)? {
            Component::Renderable(r) => Some(r),
            other => panic!("Renderable table holds {}", other.kind()),
        }
    }

    #[must_use]
    pub fn nav_agent(&self, entity: Entity) -> Option<&NavAgent> {
        match self.get(entity, ComponentKind::NavAgent)? {
            Component::NavAgent(a) => Some(a),
            other => panic!("NavAgent table holds {}", other.kind()),
        }
    }

    #[must_use]
    pub fn nav_agent_mut(&mut self, entity: Entity) -> Option<&mut NavAgent> {
        match self.get_mut(entity, ComponentKind::NavAgent)? {
            Component::NavAgent(a) => Some(a),
            other => panic!("NavAgent table holds {}", other.kind()),
        }
    }

    #[must_use]
    pub fn static_obstacle(&self, entity: Entity) -> Option<&StaticObstacle> {
        match self.get(entity, ComponentKind::StaticObstacle)? {
            Component::StaticObstacle(s) => Some(s),
            other => panic!("StaticObstacle table holds {}", other.kind()),
        }
    }

    // -- Invariant --

    /// Index and tables must agree exactly. Debug builds check after every
    /// mutation; release builds trust the mutation paths.
    fn debug_check_invariant(&self) {
        #[cfg(debug_assertions)]
        {
            for (entity, kinds) in &self.index {
                for kind in kinds {
                    debug_assert!(
                        self.tables
                            .get(kind)
                            .is_some_and(|t| t.contains_key(entity)),
                        "index lists {kind} on {entity} but table has no record"
                    );
                }
            }
            for (kind, table) in &self.tables {
                for entity in table.keys() {
                    debug_assert!(
                        self.index.get(entity).is_some_and(|k| k.contains(kind)),
                        "table holds {kind} for {entity} but index disagrees"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use sandbox_math::GridCell;

    use super::*;

    fn transform_at(x: f32, y: f32) -> Component {
        Component::Transform(Transform2D::from_position(Vec2::new(x, y)))
    }

    fn obstacle_at(x: i32, y: i32) -> Component {
        Component::StaticObstacle(StaticObstacle {
            cell: GridCell::new(x, y),
        })
    }

    #[test]
    fn test_create_and_insert() {
        let mut store = Store::new();
        let e = store.create_entity();
        assert!(store.is_alive(e));
        store.insert(e, transform_at(1.0, 2.0)).unwrap();
        assert!(store.has(e, ComponentKind::Transform));
        assert_eq!(store.transform(e).unwrap().position, Vec2::new(1.0, 2.0));
    }

    #[test]
    fn test_insert_on_unknown_entity_fails() {
        let mut store = Store::new();
        let err = store
            .insert(Entity::from_raw(99), transform_at(0.0, 0.0))
            .unwrap_err();
        assert_eq!(err, StoreError::UnknownEntity(Entity::from_raw(99)));
    }

    #[test]
    fn test_insert_on_removed_entity_fails() {
        let mut store = Store::new();
        let e = store.create_entity();
        store.remove_entity(e);
        assert!(store.insert(e, transform_at(0.0, 0.0)).is_err());
    }

    #[test]
    fn test_insert_overwrites_same_kind() {
        let mut store = Store::new();
        let e = store.create_entity();
        store.insert(e, transform_at(1.0, 1.0)).unwrap();
        store.insert(e, transform_at(9.0, 9.0)).unwrap();
        assert_eq!(store.transform(e).unwrap().position, Vec2::new(9.0, 9.0));
        assert_eq!(store.query(&[ComponentKind::Transform]), vec![e]);
    }

    #[test]
    fn test_remove_entity_purges_all_records() {
        let mut store = Store::new();
        let e = store.create_entity();
        store.insert(e, transform_at(0.0, 0.0)).unwrap();
        store.insert(e, obstacle_at(0, 0)).unwrap();
        store.remove_entity(e);

        assert!(!store.is_alive(e));
        for kind in ComponentKind::ALL {
            assert!(!store.has(e, kind));
            assert!(store.get(e, kind).is_none());
        }
        assert!(store.query(&[ComponentKind::Transform]).is_empty());
    }

    #[test]
    fn test_remove_entity_is_idempotent() {
        let mut store = Store::new();
        let e1 = store.create_entity();
        let e2 = store.create_entity();
        store.insert(e2, transform_at(5.0, 5.0)).unwrap();

        store.remove_entity(e1);
        store.remove_entity(e1); // second removal is a no-op

        assert!(store.is_alive(e2));
        assert_eq!(store.transform(e2).unwrap().position, Vec2::new(5.0, 5.0));
    }

    #[test]
    fn test_remove_component_silent_when_absent() {
        let mut store = Store::new();
        let e = store.create_entity();
        store.remove(e, ComponentKind::Renderable); // nothing there
        store.remove(Entity::from_raw(404), ComponentKind::Renderable); // no entity
        assert!(store.is_alive(e));
    }

    #[test]
    fn test_entity_ids_start_at_one_and_ascend() {
        let mut store = Store::new();
        let e1 = store.create_entity();
        let e2 = store.create_entity();
        assert_eq!(e1, Entity::from_raw(1));
        assert_eq!(e2, Entity::from_raw(2));
        assert!(e1.is_valid());
    }

    #[test]
    fn test_entity_ids_never_reused() {
        let mut store = Store::new();
        let e1 = store.create_entity();
        store.remove_entity(e1);
        let e2 = store.create_entity();
        assert_ne!(e1, e2);
    }

    #[test]
    fn test_query_requires_all_kinds() {
        let mut store = Store::new();
        let both = store.create_entity();
        store.insert(both, transform_at(0.0, 0.0)).unwrap();
        store.insert(both, obstacle_at(0, 0)).unwrap();

        let only_transform = store.create_entity();
        store.insert(only_transform, transform_at(1.0, 1.0)).unwrap();

        assert_eq!(
            store.query(&[ComponentKind::Transform, ComponentKind::StaticObstacle]),
            vec![both]
        );
        assert_eq!(
            store.query(&[ComponentKind::Transform]),
            vec![both, only_transform]
        );
    }

    #[test]
    fn test_query_order_is_ascending_and_stable() {
        let mut store = Store::new();
        let mut spawned = Vec::new();
        for i in 0..5 {
            let e = store.create_entity();
            store.insert(e, transform_at(i as f32, 0.0)).unwrap();
            spawned.push(e);
        }
        assert_eq!(store.query(&[ComponentKind::Transform]), spawned);
        // Unchanged store, unchanged order.
        assert_eq!(store.query(&[ComponentKind::Transform]), spawned);
    }

    #[test]
    fn test_query_result_is_snapshot() {
        let mut store = Store::new();
        let a = store.create_entity();
        let b = store.create_entity();
        store.insert(a, transform_at(0.0, 0.0)).unwrap();
        store.insert(b, transform_at(1.0, 0.0)).unwrap();

        let snapshot = store.query(&[ComponentKind::Transform]);
        for entity in &snapshot {
            // Structural mutation mid-iteration must not invalidate the
            // snapshot we are walking.
            store.remove_entity(*entity);
        }
        assert_eq!(snapshot, vec![a, b]);
        assert_eq!(store.entity_count(), 0);
    }

    #[test]
    fn test_has_agrees_with_query() {
        let mut store = Store::new();
        let e = store.create_entity();
        store.insert(e, transform_at(0.0, 0.0)).unwrap();

        for kind in ComponentKind::ALL {
            let in_query = store.query(&[kind]).contains(&e);
            assert_eq!(store.has(e, kind), in_query);
        }
    }

    #[test]
    fn test_get_mut_is_observable_by_later_reads() {
        let mut store = Store::new();
        let e = store.create_entity();
        store.insert(e, transform_at(0.0, 0.0)).unwrap();
        store.transform_mut(e).unwrap().position.x = 123.0;
        assert_eq!(store.transform(e).unwrap().position.x, 123.0);
    }
}
