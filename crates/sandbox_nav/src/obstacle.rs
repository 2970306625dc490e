//! Obstacle snapshot and periodic rebuild.
//!
//! The obstacle map is a pure function of store state at build time. It is
//! rebuilt no more often than a configured interval and replaced wholesale on
//! each rebuild — readers never see a partially-built map, and data between
//! rebuilds is stale by at most one interval. Walls change far less often
//! than agents replan, so the staleness window is accepted.

use std::collections::HashSet;

use sandbox_component::{BodyRole, ComponentKind, Store};
use sandbox_math::GridCell;
use tracing::debug;

/// The set of blocked grid cells as of the last rebuild.
#[derive(Debug, Clone)]
pub struct ObstacleMap {
    cell_size: f32,
    cells: HashSet<GridCell>,
}

impl ObstacleMap {
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: HashSet::new(),
        }
    }

    #[must_use]
    pub fn is_blocked(&self, cell: GridCell) -> bool {
        self.cells.contains(&cell)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Mark a cell blocked. Builders and tests construct maps through this.
    pub fn insert(&mut self, cell: GridCell) {
        self.cells.insert(cell);
    }
}

/// Rebuilds the obstacle map from store state on an elapsed-time gate.
#[derive(Debug)]
pub struct ObstacleMapBuilder {
    rebuild_interval: f64,
    last_build: Option<f64>,
    map: ObstacleMap,
}

impl ObstacleMapBuilder {
    #[must_use]
    pub fn new(cell_size: f32, rebuild_interval: f64) -> Self {
        Self {
            rebuild_interval,
            last_build: None,
            map: ObstacleMap::new(cell_size),
        }
    }

    /// The current snapshot. May be up to one rebuild interval stale.
    #[must_use]
    pub fn snapshot(&self) -> &ObstacleMap {
        &self.map
    }

    /// Rebuild if the interval has elapsed (or no build has happened yet).
    /// Returns `true` if a rebuild ran.
    pub fn maybe_rebuild(&mut self, store: &Store, now: f64) -> bool {
        let due = match self.last_build {
            None => true,
            Some(last) => now - last >= self.rebuild_interval,
        };
        if due {
            self.rebuild(store, now);
        }
        due
    }

    /// Unconditionally rebuild the snapshot from current store state.
    pub fn rebuild(&mut self, store: &Store, now: f64) {
        let cell_size = self.map.cell_size;
        let mut map = ObstacleMap::new(cell_size);

        // Maze walls carry their cell precomputed at spawn time.
        for entity in store.query(&[ComponentKind::StaticObstacle]) {
            if let Some(tag) = store.static_obstacle(entity) {
                map.insert(tag.cell);
            }
        }

        // Static block bodies are derived through the shared floor rule.
        for entity in store.query(&[ComponentKind::Physics, ComponentKind::Transform]) {
            let Some(physics) = store.physics(entity) else {
                continue;
            };
            if physics.is_static && physics.role == BodyRole::Block {
                if let Some(transform) = store.transform(entity) {
                    map.insert(GridCell::from_world(transform.position, cell_size));
                }
            }
        }

        debug!(blocked_cells = map.len(), now, "rebuilt obstacle map");
        self.map = map;
        self.last_build = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use sandbox_component::{Component, Material, PhysicsRef, StaticObstacle};
    use sandbox_math::Transform2D;

    use super::*;

    fn spawn_wall_tag(store: &mut Store, cell: GridCell) {
        let e = store.create_entity();
        store
            .insert(e, Component::StaticObstacle(StaticObstacle { cell }))
            .unwrap();
    }

    fn spawn_block(store: &mut Store, pos: Vec2, is_static: bool) {
        let e = store.create_entity();
        store
            .insert(e, Component::Transform(Transform2D::from_position(pos)))
            .unwrap();
        store
            .insert(
                e,
                Component::Physics(PhysicsRef {
                    body: None,
                    role: BodyRole::Block,
                    material: Material::Wood,
                    is_static,
                }),
            )
            .unwrap();
    }

    #[test]
    fn test_rebuild_collects_wall_tags_and_static_blocks() {
        let mut store = Store::new();
        spawn_wall_tag(&mut store, GridCell::new(2, 3));
        spawn_block(&mut store, Vec2::new(170.0, 50.0), true); // cell (4, 1)
        spawn_block(&mut store, Vec2::new(330.0, 50.0), false); // dynamic, ignored

        let mut builder = ObstacleMapBuilder::new(40.0, 1.0);
        builder.rebuild(&store, 0.0);

        let map = builder.snapshot();
        assert_eq!(map.len(), 2);
        assert!(map.is_blocked(GridCell::new(2, 3)));
        assert!(map.is_blocked(GridCell::new(4, 1)));
        assert!(!map.is_blocked(GridCell::new(8, 1)));
    }

    #[test]
    fn test_first_maybe_rebuild_runs_immediately() {
        let store = Store::new();
        let mut builder = ObstacleMapBuilder::new(40.0, 1.0);
        assert!(builder.maybe_rebuild(&store, 0.0));
    }

    #[test]
    fn test_rebuild_gated_by_interval() {
        let mut store = Store::new();
        let mut builder = ObstacleMapBuilder::new(40.0, 1.0);
        builder.maybe_rebuild(&store, 0.0);

        spawn_wall_tag(&mut store, GridCell::new(5, 5));

        // Before the interval elapses the stale snapshot stays in place.
        assert!(!builder.maybe_rebuild(&store, 0.5));
        assert!(!builder.snapshot().is_blocked(GridCell::new(5, 5)));

        assert!(builder.maybe_rebuild(&store, 1.0));
        assert!(builder.snapshot().is_blocked(GridCell::new(5, 5)));
    }

    #[test]
    fn test_rebuild_replaces_wholesale() {
        let mut store = Store::new();
        let e = store.create_entity();
        store
            .insert(
                e,
                Component::StaticObstacle(StaticObstacle {
                    cell: GridCell::new(1, 1),
                }),
            )
            .unwrap();

        let mut builder = ObstacleMapBuilder::new(40.0, 1.0);
        builder.rebuild(&store, 0.0);
        assert!(builder.snapshot().is_blocked(GridCell::new(1, 1)));

        store.remove_entity(e);
        builder.rebuild(&store, 1.0);
        assert!(builder.snapshot().is_empty());
    }
}
