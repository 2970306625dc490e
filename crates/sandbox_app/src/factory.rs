//! Entity factories.
//!
//! Factories assemble the fixed component bags for maze walls, loose blocks,
//! and roaming robots. They are plain consumers of the store API plus the
//! physics boundary; all the interesting state lives in the components they
//! attach.

use glam::Vec2;
use sandbox_agent::{BodyShape, Physics};
use sandbox_component::{
    BodyRole, Component, Entity, Material, NavAgent, PhysicsRef, Renderable, Shape,
    StaticObstacle, Store, StoreError,
};
use sandbox_math::{GridCell, Transform2D};

/// Default wall thickness in world units.
pub const WALL_SIZE: f32 = 20.0;

/// The bundled maze layout: 1 = wall, 0 = open.
pub const SIMPLE_MAZE: &[&[u8]] = &[
    &[1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
    &[1, 0, 0, 0, 1, 0, 0, 0, 0, 1],
    &[1, 0, 1, 0, 1, 0, 1, 1, 0, 1],
    &[1, 0, 1, 0, 0, 0, 1, 0, 0, 1],
    &[1, 0, 1, 1, 1, 0, 1, 0, 1, 1],
    &[1, 0, 0, 0, 1, 0, 0, 0, 0, 1],
    &[1, 1, 1, 0, 1, 1, 1, 1, 0, 1],
    &[1, 0, 0, 0, 0, 0, 0, 1, 0, 1],
    &[1, 0, 1, 1, 1, 1, 0, 1, 0, 1],
    &[1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
];

/// Spawn a single maze wall at `position`. The wall is tagged with its grid
/// cell through the same floor rule the pathfinder uses.
pub fn spawn_wall(
    store: &mut Store,
    physics: &mut dyn Physics,
    position: Vec2,
    cell_size: f32,
) -> Result<Entity, StoreError> {
    let entity = store.create_entity();
    store.insert(entity, Component::Transform(Transform2D::from_position(position)))?;

    let handle = physics.create_body(
        entity,
        BodyShape::Block {
            width: WALL_SIZE,
            height: WALL_SIZE,
        },
        Material::Stone,
        true,
    );
    store.insert(
        entity,
        Component::Physics(PhysicsRef {
            body: Some(handle),
            role: BodyRole::Wall,
            material: Material::Stone,
            is_static: true,
        }),
    )?;
    store.insert(
        entity,
        Component::Renderable(Renderable {
            shape: Shape::Rect {
                width: WALL_SIZE,
                height: WALL_SIZE,
            },
            color: [0x44, 0x44, 0x44, 0xff],
            layer: 1,
        }),
    )?;
    store.insert(
        entity,
        Component::StaticObstacle(StaticObstacle {
            cell: GridCell::from_world(position, cell_size),
        }),
    )?;
    Ok(entity)
}

/// Spawn a loose block. Static blocks become obstacles on the next rebuild.
pub fn spawn_block(
    store: &mut Store,
    physics: &mut dyn Physics,
    position: Vec2,
    size: f32,
    is_static: bool,
) -> Result<Entity, StoreError> {
    let entity = store.create_entity();
    store.insert(entity, Component::Transform(Transform2D::from_position(position)))?;

    let handle = physics.create_body(
        entity,
        BodyShape::Block {
            width: size,
            height: size,
        },
        Material::Wood,
        is_static,
    );
    store.insert(
        entity,
        Component::Physics(PhysicsRef {
            body: Some(handle),
            role: BodyRole::Block,
            material: Material::Wood,
            is_static,
        }),
    )?;
    store.insert(
        entity,
        Component::Renderable(Renderable {
            shape: Shape::Rect {
                width: size,
                height: size,
            },
            color: [0x8d, 0x6e, 0x63, 0xff],
            layer: 2,
        }),
    )?;
    Ok(entity)
}

/// Spawn a roaming robot agent. Starts idle; its first plan is delayed by
/// `first_plan_delay` so freshly placed robots do not all plan on the same
/// tick.
pub fn spawn_robot(
    store: &mut Store,
    physics: &mut dyn Physics,
    position: Vec2,
    speed: f32,
    now: f64,
    first_plan_delay: f64,
) -> Result<Entity, StoreError> {
    let entity = store.create_entity();
    store.insert(entity, Component::Transform(Transform2D::from_position(position)))?;

    let handle = physics.create_body(
        entity,
        BodyShape::Ball { radius: 8.0 },
        Material::Metal,
        false,
    );
    store.insert(
        entity,
        Component::Physics(PhysicsRef {
            body: Some(handle),
            role: BodyRole::Robot,
            material: Material::Metal,
            is_static: false,
        }),
    )?;
    store.insert(
        entity,
        Component::Renderable(Renderable {
            shape: Shape::Circle { radius: 8.0 },
            color: sandbox_agent::state_color(sandbox_component::AgentState::Idle),
            layer: 3,
        }),
    )?;
    store.insert(
        entity,
        Component::NavAgent(NavAgent::new(position, speed, now, first_plan_delay)),
    )?;
    Ok(entity)
}

/// Tear down an entity and its physics body together. Safe to call twice.
pub fn despawn(store: &mut Store, physics: &mut dyn Physics, entity: Entity) {
    physics.remove_body(entity);
    store.remove_entity(entity);
}

/// Spawn walls for every `1` in `pattern`, one grid cell apart, starting at
/// `origin`. Returns the spawned wall entities.
pub fn spawn_maze(
    store: &mut Store,
    physics: &mut dyn Physics,
    pattern: &[&[u8]],
    origin: Vec2,
    cell_size: f32,
) -> Result<Vec<Entity>, StoreError> {
    let mut walls = Vec::new();
    for (row, cells) in pattern.iter().enumerate() {
        for (col, &cell) in cells.iter().enumerate() {
            if cell == 1 {
                let position = origin + Vec2::new(col as f32 * cell_size, row as f32 * cell_size);
                walls.push(spawn_wall(store, physics, position, cell_size)?);
            }
        }
    }
    Ok(walls)
}
