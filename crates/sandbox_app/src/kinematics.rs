//! Reference physics implementation.
//!
//! A deliberately crude force-integrates-to-velocity stand-in so the binary
//! runs without an external engine. The real engine sits behind the same
//! [`Physics`] trait; nothing in the core knows the difference.

use std::collections::HashMap;

use glam::Vec2;
use sandbox_agent::{BodyShape, Physics};
use sandbox_component::{BodyHandle, Entity, Material, Store};

#[derive(Debug)]
struct Body {
    velocity: Vec2,
    is_static: bool,
}

/// Velocity integration with damping. Forces arrive pre-scaled-down by the
/// controller's force cap, so they are amplified here to produce visible
/// motion.
#[derive(Debug)]
pub struct KinematicPhysics {
    bodies: HashMap<Entity, Body>,
    next_handle: u64,
    force_scale: f32,
    damping: f32,
}

impl Default for KinematicPhysics {
    fn default() -> Self {
        Self::new()
    }
}

impl KinematicPhysics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bodies: HashMap::new(),
            next_handle: 0,
            force_scale: 5_000.0,
            damping: 0.92,
        }
    }

    /// Integrate one step: move every dynamic body's transform by its
    /// velocity, then damp.
    pub fn step(&mut self, store: &mut Store, dt: f64) {
        for (entity, body) in &mut self.bodies {
            if body.is_static {
                continue;
            }
            if let Some(transform) = store.transform_mut(*entity) {
                transform.position += body.velocity * dt as f32;
            }
            body.velocity *= self.damping;
        }
    }

    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

impl Physics for KinematicPhysics {
    fn create_body(
        &mut self,
        entity: Entity,
        _shape: BodyShape,
        _material: Material,
        is_static: bool,
    ) -> BodyHandle {
        self.next_handle += 1;
        self.bodies.insert(
            entity,
            Body {
                velocity: Vec2::ZERO,
                is_static,
            },
        );
        BodyHandle(self.next_handle)
    }

    fn apply_force(&mut self, entity: Entity, force: Vec2) {
        if let Some(body) = self.bodies.get_mut(&entity) {
            if !body.is_static {
                body.velocity += force * self.force_scale;
            }
        }
    }

    fn remove_body(&mut self, entity: Entity) {
        self.bodies.remove(&entity);
    }
}
