//! The physics collaborator boundary.
//!
//! Rigid-body simulation lives outside the core. The core hands the engine
//! forces and body descriptions and reads positions back through the store;
//! it never inspects body internals beyond the opaque [`BodyHandle`].

use glam::Vec2;
use sandbox_component::{BodyHandle, Entity, Material};

/// Collision shape requested at body creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyShape {
    Ball { radius: f32 },
    Block { width: f32, height: f32 },
}

/// The narrow interface the core uses to talk to the physics engine.
pub trait Physics {
    /// Create a body for `entity` and return its opaque handle.
    fn create_body(
        &mut self,
        entity: Entity,
        shape: BodyShape,
        material: Material,
        is_static: bool,
    ) -> BodyHandle;

    /// Apply a force to the body owned by `entity`. Unknown entities are
    /// ignored — the body may already have been torn down this tick.
    fn apply_force(&mut self, entity: Entity, force: Vec2);

    /// Remove the body owned by `entity`, if any.
    fn remove_body(&mut self, entity: Entity);
}
