//! # sandbox_component
//!
//! The entity/component data store at the heart of the sandbox.
//!
//! This crate provides:
//!
//! - [`Entity`] — lightweight `u64` entity identifiers, never reused.
//! - [`Component`] / [`ComponentKind`] — the closed tagged-variant component
//!   set and its discriminant.
//! - [`Store`] — per-kind homogeneous tables plus a per-entity kind index,
//!   with O(1) lookup and all-kinds queries.

pub mod component;
pub mod entity;
pub mod store;

pub use component::{
    AgentState, BodyHandle, BodyRole, Component, ComponentKind, Material, NavAgent, PhysicsRef,
    Renderable, Shape, StaticObstacle,
};
pub use entity::Entity;
pub use store::{Store, StoreError};
