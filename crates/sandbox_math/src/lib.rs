//! # sandbox_math
//!
//! Math types for the grid sandbox. Re-exports [`glam`] for linear algebra
//! and defines the spatial types shared by the store, the obstacle map, and
//! the pathfinder.
//!
//! The single most important rule in this crate is the world-to-grid
//! conversion: `floor(coord / cell_size)`. The maze factory, the obstacle
//! map builder, and the pathfinder must all key cells through [`GridCell`]
//! so they agree on what "blocked" means.

pub mod bounds;
pub mod grid;
pub mod transform;

// Re-export glam types for convenience.
pub use glam::Vec2;

pub use bounds::WorldBounds;
pub use grid::GridCell;
pub use transform::Transform2D;
