//! # sandbox_nav
//!
//! Navigation for the grid sandbox: the periodically rebuilt obstacle
//! snapshot and the A* grid pathfinder with path smoothing.
//!
//! This crate provides:
//!
//! - [`ObstacleMap`] — the set of blocked grid cells as of the last rebuild.
//! - [`ObstacleMapBuilder`] — elapsed-time-gated rebuild-and-swap from store
//!   state.
//! - [`Pathfinder`] — stateless 8-directional A* returning world waypoints,
//!   plus greedy line-of-sight path smoothing.
//! - [`PathError`] — the routine negative outcomes a caller folds into
//!   "retry later".

pub mod obstacle;
pub mod pathfind;

pub use obstacle::{ObstacleMap, ObstacleMapBuilder};
pub use pathfind::{PathError, Pathfinder};
