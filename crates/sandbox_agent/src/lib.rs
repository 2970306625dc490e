//! # sandbox_agent
//!
//! Autonomous-agent behavior for the grid sandbox.
//!
//! This crate provides:
//!
//! - [`Physics`] — the narrow force/body boundary to the external physics
//!   engine.
//! - [`AgentController`] — the per-agent `Idle → Seeking → Moving` state
//!   machine with stuck detection, re-plan cadence, and recovery cooldowns.
//! - [`AgentConfig`] — behavior tuning knobs.

pub mod controller;
pub mod physics;

pub use controller::{state_color, AgentConfig, AgentController};
pub use physics::{BodyShape, Physics};
