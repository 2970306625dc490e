//! World bounds and target sampling.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Rectangular world bounds with origin at `(0, 0)`.
///
/// Agents roam only the upper portion of the world — the lower strip is
/// reserved for ground clutter and settled bodies. `roam_fraction` is the
/// fraction of `height` that target sampling may use.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WorldBounds {
    pub width: f32,
    pub height: f32,
    pub roam_fraction: f32,
}

impl WorldBounds {
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            roam_fraction: 0.6,
        }
    }

    /// Returns `true` if the position lies inside the playable area: full
    /// width, upper 70% of the height. Slightly wider than the roam band so
    /// an agent pushed a little past it by physics is still in bounds.
    #[must_use]
    pub fn contains(&self, pos: Vec2) -> bool {
        pos.x >= 0.0 && pos.x <= self.width && pos.y >= 0.0 && pos.y <= self.height * 0.7
    }

    /// Safe reset point for agents recovered from out-of-bounds positions.
    #[must_use]
    pub fn safe_center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 4.0)
    }

    /// Sample a random target inside the roam band, `margin` away from the
    /// edges.
    pub fn random_target<R: Rng + ?Sized>(&self, rng: &mut R, margin: f32) -> Vec2 {
        let x = margin + rng.gen_range(0.0..1.0) * (self.width - 2.0 * margin);
        let y = margin + rng.gen_range(0.0..1.0) * (self.height * self.roam_fraction - 2.0 * margin);
        Vec2::new(x, y)
    }
}
