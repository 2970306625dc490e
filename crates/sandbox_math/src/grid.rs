//! Grid cell coordinates and world↔grid conversion.
//!
//! A [`GridCell`] is derived data, never stored as authoritative position:
//! `(floor(x / cell_size), floor(y / cell_size))`. It is the key for
//! obstacle membership and the vertex type for the path search.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An integer grid coordinate pair.
///
/// Cells are obtained by flooring world coordinates against a fixed cell
/// size. Negative world coordinates floor toward negative infinity, so the
/// cell containing `(-0.5, -0.5)` is `(-1, -1)`, not `(0, 0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
}

impl GridCell {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell containing the given world position.
    #[must_use]
    pub fn from_world(pos: Vec2, cell_size: f32) -> Self {
        Self {
            x: (pos.x / cell_size).floor() as i32,
            y: (pos.y / cell_size).floor() as i32,
        }
    }

    /// World-space center of this cell.
    #[must_use]
    pub fn center(self, cell_size: f32) -> Vec2 {
        Vec2::new(
            self.x as f32 * cell_size + cell_size / 2.0,
            self.y as f32 * cell_size + cell_size / 2.0,
        )
    }

    /// Manhattan distance to another cell.
    #[must_use]
    pub fn manhattan(self, other: Self) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

impl std::fmt::Display for GridCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_world_floors() {
        let cell = GridCell::from_world(Vec2::new(79.9, 40.0), 40.0);
        assert_eq!(cell, GridCell::new(1, 1));
    }

    #[test]
    fn test_from_world_negative_floors_down() {
        let cell = GridCell::from_world(Vec2::new(-0.5, -0.5), 40.0);
        assert_eq!(cell, GridCell::new(-1, -1));
    }

    #[test]
    fn test_center_roundtrip() {
        let cell = GridCell::new(3, 7);
        let center = cell.center(40.0);
        assert_eq!(center, Vec2::new(140.0, 300.0));
        assert_eq!(GridCell::from_world(center, 40.0), cell);
    }

    #[test]
    fn test_manhattan() {
        assert_eq!(GridCell::new(0, 0).manhattan(GridCell::new(3, -4)), 7);
        assert_eq!(GridCell::new(2, 2).manhattan(GridCell::new(2, 2)), 0);
    }
}
