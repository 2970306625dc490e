//! A* grid pathfinding and path smoothing.
//!
//! The search runs over grid cells derived by the shared floor rule and
//! returns world-space waypoints at cell centers. It is pure and re-entrant:
//! no state survives between calls, so any number of agents may plan against
//! their own snapshots without cross-contamination.
//!
//! The heuristic is plain Manhattan distance. With √2-cost diagonal moves
//! that is not admissible, so returned paths can be slightly non-optimal on
//! diagonal-heavy routes. This reproduces the behavior the rest of the
//! sandbox was tuned against; the closed-set skip below keeps the search
//! terminating and deterministic regardless.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::f64::consts::SQRT_2;

use glam::Vec2;
use sandbox_math::GridCell;
use thiserror::Error;

use crate::obstacle::ObstacleMap;

/// Negative pathfinding outcomes. All of these are routine for the behavior
/// controller — it folds them into "retry later", never into a crash.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// The start position floors into a blocked cell. No search is attempted.
    #[error("start cell {0} is blocked")]
    StartBlocked(GridCell),
    /// The goal position floors into a blocked cell. No search is attempted.
    #[error("goal cell {0} is blocked")]
    GoalBlocked(GridCell),
    /// The frontier emptied without reaching the goal.
    #[error("no path from {0} to {1}")]
    NoPath(GridCell, GridCell),
}

/// 8-directional neighbor offsets with step costs: cardinal moves cost 1,
/// diagonal moves cost √2.
const NEIGHBORS: [(i32, i32, f64); 8] = [
    (1, 0, 1.0),
    (-1, 0, 1.0),
    (0, 1, 1.0),
    (0, -1, 1.0),
    (1, 1, SQRT_2),
    (-1, 1, SQRT_2),
    (1, -1, SQRT_2),
    (-1, -1, SQRT_2),
];

/// Frontier entry ordered by ascending f-score, tie-broken on cell
/// coordinates so equal-cost searches expand in a fixed order.
#[derive(Debug, Clone, Copy, PartialEq)]
struct OpenNode {
    f: f64,
    cell: GridCell,
}

impl Eq for OpenNode {}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.f
            .total_cmp(&other.f)
            .then_with(|| self.cell.cmp(&other.cell))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Stateless A* pathfinder over a fixed cell size.
///
/// The cell size must match the one the obstacle map (and maze geometry) was
/// built with, otherwise "blocked" and "walkable" disagree about the world.
#[derive(Debug, Clone, Copy)]
pub struct Pathfinder {
    cell_size: f32,
}

impl Pathfinder {
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        Self { cell_size }
    }

    /// Find a path from `start` to `goal`, both world coordinates, avoiding
    /// blocked cells. Returns waypoints at the centers of the traversed
    /// cells, start cell first, goal cell last.
    ///
    /// # Errors
    ///
    /// [`PathError::StartBlocked`] / [`PathError::GoalBlocked`] if either
    /// endpoint floors into a blocked cell (short-circuits before any
    /// expansion), [`PathError::NoPath`] if the frontier empties.
    pub fn find_path(
        &self,
        start: Vec2,
        goal: Vec2,
        obstacles: &ObstacleMap,
    ) -> Result<Vec<Vec2>, PathError> {
        let start_cell = GridCell::from_world(start, self.cell_size);
        let goal_cell = GridCell::from_world(goal, self.cell_size);

        if obstacles.is_blocked(start_cell) {
            return Err(PathError::StartBlocked(start_cell));
        }
        if obstacles.is_blocked(goal_cell) {
            return Err(PathError::GoalBlocked(goal_cell));
        }

        let mut open = BinaryHeap::new();
        let mut closed: HashSet<GridCell> = HashSet::new();
        let mut came_from: HashMap<GridCell, GridCell> = HashMap::new();
        let mut g_score: HashMap<GridCell, f64> = HashMap::new();

        g_score.insert(start_cell, 0.0);
        open.push(Reverse(OpenNode {
            f: f64::from(start_cell.manhattan(goal_cell)),
            cell: start_cell,
        }));

        while let Some(Reverse(OpenNode { cell: current, .. })) = open.pop() {
            if current == goal_cell {
                return Ok(self.reconstruct(&came_from, current));
            }
            // Stale frontier entries are skipped rather than decreased in
            // place.
            if !closed.insert(current) {
                continue;
            }

            let current_g = g_score[&current];
            for (dx, dy, step_cost) in NEIGHBORS {
                let neighbor = GridCell::new(current.x + dx, current.y + dy);
                if closed.contains(&neighbor) || obstacles.is_blocked(neighbor) {
                    continue;
                }

                let tentative = current_g + step_cost;
                let improves = g_score
                    .get(&neighbor)
                    .is_none_or(|&known| tentative < known);
                if !improves {
                    continue;
                }

                came_from.insert(neighbor, current);
                g_score.insert(neighbor, tentative);
                open.push(Reverse(OpenNode {
                    f: tentative + f64::from(neighbor.manhattan(goal_cell)),
                    cell: neighbor,
                }));
            }
        }

        Err(PathError::NoPath(start_cell, goal_cell))
    }

    /// Follow predecessor links from `last` back to the start, then convert
    /// every cell to its world-space center.
    fn reconstruct(&self, came_from: &HashMap<GridCell, GridCell>, last: GridCell) -> Vec<Vec2> {
        let mut cells = vec![last];
        let mut current = last;
        while let Some(&prev) = came_from.get(&current) {
            cells.push(prev);
            current = prev;
        }
        cells.reverse();
        cells
            .into_iter()
            .map(|cell| cell.center(self.cell_size))
            .collect()
    }

    /// Greedily drop intermediate waypoints wherever a straight line between
    /// non-adjacent points stays clear of blocked cells. Line-of-sight is
    /// sampled at half-cell steps against the given snapshot. Paths of two
    /// or fewer points are returned unchanged.
    #[must_use]
    pub fn smooth_path(&self, path: &[Vec2], obstacles: &ObstacleMap) -> Vec<Vec2> {
        if path.len() <= 2 {
            return path.to_vec();
        }

        let mut smoothed = vec![path[0]];
        let mut current = 0;
        while current < path.len() - 1 {
            let mut next = current + 1;
            while next < path.len() - 1 && self.line_of_sight(path[current], path[next + 1], obstacles)
            {
                next += 1;
            }
            smoothed.push(path[next]);
            current = next;
        }
        smoothed
    }

    /// Sample the segment at half-cell steps; clear only if every sampled
    /// point lands in an unblocked cell.
    fn line_of_sight(&self, from: Vec2, to: Vec2, obstacles: &ObstacleMap) -> bool {
        let delta = to - from;
        let distance = delta.length();
        let steps = ((distance / (self.cell_size / 2.0)).ceil() as usize).max(1);

        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let sample = from + delta * t;
            if obstacles.is_blocked(GridCell::from_world(sample, self.cell_size)) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_with(cells: &[(i32, i32)]) -> ObstacleMap {
        let mut map = ObstacleMap::new(40.0);
        for &(x, y) in cells {
            map.insert(GridCell::new(x, y));
        }
        map
    }

    fn cell_of(point: Vec2) -> GridCell {
        GridCell::from_world(point, 40.0)
    }

    #[test]
    fn test_straight_run_visits_every_cell() {
        let finder = Pathfinder::new(40.0);
        let path = finder
            .find_path(Vec2::new(0.0, 0.0), Vec2::new(400.0, 0.0), &map_with(&[]))
            .unwrap();

        // 10 cardinal steps from cell (0,0) to (10,0): N+1 waypoints.
        assert_eq!(path.len(), 11);
        for (i, point) in path.iter().enumerate() {
            assert_eq!(cell_of(*point), GridCell::new(i as i32, 0));
            assert_eq!(point.y, 20.0); // all centers on row 0
        }
        // All moves cardinal: spacing exactly one cell.
        for pair in path.windows(2) {
            assert_eq!(pair[1].x - pair[0].x, 40.0);
        }
    }

    #[test]
    fn test_path_avoids_blocked_cell() {
        let finder = Pathfinder::new(40.0);
        let obstacles = map_with(&[(1, 0)]);
        let path = finder
            .find_path(Vec2::new(20.0, 20.0), Vec2::new(100.0, 20.0), &obstacles)
            .unwrap();

        assert!(!path.is_empty());
        for point in &path {
            assert_ne!(cell_of(*point), GridCell::new(1, 0));
        }
        assert_eq!(cell_of(*path.last().unwrap()), GridCell::new(2, 0));
    }

    #[test]
    fn test_blocked_goal_short_circuits() {
        let finder = Pathfinder::new(40.0);
        let obstacles = map_with(&[(2, 0)]);
        let err = finder
            .find_path(Vec2::new(20.0, 20.0), Vec2::new(100.0, 20.0), &obstacles)
            .unwrap_err();
        assert_eq!(err, PathError::GoalBlocked(GridCell::new(2, 0)));
    }

    #[test]
    fn test_blocked_start_short_circuits() {
        let finder = Pathfinder::new(40.0);
        let obstacles = map_with(&[(0, 0)]);
        let err = finder
            .find_path(Vec2::new(20.0, 20.0), Vec2::new(100.0, 20.0), &obstacles)
            .unwrap_err();
        assert_eq!(err, PathError::StartBlocked(GridCell::new(0, 0)));
    }

    #[test]
    fn test_enclosed_start_reports_no_path() {
        let finder = Pathfinder::new(40.0);
        // Start cell (5,5) walled in on all 8 sides: the frontier empties.
        // (The grid is unbounded, so only the reachable side can exhaust.)
        let ring: Vec<(i32, i32)> = (4..=6)
            .flat_map(|x| (4..=6).map(move |y| (x, y)))
            .filter(|&(x, y)| (x, y) != (5, 5))
            .collect();
        let err = finder
            .find_path(Vec2::new(220.0, 220.0), Vec2::new(20.0, 20.0), &map_with(&ring))
            .unwrap_err();
        assert_eq!(
            err,
            PathError::NoPath(GridCell::new(5, 5), GridCell::new(0, 0))
        );
    }

    #[test]
    fn test_start_equals_goal() {
        let finder = Pathfinder::new(40.0);
        let path = finder
            .find_path(Vec2::new(25.0, 25.0), Vec2::new(30.0, 30.0), &map_with(&[]))
            .unwrap();
        // Same cell: single waypoint at its center.
        assert_eq!(path, vec![Vec2::new(20.0, 20.0)]);
    }

    #[test]
    fn test_search_is_deterministic() {
        let finder = Pathfinder::new(40.0);
        let obstacles = map_with(&[(2, 1), (2, 2), (2, 3)]);
        let a = finder
            .find_path(Vec2::new(20.0, 100.0), Vec2::new(180.0, 100.0), &obstacles)
            .unwrap();
        let b = finder
            .find_path(Vec2::new(20.0, 100.0), Vec2::new(180.0, 100.0), &obstacles)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_smooth_two_point_path_unchanged() {
        let finder = Pathfinder::new(40.0);
        let path = vec![Vec2::new(20.0, 20.0), Vec2::new(420.0, 20.0)];
        assert_eq!(finder.smooth_path(&path, &map_with(&[])), path);
    }

    #[test]
    fn test_smooth_collapses_clear_straight_path() {
        let finder = Pathfinder::new(40.0);
        let path = finder
            .find_path(Vec2::new(20.0, 20.0), Vec2::new(420.0, 20.0), &map_with(&[]))
            .unwrap();
        let smoothed = finder.smooth_path(&path, &map_with(&[]));
        assert_eq!(smoothed, vec![path[0], *path.last().unwrap()]);
    }

    #[test]
    fn test_smooth_keeps_waypoints_around_walls() {
        let finder = Pathfinder::new(40.0);
        let obstacles = map_with(&[(1, 0)]);
        // Detour over row 1: skipping the middle point would clip the wall.
        let path = vec![
            GridCell::new(0, 0).center(40.0),
            GridCell::new(1, 1).center(40.0),
            GridCell::new(2, 0).center(40.0),
        ];
        let smoothed = finder.smooth_path(&path, &obstacles);
        assert_eq!(smoothed, path);
    }
}
