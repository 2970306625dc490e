//! The closed component set.
//!
//! Every record the store can hold is one variant of [`Component`], and every
//! variant has exactly one [`ComponentKind`] discriminant. An entity holds at
//! most one record per kind. The set is closed on purpose: per-kind
//! homogeneous tables, no dynamic field access.

use glam::Vec2;
use sandbox_math::{GridCell, Transform2D};
use serde::{Deserialize, Serialize};

/// Discriminant for the closed component set. Used as the per-entity index
/// key and the per-kind table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentKind {
    Transform,
    Physics,
    Renderable,
    NavAgent,
    StaticObstacle,
}

impl ComponentKind {
    /// All kinds, in index order.
    pub const ALL: [ComponentKind; 5] = [
        ComponentKind::Transform,
        ComponentKind::Physics,
        ComponentKind::Renderable,
        ComponentKind::NavAgent,
        ComponentKind::StaticObstacle,
    ];
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ComponentKind::Transform => "Transform",
            ComponentKind::Physics => "Physics",
            ComponentKind::Renderable => "Renderable",
            ComponentKind::NavAgent => "NavAgent",
            ComponentKind::StaticObstacle => "StaticObstacle",
        };
        f.write_str(name)
    }
}

/// Opaque handle to a body owned by the external physics engine.
///
/// The core never inspects body internals; it only passes the handle back
/// across the physics boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyHandle(pub u64);

/// Surface material, forwarded to the physics engine at body creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Material {
    Stone,
    Metal,
    Wood,
}

/// What role a physics body plays in the world. The obstacle map builder
/// treats static `Block` bodies as blocked cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyRole {
    Wall,
    Block,
    Robot,
}

/// Reference to an external physics body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsRef {
    /// Handle returned by the physics engine, `None` until the body exists.
    pub body: Option<BodyHandle>,
    pub role: BodyRole,
    pub material: Material,
    pub is_static: bool,
}

/// Shape descriptor for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { radius: f32 },
    Rect { width: f32, height: f32 },
}

/// Drawing data consumed (never written) by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Renderable {
    pub shape: Shape,
    /// RGBA, straight alpha.
    pub color: [u8; 4],
    /// Draw order, higher on top.
    pub layer: u8,
}

/// Behavior state of an autonomous agent.
///
/// `Stuck` never lingers: the controller handles it within the same tick and
/// returns the agent to `Idle`. The variant exists so the presentation layer
/// can color-code the episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentState {
    Idle,
    Seeking,
    Moving,
    Stuck,
}

/// Navigation state for an autonomous agent.
///
/// All deadlines are absolute clock values in seconds, compared against the
/// `now` passed into the controller each tick. No scheduled callbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavAgent {
    pub state: AgentState,
    /// Current destination in world coordinates, `None` while idle.
    pub target: Option<Vec2>,
    /// Waypoints of the active plan, world coordinates.
    pub path: Vec<Vec2>,
    /// Index of the waypoint currently steered toward.
    pub path_index: usize,
    /// Movement speed factor fed into the force calculation.
    pub speed: f32,
    /// Earliest clock time the agent may plan (or pick a target) again.
    pub plan_deadline: f64,
    /// Clock time the current path was computed, for re-plan aging.
    pub planned_at: f64,
    /// Seconds spent below the displacement threshold while moving.
    pub stuck_timer: f32,
    /// Position at the last stuck-detection sample.
    pub last_position: Vec2,
}

impl NavAgent {
    /// A fresh idle agent at `position`. `first_plan_delay` holds it idle for
    /// a moment after spawn instead of planning on its first tick.
    #[must_use]
    pub fn new(position: Vec2, speed: f32, now: f64, first_plan_delay: f64) -> Self {
        Self {
            state: AgentState::Idle,
            target: None,
            path: Vec::new(),
            path_index: 0,
            speed,
            plan_deadline: now + first_plan_delay,
            planned_at: now,
            stuck_timer: 0.0,
            last_position: position,
        }
    }

    /// Drop the current plan and target. Used on arrival, abandonment, and
    /// every recovery path.
    pub fn clear_plan(&mut self) {
        self.target = None;
        self.path.clear();
        self.path_index = 0;
    }
}

/// Tag marking an entity as immovable maze geometry at a precomputed cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticObstacle {
    pub cell: GridCell,
}

/// A single component record: one variant per [`ComponentKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Component {
    Transform(Transform2D),
    Physics(PhysicsRef),
    Renderable(Renderable),
    NavAgent(NavAgent),
    StaticObstacle(StaticObstacle),
}

impl Component {
    /// The kind this record is stored under.
    #[must_use]
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Transform(_) => ComponentKind::Transform,
            Component::Physics(_) => ComponentKind::Physics,
            Component::Renderable(_) => ComponentKind::Renderable,
            Component::NavAgent(_) => ComponentKind::NavAgent,
            Component::StaticObstacle(_) => ComponentKind::StaticObstacle,
        }
    }
}
