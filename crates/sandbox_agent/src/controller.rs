//! The per-agent behavior state machine.
//!
//! `Idle → Seeking → Moving`, with stuck detection folding back to `Idle`.
//! No terminal state: an agent cycles until its entity is destroyed. Every
//! negative pathfinding outcome — blocked endpoints, no path, a path longer
//! than the configured maximum — is handled identically: abandon the target,
//! cool down, try again later.
//!
//! All timing is explicit: deadlines are absolute clock values stored in the
//! `NavAgent` record and compared against the `now` passed into
//! [`AgentController::update`]. Nothing is scheduled.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sandbox_component::{AgentState, ComponentKind, Entity, Store};
use sandbox_math::WorldBounds;
use sandbox_nav::{ObstacleMap, Pathfinder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::physics::Physics;

/// Tuning knobs for agent behavior. Defaults mirror the values the sandbox
/// ships with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Base idle dwell before picking a new target, seconds.
    pub dwell_base: f64,
    /// Random extra dwell in `[0, dwell_jitter)`, seconds.
    pub dwell_jitter: f64,
    /// Margin from the world edges when sampling targets.
    pub target_margin: f32,
    /// Re-plan when the current path is older than this, seconds.
    pub replan_interval: f64,
    /// Extra cooldown after a failed plan, seconds.
    pub retry_cooldown: f64,
    /// Extra cooldown after a stuck recovery, seconds.
    pub stuck_cooldown: f64,
    /// Paths with this many waypoints or more are rejected.
    pub max_path_len: usize,
    /// Waypoint arrival radius, world units.
    pub arrival_radius: f32,
    /// Displacement below this counts as "not moving", world units.
    pub stuck_threshold: f32,
    /// Seconds below the displacement threshold before recovery kicks in.
    pub max_stuck_time: f64,
    /// Hard cap on the magnitude of any movement force.
    pub force_cap: f32,
    /// Magnitude scale of the stuck-recovery nudge impulse.
    pub nudge_magnitude: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            dwell_base: 3.0,
            dwell_jitter: 2.0,
            target_margin: 50.0,
            replan_interval: 3.0,
            retry_cooldown: 3.0,
            stuck_cooldown: 2.0,
            max_path_len: 100,
            arrival_radius: 15.0,
            stuck_threshold: 5.0,
            max_stuck_time: 5.0,
            force_cap: 0.001,
            nudge_magnitude: 0.0001,
        }
    }
}

/// Presentation color for an agent state, RGBA.
#[must_use]
pub fn state_color(state: AgentState) -> [u8; 4] {
    match state {
        AgentState::Idle => [0x60, 0x60, 0x60, 0xff],
        AgentState::Seeking => [0x4c, 0xaf, 0x50, 0xff],
        AgentState::Moving => [0x21, 0x96, 0xf3, 0xff],
        AgentState::Stuck => [0xff, 0x57, 0x22, 0xff],
    }
}

/// Drives every `NavAgent` in the store, one tick at a time.
///
/// Owns the pathfinder and a seeded RNG; given the same seed, store state,
/// and tick sequence, agent behavior replays exactly.
#[derive(Debug)]
pub struct AgentController {
    config: AgentConfig,
    bounds: WorldBounds,
    pathfinder: Pathfinder,
    rng: ChaCha8Rng,
}

impl AgentController {
    #[must_use]
    pub fn new(config: AgentConfig, bounds: WorldBounds, cell_size: f32, seed: u64) -> Self {
        Self {
            config,
            bounds,
            pathfinder: Pathfinder::new(cell_size),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Advance every agent by one tick. Agents are visited in store query
    /// order (ascending entity id), so a tick is deterministic.
    pub fn update(
        &mut self,
        store: &mut Store,
        obstacles: &ObstacleMap,
        physics: &mut dyn Physics,
        now: f64,
        dt: f64,
    ) {
        let agents = store.query(&[
            ComponentKind::NavAgent,
            ComponentKind::Transform,
            ComponentKind::Physics,
        ]);
        for entity in agents {
            self.update_agent(store, obstacles, physics, entity, now, dt);
        }
    }

    fn update_agent(
        &mut self,
        store: &mut Store,
        obstacles: &ObstacleMap,
        physics: &mut dyn Physics,
        entity: Entity,
        now: f64,
        dt: f64,
    ) {
        let Some(position) = store.transform(entity).map(|t| t.position) else {
            return;
        };

        // Stuck detection runs every tick, independent of the state dispatch
        // below, but only accumulates while nominally moving.
        if self.detect_stuck(store, entity, position, dt) {
            self.recover_stuck(store, physics, entity, now);
            return;
        }

        let state = match store.nav_agent(entity) {
            Some(agent) => agent.state,
            None => return,
        };
        match state {
            AgentState::Idle => self.handle_idle(store, entity, now),
            AgentState::Seeking => self.handle_seeking(store, obstacles, entity, position, now),
            AgentState::Moving => self.handle_moving(store, physics, entity, position, now, dt),
            // Stuck never persists across ticks; seeing it here means the
            // record was stamped externally. Recover the same way.
            AgentState::Stuck => self.recover_stuck(store, physics, entity, now),
        }
    }

    /// Accumulate time-below-threshold while moving. Returns `true` once the
    /// agent has been stuck longer than allowed.
    fn detect_stuck(&self, store: &mut Store, entity: Entity, position: Vec2, dt: f64) -> bool {
        let threshold = self.config.stuck_threshold;
        let max_stuck = self.config.max_stuck_time;
        let Some(agent) = store.nav_agent_mut(entity) else {
            return false;
        };

        let displacement = (position - agent.last_position).length();
        if agent.state == AgentState::Moving && displacement < threshold {
            agent.stuck_timer += dt as f32;
            agent.stuck_timer as f64 > max_stuck
        } else {
            agent.stuck_timer = 0.0;
            agent.last_position = position;
            false
        }
    }

    fn handle_idle(&mut self, store: &mut Store, entity: Entity, now: f64) {
        let Some(agent) = store.nav_agent(entity) else {
            return;
        };
        if now < agent.plan_deadline {
            return;
        }

        let target = self
            .bounds
            .random_target(&mut self.rng, self.config.target_margin);
        if let Some(agent) = store.nav_agent_mut(entity) {
            agent.target = Some(target);
            agent.path.clear();
            agent.path_index = 0;
            agent.state = AgentState::Seeking;
        }
        self.update_appearance(store, entity, AgentState::Seeking);
        debug!(%entity, target_x = target.x, target_y = target.y, "agent picked target");
    }

    fn handle_seeking(
        &mut self,
        store: &mut Store,
        obstacles: &ObstacleMap,
        entity: Entity,
        position: Vec2,
        now: f64,
    ) {
        let Some(agent) = store.nav_agent(entity) else {
            return;
        };
        let Some(target) = agent.target else {
            self.drop_plan(store, entity, now, 0.0);
            return;
        };

        let path_is_fresh =
            !agent.path.is_empty() && now - agent.planned_at <= self.config.replan_interval;
        if path_is_fresh {
            return;
        }

        match self.pathfinder.find_path(position, target, obstacles) {
            Ok(path) if path.len() < self.config.max_path_len => {
                debug!(%entity, waypoints = path.len(), "agent found path");
                if let Some(agent) = store.nav_agent_mut(entity) {
                    agent.path = path;
                    agent.path_index = 0;
                    agent.planned_at = now;
                    agent.state = AgentState::Moving;
                }
                self.update_appearance(store, entity, AgentState::Moving);
            }
            Ok(path) => {
                // Excessively long paths are treated exactly like no path.
                debug!(%entity, waypoints = path.len(), "agent rejected oversized path");
                self.drop_plan(store, entity, now, self.config.retry_cooldown);
            }
            Err(err) => {
                debug!(%entity, %err, "agent found no path");
                self.drop_plan(store, entity, now, self.config.retry_cooldown);
            }
        }
    }

    fn handle_moving(
        &mut self,
        store: &mut Store,
        physics: &mut dyn Physics,
        entity: Entity,
        position: Vec2,
        now: f64,
        dt: f64,
    ) {
        // Recovery, not failure: physics pushed the agent out of the world.
        if !self.bounds.contains(position) {
            let safe = self.bounds.safe_center();
            if let Some(transform) = store.transform_mut(entity) {
                transform.position = safe;
            }
            if let Some(agent) = store.nav_agent_mut(entity) {
                agent.last_position = safe;
            }
            debug!(%entity, "agent out of bounds, reset to safe point");
            self.drop_plan(store, entity, now, 0.0);
            return;
        }

        enum Move {
            Arrived,
            Advanced,
            Steer { waypoint: Vec2, speed: f32 },
        }

        let action = {
            let Some(agent) = store.nav_agent_mut(entity) else {
                return;
            };
            if agent.path_index >= agent.path.len() {
                Move::Arrived
            } else {
                let waypoint = agent.path[agent.path_index];
                if position.distance(waypoint) < self.config.arrival_radius {
                    agent.path_index += 1;
                    if agent.path_index >= agent.path.len() {
                        Move::Arrived
                    } else {
                        Move::Advanced
                    }
                } else {
                    Move::Steer {
                        waypoint,
                        speed: agent.speed,
                    }
                }
            }
        };

        match action {
            Move::Arrived => self.arrive(store, entity, now),
            Move::Advanced => {}
            Move::Steer { waypoint, speed } => {
                // The cap is the design: runaway forces are rejected outright.
                let delta = waypoint - position;
                let magnitude = self.config.force_cap.min(speed * dt as f32 * 0.001);
                physics.apply_force(entity, delta.normalize() * magnitude);
            }
        }
    }

    /// Waypoints exhausted: clear the plan and dwell before the next one.
    fn arrive(&mut self, store: &mut Store, entity: Entity, now: f64) {
        debug!(%entity, "agent arrived");
        self.drop_plan(store, entity, now, 0.0);
    }

    /// One stuck episode ends with exactly one nudge and a cooldown.
    fn recover_stuck(&mut self, store: &mut Store, physics: &mut dyn Physics, entity: Entity, now: f64) {
        debug!(%entity, "agent stuck, recovering");
        let nudge = Vec2::new(
            (self.rng.gen_range(0.0..1.0) - 0.5) * self.config.nudge_magnitude,
            (self.rng.gen_range(0.0..1.0) - 0.5) * self.config.nudge_magnitude,
        );
        physics.apply_force(entity, nudge);
        if let Some(agent) = store.nav_agent_mut(entity) {
            agent.stuck_timer = 0.0;
        }
        self.drop_plan(store, entity, now, self.config.stuck_cooldown);
    }

    /// Abandon target and path, return to `Idle`, and set the next plan
    /// deadline to `now + extra_cooldown + randomized dwell`.
    fn drop_plan(&mut self, store: &mut Store, entity: Entity, now: f64, extra_cooldown: f64) {
        let dwell = self.config.dwell_base + self.rng.gen_range(0.0..1.0) * self.config.dwell_jitter;
        if let Some(agent) = store.nav_agent_mut(entity) {
            agent.clear_plan();
            agent.state = AgentState::Idle;
            agent.plan_deadline = now + extra_cooldown + dwell;
        }
        self.update_appearance(store, entity, AgentState::Idle);
    }

    /// Color-code the agent for the presentation layer, when it has a
    /// renderable at all.
    fn update_appearance(&self, store: &mut Store, entity: Entity, state: AgentState) {
        if let Some(renderable) = store.renderable_mut(entity) {
            renderable.color = state_color(state);
        }
    }
}
