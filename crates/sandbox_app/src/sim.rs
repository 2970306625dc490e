//! Fixed-timestep simulation loop.
//!
//! One tick runs, in order: the obstacle rebuild gate, the agent controller
//! over the store-query snapshot (ascending entity id, so deterministic),
//! then the physics step. The obstacle map is rebuilt before any agent can
//! consume it; that ordering lives here, not in the store.

use std::time::{Duration, Instant};

use anyhow::Result;
use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sandbox_agent::AgentController;
use sandbox_component::Store;
use sandbox_nav::{ObstacleMap, ObstacleMapBuilder};
use tracing::{debug, info, warn};

use crate::config::SimConfig;
use crate::factory;
use crate::kinematics::KinematicPhysics;

/// The whole sandbox: store, navigation, agents, reference physics, clock.
#[derive(Debug)]
pub struct Simulation {
    config: SimConfig,
    store: Store,
    obstacles: ObstacleMapBuilder,
    controller: AgentController,
    physics: KinematicPhysics,
    /// Simulation clock in seconds, advanced by `dt` each tick. All agent
    /// deadlines compare against this, never against wall time.
    clock: f64,
    tick_id: u64,
}

impl Simulation {
    #[must_use]
    pub fn new(config: SimConfig) -> Self {
        let obstacles = ObstacleMapBuilder::new(config.cell_size, config.obstacle_rebuild_interval);
        let controller = AgentController::new(
            config.agent,
            config.world_bounds(),
            config.cell_size,
            config.rng_seed,
        );
        Self {
            config,
            store: Store::new(),
            obstacles,
            controller,
            physics: KinematicPhysics::new(),
            clock: 0.0,
            tick_id: 0,
        }
    }

    /// Spawn the bundled maze and the configured number of robots at random
    /// in-bounds positions.
    pub fn populate(&mut self) -> Result<()> {
        let walls = factory::spawn_maze(
            &mut self.store,
            &mut self.physics,
            factory::SIMPLE_MAZE,
            Vec2::new(100.0, 100.0),
            self.config.cell_size,
        )?;
        info!(walls = walls.len(), "maze placed");

        let bounds = self.config.world_bounds();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.rng_seed.wrapping_add(1));
        for _ in 0..self.config.agent_count {
            let position = bounds.random_target(&mut rng, self.config.agent.target_margin);
            factory::spawn_robot(
                &mut self.store,
                &mut self.physics,
                position,
                self.config.agent_speed,
                self.clock,
                self.config.first_plan_delay,
            )?;
        }
        info!(agents = self.config.agent_count, "robots placed");
        Ok(())
    }

    /// Advance the simulation by `dt` seconds.
    pub fn tick(&mut self, dt: f64) {
        self.tick_id += 1;

        let rebuilt = self.obstacles.maybe_rebuild(&self.store, self.clock);
        self.controller.update(
            &mut self.store,
            self.obstacles.snapshot(),
            &mut self.physics,
            self.clock,
            dt,
        );
        self.physics.step(&mut self.store, dt);
        self.clock += dt;

        debug!(
            tick_id = self.tick_id,
            clock = self.clock,
            rebuilt, "tick complete"
        );
    }

    /// Run the fixed-timestep loop at the configured tick rate until
    /// `max_ticks` ticks have run (forever when 0).
    pub fn run(&mut self) {
        let tick_duration = Duration::from_secs_f64(1.0 / self.config.tick_rate);
        let dt = tick_duration.as_secs_f64();

        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            "starting simulation loop"
        );

        loop {
            let start = Instant::now();
            self.tick(dt);

            if self.config.max_ticks > 0 && self.tick_id >= self.config.max_ticks {
                info!(ticks = self.tick_id, "simulation loop complete");
                break;
            }

            let elapsed = start.elapsed();
            if elapsed < tick_duration {
                std::thread::sleep(tick_duration - elapsed);
            } else {
                warn!(
                    tick_id = self.tick_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = tick_duration.as_millis() as u64,
                    "tick exceeded time budget"
                );
            }
        }
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub fn obstacle_snapshot(&self) -> &ObstacleMap {
        self.obstacles.snapshot()
    }

    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    #[must_use]
    pub fn clock(&self) -> f64 {
        self.clock
    }
}

#[cfg(test)]
mod tests {
    use sandbox_component::ComponentKind;

    use super::*;

    #[test]
    fn test_tick_advances_counter_and_clock() {
        let mut sim = Simulation::new(SimConfig::default());
        assert_eq!(sim.tick_id(), 0);
        sim.tick(1.0 / 60.0);
        sim.tick(1.0 / 60.0);
        assert_eq!(sim.tick_id(), 2);
        assert!((sim.clock() - 2.0 / 60.0).abs() < 1e-12);
    }

    #[test]
    fn test_obstacle_map_built_on_first_tick() {
        let mut sim = Simulation::new(SimConfig::default());
        sim.populate().unwrap();
        assert!(sim.obstacle_snapshot().is_empty());

        sim.tick(1.0 / 60.0);

        let walls = sim.store().query(&[ComponentKind::StaticObstacle]).len();
        assert!(walls > 0);
        assert_eq!(sim.obstacle_snapshot().len(), walls);
    }

    #[test]
    fn test_run_limited_ticks() {
        let config = SimConfig {
            tick_rate: 1000.0, // fast for testing
            max_ticks: 5,
            ..SimConfig::default()
        };
        let mut sim = Simulation::new(config);
        sim.run();
        assert_eq!(sim.tick_id(), 5);
    }

    #[test]
    fn test_lone_robot_eventually_moves() {
        // No maze: every plan succeeds, so the robot must leave its spawn
        // point once the first dwell elapses.
        let config = SimConfig {
            agent_count: 1,
            first_plan_delay: 0.0,
            ..SimConfig::default()
        };
        let mut sim = Simulation::new(config);
        let bounds = sim.config.world_bounds();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let spawn = bounds.random_target(&mut rng, 50.0);
        factory::spawn_robot(&mut sim.store, &mut sim.physics, spawn, 10.0, 0.0, 0.0).unwrap();

        for _ in 0..600 {
            sim.tick(1.0 / 60.0);
        }

        let robot = sim.store.query(&[ComponentKind::NavAgent])[0];
        let position = sim.store.transform(robot).unwrap().position;
        assert_ne!(position, spawn);
        assert!(bounds.contains(position) || position == bounds.safe_center());
    }
}
