//! Simulation configuration.
//!
//! Loaded from a TOML file; every field has a default, so a partial file (or
//! none at all) works. The grid cell size configured here feeds the maze
//! factory, the obstacle map, and the pathfinder alike — it must stay a
//! single value or "blocked" loses its meaning.

use std::path::Path;

use anyhow::Context;
use sandbox_agent::AgentConfig;
use sandbox_math::WorldBounds;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Grid cell size in world units.
    pub cell_size: f32,
    /// World width in world units.
    pub world_width: f32,
    /// World height in world units.
    pub world_height: f32,
    /// Minimum seconds between obstacle map rebuilds.
    pub obstacle_rebuild_interval: f64,
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
    /// Number of roaming agents to spawn.
    pub agent_count: usize,
    /// Movement speed factor per agent.
    pub agent_speed: f32,
    /// Seconds an agent stays idle after spawning before its first plan.
    pub first_plan_delay: f64,
    /// Seed for all randomized behavior. Same seed, same run.
    pub rng_seed: u64,
    /// Agent behavior tuning.
    pub agent: AgentConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            cell_size: 40.0,
            world_width: 800.0,
            world_height: 600.0,
            obstacle_rebuild_interval: 1.0,
            tick_rate: 60.0,
            max_ticks: 0,
            agent_count: 5,
            agent_speed: 10.0,
            first_plan_delay: 2.0,
            rng_seed: 0,
            agent: AgentConfig::default(),
        }
    }
}

impl SimConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Self = toml::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    #[must_use]
    pub fn world_bounds(&self) -> WorldBounds {
        WorldBounds::new(self.world_width, self.world_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimConfig::default();
        assert_eq!(config.cell_size, 40.0);
        assert_eq!(config.agent_count, 5);
        assert_eq!(config.max_ticks, 0);
        assert_eq!(config.agent.max_path_len, 100);
    }

    #[test]
    fn test_partial_toml_overrides_defaults() {
        let config: SimConfig = toml::from_str(
            r#"
            cell_size = 20.0
            agent_count = 2

            [agent]
            max_path_len = 50
        "#,
        )
        .unwrap();
        assert_eq!(config.cell_size, 20.0);
        assert_eq!(config.agent_count, 2);
        assert_eq!(config.agent.max_path_len, 50);
        // Untouched fields keep their defaults.
        assert_eq!(config.world_width, 800.0);
        assert_eq!(config.agent.arrival_radius, 15.0);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = SimConfig::default();
        let text = toml::to_string(&config).unwrap();
        let restored: SimConfig = toml::from_str(&text).unwrap();
        assert_eq!(restored.cell_size, config.cell_size);
        assert_eq!(restored.agent.dwell_base, config.agent.dwell_base);
    }
}
