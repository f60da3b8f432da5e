use crate::sim_params::{SimParams, CELL_SIZE};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

// Configuration for the bounded simulation box
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct WorldConfig {
    pub width: f64,
    pub height: f64,
}

// Configuration for the particle population
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ParticleConfig {
    pub count: u32,
    pub radius: f64,
    pub mass: f64,
    /// Number of particles (from the front of the population) whose
    /// trajectory is recorded and exposed for rendering.
    #[serde(default = "default_tracked_count")]
    pub tracked_count: u32,
}

// Langevin dynamics inputs
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct DynamicsConfig {
    pub temperature_c: f64,
    pub dt: f64,
    #[serde(default = "default_viscosity_factor")]
    pub viscosity_factor: f64,
    #[serde(default = "default_rng_seed")]
    pub rng_seed: u64,
}

// Which optional per-tick stages run. All three can also be toggled at
// runtime through the simulation's control surface.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct FeatureToggles {
    #[serde(default)]
    pub collisions: bool,
    #[serde(default = "default_on")]
    pub heatmap: bool,
    #[serde(default = "default_on")]
    pub monte_carlo: bool,
}

// Geometry of the Monte Carlo sampling square. When the section is omitted
// the square spans the full world width anchored at the origin.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct MonteCarloConfig {
    pub square_size: f64,
    #[serde(default)]
    pub offset_x: f64,
    #[serde(default)]
    pub offset_y: f64,
}

// Resolution of the concentration histogram
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ConcentrationConfig {
    pub grid_width: u32,
    pub grid_height: u32,
}

// Configuration for the headless runner's duration and recording cadence,
// both in simulated time units
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TimingConfig {
    pub total_time: f64,
    pub record_interval: f64,
}

// Configuration for output settings
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub base_filename: String,
    pub save_positions: bool,
    pub save_stats: bool,
    #[serde(default)]
    pub save_positions_in_snapshot: bool,
    pub format: Option<String>, // Output format: "json", "bincode", "messagepack"
}

fn default_tracked_count() -> u32 {
    3
}

fn default_viscosity_factor() -> f64 {
    1.0
}

fn default_rng_seed() -> u64 {
    42
}

fn default_on() -> bool {
    true
}

impl Default for FeatureToggles {
    fn default() -> Self {
        FeatureToggles { collisions: false, heatmap: true, monte_carlo: true }
    }
}

// Main simulation configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SimulationConfig {
    pub world: WorldConfig,
    pub particles: ParticleConfig,
    pub dynamics: DynamicsConfig,
    #[serde(default)]
    pub features: FeatureToggles,
    #[serde(default)]
    pub monte_carlo: Option<MonteCarloConfig>,
    pub concentration: ConcentrationConfig,
    pub timing: TimingConfig,
    pub output: OutputConfig,
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        let config: SimulationConfig = toml::from_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML from '{}': {}", path_ref.display(), e))?;

        config.validate()?;
        Ok(config)
    }

    /// Checks the structural preconditions the physics loop relies on.
    /// Violations are surfaced immediately; nothing in the engine recovers
    /// from an invalid configuration.
    pub fn validate(&self) -> Result<()> {
        if self.world.width <= 0.0 || self.world.height <= 0.0 {
            anyhow::bail!("world dimensions must be positive");
        }
        if self.particles.count == 0 {
            anyhow::bail!("particles.count must be greater than 0");
        }
        if self.particles.radius <= 0.0 {
            anyhow::bail!("particles.radius must be positive");
        }
        if self.particles.mass <= 0.0 {
            anyhow::bail!("particles.mass must be positive");
        }
        if 2.0 * self.particles.radius > CELL_SIZE {
            anyhow::bail!(
                "particles.radius {} too large for the spatial hash (max {})",
                self.particles.radius,
                CELL_SIZE / 2.0
            );
        }
        if self.dynamics.dt <= 0.0 {
            anyhow::bail!("dynamics.dt must be positive");
        }
        if self.concentration.grid_width == 0 || self.concentration.grid_height == 0 {
            anyhow::bail!("concentration grid dimensions must be greater than 0");
        }
        if let Some(mc) = &self.monte_carlo {
            if mc.square_size <= 0.0 {
                anyhow::bail!("monte_carlo.square_size must be positive");
            }
        }
        if self.timing.total_time < 0.0 || self.timing.record_interval < 0.0 {
            anyhow::bail!("timing values must not be negative");
        }
        Ok(())
    }

    /// Converts the configuration into the runtime parameters consumed by
    /// the physics components.
    pub fn get_sim_params(&self) -> SimParams {
        let world_width = self.world.width;
        let world_height = self.world.height;

        let inv_cell_size = 1.0 / CELL_SIZE;
        let grid_dim_x = (world_width * inv_cell_size).ceil() as u32;
        let grid_dim_y = (world_height * inv_cell_size).ceil() as u32;
        let num_grid_cells = grid_dim_x * grid_dim_y;

        // Default sampling square: full world width anchored at the origin
        let (mc_square_size, mc_offset_x, mc_offset_y) = match &self.monte_carlo {
            Some(mc) => (mc.square_size, mc.offset_x, mc.offset_y),
            None => (world_width, 0.0, 0.0),
        };

        SimParams {
            world_width,
            world_height,
            cell_size: CELL_SIZE,
            inv_cell_size,
            grid_dim_x,
            grid_dim_y,
            num_grid_cells,
            conc_grid_width: self.concentration.grid_width,
            conc_grid_height: self.concentration.grid_height,
            dt: self.dynamics.dt,
            num_particles: self.particles.count,
            tracked_count: self.particles.tracked_count,
            radius: self.particles.radius,
            mass: self.particles.mass,
            temperature_c: self.dynamics.temperature_c,
            viscosity_factor: self.dynamics.viscosity_factor,
            mc_square_size,
            mc_offset_x,
            mc_offset_y,
            collisions_enabled: self.features.collisions,
            heatmap_enabled: self.features.heatmap,
            monte_carlo_enabled: self.features.monte_carlo,
        }
    }
}

impl Default for SimulationConfig {
    /// The reference setup: 1000 particles of radius 2 released at the
    /// center of a 900x900 box at 25 degrees C.
    fn default() -> Self {
        SimulationConfig {
            world: WorldConfig { width: 900.0, height: 900.0 },
            particles: ParticleConfig {
                count: 1000,
                radius: 2.0,
                mass: 1.0,
                tracked_count: 3,
            },
            dynamics: DynamicsConfig {
                temperature_c: 25.0,
                dt: 0.1,
                viscosity_factor: 1.0,
                rng_seed: 42,
            },
            features: FeatureToggles::default(),
            monte_carlo: None,
            concentration: ConcentrationConfig { grid_width: 20, grid_height: 20 },
            timing: TimingConfig { total_time: 100.0, record_interval: 10.0 },
            output: OutputConfig {
                base_filename: "diffusion".to_string(),
                save_positions: false,
                save_stats: true,
                save_positions_in_snapshot: false,
                format: Some("json".to_string()),
            },
        }
    }
}
