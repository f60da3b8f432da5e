use serde::{Deserialize, Serialize};

/// Edge length of a spatial-hash cell, in world units.
///
/// Invariant: CELL_SIZE must be >= 2x the particle radius, otherwise two
/// particles within collision distance can sit outside each other's 3x3
/// cell neighborhood and the broad phase misses the pair.
pub const CELL_SIZE: f64 = 8.0;

/// Runtime parameters derived from the configuration, read by every physics
/// component once per tick. The tunable fields (temperature, mass, dt,
/// viscosity factor, feature switches) are mutated through the simulation's
/// control surface only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimParams {
    // World & grids
    pub world_width: f64,
    pub world_height: f64,
    pub cell_size: f64,
    pub inv_cell_size: f64,
    pub grid_dim_x: u32,
    pub grid_dim_y: u32,
    pub num_grid_cells: u32,
    pub conc_grid_width: u32,
    pub conc_grid_height: u32,

    // Time
    pub dt: f64,

    // Particle population
    pub num_particles: u32,
    pub tracked_count: u32,
    pub radius: f64,
    pub mass: f64,

    // Thermodynamics (runtime tunable)
    pub temperature_c: f64,
    pub viscosity_factor: f64,

    // Monte Carlo sampling region
    pub mc_square_size: f64,
    pub mc_offset_x: f64,
    pub mc_offset_y: f64,

    // Feature switches (runtime toggleable)
    pub collisions_enabled: bool,
    pub heatmap_enabled: bool,
    pub monte_carlo_enabled: bool,
}
