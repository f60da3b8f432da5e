use serde::{Deserialize, Serialize};

/// A snapshot of the simulation state and metrics at a specific time.
#[derive(Debug, Clone, Serialize, Deserialize)] // Derive traits for easy saving/loading
pub struct Snapshot {
    /// Elapsed simulated time at which the snapshot was taken.
    pub time: f64,
    /// The total number of particles in the simulation.
    pub particle_count: u32,
    /// Configured bath temperature in degrees Celsius.
    pub temperature_c: f64,
    /// Effective dynamic viscosity (water viscosity x configured factor).
    pub viscosity: f64,
    /// Current particle mass (shared across the population).
    pub mass: f64,
    /// Running Monte Carlo totals behind the pi estimate.
    pub mc_points_total: u64,
    pub mc_points_inside: u64,
    /// Pi estimate and its accuracy percentage. `None` until the first
    /// particle has been classified inside the sampling square.
    pub pi_estimate: Option<f64>,
    pub pi_accuracy: Option<f64>,
    /// Row-major concentration histogram (conc_grid_width x conc_grid_height).
    pub concentration: Vec<u32>,
    /// Optional: raw (x, y) positions of all particles at snapshot time.
    /// Included only if `config.output.save_positions_in_snapshot` is true.
    #[serde(skip_serializing_if = "Option::is_none")] // Don't write "positions": null
    pub positions: Option<Vec<(f64, f64)>>,
}
