//! Core of a real-time 2D particle diffusion simulation: Langevin dynamics
//! with reflective boundaries, spatial-hash collision detection with
//! impulse resolution, a concentration histogram, and an embedded Monte
//! Carlo pi estimator fed by the same particle population.
//!
//! Rendering, HUD, and input handling are external collaborators: they
//! consume the read-only state this crate exposes ([`Simulation::particles`],
//! [`Simulation::stats`], [`Simulation::concentration`]) and drive the
//! control surface ([`Simulation::heat`], [`Simulation::restart`], ...).

pub mod collision;
pub mod concentration;
pub mod grid;
pub mod integrator;
pub mod montecarlo;
pub mod particle;
pub mod physics;
pub mod simulation;

pub use montecarlo::{MonteCarlo, PiEstimate};
pub use particle::{ColorClass, Particle, TRAJECTORY_CAP};
pub use simulation::{SimStats, Simulation};

// Re-export the shared crate's surface for downstream convenience
pub use diffusion_common::{SimParams, SimulationConfig, Snapshot, Vec2, CELL_SIZE};
