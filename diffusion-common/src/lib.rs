pub mod config;
pub mod sim_params;
pub mod snapshot;
pub mod vecmath;

// Re-export key types for easier use by dependent crates
pub use config::{
    ConcentrationConfig, DynamicsConfig, FeatureToggles, MonteCarloConfig, OutputConfig,
    ParticleConfig, SimulationConfig, TimingConfig, WorldConfig,
};
pub use sim_params::{SimParams, CELL_SIZE};
pub use snapshot::Snapshot;
pub use vecmath::Vec2;
