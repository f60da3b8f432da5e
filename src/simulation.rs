use crate::collision;
use crate::concentration::concentration_grid;
use crate::grid::SpatialGrid;
use crate::integrator;
use crate::montecarlo::{MonteCarlo, PiEstimate};
use crate::particle::{ColorClass, Particle};
use crate::physics;
use anyhow::Result;
use diffusion_common::{SimParams, SimulationConfig, Snapshot, Vec2};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

/// Aggregate scalars exposed per tick for the external stats overlay. The
/// overlay renders these; it computes none of them.
#[derive(Debug, Clone, Serialize)]
pub struct SimStats {
    pub particle_count: u32,
    pub elapsed: f64,
    pub temperature_c: f64,
    pub mass: f64,
    /// Effective dynamic viscosity (water viscosity x viscosity factor).
    pub viscosity: f64,
    pub viscosity_factor: f64,
    /// `None` until the first particle is classified inside the sampling
    /// square.
    pub pi: Option<PiEstimate>,
    pub collisions_enabled: bool,
    pub heatmap_enabled: bool,
    pub monte_carlo_enabled: bool,
}

/// Manages the state and execution of one particle diffusion simulation.
///
/// All state is owned here; there are no process-wide singletons, so
/// multiple independent simulations can coexist (and tests stay isolated).
/// Runtime tuning goes through the mutator methods, which an external
/// input-handling collaborator invokes; the core defines no keybindings.
pub struct Simulation {
    config: SimulationConfig,
    params: SimParams,
    particles: Vec<Particle>,
    grid: SpatialGrid,
    monte_carlo: MonteCarlo,
    /// Latest concentration histogram, row-major. All zeros until the
    /// heatmap stage first runs.
    concentration: Vec<u32>,
    /// Shared sequential RNG stream; draw order is part of the reproducible
    /// behavior under a fixed seed.
    rng: StdRng,
    elapsed: f64,
    collided_last_tick: bool,
    /// Scratch buffer for collision candidate indices.
    candidates: Vec<usize>,
}

impl Simulation {
    /// Creates a new simulation, validating the configuration and placing
    /// the initial population at the box center.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let params = config.get_sim_params();
        ensure_above_viscosity_floor(params.temperature_c)?;

        let particles = spawn_population(&params);
        let grid = SpatialGrid::new(&params);
        let monte_carlo = MonteCarlo::new(params.mc_square_size, params.mc_offset_x, params.mc_offset_y);
        let concentration = vec![0; (params.conc_grid_width * params.conc_grid_height) as usize];
        let rng = StdRng::seed_from_u64(config.dynamics.rng_seed);

        info!(
            "Initialized simulation: {} particles ({} tracked) in {}x{} box, seed {}",
            params.num_particles,
            params.tracked_count.min(params.num_particles),
            params.world_width,
            params.world_height,
            config.dynamics.rng_seed
        );

        Ok(Simulation {
            config,
            params,
            particles,
            grid,
            monte_carlo,
            concentration,
            rng,
            elapsed: 0.0,
            collided_last_tick: false,
            candidates: Vec::new(),
        })
    }

    /// Advances the simulation by one tick.
    ///
    /// Order: rebuild the spatial grid from current positions, then one
    /// sequential pass over the population (integrate, resolve collisions,
    /// classify for Monte Carlo), then recompute the concentration
    /// histogram, then advance elapsed time.
    pub fn step(&mut self) {
        self.grid.rebuild(&self.particles);

        let viscosity = self.effective_viscosity();
        let mut any_collision = false;

        for idx in 0..self.particles.len() {
            integrator::step(&mut self.particles[idx], &self.params, viscosity, &mut self.rng);

            if self.params.collisions_enabled {
                any_collision |= collision::resolve_for(
                    &mut self.particles,
                    idx,
                    &self.grid,
                    &mut self.candidates,
                );
            }

            if self.params.monte_carlo_enabled {
                self.monte_carlo.classify(&mut self.particles[idx]);
            }
        }
        self.collided_last_tick = any_collision;

        if self.params.heatmap_enabled {
            self.concentration = concentration_grid(
                &self.particles,
                self.params.conc_grid_width,
                self.params.conc_grid_height,
                self.params.world_width,
                self.params.world_height,
            );
        }

        self.elapsed += self.params.dt;
    }

    /// Discards the population and statistics and re-initializes from the
    /// current parameters. Runtime tuning (temperature, mass, dt, factors,
    /// toggles) survives a restart; particles, Monte Carlo totals, the
    /// concentration grid, elapsed time, and the RNG stream do not.
    pub fn restart(&mut self) {
        self.particles = spawn_population(&self.params);
        self.monte_carlo.reset();
        self.concentration =
            vec![0; (self.params.conc_grid_width * self.params.conc_grid_height) as usize];
        self.elapsed = 0.0;
        self.collided_last_tick = false;
        self.rng = StdRng::seed_from_u64(self.config.dynamics.rng_seed);
        debug!("Simulation restarted with {} particles", self.particles.len());
    }

    // --- Control surface (invoked by the external input collaborator) ---

    /// Sets the bath temperature, rejecting values at or below the
    /// viscosity singularity floor.
    pub fn set_temperature(&mut self, temperature_c: f64) -> Result<()> {
        ensure_above_viscosity_floor(temperature_c)?;
        self.params.temperature_c = temperature_c;
        Ok(())
    }

    /// Shifts the bath temperature by `delta_c` degrees.
    pub fn heat(&mut self, delta_c: f64) -> Result<()> {
        self.set_temperature(self.params.temperature_c + delta_c)
    }

    /// Sets the shared particle mass and broadcasts it to the whole
    /// population.
    pub fn set_mass_for_all(&mut self, mass: f64) -> Result<()> {
        if mass <= 0.0 {
            anyhow::bail!("mass must be positive, got {}", mass);
        }
        self.params.mass = mass;
        for p in &mut self.particles {
            p.mass = mass;
        }
        Ok(())
    }

    /// Multiplies the viscosity scaling factor.
    pub fn scale_viscosity_factor(&mut self, factor: f64) {
        self.params.viscosity_factor *= factor;
    }

    /// Multiplies the timestep. The factor must be positive so dt stays
    /// positive.
    pub fn scale_timestep(&mut self, factor: f64) -> Result<()> {
        if factor <= 0.0 {
            anyhow::bail!("timestep factor must be positive, got {}", factor);
        }
        self.params.dt *= factor;
        Ok(())
    }

    /// Toggles pairwise collision resolution; returns the new state.
    pub fn toggle_collisions(&mut self) -> bool {
        self.params.collisions_enabled = !self.params.collisions_enabled;
        self.params.collisions_enabled
    }

    /// Toggles the concentration histogram stage; returns the new state.
    pub fn toggle_heatmap(&mut self) -> bool {
        self.params.heatmap_enabled = !self.params.heatmap_enabled;
        self.params.heatmap_enabled
    }

    /// Toggles Monte Carlo classification; returns the new state.
    pub fn toggle_monte_carlo(&mut self) -> bool {
        self.params.monte_carlo_enabled = !self.params.monte_carlo_enabled;
        self.params.monte_carlo_enabled
    }

    // --- Read-only surface (consumed by rendering/HUD collaborators) ---

    /// Read-only view of the particle population.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Latest concentration histogram, row-major
    /// (conc_grid_width x conc_grid_height).
    pub fn concentration(&self) -> &[u32] {
        &self.concentration
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn particle_count(&self) -> u32 {
        self.particles.len() as u32
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Whether any collision fired during the last tick. External signal
    /// only.
    pub fn collided_last_tick(&self) -> bool {
        self.collided_last_tick
    }

    /// Effective dynamic viscosity for the current tick.
    pub fn effective_viscosity(&self) -> f64 {
        physics::water_viscosity(self.params.temperature_c) * self.params.viscosity_factor
    }

    /// Aggregate scalars for the stats overlay.
    pub fn stats(&self) -> SimStats {
        SimStats {
            particle_count: self.particle_count(),
            elapsed: self.elapsed,
            temperature_c: self.params.temperature_c,
            mass: self.params.mass,
            viscosity: self.effective_viscosity(),
            viscosity_factor: self.params.viscosity_factor,
            pi: self.monte_carlo.estimate(),
            collisions_enabled: self.params.collisions_enabled,
            heatmap_enabled: self.params.heatmap_enabled,
            monte_carlo_enabled: self.params.monte_carlo_enabled,
        }
    }

    /// Collects the current state and metrics into a serializable snapshot.
    pub fn snapshot(&self) -> Snapshot {
        let estimate = self.monte_carlo.estimate();
        let positions = if self.config.output.save_positions_in_snapshot {
            Some(self.particles.iter().map(|p| (p.pos.x, p.pos.y)).collect())
        } else {
            None
        };

        Snapshot {
            time: self.elapsed,
            particle_count: self.particle_count(),
            temperature_c: self.params.temperature_c,
            viscosity: self.effective_viscosity(),
            mass: self.params.mass,
            mc_points_total: self.monte_carlo.points_total(),
            mc_points_inside: self.monte_carlo.points_inside(),
            pi_estimate: estimate.map(|e| e.pi),
            pi_accuracy: estimate.map(|e| e.accuracy_percent),
            concentration: self.concentration.clone(),
            positions,
        }
    }
}

/// Places the initial population: every particle at the box center, at
/// rest, with the first `tracked_count` flagged for trajectory recording.
fn spawn_population(params: &SimParams) -> Vec<Particle> {
    let center = Vec2::new(params.world_width / 2.0, params.world_height / 2.0);
    let tracked = params.tracked_count.min(params.num_particles) as usize;

    let mut particles: Vec<Particle> = (0..params.num_particles)
        .map(|_| Particle::new(center, params.radius, params.mass))
        .collect();
    for p in particles.iter_mut().take(tracked) {
        p.tracked = true;
        p.color = ColorClass::Tracked;
    }
    particles
}

fn ensure_above_viscosity_floor(temperature_c: f64) -> Result<()> {
    let t_kelvin = temperature_c + physics::KELVIN_OFFSET;
    if t_kelvin <= physics::VISCOSITY_SINGULARITY_K {
        anyhow::bail!(
            "temperature {} C ({} K) is at or below the {} K viscosity singularity",
            temperature_c,
            t_kelvin,
            physics::VISCOSITY_SINGULARITY_K
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_sim() -> Simulation {
        let mut config = SimulationConfig::default();
        config.particles.count = 20;
        Simulation::new(config).unwrap()
    }

    #[test]
    fn population_spawns_at_center_with_tracked_prefix() {
        let sim = small_sim();
        assert_eq!(sim.particle_count(), 20);
        for p in sim.particles() {
            assert_eq!(p.pos, Vec2::new(450.0, 450.0));
        }
        assert!(sim.particles()[..3].iter().all(|p| p.tracked));
        assert!(sim.particles()[3..].iter().all(|p| !p.tracked));
        assert_eq!(sim.particles()[0].color, ColorClass::Tracked);
    }

    #[test]
    fn mass_broadcast_reaches_every_particle() {
        let mut sim = small_sim();
        sim.set_mass_for_all(1.5).unwrap();
        assert_eq!(sim.params().mass, 1.5);
        assert!(sim.particles().iter().all(|p| p.mass == 1.5));
        assert!(sim.set_mass_for_all(0.0).is_err());
    }

    #[test]
    fn temperature_floor_is_enforced() {
        let mut sim = small_sim();
        assert!(sim.set_temperature(-134.0).is_err());
        assert!(sim.set_temperature(-133.0).is_ok());
        assert!(sim.heat(-1.0).is_err()); // would cross the floor
        assert!(sim.heat(158.0).is_ok());

        let mut config = SimulationConfig::default();
        config.dynamics.temperature_c = -200.0;
        assert!(Simulation::new(config).is_err());
    }

    #[test]
    fn timestep_scaling_validates_the_factor() {
        let mut sim = small_sim();
        sim.scale_timestep(1.1).unwrap();
        assert!((sim.params().dt - 0.11).abs() < 1e-12);
        assert!(sim.scale_timestep(0.0).is_err());
        assert!(sim.scale_timestep(-1.0).is_err());
    }

    #[test]
    fn toggles_flip_and_report_state() {
        let mut sim = small_sim();
        assert!(sim.toggle_collisions());
        assert!(!sim.toggle_collisions());
        assert!(!sim.toggle_heatmap());
        assert!(!sim.toggle_monte_carlo());
        let stats = sim.stats();
        assert!(!stats.heatmap_enabled);
        assert!(!stats.monte_carlo_enabled);
    }

    #[test]
    fn stats_report_effective_viscosity() {
        let mut sim = small_sim();
        let base = sim.stats().viscosity;
        sim.scale_viscosity_factor(0.05);
        let scaled = sim.stats().viscosity;
        assert!((scaled - base * 0.05).abs() < 1e-12);
    }
}
