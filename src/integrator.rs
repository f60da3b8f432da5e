use crate::particle::Particle;
use crate::physics::{BOLTZMANN, KELVIN_OFFSET};
use diffusion_common::SimParams;
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::StandardNormal;

/// Empirical scale applied to the Stokes drag coefficient.
const DRAG_SCALE: f64 = 0.1;

/// Amplifies the thermal noise term from microscopic magnitudes into
/// world-unit motion. A presentation-tuning constant, not physically
/// derived; changing it changes every trajectory.
const NOISE_SCALE: f64 = 1e12;

/// Fraction of the normal velocity component retained on wall reflection.
const WALL_DAMPING: f64 = 0.8;

/// Advances one particle by a single Langevin step, mutating its velocity
/// and position in place and reflecting it off the box walls.
///
/// `viscosity` is the effective dynamic viscosity for this tick (water
/// viscosity at the configured temperature times the viscosity factor).
/// The two standard-normal draws (x first, then y) come from the shared
/// `rng` stream, so the per-tick draw order is part of the reproducible
/// behavior under a fixed seed.
pub fn step(p: &mut Particle, params: &SimParams, viscosity: f64, rng: &mut StdRng) {
    let t_kelvin = params.temperature_c + KELVIN_OFFSET;

    // Stokes drag coefficient
    let gamma = 6.0 * std::f64::consts::PI * viscosity * p.radius * DRAG_SCALE;

    // Fluctuation-dissipation noise amplitude
    let noise_amplitude =
        (2.0 * gamma * BOLTZMANN * t_kelvin / p.mass * params.dt).sqrt() * NOISE_SCALE;

    let random_force_x = noise_amplitude * rng.sample::<f64, _>(StandardNormal);
    let random_force_y = noise_amplitude * rng.sample::<f64, _>(StandardNormal);

    let drag_force_x = -gamma * p.vel.x;
    let drag_force_y = -gamma * p.vel.y;

    p.vel.x += (drag_force_x / p.mass + random_force_x / p.mass) * params.dt;
    p.vel.y += (drag_force_y / p.mass + random_force_y / p.mass) * params.dt;

    p.pos.x += p.vel.x * params.dt;
    p.pos.y += p.vel.y * params.dt;

    reflect_at_walls(p, params);

    if p.tracked {
        p.record_position();
    }
}

/// Reflects the particle off the four box edges, clamping the position to
/// the radius inset and damping the normal velocity component. Each edge is
/// checked independently; a corner hit reflects both axes in the same step.
fn reflect_at_walls(p: &mut Particle, params: &SimParams) {
    if p.pos.x - p.radius < 0.0 {
        p.pos.x = p.radius;
        p.vel.x = -p.vel.x * WALL_DAMPING;
    }
    if p.pos.x + p.radius > params.world_width {
        p.pos.x = params.world_width - p.radius;
        p.vel.x = -p.vel.x * WALL_DAMPING;
    }
    if p.pos.y + p.radius > params.world_height {
        p.pos.y = params.world_height - p.radius;
        p.vel.y = -p.vel.y * WALL_DAMPING;
    }
    if p.pos.y - p.radius < 0.0 {
        p.pos.y = p.radius;
        p.vel.y = -p.vel.y * WALL_DAMPING;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diffusion_common::{SimulationConfig, Vec2};
    use rand::SeedableRng;

    fn test_params() -> SimParams {
        SimulationConfig::default().get_sim_params()
    }

    #[test]
    fn identical_seeds_give_identical_steps() {
        let params = test_params();
        let viscosity = crate::physics::water_viscosity(params.temperature_c);
        let mut a = Particle::new(Vec2::new(450.0, 450.0), 2.0, 1.0);
        let mut b = a.clone();
        let mut rng_a = StdRng::seed_from_u64(99);
        let mut rng_b = StdRng::seed_from_u64(99);
        for _ in 0..50 {
            step(&mut a, &params, viscosity, &mut rng_a);
            step(&mut b, &params, viscosity, &mut rng_b);
        }
        assert_eq!(a.pos, b.pos);
        assert_eq!(a.vel, b.vel);
    }

    #[test]
    fn wall_reflection_clamps_and_damps() {
        let params = test_params();
        let mut p = Particle::new(Vec2::new(-1.0, 450.0), 2.0, 1.0);
        p.vel = Vec2::new(-10.0, 0.0);
        reflect_at_walls(&mut p, &params);
        assert_eq!(p.pos.x, p.radius);
        assert_eq!(p.vel.x, 8.0); // negated and damped by 0.8
    }

    #[test]
    fn corner_hit_reflects_both_axes() {
        let params = test_params();
        let mut p = Particle::new(
            Vec2::new(params.world_width + 1.0, params.world_height + 1.0),
            2.0,
            1.0,
        );
        p.vel = Vec2::new(5.0, 5.0);
        reflect_at_walls(&mut p, &params);
        assert_eq!(p.pos.x, params.world_width - p.radius);
        assert_eq!(p.pos.y, params.world_height - p.radius);
        assert_eq!(p.vel.x, -4.0);
        assert_eq!(p.vel.y, -4.0);
    }

    #[test]
    fn untracked_particles_record_nothing() {
        let params = test_params();
        let viscosity = crate::physics::water_viscosity(params.temperature_c);
        let mut p = Particle::new(Vec2::new(450.0, 450.0), 2.0, 1.0);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..10 {
            step(&mut p, &params, viscosity, &mut rng);
        }
        assert_eq!(p.trajectory_len(), 0);

        p.tracked = true;
        for _ in 0..10 {
            step(&mut p, &params, viscosity, &mut rng);
        }
        assert_eq!(p.trajectory_len(), 10);
    }
}
