use diffusion_common::Vec2;
use std::collections::VecDeque;

/// Maximum number of positions retained in a tracked particle's trajectory.
pub const TRAJECTORY_CAP: usize = 500;

/// Display classification consumed by the rendering collaborator. The core
/// only assigns tags; mapping tags to actual colors happens outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorClass {
    /// Default population tag.
    Base,
    /// Tracked particle with a recorded trajectory.
    Tracked,
    /// Classified inside the Monte Carlo quarter circle.
    InsideArc,
    /// Inside the sampling square but outside the quarter circle.
    OutsideArc,
}

/// A single diffusing particle. Owned exclusively by the simulation; all
/// mutation happens inside the tick loop or the control surface.
#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Collision radius, constant for the particle's lifetime.
    pub radius: f64,
    /// Mass, shared default across the population and mutable at runtime
    /// via the broadcast setter on the simulation.
    pub mass: f64,
    pub tracked: bool,
    /// Result of the latest Monte Carlo classification.
    pub inside_arc: bool,
    pub color: ColorClass,
    trajectory: VecDeque<Vec2>,
}

impl Particle {
    pub fn new(pos: Vec2, radius: f64, mass: f64) -> Self {
        Particle {
            pos,
            vel: Vec2::zero(),
            radius,
            mass,
            tracked: false,
            inside_arc: false,
            color: ColorClass::Base,
            trajectory: VecDeque::new(),
        }
    }

    /// Appends the current position to the trajectory, evicting the oldest
    /// entry once [`TRAJECTORY_CAP`] is reached. Called by the integrator
    /// for tracked particles only.
    pub fn record_position(&mut self) {
        self.trajectory.push_back(self.pos);
        if self.trajectory.len() > TRAJECTORY_CAP {
            self.trajectory.pop_front();
        }
    }

    /// Read-only view of the recorded trajectory, oldest point first.
    pub fn trajectory(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.trajectory.iter().copied()
    }

    pub fn trajectory_len(&self) -> usize {
        self.trajectory.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trajectory_is_bounded() {
        let mut p = Particle::new(Vec2::new(1.0, 1.0), 2.0, 1.0);
        p.tracked = true;
        for i in 0..(TRAJECTORY_CAP + 250) {
            p.pos = Vec2::new(i as f64, 0.0);
            p.record_position();
            assert!(p.trajectory_len() <= TRAJECTORY_CAP);
        }
        assert_eq!(p.trajectory_len(), TRAJECTORY_CAP);
        // FIFO eviction: the oldest 250 points are gone
        let first = p.trajectory().next().unwrap();
        assert_eq!(first.x, 250.0);
    }

    #[test]
    fn new_particle_starts_at_rest() {
        let p = Particle::new(Vec2::new(450.0, 450.0), 2.0, 1.0);
        assert_eq!(p.vel, Vec2::zero());
        assert_eq!(p.color, ColorClass::Base);
        assert!(!p.tracked);
        assert_eq!(p.trajectory_len(), 0);
    }
}
