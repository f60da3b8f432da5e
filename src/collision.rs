use crate::grid::SpatialGrid;
use crate::particle::Particle;
use diffusion_common::Vec2;

/// Coefficient of restitution for particle-particle impacts.
pub const RESTITUTION: f64 = 0.9;

/// Resolves collisions between `particles[idx]` and every candidate in its
/// 3x3 grid neighborhood. Returns whether any impulse was applied, an
/// external signal only; the physics does not consume it.
///
/// Candidate pairs are not deduplicated across the tick: a pair in overlap
/// is visited once from each side, so the positional correction can apply
/// twice. Resolution mutates both particles, which is why the tick loop
/// runs this sequentially (single-writer discipline).
///
/// `scratch` is reused across calls to avoid a per-particle allocation.
pub fn resolve_for(
    particles: &mut [Particle],
    idx: usize,
    grid: &SpatialGrid,
    scratch: &mut Vec<usize>,
) -> bool {
    scratch.clear();
    grid.for_each_candidate(idx, particles[idx].pos, |j| scratch.push(j));

    let mut any = false;
    for &j in scratch.iter() {
        any |= resolve_pair(particles, idx, j);
    }
    any
}

/// Applies an elastic impulse between particles `i` and `j` if they overlap
/// and are approaching each other.
fn resolve_pair(particles: &mut [Particle], i: usize, j: usize) -> bool {
    let delta = particles[i].pos - particles[j].pos;
    let dist = delta.length();
    let min_dist = particles[i].radius + particles[j].radius;
    if dist >= min_dist {
        return false;
    }

    // Contact normal from j toward i; coincident centers fall back to a
    // unit x normal instead of dividing by zero.
    let normal = if dist > 0.0 {
        delta / dist
    } else {
        Vec2::new(1.0, 0.0)
    };

    let v_rel = particles[i].vel - particles[j].vel;
    let v_rel_normal = v_rel.dot(normal);

    // Separating or resting pairs are left untouched.
    if v_rel_normal >= 0.0 {
        return false;
    }

    let (m_i, m_j) = (particles[i].mass, particles[j].mass);
    let impulse = -(1.0 + RESTITUTION) * v_rel_normal / (1.0 / m_i + 1.0 / m_j);

    particles[i].vel = particles[i].vel + normal.scale(impulse / m_i);
    particles[j].vel = particles[j].vel - normal.scale(impulse / m_j);

    // Push the pair apart by half the overlap each so it does not re-trigger
    // on the next tick.
    let half_overlap = 0.5 * (min_dist - dist);
    particles[i].pos = particles[i].pos + normal.scale(half_overlap);
    particles[j].pos = particles[j].pos - normal.scale(half_overlap);

    true
}
