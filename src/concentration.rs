use crate::particle::Particle;
use rayon::prelude::*;

/// Bins particle positions into a row-major `grid_width x grid_height`
/// histogram over the box. Recomputed from scratch each tick; no state is
/// carried between calls.
///
/// Particles outside [0, world_width) x [0, world_height) are dropped, not
/// clamped, so the cell sum can be less than the population size. In-range
/// positions bin by floor division, with the index clamped to the last cell
/// to absorb float rounding at the upper edge.
pub fn concentration_grid(
    particles: &[Particle],
    grid_width: u32,
    grid_height: u32,
    world_width: f64,
    world_height: f64,
) -> Vec<u32> {
    let grid_w = grid_width as usize;
    let grid_h = grid_height as usize;
    let cell_width = world_width / grid_width as f64;
    let cell_height = world_height / grid_height as f64;

    particles
        .par_iter()
        .fold(
            || vec![0u32; grid_w * grid_h],
            |mut counts, p| {
                if p.pos.x >= 0.0 && p.pos.x < world_width && p.pos.y >= 0.0 && p.pos.y < world_height
                {
                    let grid_x = ((p.pos.x / cell_width) as usize).min(grid_w - 1);
                    let grid_y = ((p.pos.y / cell_height) as usize).min(grid_h - 1);
                    counts[grid_y * grid_w + grid_x] += 1;
                }
                counts
            },
        )
        .reduce(
            || vec![0u32; grid_w * grid_h],
            |mut left, right| {
                for (acc, count) in left.iter_mut().zip(right) {
                    *acc += count;
                }
                left
            },
        )
}
